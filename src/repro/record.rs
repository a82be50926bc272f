//! Capture a live session as a tape
//!
//! The fixture is taken from the backend when recording starts; commands are
//! then written with names resolved from that fixture.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::tape::{
    FixtureSession, FixtureWorkspace, TapeCommand, TapeError, TapeFixture, TapeWriter,
};
use crate::backend::ChatBackend;
use crate::data::{SessionId, WorkspaceId};
use crate::error::BackendError;
use crate::quick_switch::SwitchTarget;

/// Build a fixture from the backend's current contents
///
/// Session activity is stored relative to `now`. Repeated display names get a
/// `#n` suffix so every item keeps a unique handle.
pub async fn capture_fixture(
    backend: &dyn ChatBackend,
    primary_target: SwitchTarget,
    now: DateTime<Utc>,
) -> Result<(TapeFixture, HashMap<Uuid, String>), BackendError> {
    let mut names = HashMap::new();
    let mut used: HashMap<String, usize> = HashMap::new();
    let mut unique = |base: &str| {
        let count = used.entry(base.to_string()).or_insert(0);
        *count += 1;
        if *count == 1 {
            base.to_string()
        } else {
            format!("{base} #{count}")
        }
    };

    let mut workspaces = Vec::new();
    for workspace in backend.list_workspaces().await? {
        let name = unique(&workspace.name);
        names.insert(workspace.id.0, name.clone());

        let mut sessions = Vec::new();
        for session in backend.list_sessions(workspace.id).await? {
            let session_name = unique(session.display_name());
            names.insert(session.id.0, session_name.clone());
            sessions.push(FixtureSession {
                name: session_name,
                mode: session.mode,
                updated_s: (session.updated_at - now).num_seconds(),
                pinned: false,
                fail: false,
            });
        }
        workspaces.push(FixtureWorkspace {
            name,
            branch: workspace.branch,
            is_remote: workspace.is_remote,
            fail: false,
            sessions,
        });
    }

    Ok((
        TapeFixture {
            primary_target,
            workspaces,
            ..TapeFixture::default()
        },
        names,
    ))
}

/// Writes hub commands to a tape, translating ids to fixture names
pub struct Recorder {
    writer: TapeWriter,
    names: HashMap<Uuid, String>,
    created: usize,
}

impl Recorder {
    pub async fn start(
        path: &Path,
        backend: &dyn ChatBackend,
        primary_target: SwitchTarget,
        pins: &HashMap<WorkspaceId, Vec<SessionId>>,
        now: DateTime<Utc>,
    ) -> Result<Self, TapeError> {
        let (mut fixture, names) = capture_fixture(backend, primary_target, now).await?;
        for (workspace_id, pinned) in pins {
            let Some(ws_name) = names.get(&workspace_id.0) else {
                continue;
            };
            let Some(ws) = fixture.workspaces.iter_mut().find(|w| &w.name == ws_name) else {
                continue;
            };
            for session in &mut ws.sessions {
                session.pinned = pinned
                    .iter()
                    .any(|id| names.get(&id.0) == Some(&session.name));
            }
        }
        let writer = TapeWriter::create(path, fixture)?;
        tracing::info!(path = %path.display(), "Recording tape");
        Ok(Self {
            writer,
            names,
            created: 0,
        })
    }

    /// Fixture name for a workspace or chat id
    pub fn name_of(&self, id: Uuid) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// Register a chat created during recording under its replay alias
    pub fn created(&mut self, id: SessionId) {
        if self.names.contains_key(&id.0) {
            return;
        }
        self.created += 1;
        self.names.insert(id.0, format!("new-{}", self.created));
    }

    /// Resolve an id-based command into a named one and append it
    ///
    /// Commands naming items outside the fixture are dropped.
    pub fn record(&self, command: impl FnOnce(&Self) -> Option<TapeCommand>) {
        let Some(command) = command(self) else {
            tracing::debug!("Skipping command for unrecorded item");
            return;
        };
        if let Err(e) = self.writer.record(command) {
            tracing::warn!(error = %e, "Failed to write tape entry");
        }
    }

    /// Shorthand for commands naming a single item
    pub fn named(&self, id: Uuid) -> Option<String> {
        self.name_of(id).map(str::to_string)
    }
}

impl std::fmt::Debug for Recorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recorder")
            .field("names", &self.names.len())
            .finish_non_exhaustive()
    }
}
