//! Canonical list of known sessions for one workspace

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::data::{Session, SessionId, SessionMode, WorkspaceId};

/// Known sessions of a workspace and their metadata
///
/// This mirrors what the backend returned last; local optimistic edits go
/// through [`SessionRegistry::rename`] and friends, which hand back the prior
/// value so the edit can be reverted.
#[derive(Debug, Clone)]
pub struct SessionRegistry {
    workspace_id: WorkspaceId,
    sessions: HashMap<SessionId, Session>,
}

impl SessionRegistry {
    pub fn new(workspace_id: WorkspaceId) -> Self {
        Self {
            workspace_id,
            sessions: HashMap::new(),
        }
    }

    pub fn workspace_id(&self) -> WorkspaceId {
        self.workspace_id
    }

    /// Replace the contents with a fresh fetch. Sessions of other workspaces are ignored.
    pub fn replace_all(&mut self, sessions: Vec<Session>) {
        let workspace_id = self.workspace_id;
        self.sessions = sessions
            .into_iter()
            .filter(|s| s.workspace_id == workspace_id)
            .map(|s| (s.id, s))
            .collect();
    }

    /// Insert or replace a session. Returns false if it belongs to another workspace.
    pub fn upsert(&mut self, session: Session) -> bool {
        if session.workspace_id != self.workspace_id {
            return false;
        }
        self.sessions.insert(session.id, session);
        true
    }

    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.sessions.contains_key(&id)
    }

    pub fn remove(&mut self, id: SessionId) -> Option<Session> {
        self.sessions.remove(&id)
    }

    /// Set the display name, returning the previous one (`None` if the session is unknown)
    pub fn rename(&mut self, id: SessionId, name: Option<String>) -> Option<Option<String>> {
        let session = self.sessions.get_mut(&id)?;
        Some(std::mem::replace(&mut session.name, name))
    }

    /// Set the mode, returning the previous one
    pub fn set_mode(&mut self, id: SessionId, mode: SessionMode) -> Option<SessionMode> {
        let session = self.sessions.get_mut(&id)?;
        Some(std::mem::replace(&mut session.mode, mode))
    }

    /// Record activity; `updated_at` only moves forward
    pub fn touch(&mut self, id: SessionId, at: DateTime<Utc>) -> bool {
        match self.sessions.get_mut(&id) {
            Some(session) => {
                if at > session.updated_at {
                    session.updated_at = at;
                }
                true
            }
            None => false,
        }
    }

    pub fn updated_at(&self, id: SessionId) -> Option<DateTime<Utc>> {
        self.sessions.get(&id).map(|s| s.updated_at)
    }

    /// Sessions ordered by `updated_at` descending, ties broken by id for stability
    pub fn by_recency(&self) -> Vec<&Session> {
        let mut sessions: Vec<&Session> = self.sessions.values().collect();
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)));
        sessions
    }

    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
