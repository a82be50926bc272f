//! Executes hub effects against the backend and preference store

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::effect::{Effect, EffectResult};
use crate::backend::ChatBackend;
use crate::data::Preferences;

/// Runs effects one at a time, in submission order
///
/// Ordering matters: an archive followed by its undo must reach the backend
/// as archive, then restore.
#[derive(Clone)]
pub struct EffectRunner {
    backend: Arc<dyn ChatBackend>,
    preferences: Preferences,
}

impl EffectRunner {
    pub fn new(backend: Arc<dyn ChatBackend>, preferences: Preferences) -> Self {
        Self {
            backend,
            preferences,
        }
    }

    /// Execute one effect. Preference writes that succeed produce no result.
    pub async fn execute(&self, effect: Effect) -> Option<EffectResult> {
        tracing::debug!(effect = effect.name(), "Executing effect");
        match effect {
            Effect::RefetchWorkspaces => Some(EffectResult::WorkspacesLoaded(
                self.backend.list_workspaces().await,
            )),
            Effect::RefetchSessions(workspace_id) => {
                let result = self.backend.list_sessions(workspace_id).await;
                let pins = self.preferences.load_pins(workspace_id).unwrap_or_else(|e| {
                    tracing::warn!(workspace_id = %workspace_id, error = %e, "Ignoring unreadable pins");
                    Vec::new()
                });
                Some(EffectResult::SessionsLoaded {
                    workspace_id,
                    result,
                    pins,
                })
            }
            Effect::ArchiveWorkspace {
                request,
                workspace_id,
            } => Some(EffectResult::Mutation {
                request,
                result: self.backend.archive_workspace(workspace_id).await,
            }),
            Effect::RestoreWorkspace {
                request,
                workspace_id,
            } => Some(EffectResult::Mutation {
                request,
                result: self.backend.restore_workspace(workspace_id).await,
            }),
            Effect::ArchiveWorkspaces { request, ids } => Some(EffectResult::BatchArchived {
                request,
                results: self.backend.archive_workspaces(ids).await,
            }),
            Effect::ArchiveSession {
                request,
                session_id,
            } => Some(EffectResult::Mutation {
                request,
                result: self.backend.archive_session(session_id).await,
            }),
            Effect::CreateSession {
                request,
                workspace_id,
                mode,
            } => Some(EffectResult::SessionCreated {
                request,
                result: self.backend.create_session(workspace_id, mode).await,
            }),
            Effect::RenameSession {
                request,
                session_id,
                name,
            } => Some(EffectResult::Mutation {
                request,
                result: self.backend.rename_session(session_id, name).await,
            }),
            Effect::SetSessionMode {
                request,
                session_id,
                mode,
            } => Some(EffectResult::Mutation {
                request,
                result: self.backend.set_session_mode(session_id, mode).await,
            }),
            Effect::SavePins {
                workspace_id,
                pinned,
            } => self
                .preferences
                .save_pins(workspace_id, &pinned)
                .err()
                .map(|e| EffectResult::PreferenceFailed(e.to_string())),
            Effect::SaveQuickSwitchTarget(target) => self
                .preferences
                .set_quick_switch_primary(target)
                .err()
                .map(|e| EffectResult::PreferenceFailed(e.to_string())),
        }
    }

    /// Start a worker task that executes queued effects and reports results
    pub fn spawn(
        self,
        results: mpsc::UnboundedSender<EffectResult>,
    ) -> (mpsc::UnboundedSender<Effect>, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<Effect>();
        let handle = tokio::spawn(async move {
            while let Some(effect) = rx.recv().await {
                if let Some(result) = self.execute(effect).await {
                    if results.send(result).is_err() {
                        tracing::debug!("Result receiver dropped; stopping effect runner");
                        break;
                    }
                }
            }
        });
        (tx, handle)
    }
}

impl std::fmt::Debug for EffectRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectRunner").finish_non_exhaustive()
    }
}
