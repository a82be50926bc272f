//! Chat backend boundary
//!
//! The canonical workspace and session records live behind [`ChatBackend`].
//! The hub never awaits it directly; effects are executed by the
//! [`EffectRunner`](crate::core::EffectRunner) and their results fed back.

mod local;
mod memory;

use async_trait::async_trait;

use crate::data::{Session, SessionId, SessionMode, Workspace, WorkspaceId};
use crate::error::BackendError;

pub use local::LocalBackend;
pub use memory::InMemoryBackend;

/// Per-workspace outcome of a batch archive
pub type BatchResult = Vec<(WorkspaceId, Result<(), BackendError>)>;

#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Workspaces that are not archived, most recently updated first
    async fn list_workspaces(&self) -> Result<Vec<Workspace>, BackendError>;

    async fn get_workspace(&self, id: WorkspaceId) -> Result<Workspace, BackendError>;

    async fn create_workspace(&self, workspace: Workspace) -> Result<Workspace, BackendError>;

    async fn archive_workspace(&self, id: WorkspaceId) -> Result<(), BackendError>;

    async fn restore_workspace(&self, id: WorkspaceId) -> Result<(), BackendError>;

    /// Archive several workspaces; one failure does not stop the rest
    async fn archive_workspaces(&self, ids: Vec<WorkspaceId>) -> BatchResult {
        let mut results = Vec::with_capacity(ids.len());
        for id in ids {
            results.push((id, self.archive_workspace(id).await));
        }
        results
    }

    /// Unarchived sessions of a workspace
    async fn list_sessions(&self, workspace_id: WorkspaceId) -> Result<Vec<Session>, BackendError>;

    async fn get_session(&self, id: SessionId) -> Result<Session, BackendError>;

    async fn archive_session(&self, id: SessionId) -> Result<(), BackendError>;

    async fn restore_session(&self, id: SessionId) -> Result<(), BackendError>;

    async fn create_session(
        &self,
        workspace_id: WorkspaceId,
        mode: SessionMode,
    ) -> Result<Session, BackendError>;

    async fn rename_session(&self, id: SessionId, name: String) -> Result<(), BackendError>;

    async fn set_session_mode(&self, id: SessionId, mode: SessionMode) -> Result<(), BackendError>;
}
