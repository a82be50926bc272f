use std::sync::Arc;

use async_trait::async_trait;

use super::ChatBackend;
use crate::clock::{Clock, SystemClock};
use crate::data::{
    Database, Session, SessionId, SessionMode, SessionStore, Workspace, WorkspaceId,
    WorkspaceStore,
};
use crate::error::BackendError;

/// Backend that keeps the canonical records in the local SQLite database
#[derive(Clone)]
pub struct LocalBackend {
    workspaces: WorkspaceStore,
    sessions: SessionStore,
    clock: Arc<dyn Clock>,
}

impl LocalBackend {
    pub fn new(db: &Database) -> Self {
        Self::with_clock(db, Arc::new(SystemClock))
    }

    pub fn with_clock(db: &Database, clock: Arc<dyn Clock>) -> Self {
        Self {
            workspaces: WorkspaceStore::new(db.connection()),
            sessions: SessionStore::new(db.connection()),
            clock,
        }
    }

    /// Seed a workspace with one unnamed session when the database is empty
    pub fn ensure_seeded(&self) -> Result<(), BackendError> {
        let existing = self.workspaces.get_all()?;
        if !existing.is_empty() {
            return Ok(());
        }
        let now = self.clock.wall();
        let workspace = Workspace::new(uuid::Uuid::new_v4(), "scratch", "main", false, now);
        self.workspaces.create(&workspace)?;
        self.sessions
            .create(&Session::new(workspace.id, SessionMode::Agent, now))?;
        tracing::info!(workspace_id = %workspace.id, "Seeded empty database");
        Ok(())
    }
}

#[async_trait]
impl ChatBackend for LocalBackend {
    async fn list_workspaces(&self) -> Result<Vec<Workspace>, BackendError> {
        Ok(self.workspaces.get_all()?)
    }

    async fn get_workspace(&self, id: WorkspaceId) -> Result<Workspace, BackendError> {
        self.workspaces
            .get_by_id(id)?
            .ok_or(BackendError::WorkspaceNotFound(id))
    }

    async fn create_workspace(&self, workspace: Workspace) -> Result<Workspace, BackendError> {
        self.workspaces.create(&workspace)?;
        Ok(workspace)
    }

    async fn archive_workspace(&self, id: WorkspaceId) -> Result<(), BackendError> {
        if self.workspaces.archive(id, self.clock.wall())? {
            Ok(())
        } else {
            Err(BackendError::WorkspaceNotFound(id))
        }
    }

    async fn restore_workspace(&self, id: WorkspaceId) -> Result<(), BackendError> {
        if self.workspaces.unarchive(id)? {
            Ok(())
        } else {
            Err(BackendError::WorkspaceNotFound(id))
        }
    }

    async fn list_sessions(&self, workspace_id: WorkspaceId) -> Result<Vec<Session>, BackendError> {
        Ok(self.sessions.get_by_workspace(workspace_id)?)
    }

    async fn get_session(&self, id: SessionId) -> Result<Session, BackendError> {
        self.sessions
            .get_by_id(id)?
            .ok_or(BackendError::SessionNotFound(id))
    }

    async fn archive_session(&self, id: SessionId) -> Result<(), BackendError> {
        if self.sessions.archive(id, self.clock.wall())? {
            Ok(())
        } else {
            Err(BackendError::SessionNotFound(id))
        }
    }

    async fn restore_session(&self, id: SessionId) -> Result<(), BackendError> {
        if self.sessions.unarchive(id)? {
            Ok(())
        } else {
            Err(BackendError::SessionNotFound(id))
        }
    }

    async fn create_session(
        &self,
        workspace_id: WorkspaceId,
        mode: SessionMode,
    ) -> Result<Session, BackendError> {
        let now = self.clock.wall();
        if self.workspaces.get_by_id(workspace_id)?.is_none() {
            return Err(BackendError::WorkspaceNotFound(workspace_id));
        }
        let session = Session::new(workspace_id, mode, now);
        self.sessions.create(&session)?;
        self.workspaces.touch(workspace_id, now)?;
        Ok(session)
    }

    async fn rename_session(&self, id: SessionId, name: String) -> Result<(), BackendError> {
        if self.sessions.rename(id, &name, self.clock.wall())? {
            Ok(())
        } else {
            Err(BackendError::SessionNotFound(id))
        }
    }

    async fn set_session_mode(&self, id: SessionId, mode: SessionMode) -> Result<(), BackendError> {
        if self.sessions.set_mode(id, mode)? {
            Ok(())
        } else {
            Err(BackendError::SessionNotFound(id))
        }
    }
}
