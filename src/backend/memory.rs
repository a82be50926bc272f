use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

use super::ChatBackend;
use crate::clock::{Clock, SystemClock};
use crate::data::{Session, SessionId, SessionMode, Workspace, WorkspaceId};
use crate::error::BackendError;

#[derive(Debug, Default)]
struct State {
    workspaces: Vec<Workspace>,
    sessions: Vec<Session>,
    failing_workspaces: HashSet<WorkspaceId>,
    failing_sessions: HashSet<SessionId>,
    unavailable: bool,
    next_id: Option<u128>,
    calls: Vec<String>,
}

impl State {
    fn check_available(&self) -> Result<(), BackendError> {
        if self.unavailable {
            return Err(BackendError::Unavailable("backend offline".into()));
        }
        Ok(())
    }

    fn check_workspace(&self, id: WorkspaceId) -> Result<(), BackendError> {
        self.check_available()?;
        if self.failing_workspaces.contains(&id) {
            return Err(BackendError::Rejected(format!("workspace {id} is locked")));
        }
        Ok(())
    }

    fn check_session(&self, id: SessionId) -> Result<(), BackendError> {
        self.check_available()?;
        if self.failing_sessions.contains(&id) {
            return Err(BackendError::Rejected(format!("session {id} is locked")));
        }
        Ok(())
    }

    fn workspace_mut(&mut self, id: WorkspaceId) -> Result<&mut Workspace, BackendError> {
        self.workspaces
            .iter_mut()
            .find(|w| w.id == id)
            .ok_or(BackendError::WorkspaceNotFound(id))
    }

    fn session_mut(&mut self, id: SessionId) -> Result<&mut Session, BackendError> {
        self.sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(BackendError::SessionNotFound(id))
    }

    fn fresh_id(&mut self) -> Uuid {
        match self.next_id.as_mut() {
            Some(next) => {
                let id = Uuid::from_u128(*next);
                *next += 1;
                id
            }
            None => Uuid::new_v4(),
        }
    }
}

/// Process-local backend with failure injection
///
/// Used by tests and tape replay. Clones share state.
#[derive(Clone)]
pub struct InMemoryBackend {
    state: Arc<Mutex<State>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            clock,
        }
    }

    /// Hand out `Uuid::from_u128(seed)`, `seed + 1`, ... for created sessions
    pub fn with_sequential_ids(self, seed: u128) -> Self {
        self.state.lock().next_id = Some(seed);
        self
    }

    pub fn insert_workspace(&self, workspace: Workspace) {
        let mut state = self.state.lock();
        state.workspaces.retain(|w| w.id != workspace.id);
        state.workspaces.push(workspace);
    }

    pub fn insert_session(&self, session: Session) {
        let mut state = self.state.lock();
        state.sessions.retain(|s| s.id != session.id);
        state.sessions.push(session);
    }

    /// Make every mutation of `id` fail with `Rejected`
    pub fn fail_workspace(&self, id: WorkspaceId) {
        self.state.lock().failing_workspaces.insert(id);
    }

    /// Make every mutation of `id` fail with `Rejected`
    pub fn fail_session(&self, id: SessionId) {
        self.state.lock().failing_sessions.insert(id);
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unavailable = unavailable;
    }

    pub fn workspace(&self, id: WorkspaceId) -> Option<Workspace> {
        self.state.lock().workspaces.iter().find(|w| w.id == id).cloned()
    }

    pub fn session(&self, id: SessionId) -> Option<Session> {
        self.state.lock().sessions.iter().find(|s| s.id == id).cloned()
    }

    /// Names of the mutating calls received so far, oldest first
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("InMemoryBackend")
            .field("workspaces", &state.workspaces.len())
            .field("sessions", &state.sessions.len())
            .finish()
    }
}

#[async_trait]
impl ChatBackend for InMemoryBackend {
    async fn list_workspaces(&self) -> Result<Vec<Workspace>, BackendError> {
        let state = self.state.lock();
        state.check_available()?;
        let mut workspaces: Vec<Workspace> = state
            .workspaces
            .iter()
            .filter(|w| !w.is_archived())
            .cloned()
            .collect();
        workspaces.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(workspaces)
    }

    async fn get_workspace(&self, id: WorkspaceId) -> Result<Workspace, BackendError> {
        let mut state = self.state.lock();
        state.check_available()?;
        state.workspace_mut(id).map(|w| w.clone())
    }

    async fn create_workspace(&self, workspace: Workspace) -> Result<Workspace, BackendError> {
        let mut state = self.state.lock();
        state.check_available()?;
        state.calls.push(format!("create_workspace {}", workspace.id));
        state.workspaces.push(workspace.clone());
        Ok(workspace)
    }

    async fn archive_workspace(&self, id: WorkspaceId) -> Result<(), BackendError> {
        let now = self.clock.wall();
        let mut state = self.state.lock();
        state.calls.push(format!("archive_workspace {id}"));
        state.check_workspace(id)?;
        state.workspace_mut(id)?.archived_at = Some(now);
        Ok(())
    }

    async fn restore_workspace(&self, id: WorkspaceId) -> Result<(), BackendError> {
        let mut state = self.state.lock();
        state.calls.push(format!("restore_workspace {id}"));
        state.check_workspace(id)?;
        state.workspace_mut(id)?.archived_at = None;
        Ok(())
    }

    async fn list_sessions(&self, workspace_id: WorkspaceId) -> Result<Vec<Session>, BackendError> {
        let state = self.state.lock();
        state.check_available()?;
        if !state.workspaces.iter().any(|w| w.id == workspace_id) {
            return Err(BackendError::WorkspaceNotFound(workspace_id));
        }
        Ok(state
            .sessions
            .iter()
            .filter(|s| s.workspace_id == workspace_id && !s.is_archived())
            .cloned()
            .collect())
    }

    async fn get_session(&self, id: SessionId) -> Result<Session, BackendError> {
        let mut state = self.state.lock();
        state.check_available()?;
        state.session_mut(id).map(|s| s.clone())
    }

    async fn archive_session(&self, id: SessionId) -> Result<(), BackendError> {
        let now = self.clock.wall();
        let mut state = self.state.lock();
        state.calls.push(format!("archive_session {id}"));
        state.check_session(id)?;
        state.session_mut(id)?.archived_at = Some(now);
        Ok(())
    }

    async fn restore_session(&self, id: SessionId) -> Result<(), BackendError> {
        let mut state = self.state.lock();
        state.calls.push(format!("restore_session {id}"));
        state.check_session(id)?;
        state.session_mut(id)?.archived_at = None;
        Ok(())
    }

    async fn create_session(
        &self,
        workspace_id: WorkspaceId,
        mode: SessionMode,
    ) -> Result<Session, BackendError> {
        let now = self.clock.wall();
        let mut state = self.state.lock();
        state.calls.push(format!("create_session {workspace_id}"));
        state.check_workspace(workspace_id)?;
        state.workspace_mut(workspace_id)?.updated_at = now;

        let mut session = Session::new(workspace_id, mode, now);
        session.id = SessionId(state.fresh_id());
        state.sessions.push(session.clone());
        Ok(session)
    }

    async fn rename_session(&self, id: SessionId, name: String) -> Result<(), BackendError> {
        let now = self.clock.wall();
        let mut state = self.state.lock();
        state.calls.push(format!("rename_session {id}"));
        state.check_session(id)?;
        let session = state.session_mut(id)?;
        session.name = Some(name);
        session.updated_at = now;
        Ok(())
    }

    async fn set_session_mode(&self, id: SessionId, mode: SessionMode) -> Result<(), BackendError> {
        let mut state = self.state.lock();
        state.calls.push(format!("set_session_mode {id}"));
        state.check_session(id)?;
        state.session_mut(id)?.mode = mode;
        Ok(())
    }
}
