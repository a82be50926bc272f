use crate::backend::BatchResult;
use crate::data::{Session, SessionId, SessionMode, Workspace, WorkspaceId};
use crate::error::BackendError;
use crate::quick_switch::SwitchTarget;

use super::optimistic::RequestId;

/// Side effects that should be executed outside the hub.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    RefetchWorkspaces,
    RefetchSessions(WorkspaceId),
    ArchiveWorkspace {
        request: RequestId,
        workspace_id: WorkspaceId,
    },
    RestoreWorkspace {
        request: RequestId,
        workspace_id: WorkspaceId,
    },
    ArchiveWorkspaces {
        request: RequestId,
        ids: Vec<WorkspaceId>,
    },
    /// Sent when the undo window of a chat archive closes
    ArchiveSession {
        request: RequestId,
        session_id: SessionId,
    },
    CreateSession {
        request: RequestId,
        workspace_id: WorkspaceId,
        mode: SessionMode,
    },
    RenameSession {
        request: RequestId,
        session_id: SessionId,
        name: String,
    },
    SetSessionMode {
        request: RequestId,
        session_id: SessionId,
        mode: SessionMode,
    },
    SavePins {
        workspace_id: WorkspaceId,
        pinned: Vec<SessionId>,
    },
    SaveQuickSwitchTarget(SwitchTarget),
}

impl Effect {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Effect::RefetchWorkspaces => "refetch_workspaces",
            Effect::RefetchSessions(_) => "refetch_sessions",
            Effect::ArchiveWorkspace { .. } => "archive_workspace",
            Effect::RestoreWorkspace { .. } => "restore_workspace",
            Effect::ArchiveWorkspaces { .. } => "archive_workspaces",
            Effect::ArchiveSession { .. } => "archive_session",
            Effect::CreateSession { .. } => "create_session",
            Effect::RenameSession { .. } => "rename_session",
            Effect::SetSessionMode { .. } => "set_session_mode",
            Effect::SavePins { .. } => "save_pins",
            Effect::SaveQuickSwitchTarget(_) => "save_quick_switch_target",
        }
    }
}

/// Outcome of an [`Effect`], fed back through `SessionHub::apply_result`
#[derive(Debug, Clone, PartialEq)]
pub enum EffectResult {
    WorkspacesLoaded(Result<Vec<Workspace>, BackendError>),
    SessionsLoaded {
        workspace_id: WorkspaceId,
        result: Result<Vec<Session>, BackendError>,
        /// Persisted pin set for the workspace
        pins: Vec<SessionId>,
    },
    /// A single optimistic mutation settled
    Mutation {
        request: RequestId,
        result: Result<(), BackendError>,
    },
    SessionCreated {
        request: RequestId,
        result: Result<Session, BackendError>,
    },
    BatchArchived {
        request: RequestId,
        results: BatchResult,
    },
    /// Writing a preference failed; local state stays as the user set it
    PreferenceFailed(String),
}
