//! Ledger of in-flight optimistic mutations
//!
//! Every optimistic edit records how to undo itself before the request goes
//! out. The result of the request settles the entry: success drops it,
//! failure hands the compensation back to the hub.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::{SessionId, SessionMode, Workspace, WorkspaceId};

/// Correlates an effect with its result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// Inverse of an optimistic mutation, derived from the prior state
#[derive(Debug, Clone, PartialEq)]
pub enum Compensation {
    RestoreSessionName {
        workspace_id: WorkspaceId,
        session_id: SessionId,
        previous: Option<String>,
    },
    RestoreSessionMode {
        workspace_id: WorkspaceId,
        session_id: SessionId,
        previous: SessionMode,
    },
    /// Put an optimistically archived workspace back where it was
    UnarchiveWorkspace { workspace: Workspace, index: usize },
    /// Take an optimistically restored workspace back out of the list
    RearchiveWorkspace { workspace_id: WorkspaceId },
    /// Reopen a chat whose archive the backend refused
    ReopenSession {
        workspace_id: WorkspaceId,
        session_id: SessionId,
    },
}

impl Compensation {
    /// Human-readable description of the failed operation
    pub fn describe(&self) -> &'static str {
        match self {
            Compensation::RestoreSessionName { .. } => "rename chat",
            Compensation::RestoreSessionMode { .. } => "change chat mode",
            Compensation::UnarchiveWorkspace { .. } => "archive workspace",
            Compensation::RearchiveWorkspace { .. } => "restore workspace",
            Compensation::ReopenSession { .. } => "archive chat",
        }
    }
}

/// What an in-flight request is waiting for
#[derive(Debug, Clone, PartialEq)]
pub enum Pending {
    Compensate(Compensation),
    /// Nothing changes locally until each id is confirmed
    BatchArchive { ids: Vec<WorkspaceId> },
    CreateSession { workspace_id: WorkspaceId },
}

#[derive(Debug, Default)]
pub struct OptimisticLedger {
    next_id: u64,
    pending: HashMap<RequestId, Pending>,
}

impl OptimisticLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pending request and return its id
    pub fn begin(&mut self, pending: Pending) -> RequestId {
        self.next_id += 1;
        let id = RequestId(self.next_id);
        self.pending.insert(id, pending);
        id
    }

    /// Remove and return the entry for `id`
    pub fn settle(&mut self, id: RequestId) -> Option<Pending> {
        self.pending.remove(&id)
    }

    /// Whether an archive of `workspace_id` is awaiting confirmation
    pub fn archive_pending(&self, workspace_id: WorkspaceId) -> bool {
        self.pending.values().any(|p| {
            matches!(
                p,
                Pending::Compensate(Compensation::UnarchiveWorkspace { workspace, .. })
                    if workspace.id == workspace_id
            )
        })
    }

    /// Whether a restore of `workspace_id` is awaiting confirmation
    pub fn restore_pending(&self, workspace_id: WorkspaceId) -> bool {
        self.pending.values().any(|p| {
            matches!(
                p,
                Pending::Compensate(Compensation::RearchiveWorkspace { workspace_id: id })
                    if *id == workspace_id
            )
        })
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
