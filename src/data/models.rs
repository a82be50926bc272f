//! Data models for workspaces and their sessions

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a workspace (top-level chat)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkspaceId(pub Uuid);

/// Stable identifier of a session (sub-chat)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl WorkspaceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WorkspaceId {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WorkspaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for WorkspaceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Interaction mode of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    #[default]
    Agent,
    Plan,
}

impl SessionMode {
    pub fn toggled(self) -> Self {
        match self {
            SessionMode::Agent => SessionMode::Plan,
            SessionMode::Plan => SessionMode::Agent,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionMode::Agent => "agent",
            SessionMode::Plan => "plan",
        }
    }
}

impl FromStr for SessionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "agent" => Ok(SessionMode::Agent),
            "plan" => Ok(SessionMode::Plan),
            other => Err(format!("unknown session mode: {other}")),
        }
    }
}

/// A top-level chat context that owns sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    /// Unique identifier
    pub id: WorkspaceId,
    /// Display name
    pub name: String,
    /// Git branch the workspace runs on
    pub branch: String,
    /// Owning project
    pub project_id: Uuid,
    /// Sandbox-backed (remote) rather than a local checkout
    pub is_remote: bool,
    /// When the workspace was created
    pub created_at: DateTime<Utc>,
    /// Last activity; drives workspace recency
    pub updated_at: DateTime<Utc>,
    /// When the workspace was archived (None = active)
    pub archived_at: Option<DateTime<Utc>>,
}

impl Workspace {
    pub fn new(
        project_id: Uuid,
        name: impl Into<String>,
        branch: impl Into<String>,
        is_remote: bool,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: WorkspaceId::new(),
            name: name.into(),
            branch: branch.into(),
            project_id,
            is_remote,
            created_at: now,
            updated_at: now,
            archived_at: None,
        }
    }

    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }
}

/// An individual conversation thread (sub-chat) inside a workspace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub workspace_id: WorkspaceId,
    /// Empty until the user or the first message names it
    pub name: Option<String>,
    pub mode: SessionMode,
    pub created_at: DateTime<Utc>,
    /// Drives recency ordering
    pub updated_at: DateTime<Utc>,
    /// Set once the undo window of an archive closed
    #[serde(default)]
    pub archived_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(workspace_id: WorkspaceId, mode: SessionMode, now: DateTime<Utc>) -> Self {
        Self {
            id: SessionId::new(),
            workspace_id,
            name: None,
            mode,
            created_at: now,
            updated_at: now,
            archived_at: None,
        }
    }

    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Name for tab and list rendering
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => "New Chat",
        }
    }
}
