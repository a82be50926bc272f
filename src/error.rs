//! Error types shared across modules

use std::path::PathBuf;

use thiserror::Error;

use crate::config::KeyParseError;
use crate::data::{DatabaseError, SessionId, WorkspaceId};
use crate::input::Action;

/// Failure reported by the chat backend
///
/// Cloneable so results can be fanned out to toasts, logs and tests.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("workspace {0} not found")]
    WorkspaceNotFound(WorkspaceId),

    #[error("session {0} not found")]
    SessionNotFound(SessionId),

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<DatabaseError> for BackendError {
    fn from(err: DatabaseError) -> Self {
        BackendError::Storage(err.to_string())
    }
}

impl From<rusqlite::Error> for BackendError {
    fn from(err: rusqlite::Error) -> Self {
        BackendError::Storage(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid key `{notation}` for `{action}`: {source}")]
    InvalidKey {
        action: String,
        notation: String,
        #[source]
        source: KeyParseError,
    },

    #[error("unknown action `{0}`")]
    UnknownAction(String),

    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("shortcut for {0:?} is already registered")]
    AlreadyRegistered(Action),
}
