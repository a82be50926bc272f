//! Data model and persistence layer
//!
//! SQLite-backed storage for workspaces, sessions and preferences.

mod app_state;
mod database;
mod migrations;
mod models;
mod preferences;
mod session;
mod workspace;

pub use app_state::AppStateStore;
pub use database::{Database, DatabaseError};
pub use models::{Session, SessionId, SessionMode, Workspace, WorkspaceId};
pub use preferences::{MemoryPreferences, PreferenceStore, Preferences, SqlitePreferences};
pub use session::SessionStore;
pub use workspace::WorkspaceStore;
