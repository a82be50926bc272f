pub mod backend;
pub mod clock;
pub mod config;
pub mod core;
pub mod data;
pub mod error;
pub mod input;
pub mod quick_switch;
pub mod repro;
pub mod selection;
pub mod session;
pub mod timer;
pub mod ui;
pub mod undo;
pub mod util;

pub use backend::{ChatBackend, InMemoryBackend, LocalBackend};
pub use config::Config;
pub use core::{Effect, EffectResult, EffectRunner, HubSettings, HubSnapshot, SessionHub};
pub use data::{Database, Session, SessionId, SessionMode, Workspace, WorkspaceId};
pub use ui::App;
