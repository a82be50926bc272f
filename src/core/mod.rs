//! Navigation coordinator
//!
//! - [`SessionHub`]: single writer over workspaces, open sets, undo, selection
//!   and quick switching
//! - [`Effect`]/[`EffectResult`]: backend work requested by the hub and its outcome
//! - [`EffectRunner`]: executes effects on the tokio runtime

mod effect;
mod hub;
mod optimistic;
mod runner;
mod toast;

pub use effect::{Effect, EffectResult};
pub use hub::{
    Confirmation, HubSettings, HubSnapshot, Pane, QuickSwitchView, SessionHub, SessionRow,
    WorkspaceRow,
};
pub use optimistic::{Compensation, OptimisticLedger, Pending, RequestId};
pub use runner::EffectRunner;
pub use toast::{Toast, ToastKind, ToastQueue};
