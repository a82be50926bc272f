//! Per-workspace session bookkeeping
//!
//! Each workspace owns one registry (what exists), one open set (what is
//! shown as tabs) and one active pointer (what is focused).

pub mod active;
pub mod layout;
pub mod open_set;
pub mod registry;

pub use active::{ActiveSessionPointer, ReassignPolicy};
pub use layout::{display_order, DisplayList};
pub use open_set::OpenSessionSet;
pub use registry::SessionRegistry;
