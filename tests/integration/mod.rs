//! Integration tests
//!
//! These drive the hub, runner and backend together through named fixtures.

#[path = "../common/mod.rs"]
pub mod common;

pub mod app_flow;
pub mod archive_flow;
pub mod quick_switch_flow;
pub mod replay_cli;
pub mod selection_flow;
