//! Shared test utilities
//!
//! - Deterministic clocks and ids
//! - Fixture-driven hubs built on the tape replayer
//! - TUI terminal testing helpers

pub mod determinism;
pub mod terminal;

use subchat::repro::{Replayer, TapeCommand, TapeFixture};
use subchat::SessionHub;

/// Build a replayer from a JSON fixture
pub async fn replayer(fixture: serde_json::Value) -> Replayer {
    let fixture: TapeFixture = serde_json::from_value(fixture).expect("invalid fixture");
    Replayer::new(&fixture).await.expect("fixture should load")
}

/// Apply commands in order, failing the test on unknown names
pub async fn run(replayer: &mut Replayer, commands: impl IntoIterator<Item = TapeCommand>) {
    for command in commands {
        replayer
            .apply(&command)
            .await
            .unwrap_or_else(|e| panic!("{command:?} failed: {e}"));
    }
}

/// Session names in display order
pub fn session_names(hub: &SessionHub) -> Vec<String> {
    hub.snapshot().sessions.into_iter().map(|row| row.name).collect()
}

/// Workspace names in list order
pub fn workspace_names(hub: &SessionHub) -> Vec<String> {
    hub.snapshot()
        .workspaces
        .into_iter()
        .map(|row| row.name)
        .collect()
}

/// Name of the active session, if any
pub fn active_name(hub: &SessionHub) -> Option<String> {
    hub.snapshot()
        .sessions
        .into_iter()
        .find(|row| row.active)
        .map(|row| row.name)
}

/// Name of the current workspace, if any
pub fn current_workspace_name(hub: &SessionHub) -> Option<String> {
    hub.snapshot()
        .workspaces
        .into_iter()
        .find(|row| row.current)
        .map(|row| row.name)
}
