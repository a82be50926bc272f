//! Hold-to-preview quick switching through the hub

use serde_json::json;
use subchat::quick_switch::{QuickSwitchState, SwitchTarget};
use subchat::repro::TapeCommand;

use super::common::{active_name, current_workspace_name, replayer, run};

fn three_workspaces() -> serde_json::Value {
    json!({
        "workspaces": [
            {
                "name": "alpha",
                "sessions": [
                    { "name": "a1", "updated_s": 3 },
                    { "name": "a2", "updated_s": 2 },
                    { "name": "a3", "updated_s": 1 }
                ]
            },
            { "name": "beta", "sessions": [{ "name": "b1" }] },
            { "name": "gamma", "sessions": [{ "name": "g1" }] }
        ]
    })
}

fn press(target: SwitchTarget) -> TapeCommand {
    TapeCommand::QuickSwitchPress {
        target,
        reverse: false,
    }
}

#[tokio::test]
async fn test_quick_tap_toggles_between_recent_workspaces() {
    let mut r = replayer(three_workspaces()).await;

    run(&mut r, [press(SwitchTarget::Workspaces), TapeCommand::QuickSwitchRelease]).await;
    assert_eq!(current_workspace_name(r.hub()).as_deref(), Some("beta"));

    r.advance_to(500).await;
    run(&mut r, [press(SwitchTarget::Workspaces), TapeCommand::QuickSwitchRelease]).await;
    assert_eq!(current_workspace_name(r.hub()).as_deref(), Some("alpha"));
    assert!(r.hub().snapshot().quick_switch.is_none());
}

#[tokio::test]
async fn test_held_chord_opens_overlay_and_cycles() {
    let mut r = replayer(three_workspaces()).await;

    run(&mut r, [press(SwitchTarget::Workspaces)]).await;
    let view = r.hub().snapshot().quick_switch.expect("gesture in progress");
    assert_eq!(view.state, QuickSwitchState::Holding);
    assert_eq!(view.selected, None);

    // Hold delay elapses
    r.advance_to(60).await;
    let view = r.hub().snapshot().quick_switch.expect("overlay open");
    assert_eq!(view.state, QuickSwitchState::Open);
    assert_eq!(view.items, ["alpha", "beta", "gamma"]);
    assert_eq!(view.selected, Some(1));

    run(&mut r, [press(SwitchTarget::Workspaces)]).await;
    assert_eq!(
        r.hub().snapshot().quick_switch.and_then(|v| v.selected),
        Some(2)
    );

    run(&mut r, [TapeCommand::QuickSwitchRelease]).await;
    assert_eq!(current_workspace_name(r.hub()).as_deref(), Some("gamma"));
    assert!(r.hub().snapshot().quick_switch.is_none());
}

#[tokio::test]
async fn test_reverse_press_selects_last_candidate() {
    let mut r = replayer(three_workspaces()).await;

    run(
        &mut r,
        [
            TapeCommand::QuickSwitchPress {
                target: SwitchTarget::Workspaces,
                reverse: true,
            },
            TapeCommand::QuickSwitchRelease,
        ],
    )
    .await;
    assert_eq!(current_workspace_name(r.hub()).as_deref(), Some("gamma"));
}

#[tokio::test]
async fn test_cancel_keeps_current_workspace() {
    let mut r = replayer(three_workspaces()).await;

    run(&mut r, [press(SwitchTarget::Workspaces)]).await;
    r.advance_to(100).await;
    run(&mut r, [TapeCommand::QuickSwitchCancel, TapeCommand::QuickSwitchRelease]).await;

    assert_eq!(current_workspace_name(r.hub()).as_deref(), Some("alpha"));
    assert!(r.hub().snapshot().quick_switch.is_none());
}

#[tokio::test]
async fn test_session_switch_uses_recent_focus_order() {
    let mut r = replayer(three_workspaces()).await;

    run(
        &mut r,
        [
            TapeCommand::FocusSession {
                session: "a3".into(),
            },
            press(SwitchTarget::Sessions),
            TapeCommand::QuickSwitchRelease,
        ],
    )
    .await;
    // a1 was focused right before a3
    assert_eq!(active_name(r.hub()).as_deref(), Some("a1"));
}

#[tokio::test]
async fn test_enter_commits_open_overlay() {
    let mut r = replayer(three_workspaces()).await;

    run(&mut r, [press(SwitchTarget::Sessions)]).await;
    r.advance_to(60).await;
    run(&mut r, [TapeCommand::QuickSwitchConfirm]).await;

    assert_eq!(active_name(r.hub()).as_deref(), Some("a2"));
    assert!(r.hub().quick_switch_target().is_none());
}

#[tokio::test]
async fn test_swap_targets_flips_primary() {
    let mut r = replayer(three_workspaces()).await;
    assert_eq!(r.hub().primary_target(), SwitchTarget::Workspaces);

    run(&mut r, [TapeCommand::SwapTargets]).await;
    assert_eq!(r.hub().primary_target(), SwitchTarget::Sessions);
}

#[tokio::test]
async fn test_single_candidate_never_switches() {
    let mut r = replayer(json!({
        "workspaces": [{ "name": "only", "sessions": [{ "name": "x" }] }]
    }))
    .await;

    run(&mut r, [press(SwitchTarget::Workspaces), TapeCommand::QuickSwitchRelease]).await;
    assert_eq!(current_workspace_name(r.hub()).as_deref(), Some("only"));
}
