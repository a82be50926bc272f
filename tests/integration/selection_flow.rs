//! Multi-select, bulk archive, pins and split view

use serde_json::json;
use subchat::core::{Pane, ToastKind};
use subchat::repro::TapeCommand;

use super::common::{current_workspace_name, replayer, run, session_names, workspace_names};

fn fixture() -> serde_json::Value {
    json!({
        "workspaces": [
            {
                "name": "alpha",
                "sessions": [
                    { "name": "a", "updated_s": 4 },
                    { "name": "b", "updated_s": 3 },
                    { "name": "c", "updated_s": 2 },
                    { "name": "d", "updated_s": 1 }
                ]
            },
            { "name": "beta", "sessions": [{ "name": "b1" }] },
            { "name": "gamma", "sessions": [{ "name": "g1" }] }
        ]
    })
}

fn select(pane: Pane, item: &str) -> TapeCommand {
    TapeCommand::ToggleSelection {
        pane,
        item: item.to_string(),
    }
}

#[tokio::test]
async fn test_shift_select_extends_from_active_chat() {
    let mut r = replayer(fixture()).await;

    run(
        &mut r,
        [TapeCommand::ShiftSelect {
            pane: Pane::Sessions,
            item: "c".into(),
        }],
    )
    .await;

    let selected: Vec<String> = r
        .hub()
        .snapshot()
        .sessions
        .into_iter()
        .filter(|row| row.selected)
        .map(|row| row.name)
        .collect();
    assert_eq!(selected, ["a", "b", "c"]);
}

#[tokio::test]
async fn test_bulk_archive_and_undo_each() {
    let mut r = replayer(fixture()).await;

    run(
        &mut r,
        [
            select(Pane::Sessions, "b"),
            select(Pane::Sessions, "c"),
            TapeCommand::ArchiveSelectedSessions,
        ],
    )
    .await;
    assert_eq!(session_names(r.hub()), ["a", "d"]);
    assert_eq!(r.hub().selection_len(Pane::Sessions), 0);
    assert_eq!(
        r.hub().toasts().latest().map(|t| t.message.as_str()),
        Some("Archived 2 chats")
    );

    run(&mut r, [TapeCommand::Undo, TapeCommand::Undo]).await;
    assert_eq!(session_names(r.hub()), ["a", "b", "c", "d"]);
}

#[tokio::test]
async fn test_selecting_every_chat_asks_to_archive_workspace() {
    let mut r = replayer(fixture()).await;

    run(
        &mut r,
        [
            TapeCommand::SelectAll {
                pane: Pane::Sessions,
            },
            TapeCommand::ArchiveSelectedSessions,
        ],
    )
    .await;

    assert!(r.hub().confirmation().is_some());
    assert_eq!(session_names(r.hub()).len(), 4);
}

#[tokio::test]
async fn test_batch_workspace_archive_waits_for_backend() {
    let mut r = replayer(fixture()).await;

    run(
        &mut r,
        [
            select(Pane::Workspaces, "alpha"),
            select(Pane::Workspaces, "beta"),
            TapeCommand::ArchiveSelectedWorkspaces,
        ],
    )
    .await;

    assert_eq!(workspace_names(r.hub()), ["gamma"]);
    assert_eq!(current_workspace_name(r.hub()).as_deref(), Some("gamma"));
    assert_eq!(r.hub().undo_stack().len(), 2);
    assert_eq!(
        r.hub().toasts().latest().map(|t| t.message.as_str()),
        Some("Archived 2 workspaces")
    );
}

#[tokio::test]
async fn test_batch_workspace_archive_reports_partial_failure() {
    let mut f = fixture();
    f["workspaces"][1]["fail"] = json!(true);
    let mut r = replayer(f).await;

    run(
        &mut r,
        [
            select(Pane::Workspaces, "beta"),
            select(Pane::Workspaces, "gamma"),
            TapeCommand::ArchiveSelectedWorkspaces,
        ],
    )
    .await;

    assert_eq!(workspace_names(r.hub()), ["alpha", "beta"]);
    let toast = r.hub().toasts().latest().expect("toast");
    assert_eq!(toast.kind, ToastKind::Error);
    assert_eq!(toast.message, "Couldn't archive 1 of 2 workspaces");
}

#[tokio::test]
async fn test_pins_sort_first() {
    let mut r = replayer(fixture()).await;

    run(
        &mut r,
        [TapeCommand::TogglePin {
            session: "c".into(),
        }],
    )
    .await;
    assert_eq!(session_names(r.hub()), ["c", "a", "b", "d"]);
    assert_eq!(r.hub().snapshot().pinned_rows, 1);

    run(
        &mut r,
        [
            select(Pane::Sessions, "a"),
            select(Pane::Sessions, "b"),
            TapeCommand::PinSelected,
        ],
    )
    .await;
    assert_eq!(session_names(r.hub()), ["a", "b", "c", "d"]);
    assert_eq!(r.hub().snapshot().pinned_rows, 3);
}

#[tokio::test]
async fn test_fixture_pins_load() {
    let mut f = fixture();
    f["workspaces"][0]["sessions"][3]["pinned"] = json!(true);
    let r = replayer(f).await;

    assert_eq!(session_names(r.hub()), ["d", "a", "b", "c"]);
}

#[tokio::test]
async fn test_split_groups_members_and_suppresses_unseen() {
    let mut r = replayer(fixture()).await;

    run(
        &mut r,
        [
            TapeCommand::AddToSplit {
                session: "d".into(),
            },
            TapeCommand::Activity {
                session: "d".into(),
            },
            TapeCommand::Activity {
                session: "c".into(),
            },
        ],
    )
    .await;

    let snapshot = r.hub().snapshot();
    let names: Vec<&str> = snapshot.sessions.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names[..2], ["a", "d"]);
    let d = snapshot.sessions.iter().find(|s| s.name == "d").unwrap();
    assert!(d.in_split && d.focused && !d.unseen);
    let c = snapshot.sessions.iter().find(|s| s.name == "c").unwrap();
    assert!(c.unseen);

    run(&mut r, [TapeCommand::CloseSplit]).await;
    assert!(r.hub().split_sessions().is_empty());
}
