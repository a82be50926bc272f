//! Archive, confirmation and undo across the hub, runner and backend

use proptest::prelude::*;
use serde_json::json;
use subchat::core::ToastKind;
use subchat::repro::TapeCommand;
use subchat::undo::UndoItem;

use super::common::{
    active_name, current_workspace_name, replayer, run, session_names, workspace_names,
};

fn four_chats() -> serde_json::Value {
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
            {
                "name": "beta",
                "sessions": [{ "name": "solo" }]
            }
        ]
    })
}

fn archive(name: &str) -> TapeCommand {
    TapeCommand::ArchiveSession {
        session: name.to_string(),
    }
}

#[tokio::test]
async fn test_sessions_load_in_recency_order() {
    let r = replayer(four_chats()).await;

    assert_eq!(workspace_names(r.hub()), ["alpha", "beta"]);
    assert_eq!(current_workspace_name(r.hub()).as_deref(), Some("alpha"));
    assert_eq!(session_names(r.hub()), ["a", "b", "c", "d"]);
    assert_eq!(active_name(r.hub()).as_deref(), Some("a"));
}

#[tokio::test]
async fn test_undo_restores_archived_chats_in_place() {
    let mut r = replayer(four_chats()).await;

    run(&mut r, [archive("b"), archive("c")]).await;
    assert_eq!(session_names(r.hub()), ["a", "d"]);
    assert_eq!(r.hub().undo_stack().len(), 2);

    run(&mut r, [TapeCommand::Undo]).await;
    assert_eq!(session_names(r.hub()), ["a", "c", "d"]);

    run(&mut r, [TapeCommand::Undo]).await;
    assert_eq!(session_names(r.hub()), ["a", "b", "c", "d"]);
    assert!(r.hub().undo_stack().is_empty());
}

#[tokio::test]
async fn test_undo_does_not_refocus_restored_chat() {
    let mut r = replayer(four_chats()).await;

    run(
        &mut r,
        [
            TapeCommand::FocusSession {
                session: "c".into(),
            },
            archive("c"),
        ],
    )
    .await;
    // Focus returns to the previously focused chat
    assert_eq!(active_name(r.hub()).as_deref(), Some("a"));

    run(&mut r, [TapeCommand::Undo]).await;
    assert_eq!(session_names(r.hub()), ["a", "b", "c", "d"]);
    assert_eq!(active_name(r.hub()).as_deref(), Some("a"));
}

#[tokio::test]
async fn test_undo_window_expires() {
    let mut fixture = four_chats();
    fixture["settings"] = json!({ "undo_window_ms": 1000 });
    let mut r = replayer(fixture).await;

    run(&mut r, [archive("b")]).await;
    r.advance_to(999).await;
    assert_eq!(r.hub().undo_stack().len(), 1);

    r.advance_to(1000).await;
    assert!(r.hub().undo_stack().is_empty());

    run(&mut r, [TapeCommand::Undo]).await;
    assert_eq!(session_names(r.hub()), ["a", "c", "d"]);
}

#[tokio::test]
async fn test_last_chat_asks_before_archiving_workspace() {
    let mut r = replayer(four_chats()).await;

    run(
        &mut r,
        [
            TapeCommand::SelectWorkspace {
                workspace: "beta".into(),
            },
            archive("solo"),
        ],
    )
    .await;
    assert!(r.hub().confirmation().is_some());
    assert_eq!(session_names(r.hub()), ["solo"]);

    run(&mut r, [TapeCommand::CancelConfirmation]).await;
    assert!(r.hub().confirmation().is_none());
    assert_eq!(workspace_names(r.hub()), ["alpha", "beta"]);

    run(&mut r, [archive("solo"), TapeCommand::Confirm]).await;
    assert_eq!(workspace_names(r.hub()), ["alpha"]);
    assert_eq!(current_workspace_name(r.hub()).as_deref(), Some("alpha"));
    assert!(matches!(
        r.hub().undo_stack().peek(),
        Some(UndoItem::Workspace { .. })
    ));

    run(&mut r, [TapeCommand::Undo]).await;
    assert_eq!(workspace_names(r.hub()), ["alpha", "beta"]);
    // Undo restores the workspace without switching to it
    assert_eq!(current_workspace_name(r.hub()).as_deref(), Some("alpha"));
}

#[tokio::test]
async fn test_rejected_workspace_archive_rolls_back() {
    let mut fixture = four_chats();
    fixture["workspaces"][1]["fail"] = json!(true);
    let mut r = replayer(fixture).await;

    run(
        &mut r,
        [TapeCommand::ArchiveWorkspace {
            workspace: "beta".into(),
        }],
    )
    .await;

    assert_eq!(workspace_names(r.hub()), ["alpha", "beta"]);
    assert!(r.hub().undo_stack().is_empty());
    let toast = r.hub().toasts().latest().expect("error toast");
    assert_eq!(toast.kind, ToastKind::Error);
    assert!(toast.message.starts_with("Couldn't"));
    assert_eq!(r.hub().pending_requests(), 0);
}

#[tokio::test]
async fn test_archiving_current_workspace_moves_to_neighbour() {
    let mut r = replayer(four_chats()).await;

    run(
        &mut r,
        [TapeCommand::ArchiveWorkspace {
            workspace: "alpha".into(),
        }],
    )
    .await;

    assert_eq!(workspace_names(r.hub()), ["beta"]);
    assert_eq!(current_workspace_name(r.hub()).as_deref(), Some("beta"));
    assert_eq!(session_names(r.hub()), ["solo"]);
}

#[tokio::test]
async fn test_rejected_rename_restores_previous_name() {
    let mut fixture = four_chats();
    fixture["workspaces"][0]["sessions"][1]["fail"] = json!(true);
    let mut r = replayer(fixture).await;

    run(
        &mut r,
        [
            TapeCommand::Rename {
                session: "b".into(),
                name: "renamed".into(),
            },
            TapeCommand::Rename {
                session: "c".into(),
                name: "kept".into(),
            },
        ],
    )
    .await;

    assert_eq!(session_names(r.hub()), ["a", "b", "kept", "d"]);
    assert_eq!(r.hub().toasts().latest().map(|t| t.kind), Some(ToastKind::Error));
}

fn run_blocking<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime")
        .block_on(future)
}

proptest! {
    #[test]
    fn prop_undo_reverses_any_archive_sequence(picks in prop::collection::vec(0usize..8, 1..7)) {
        let (original, archived_all, restored) = run_blocking(async {
            let sessions: Vec<_> = (0..8)
                .map(|i| json!({ "name": format!("chat-{i}"), "updated_s": 8 - i }))
                .collect();
            let mut r = replayer(json!({
                "workspaces": [{ "name": "alpha", "sessions": sessions }]
            }))
            .await;
            let original = session_names(r.hub());

            for pick in &picks {
                let names = session_names(r.hub());
                let name = names[pick % names.len()].clone();
                run(&mut r, [archive(&name)]).await;
            }
            let archived_all = session_names(r.hub()).len() == original.len() - picks.len();

            for _ in &picks {
                run(&mut r, [TapeCommand::Undo]).await;
            }
            (original, archived_all, session_names(r.hub()))
        });

        prop_assert!(archived_all);
        prop_assert_eq!(restored, original);
    }
}
