//! The `subchat replay` command, run as a binary

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use subchat::repro::{replay, Tape};
use tempfile::tempdir;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn subchat(data_dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("subchat").unwrap();
    cmd.arg("--data-dir").arg(data_dir);
    cmd
}

#[test]
fn test_replay_prints_final_state() {
    let data = tempdir().unwrap();
    subchat(data.path())
        .arg("replay")
        .arg(fixture_path("archive_undo.jsonl"))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"solo\""))
        .stdout(predicate::str::contains("\"branch\": \"feature/login\""))
        .stdout(predicate::str::contains("after-archive").not());
}

#[test]
fn test_replay_all_includes_labeled_snapshots() {
    let data = tempdir().unwrap();
    subchat(data.path())
        .args(["replay", "--all"])
        .arg(fixture_path("archive_undo.jsonl"))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"label\": \"after-archive\""))
        .stdout(predicate::str::contains("\"label\": \"after-undo\""))
        .stdout(predicate::str::contains("\"final\""));
}

#[test]
fn test_missing_tape_fails() {
    let data = tempdir().unwrap();
    subchat(data.path())
        .arg("replay")
        .arg(data.path().join("nope.jsonl"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to access tape"));
}

#[test]
fn test_unknown_name_fails_with_context() {
    let data = tempdir().unwrap();
    let tape = data.path().join("bad.jsonl");
    std::fs::write(
        &tape,
        concat!(
            r#"{"type":"header","schema_version":1,"created_at_ms":0,"fixture":{"workspaces":[{"name":"alpha","sessions":[{"name":"a"}]}]}}"#,
            "\n",
            r#"{"type":"entry","entry":{"seq":1,"at_ms":0,"command":{"type":"archive_session","session":"ghost"}}}"#,
            "\n",
        ),
    )
    .unwrap();

    subchat(data.path())
        .arg("replay")
        .arg(&tape)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown chat `ghost`"));
}

#[test]
fn test_entry_before_header_is_rejected() {
    let data = tempdir().unwrap();
    let tape = data.path().join("headless.jsonl");
    std::fs::write(
        &tape,
        r#"{"type":"entry","entry":{"seq":1,"at_ms":0,"command":{"type":"undo"}}}"#,
    )
    .unwrap();

    subchat(data.path())
        .arg("replay")
        .arg(&tape)
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing tape header"));
}

#[tokio::test]
async fn test_fixture_tape_snapshots() {
    let tape = Tape::read_jsonl_from_path(&fixture_path("archive_undo.jsonl")).unwrap();
    let report = replay(&tape).await.unwrap();

    assert_eq!(report.commands, 6);
    let labels: Vec<&str> = report.snapshots.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, ["after-archive", "after-undo"]);

    let names = |i: usize| -> Vec<String> {
        report.snapshots[i]
            .state
            .sessions
            .iter()
            .map(|row| row.name.clone())
            .collect()
    };
    assert_eq!(names(0), ["a", "c"]);
    assert_eq!(names(1), ["a", "b", "c"]);

    let current = report
        .final_state
        .workspaces
        .iter()
        .find(|w| w.current)
        .map(|w| w.name.as_str());
    assert_eq!(current, Some("beta"));
}
