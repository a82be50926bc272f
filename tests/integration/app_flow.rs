//! Keyboard-driven app sessions, rendering and record/replay parity

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};
use subchat::clock::ManualClock;
use subchat::data::Preferences;
use subchat::input::ShortcutRegistry;
use subchat::quick_switch::SwitchTarget;
use subchat::repro::{replay, Recorder, Tape};
use subchat::{App, Config, Effect, EffectRunner, HubSettings, InMemoryBackend, SessionHub};
use tempfile::tempdir;

use super::common::determinism::{session, test_clock, test_now, workspace, DeterministicIds};
use super::common::terminal::{line_of, render_app};
use super::common::{session_names, workspace_names};

struct Driver {
    app: App,
    runner: EffectRunner,
    clock: Arc<ManualClock>,
}

impl Driver {
    fn new(app: App, backend: InMemoryBackend, clock: Arc<ManualClock>) -> Self {
        let runner = EffectRunner::new(Arc::new(backend), Preferences::in_memory());
        Self { app, runner, clock }
    }

    async fn start(&mut self) {
        let effects = self.app.start();
        self.drive(effects).await;
    }

    async fn drive(&mut self, effects: Vec<Effect>) {
        let mut queue: VecDeque<Effect> = effects.into();
        while let Some(effect) = queue.pop_front() {
            if let Some(result) = self.runner.execute(effect).await {
                queue.extend(self.app.handle_result(result));
            }
        }
    }

    async fn key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        let effects = self.app.handle_key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        });
        self.drive(effects).await;
    }

    async fn type_keys(&mut self, keys: &str) {
        for c in keys.chars() {
            self.key(KeyCode::Char(c), KeyModifiers::NONE).await;
        }
    }
}

fn seeded_backend(clock: Arc<ManualClock>) -> InMemoryBackend {
    let ids = DeterministicIds::default();
    let backend = InMemoryBackend::with_clock(clock).with_sequential_ids(0xAAAA_0000);
    let alpha = workspace(&ids, "alpha", 0);
    let beta = workspace(&ids, "beta", 5);
    for (i, name) in ["one", "two", "three"].into_iter().enumerate() {
        backend.insert_session(session(&ids, alpha.id, name, i as i64 + 1));
    }
    backend.insert_session(session(&ids, beta.id, "solo", 1));
    backend.insert_workspace(alpha);
    backend.insert_workspace(beta);
    backend
}

fn app(clock: Arc<ManualClock>) -> App {
    let hub = SessionHub::new(HubSettings::default(), clock);
    App::new(hub, &Config::default(), &ShortcutRegistry::new()).expect("default shortcuts register")
}

#[tokio::test]
async fn test_full_screen_shows_lists_and_footer() {
    let clock = test_clock();
    let backend = seeded_backend(clock.clone());
    let mut s = Driver::new(app(clock.clone()), backend, clock);
    s.start().await;

    let screen = render_app(&s.app, 100, 20);
    assert!(screen.contains("alpha"));
    assert!(screen.contains("beta"));
    assert!(screen.contains("Chats (3)"));
    let two = line_of(&screen, "two").expect("second chat drawn");
    let three = line_of(&screen, "three").expect("last chat drawn");
    assert!(two < three);
}

#[tokio::test]
async fn test_toast_disappears_after_its_lifetime() {
    let clock = test_clock();
    let backend = seeded_backend(clock.clone());
    let mut s = Driver::new(app(clock.clone()), backend.clone(), clock);
    s.start().await;

    s.type_keys("jd").await;
    assert!(render_app(&s.app, 100, 20).contains("Chat archived"));
    assert!(!backend.calls().iter().any(|c| c.starts_with("archive_session")));

    s.clock.advance(std::time::Duration::from_secs(30));
    let effects = s.app.tick();
    s.drive(effects).await;
    assert!(!render_app(&s.app, 100, 20).contains("Chat archived"));
    assert!(s.app.hub().undo_stack().is_empty());
    // The backend hears about the archive once undo is no longer possible
    assert_eq!(
        backend.calls().iter().filter(|c| c.starts_with("archive_session")).count(),
        1
    );
}

#[tokio::test]
async fn test_switching_workspace_from_list_pane() {
    let clock = test_clock();
    let backend = seeded_backend(clock.clone());
    let mut s = Driver::new(app(clock.clone()), backend, clock);
    s.start().await;

    s.key(KeyCode::Tab, KeyModifiers::NONE).await;
    s.type_keys("j").await;
    s.key(KeyCode::Enter, KeyModifiers::NONE).await;

    assert_eq!(session_names(s.app.hub()), ["solo"]);
}

#[tokio::test]
async fn test_recorded_session_replays_to_same_state() {
    let clock = test_clock();
    let backend = seeded_backend(clock.clone());
    let dir = tempdir().unwrap();
    let path = dir.path().join("session.jsonl");

    let recorder = Recorder::start(
        &path,
        &backend,
        SwitchTarget::Workspaces,
        &HashMap::new(),
        test_now(),
    )
    .await
    .unwrap();
    let live = app(clock.clone()).with_recorder(recorder);
    let mut s = Driver::new(live, backend, clock);
    s.start().await;

    // Archive "two", create a chat, pin it, then bring "two" back
    s.type_keys("jdnpu").await;
    let names = session_names(s.app.hub());
    assert_eq!(names, ["New Chat", "one", "two", "three"]);

    let tape = Tape::read_jsonl_from_path(&path).unwrap();
    assert_eq!(tape.entries.len(), 4);
    let report = replay(&tape).await.unwrap();

    let replayed: Vec<String> = report
        .final_state
        .sessions
        .iter()
        .map(|row| row.name.clone())
        .collect();
    assert_eq!(replayed, names);
    assert_eq!(report.final_state.pinned_rows, 1);
    let workspaces: Vec<String> = report
        .final_state
        .workspaces
        .iter()
        .map(|row| row.name.clone())
        .collect();
    assert_eq!(workspaces, workspace_names(s.app.hub()));
}
