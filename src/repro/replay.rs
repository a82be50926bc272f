//! Deterministic replay of a tape against an in-memory backend
//!
//! Time only moves when an entry says so: the hub runs on a [`ManualClock`]
//! set to each entry's `at_ms` before the command is applied, and every effect
//! is executed to completion before the next entry.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::tape::{Tape, TapeCommand, TapeError, TapeFixture, TapeSettings};
use crate::backend::InMemoryBackend;
use crate::clock::{Clock, ManualClock};
use crate::config::NavigationConfig;
use crate::core::{Effect, EffectRunner, HubSettings, HubSnapshot, Pane, SessionHub};
use crate::data::{Preferences, Session, SessionId, Workspace, WorkspaceId};

const WORKSPACE_ID_BASE: u128 = 0x1_0000;
const SESSION_ID_BASE: u128 = 0x2_0000;
const CREATED_ID_BASE: u128 = 0x3_0000;

/// Wall-clock time at `at_ms == 0`
pub fn tape_epoch() -> DateTime<Utc> {
    Utc.timestamp_opt(1_735_689_600, 0)
        .single()
        .unwrap_or_default()
}

#[derive(Debug, Clone, Serialize)]
pub struct LabeledSnapshot {
    pub label: String,
    pub at_ms: u64,
    pub state: HubSnapshot,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub commands: usize,
    pub snapshots: Vec<LabeledSnapshot>,
    #[serde(rename = "final")]
    pub final_state: HubSnapshot,
}

#[derive(Debug, Default)]
struct Names {
    workspaces: HashMap<String, WorkspaceId>,
    sessions: HashMap<String, (WorkspaceId, SessionId)>,
}

impl Names {
    fn workspace(&self, name: &str) -> Result<WorkspaceId, TapeError> {
        self.workspaces
            .get(name)
            .copied()
            .ok_or_else(|| TapeError::UnknownWorkspace(name.to_string()))
    }

    fn session(&self, name: &str) -> Result<(WorkspaceId, SessionId), TapeError> {
        self.sessions
            .get(name)
            .copied()
            .ok_or_else(|| TapeError::UnknownSession(name.to_string()))
    }

    fn item(&self, pane: Pane, name: &str) -> Result<Uuid, TapeError> {
        match pane {
            Pane::Workspaces => self.workspace(name).map(|id| id.0),
            Pane::Sessions => self.session(name).map(|(_, id)| id.0),
        }
    }
}

/// Drives a [`SessionHub`] from tape commands
pub struct Replayer {
    clock: Arc<ManualClock>,
    hub: SessionHub,
    runner: EffectRunner,
    names: Names,
    created: usize,
}

impl Replayer {
    /// Seed an in-memory backend from `fixture` and load it into a fresh hub
    pub async fn new(fixture: &TapeFixture) -> Result<Self, TapeError> {
        let clock = Arc::new(ManualClock::new(tape_epoch()));
        let backend = InMemoryBackend::with_clock(clock.clone()).with_sequential_ids(CREATED_ID_BASE);
        let preferences = Preferences::in_memory();
        let mut names = Names::default();
        let epoch = tape_epoch();
        let mut session_seq = SESSION_ID_BASE;

        for (idx, ws) in fixture.workspaces.iter().enumerate() {
            let mut workspace = Workspace::new(Uuid::nil(), &ws.name, &ws.branch, ws.is_remote, epoch);
            workspace.id = WorkspaceId(Uuid::from_u128(WORKSPACE_ID_BASE + idx as u128));
            // Earlier fixture entries list first
            workspace.updated_at = epoch - chrono::Duration::seconds(idx as i64);
            if names.workspaces.insert(ws.name.clone(), workspace.id).is_some() {
                return Err(TapeError::DuplicateName(ws.name.clone()));
            }

            let mut pins = Vec::new();
            for fs in &ws.sessions {
                let mut session = Session::new(workspace.id, fs.mode, epoch).with_name(&fs.name);
                session.id = SessionId(Uuid::from_u128(session_seq));
                session_seq += 1;
                session.updated_at = epoch + chrono::Duration::seconds(fs.updated_s);
                if names
                    .sessions
                    .insert(fs.name.clone(), (workspace.id, session.id))
                    .is_some()
                {
                    return Err(TapeError::DuplicateName(fs.name.clone()));
                }
                if fs.pinned {
                    pins.push(session.id);
                }
                if fs.fail {
                    backend.fail_session(session.id);
                }
                backend.insert_session(session);
            }
            if ws.fail {
                backend.fail_workspace(workspace.id);
            }
            if let Err(e) = preferences.save_pins(workspace.id, &pins) {
                tracing::warn!(error = %e, "Failed to seed pins");
            }
            backend.insert_workspace(workspace);
        }
        if let Err(e) = preferences.set_quick_switch_primary(fixture.primary_target) {
            tracing::warn!(error = %e, "Failed to seed quick switch target");
        }

        let settings = HubSettings::from(&navigation(&fixture.settings));
        let mut hub = SessionHub::new(settings, clock.clone());
        hub.set_primary_target(fixture.primary_target);
        let runner = EffectRunner::new(Arc::new(backend), preferences);

        let mut replayer = Self {
            clock,
            hub,
            runner,
            names,
            created: 0,
        };
        let effects = replayer.hub.load_workspaces();
        replayer.drive(effects).await;
        Ok(replayer)
    }

    pub fn hub(&self) -> &SessionHub {
        &self.hub
    }

    /// Run effects to completion, feeding results back into the hub
    async fn drive(&mut self, effects: Vec<Effect>) {
        let mut queue: VecDeque<Effect> = effects.into();
        queue.extend(self.hub.take_deferred());
        while let Some(effect) = queue.pop_front() {
            if let Some(result) = self.runner.execute(effect).await {
                queue.extend(self.hub.apply_result(result));
                queue.extend(self.hub.take_deferred());
            }
        }
    }

    /// Advance the clock to `at_ms`, fire due timers and run what they raised
    pub async fn advance_to(&mut self, at_ms: u64) {
        self.clock.set_elapsed(Duration::from_millis(at_ms));
        self.hub.tick();
        self.drive(Vec::new()).await;
    }

    /// Apply one command. Returns a snapshot for `Snapshot` commands.
    pub async fn apply(&mut self, command: &TapeCommand) -> Result<Option<String>, TapeError> {
        let effects = match command {
            TapeCommand::SelectWorkspace { workspace } => {
                let id = self.names.workspace(workspace)?;
                self.hub.select_workspace(id)
            }
            TapeCommand::OpenSession { session } => {
                let (_, id) = self.names.session(session)?;
                self.hub.open_session(id);
                Vec::new()
            }
            TapeCommand::FocusSession { session } => {
                let (_, id) = self.names.session(session)?;
                self.hub.focus_session(id);
                Vec::new()
            }
            TapeCommand::NewSession => {
                let before = self.hub.active_session();
                let effects = self.hub.new_session();
                self.drive(effects).await;
                if let (Some(ws), Some(id)) = (self.hub.current_workspace(), self.hub.active_session()) {
                    if Some(id) != before {
                        self.created += 1;
                        self.names
                            .sessions
                            .insert(format!("new-{}", self.created), (ws, id));
                    }
                }
                Vec::new()
            }
            TapeCommand::ArchiveSession { session } => {
                let (_, id) = self.names.session(session)?;
                self.hub.archive_session(id)
            }
            TapeCommand::ArchiveWorkspace { workspace } => {
                let id = self.names.workspace(workspace)?;
                self.hub.archive_workspace(id)
            }
            TapeCommand::ArchiveSelectedSessions => self.hub.archive_selected_sessions(),
            TapeCommand::ArchiveSelectedWorkspaces => self.hub.archive_selected_workspaces(),
            TapeCommand::Confirm => self.hub.confirm(),
            TapeCommand::CancelConfirmation => {
                self.hub.cancel_confirmation();
                Vec::new()
            }
            TapeCommand::Undo => self.hub.undo(),
            TapeCommand::TogglePin { session } => {
                let (_, id) = self.names.session(session)?;
                self.hub.toggle_pin(id)
            }
            TapeCommand::PinSelected => self.hub.pin_selected_sessions(),
            TapeCommand::AddToSplit { session } => {
                let (_, id) = self.names.session(session)?;
                self.hub.add_to_split(id);
                Vec::new()
            }
            TapeCommand::RemoveFromSplit { session } => {
                let (_, id) = self.names.session(session)?;
                self.hub.remove_from_split(id);
                Vec::new()
            }
            TapeCommand::CloseSplit => {
                self.hub.close_split();
                Vec::new()
            }
            TapeCommand::Rename { session, name } => {
                let (_, id) = self.names.session(session)?;
                self.hub.rename_session(id, name)
            }
            TapeCommand::ToggleMode { session } => {
                let (_, id) = self.names.session(session)?;
                self.hub.toggle_mode(id)
            }
            TapeCommand::Activity { session } => {
                let (ws, id) = self.names.session(session)?;
                let at = self.clock.wall();
                self.hub.session_activity(ws, id, at);
                Vec::new()
            }
            TapeCommand::QuickSwitchPress { target, reverse } => {
                self.hub.quick_switch_press(*target, *reverse);
                Vec::new()
            }
            TapeCommand::QuickSwitchRelease => self.hub.quick_switch_release(),
            TapeCommand::QuickSwitchConfirm => self.hub.quick_switch_confirm(),
            TapeCommand::QuickSwitchCancel => {
                self.hub.quick_switch_cancel();
                Vec::new()
            }
            TapeCommand::SwapTargets => self.hub.swap_quick_switch_targets(),
            TapeCommand::ToggleSelection { pane, item } => {
                let id = self.names.item(*pane, item)?;
                self.hub.toggle_selection(*pane, id);
                Vec::new()
            }
            TapeCommand::ShiftSelect { pane, item } => {
                let id = self.names.item(*pane, item)?;
                self.hub.shift_select(*pane, id);
                Vec::new()
            }
            TapeCommand::SelectAll { pane } => {
                self.hub.select_all(*pane);
                Vec::new()
            }
            TapeCommand::ClearSelection { pane } => {
                self.hub.clear_selection(*pane);
                Vec::new()
            }
            TapeCommand::Snapshot { label } => return Ok(Some(label.clone())),
        };
        self.drive(effects).await;
        Ok(None)
    }
}

fn navigation(settings: &TapeSettings) -> NavigationConfig {
    let mut nav = NavigationConfig::default();
    if let Some(ms) = settings.undo_window_ms {
        nav.undo_window = Duration::from_millis(ms);
    }
    if let Some(ms) = settings.hold_delay_ms {
        nav.hold_delay = Duration::from_millis(ms);
    }
    if let Some(limit) = settings.candidate_limit {
        nav.candidate_limit = limit.max(1);
    }
    if let Some(policy) = settings.reassign_policy {
        nav.reassign_policy = policy;
    }
    nav
}

/// Replay `tape` from its fixture and report the resulting states
pub async fn replay(tape: &Tape) -> Result<ReplayReport, TapeError> {
    let mut replayer = Replayer::new(&tape.fixture).await?;
    let mut snapshots = Vec::new();

    for entry in &tape.entries {
        replayer.advance_to(entry.at_ms).await;
        tracing::debug!(seq = entry.seq, at_ms = entry.at_ms, command = ?entry.command, "Replaying");
        if let Some(label) = replayer.apply(&entry.command).await? {
            snapshots.push(LabeledSnapshot {
                label,
                at_ms: entry.at_ms,
                state: replayer.hub().snapshot(),
            });
        }
    }

    Ok(ReplayReport {
        commands: tape.entries.len(),
        snapshots,
        final_state: replayer.hub().snapshot(),
    })
}
