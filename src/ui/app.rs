use std::io;
use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyEvent, KeyModifiers};
use futures::StreamExt;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Rect},
    style::Style,
    Frame, Terminal,
};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::config::Config;
use crate::core::{
    Effect, EffectResult, EffectRunner, HubSnapshot, Pane, SessionHub, SessionRow, WorkspaceRow,
};
use crate::data::{SessionId, WorkspaceId};
use crate::error::InputError;
use crate::input::{Action, InputMode, KeyRouter, RoutedKey, ShortcutGuard, ShortcutRegistry};
use crate::repro::{Recorder, TapeCommand};
use crate::ui::components::{
    init_theme, theme, ConfirmChoice, ConfirmationDialog, GlobalFooter, QuickSwitchOverlay,
    SessionList, TextInputState, ToastStack, WorkspaceList,
};
use crate::ui::terminal_guard::TerminalGuard;

/// Longest sleep between loop iterations when no timer is pending
const IDLE_WAKE: Duration = Duration::from_secs(1);
/// How long pending effects get to finish on quit
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Rows currently shown after the list filter is applied
#[derive(Debug, Default)]
struct VisibleRows {
    workspaces: Vec<WorkspaceRow>,
    sessions: Vec<SessionRow>,
    pinned: usize,
}

fn matches_filter(name: &str, filter: &str) -> bool {
    filter.is_empty() || name.to_lowercase().contains(&filter.to_lowercase())
}

/// Interactive front end over a [`SessionHub`]
///
/// Key handling is synchronous and returns effects; [`App::run`] owns the
/// terminal and hands those effects to the runner.
pub struct App {
    hub: SessionHub,
    router: KeyRouter,
    _shortcuts: Vec<ShortcutGuard>,
    mode: InputMode,
    pane: Pane,
    workspace_cursor: usize,
    session_cursor: usize,
    filter: TextInputState,
    rename: TextInputState,
    renaming: Option<SessionId>,
    confirm_choice: ConfirmChoice,
    /// Modifiers of the chord holding a quick-switch gesture open
    held: Option<KeyModifiers>,
    recorder: Option<Recorder>,
    should_quit: bool,
}

impl App {
    /// Mount the app on `shortcuts`
    ///
    /// Fails with [`InputError::AlreadyRegistered`] while another surface holds
    /// any of the app's actions on the same registry.
    pub fn new(hub: SessionHub, config: &Config, shortcuts: &ShortcutRegistry) -> Result<Self, InputError> {
        init_theme(config.theme.as_deref());
        let guards = shortcuts.register_all(Action::ALL, "app")?;
        Ok(Self {
            hub,
            router: KeyRouter::new(config.keybindings.clone(), shortcuts.clone()),
            _shortcuts: guards,
            mode: InputMode::Normal,
            pane: Pane::Sessions,
            workspace_cursor: 0,
            session_cursor: 0,
            filter: TextInputState::new(),
            rename: TextInputState::new(),
            renaming: None,
            confirm_choice: ConfirmChoice::default(),
            held: None,
            recorder: None,
            should_quit: false,
        })
    }

    /// Append every user command to `recorder`
    pub fn with_recorder(mut self, recorder: Recorder) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn hub(&self) -> &SessionHub {
        &self.hub
    }

    /// Effects that load the initial workspace list
    pub fn start(&mut self) -> Vec<Effect> {
        self.hub.load_workspaces()
    }

    /// Fire due timers, e.g. after the clock moved without input
    pub fn tick(&mut self) -> Vec<Effect> {
        self.hub.tick();
        self.clamp_cursors();
        self.hub.take_deferred()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn pane(&self) -> Pane {
        self.pane
    }

    /// Effective input mode; hub state takes priority over local editing modes
    pub fn input_mode(&self) -> InputMode {
        if self.hub.confirmation().is_some() {
            InputMode::Confirming
        } else if self.hub.quick_switch_target().is_some() {
            InputMode::QuickSwitching
        } else {
            self.mode
        }
    }

    fn visible(&self, snapshot: &HubSnapshot) -> VisibleRows {
        let filter = self.filter.value();
        let mut pinned = 0;
        let sessions: Vec<SessionRow> = snapshot
            .sessions
            .iter()
            .enumerate()
            .filter(|(_, row)| matches_filter(&row.name, filter))
            .map(|(i, row)| {
                if i < snapshot.pinned_rows {
                    pinned += 1;
                }
                row.clone()
            })
            .collect();
        VisibleRows {
            workspaces: snapshot
                .workspaces
                .iter()
                .filter(|row| matches_filter(&row.name, filter))
                .cloned()
                .collect(),
            sessions,
            pinned,
        }
    }

    fn cursor_item(&self, pane: Pane) -> Option<Uuid> {
        let rows = self.visible(&self.hub.snapshot());
        match pane {
            Pane::Workspaces => rows.workspaces.get(self.workspace_cursor).map(|r| r.id.0),
            Pane::Sessions => rows.sessions.get(self.session_cursor).map(|r| r.id.0),
        }
    }

    fn cursor_session(&self) -> Option<SessionId> {
        self.cursor_item(Pane::Sessions).map(SessionId)
    }

    fn clamp_cursors(&mut self) {
        let rows = self.visible(&self.hub.snapshot());
        self.workspace_cursor = self
            .workspace_cursor
            .min(rows.workspaces.len().saturating_sub(1));
        self.session_cursor = self.session_cursor.min(rows.sessions.len().saturating_sub(1));
    }

    /// Put the session cursor on the active chat
    fn follow_active(&mut self) {
        let rows = self.visible(&self.hub.snapshot());
        if let Some(index) = rows.sessions.iter().position(|r| r.active) {
            self.session_cursor = index;
        }
        if let Some(index) = rows.workspaces.iter().position(|r| r.current) {
            self.workspace_cursor = index;
        }
    }

    fn record(&self, command: impl FnOnce(&Recorder) -> Option<TapeCommand>) {
        if let Some(recorder) = &self.recorder {
            recorder.record(command);
        }
    }

    fn record_named(&self, id: Uuid, command: impl FnOnce(String) -> TapeCommand) {
        self.record(|r| r.named(id).map(command));
    }

    /// Handle one terminal key event
    pub fn handle_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        let mode = self.input_mode();
        let routed = self.router.route(&key, mode, self.held);
        tracing::trace!(?routed, ?mode, "Key routed");

        let mut effects = match routed {
            RoutedKey::Ignored => return Vec::new(),
            RoutedKey::QuickSwitchRelease => {
                self.held = None;
                self.record(|_| Some(TapeCommand::QuickSwitchRelease));
                self.hub.quick_switch_release()
            }
            RoutedKey::Text(c) => {
                match mode {
                    InputMode::Searching => self.filter.insert_char(c),
                    InputMode::Renaming => self.rename.insert_char(c),
                    _ => {}
                }
                Vec::new()
            }
            RoutedKey::Action(action)
                if action.is_quick_switch()
                    && matches!(mode, InputMode::Normal | InputMode::QuickSwitching) =>
            {
                self.quick_switch(action, key.modifiers)
            }
            RoutedKey::Action(action) => match mode {
                InputMode::Confirming => self.handle_dialog(action),
                InputMode::QuickSwitching => self.handle_overlay(action),
                InputMode::Searching => self.handle_search(action),
                InputMode::Renaming => self.handle_rename(action),
                InputMode::Normal => self.handle_list(action),
            },
        };

        if self.hub.quick_switch_target().is_none() {
            self.held = None;
        }
        if mode == InputMode::QuickSwitching && self.input_mode() != InputMode::QuickSwitching {
            self.follow_active();
        }
        self.clamp_cursors();
        effects.extend(self.hub.take_deferred());
        effects
    }

    fn quick_switch(&mut self, action: Action, modifiers: KeyModifiers) -> Vec<Effect> {
        let primary = self.hub.primary_target();
        let (target, reverse) = match action {
            Action::QuickSwitchPrimary => (primary, false),
            Action::QuickSwitchPrimaryReverse => (primary, true),
            Action::QuickSwitchSecondary => (primary.other(), false),
            _ => (primary.other(), true),
        };
        // Shift only picks the direction; releasing it must not end the gesture
        let held = modifiers - KeyModifiers::SHIFT;
        if !held.is_empty() {
            self.held = Some(held);
        }
        self.record(|_| Some(TapeCommand::QuickSwitchPress { target, reverse }));
        self.hub.quick_switch_press(target, reverse);
        Vec::new()
    }

    fn handle_dialog(&mut self, action: Action) -> Vec<Effect> {
        let accept = match action {
            Action::ConfirmYes => true,
            Action::ConfirmNo => false,
            Action::Submit => self.confirm_choice == ConfirmChoice::Yes,
            Action::ConfirmToggle => {
                self.confirm_choice = self.confirm_choice.toggled();
                return Vec::new();
            }
            Action::Quit => {
                self.should_quit = true;
                return Vec::new();
            }
            _ => return Vec::new(),
        };
        self.confirm_choice = ConfirmChoice::default();
        if accept {
            self.record(|_| Some(TapeCommand::Confirm));
            let effects = self.hub.confirm();
            self.follow_active();
            effects
        } else {
            self.record(|_| Some(TapeCommand::CancelConfirmation));
            self.hub.cancel_confirmation();
            Vec::new()
        }
    }

    fn handle_overlay(&mut self, action: Action) -> Vec<Effect> {
        match action {
            Action::Open => {
                self.held = None;
                self.record(|_| Some(TapeCommand::QuickSwitchConfirm));
                self.hub.quick_switch_confirm()
            }
            Action::Cancel => {
                self.held = None;
                self.record(|_| Some(TapeCommand::QuickSwitchCancel));
                self.hub.quick_switch_cancel();
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn handle_search(&mut self, action: Action) -> Vec<Effect> {
        match action {
            Action::Backspace => self.filter.delete_char(),
            Action::Submit => self.mode = InputMode::Normal,
            Action::Cancel => {
                self.filter.clear();
                self.mode = InputMode::Normal;
            }
            _ => {}
        }
        self.clamp_cursors();
        Vec::new()
    }

    fn handle_rename(&mut self, action: Action) -> Vec<Effect> {
        match action {
            Action::Backspace => {
                self.rename.delete_char();
                Vec::new()
            }
            Action::Submit => {
                self.mode = InputMode::Normal;
                let Some(id) = self.renaming.take() else {
                    return Vec::new();
                };
                let name = self.rename.value().to_string();
                self.rename.clear();
                self.record_named(id.0, |session| TapeCommand::Rename {
                    session,
                    name: name.clone(),
                });
                self.hub.rename_session(id, &name)
            }
            Action::Cancel => {
                self.mode = InputMode::Normal;
                self.renaming = None;
                self.rename.clear();
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn move_cursor(&mut self, down: bool) {
        let rows = self.visible(&self.hub.snapshot());
        let (cursor, len) = match self.pane {
            Pane::Workspaces => (&mut self.workspace_cursor, rows.workspaces.len()),
            Pane::Sessions => (&mut self.session_cursor, rows.sessions.len()),
        };
        if len == 0 {
            *cursor = 0;
        } else if down {
            *cursor = (*cursor + 1).min(len - 1);
        } else {
            *cursor = cursor.saturating_sub(1);
        }
    }

    fn handle_list(&mut self, action: Action) -> Vec<Effect> {
        let pane = self.pane;
        match action {
            Action::Quit => {
                self.should_quit = true;
                Vec::new()
            }
            Action::FocusSearch => {
                self.mode = InputMode::Searching;
                Vec::new()
            }
            Action::SwapQuickSwitchTargets => {
                self.record(|_| Some(TapeCommand::SwapTargets));
                self.hub.swap_quick_switch_targets()
            }
            Action::SelectNext | Action::SelectPrev => {
                self.move_cursor(action == Action::SelectNext);
                Vec::new()
            }
            Action::SwitchPane => {
                self.pane = match pane {
                    Pane::Workspaces => Pane::Sessions,
                    Pane::Sessions => Pane::Workspaces,
                };
                Vec::new()
            }
            Action::Open => self.open_cursor(),
            Action::ClearSelection | Action::Cancel => {
                self.filter.clear();
                self.record(|_| Some(TapeCommand::ClearSelection { pane }));
                self.hub.clear_selection(pane);
                Vec::new()
            }
            Action::ToggleSelect => {
                if let Some(id) = self.cursor_item(pane) {
                    self.record_named(id, |item| TapeCommand::ToggleSelection { pane, item });
                    self.hub.toggle_selection(pane, id);
                }
                Vec::new()
            }
            Action::ExtendSelection => {
                self.move_cursor(true);
                if let Some(id) = self.cursor_item(pane) {
                    self.record_named(id, |item| TapeCommand::ShiftSelect { pane, item });
                    self.hub.shift_select(pane, id);
                }
                Vec::new()
            }
            Action::SelectAll => {
                self.record(|_| Some(TapeCommand::SelectAll { pane }));
                self.hub.select_all(pane);
                Vec::new()
            }
            Action::NewSession => {
                self.record(|_| Some(TapeCommand::NewSession));
                self.hub.new_session()
            }
            Action::Archive => self.archive(),
            Action::Undo => {
                self.record(|_| Some(TapeCommand::Undo));
                let effects = self.hub.undo();
                self.follow_active();
                effects
            }
            Action::TogglePin => {
                if self.hub.selection_len(Pane::Sessions) > 0 {
                    self.record(|_| Some(TapeCommand::PinSelected));
                    self.hub.pin_selected_sessions()
                } else if let Some(id) = self.cursor_session() {
                    self.record_named(id.0, |session| TapeCommand::TogglePin { session });
                    self.hub.toggle_pin(id)
                } else {
                    Vec::new()
                }
            }
            Action::AddToSplit => {
                if let Some(id) = self.cursor_session() {
                    self.record_named(id.0, |session| TapeCommand::AddToSplit { session });
                    self.hub.add_to_split(id);
                }
                Vec::new()
            }
            Action::RemoveFromSplit => {
                if let Some(id) = self.cursor_session() {
                    self.record_named(id.0, |session| TapeCommand::RemoveFromSplit { session });
                    self.hub.remove_from_split(id);
                }
                Vec::new()
            }
            Action::CloseSplit => {
                self.record(|_| Some(TapeCommand::CloseSplit));
                self.hub.close_split();
                Vec::new()
            }
            Action::Rename => {
                let rows = self.visible(&self.hub.snapshot());
                if let Some(row) = rows.sessions.get(self.session_cursor) {
                    self.renaming = Some(row.id);
                    self.rename = TextInputState::with_value(&row.name);
                    self.mode = InputMode::Renaming;
                }
                Vec::new()
            }
            Action::ToggleMode => match self.cursor_session() {
                Some(id) => {
                    self.record_named(id.0, |session| TapeCommand::ToggleMode { session });
                    self.hub.toggle_mode(id)
                }
                None => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    fn open_cursor(&mut self) -> Vec<Effect> {
        match self.pane {
            Pane::Workspaces => {
                let Some(id) = self.cursor_item(Pane::Workspaces) else {
                    return Vec::new();
                };
                self.record_named(id, |workspace| TapeCommand::SelectWorkspace { workspace });
                let effects = self.hub.select_workspace(WorkspaceId(id));
                self.pane = Pane::Sessions;
                self.follow_active();
                effects
            }
            Pane::Sessions => {
                if let Some(id) = self.cursor_session() {
                    self.record_named(id.0, |session| TapeCommand::FocusSession { session });
                    self.hub.focus_session(id);
                }
                Vec::new()
            }
        }
    }

    fn archive(&mut self) -> Vec<Effect> {
        let effects = match self.pane {
            Pane::Workspaces if self.hub.selection_len(Pane::Workspaces) > 0 => {
                self.record(|_| Some(TapeCommand::ArchiveSelectedWorkspaces));
                self.hub.archive_selected_workspaces()
            }
            Pane::Workspaces => match self.cursor_item(Pane::Workspaces) {
                Some(id) => {
                    self.record_named(id, |workspace| TapeCommand::ArchiveWorkspace { workspace });
                    self.hub.archive_workspace(WorkspaceId(id))
                }
                None => Vec::new(),
            },
            Pane::Sessions if self.hub.selection_len(Pane::Sessions) > 0 => {
                self.record(|_| Some(TapeCommand::ArchiveSelectedSessions));
                self.hub.archive_selected_sessions()
            }
            Pane::Sessions => match self.cursor_session() {
                Some(id) => {
                    self.record_named(id.0, |session| TapeCommand::ArchiveSession { session });
                    self.hub.archive_session(id)
                }
                None => Vec::new(),
            },
        };
        self.follow_active();
        effects
    }

    /// Feed an effect result back to the hub
    pub fn handle_result(&mut self, result: EffectResult) -> Vec<Effect> {
        let created = match &result {
            EffectResult::SessionCreated { result: Ok(session), .. } => Some(session.id),
            _ => None,
        };
        let mut effects = self.hub.apply_result(result);
        effects.extend(self.hub.take_deferred());
        if let Some(id) = created {
            if let Some(recorder) = self.recorder.as_mut() {
                recorder.created(id);
            }
            self.follow_active();
        }
        self.clamp_cursors();
        effects
    }

    pub fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        frame.render_widget(
            ratatui::widgets::Block::default().style(Style::default().bg(theme::bg_base())),
            area,
        );

        let snapshot = self.hub.snapshot();
        let rows = self.visible(&snapshot);
        let mode = self.input_mode();

        let [main, prompt, footer] = Layout::vertical([
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(area);
        let [workspaces, sessions] =
            Layout::horizontal([Constraint::Percentage(35), Constraint::Percentage(65)]).areas(main);

        frame.render_widget(
            WorkspaceList::new(&rows.workspaces)
                .cursor(Some(self.workspace_cursor).filter(|_| !rows.workspaces.is_empty()))
                .focused(self.pane == Pane::Workspaces),
            workspaces,
        );
        frame.render_widget(
            SessionList::new(&rows.sessions, rows.pinned)
                .cursor(Some(self.session_cursor).filter(|_| !rows.sessions.is_empty()))
                .focused(self.pane == Pane::Sessions),
            sessions,
        );

        self.draw_prompt(frame, prompt, mode);
        GlobalFooter::from_state(self.router.bindings(), mode, snapshot.undo.len())
            .render(footer, frame.buffer_mut());

        frame.render_widget(ToastStack::new(&snapshot.toasts), main);

        if let Some(view) = &snapshot.quick_switch {
            frame.render_widget(QuickSwitchOverlay::new(view), area);
        }
        if let Some(confirmation) = &snapshot.confirmation {
            frame.render_widget(ConfirmationDialog::new(confirmation, self.confirm_choice), area);
        }
    }

    fn draw_prompt(&self, frame: &mut Frame, area: Rect, mode: InputMode) {
        let style = Style::default().fg(theme::text_primary());
        let faint = Style::default().fg(theme::text_faint());
        let buf = frame.buffer_mut();
        match mode {
            InputMode::Renaming => {
                self.rename
                    .render_with_placeholder(area, buf, "Rename: ", style, "New Chat", faint)
            }
            InputMode::Searching => {
                self.filter
                    .render_with_placeholder(area, buf, "/", style, "filter", faint)
            }
            _ if !self.filter.is_empty() => {
                ratatui::widgets::Widget::render(
                    ratatui::widgets::Paragraph::new(format!("/{}", self.filter.value()))
                        .style(faint),
                    area,
                    buf,
                );
            }
            _ => {}
        }
    }

    /// Run the interactive loop until quit
    pub async fn run(mut self, runner: EffectRunner) -> anyhow::Result<()> {
        let (results_tx, mut results_rx) = mpsc::unbounded_channel();
        let (effects_tx, worker) = runner.spawn(results_tx);
        let dispatch = |effects: Vec<Effect>| {
            for effect in effects {
                if effects_tx.send(effect).is_err() {
                    tracing::error!("Effect runner stopped; dropping effect");
                }
            }
        };

        let mut guard = TerminalGuard::enter()?;
        tracing::debug!(
            key_release_events = guard.keyboard_enhancement_enabled(),
            "Terminal ready"
        );
        let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
        terminal.clear()?;
        let mut events = EventStream::new();

        dispatch(self.start());

        let result: anyhow::Result<()> = async {
            loop {
                terminal.draw(|f| self.draw(f))?;

                let wake = self
                    .hub
                    .next_deadline()
                    .map(tokio::time::Instant::from_std)
                    .unwrap_or_else(|| tokio::time::Instant::now() + IDLE_WAKE);

                tokio::select! {
                    maybe_event = events.next() => match maybe_event {
                        Some(Ok(Event::Key(key))) => dispatch(self.handle_key(key)),
                        Some(Ok(_)) => {}
                        Some(Err(e)) => return Err(e.into()),
                        None => break,
                    },
                    Some(result) = results_rx.recv() => dispatch(self.handle_result(result)),
                    _ = tokio::time::sleep_until(wake) => dispatch(self.tick()),
                }

                if self.should_quit {
                    break;
                }
            }
            Ok(())
        }
        .await;

        guard.cleanup()?;
        drop(effects_tx);
        if tokio::time::timeout(SHUTDOWN_GRACE, worker).await.is_err() {
            tracing::warn!("Pending effects did not finish before exit");
        }
        tracing::info!(pending = self.hub.pending_requests(), "Exited");
        result
    }
}
