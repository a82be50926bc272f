//! The single writer over all navigation state
//!
//! [`SessionHub`] owns the workspace list, one registry/open-set/focus triple
//! per workspace, the process-wide undo stack, both selections and both
//! quick-switch controllers. Every entry point reads time from the injected
//! clock, fires whatever timers came due, then applies the event. Backend work
//! is returned as [`Effect`]s; results come back through
//! [`SessionHub::apply_result`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::effect::{Effect, EffectResult};
use super::optimistic::{Compensation, OptimisticLedger, Pending, RequestId};
use super::toast::{Toast, ToastQueue};
use crate::clock::Clock;
use crate::config::NavigationConfig;
use crate::data::{Session, SessionId, SessionMode, Workspace, WorkspaceId};
use crate::error::BackendError;
use crate::quick_switch::{
    build_candidates, QuickSwitchController, QuickSwitchEvent, QuickSwitchSettings,
    QuickSwitchState, SwitchTarget,
};
use crate::selection::SelectionController;
use crate::session::{
    display_order, ActiveSessionPointer, DisplayList, OpenSessionSet, ReassignPolicy,
    SessionRegistry,
};
use crate::undo::{UndoItem, UndoStack};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubSettings {
    pub undo_window: Duration,
    pub quick_switch: QuickSwitchSettings,
    pub reassign_policy: ReassignPolicy,
    pub toast_duration: Duration,
}

impl From<&NavigationConfig> for HubSettings {
    fn from(nav: &NavigationConfig) -> Self {
        Self {
            undo_window: nav.undo_window,
            quick_switch: QuickSwitchSettings {
                hold_delay: nav.hold_delay,
                candidate_limit: nav.candidate_limit,
            },
            reassign_policy: nav.reassign_policy,
            toast_duration: nav.toast_duration,
        }
    }
}

impl Default for HubSettings {
    fn default() -> Self {
        Self::from(&NavigationConfig::default())
    }
}

/// Which list an operation applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pane {
    #[default]
    Workspaces,
    Sessions,
}

/// A blocking question the user must answer before anything else happens
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Confirmation {
    /// Archiving the last open chat archives the whole workspace
    ArchiveWorkspace {
        workspace_id: WorkspaceId,
        name: String,
    },
}

#[derive(Debug)]
struct WorkspaceState {
    registry: SessionRegistry,
    open: OpenSessionSet,
    active: ActiveSessionPointer,
    /// Most recently focused first
    recent: Vec<SessionId>,
    loaded: bool,
    fetch_requested: bool,
}

impl WorkspaceState {
    fn new(workspace_id: WorkspaceId) -> Self {
        Self {
            registry: SessionRegistry::new(workspace_id),
            open: OpenSessionSet::new(),
            active: ActiveSessionPointer::new(),
            recent: Vec::new(),
            loaded: false,
            fetch_requested: false,
        }
    }

    fn focus(&mut self, id: SessionId) {
        self.active.set_active(id);
        self.recent.retain(|s| *s != id);
        self.recent.insert(0, id);
    }

    fn display(&self) -> DisplayList {
        display_order(&self.open, &self.registry)
    }

    /// Remove `id` from the open set and move focus on if it was active
    fn close(&mut self, id: SessionId, policy: ReassignPolicy) -> Option<usize> {
        let index = self.open.remove_from_open(id)?;
        let before = self.active.active();
        let after =
            self.active
                .reassign_after_removal(id, index, self.open.open_ids(), policy);
        if let Some(next) = after.filter(|next| Some(*next) != before) {
            self.recent.retain(|s| *s != next);
            self.recent.insert(0, next);
        }
        self.recent.retain(|s| *s != id);
        Some(index)
    }

    fn has_unseen(&self) -> bool {
        self.registry.iter().any(|s| self.active.has_unseen(s.id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkspaceRow {
    pub id: WorkspaceId,
    pub name: String,
    pub branch: String,
    pub is_remote: bool,
    pub current: bool,
    pub selected: bool,
    pub unseen: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionRow {
    pub id: SessionId,
    pub name: String,
    pub mode: SessionMode,
    pub pinned: bool,
    pub in_split: bool,
    pub active: bool,
    /// Rendered as focused (the active session or any pane of its split)
    pub focused: bool,
    pub unseen: bool,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuickSwitchView {
    pub target: SwitchTarget,
    pub state: QuickSwitchState,
    pub items: Vec<String>,
    pub selected: Option<usize>,
}

/// Everything the list UI renders, in render order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HubSnapshot {
    pub current_workspace: Option<WorkspaceId>,
    pub primary_target: SwitchTarget,
    pub workspaces: Vec<WorkspaceRow>,
    pub sessions: Vec<SessionRow>,
    /// Leading rows of `sessions` that are pinned
    pub pinned_rows: usize,
    pub split: Vec<SessionId>,
    pub undo: Vec<UndoItem>,
    pub quick_switch: Option<QuickSwitchView>,
    pub confirmation: Option<Confirmation>,
    pub toasts: Vec<Toast>,
}

pub struct SessionHub {
    settings: HubSettings,
    clock: Arc<dyn Clock>,
    workspaces: Vec<Workspace>,
    /// Archived locally and still undoable: the record and its former index
    archived: HashMap<WorkspaceId, (Workspace, usize)>,
    states: HashMap<WorkspaceId, WorkspaceState>,
    current: Option<WorkspaceId>,
    /// Most recently selected first
    workspace_recent: Vec<WorkspaceId>,
    undo: UndoStack,
    workspace_selection: SelectionController<WorkspaceId>,
    session_selection: SelectionController<SessionId>,
    workspace_switch: QuickSwitchController<WorkspaceId>,
    session_switch: QuickSwitchController<SessionId>,
    /// List the in-progress gesture cycles through
    gesture: Option<SwitchTarget>,
    primary_target: SwitchTarget,
    confirmation: Option<Confirmation>,
    toasts: ToastQueue,
    ledger: OptimisticLedger,
    /// Effects raised by timers, collected with [`SessionHub::take_deferred`]
    deferred: Vec<Effect>,
}

impl SessionHub {
    pub fn new(settings: HubSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            settings,
            clock,
            workspaces: Vec::new(),
            archived: HashMap::new(),
            states: HashMap::new(),
            current: None,
            workspace_recent: Vec::new(),
            undo: UndoStack::new(settings.undo_window),
            workspace_selection: SelectionController::new(),
            session_selection: SelectionController::new(),
            workspace_switch: QuickSwitchController::new(settings.quick_switch),
            session_switch: QuickSwitchController::new(settings.quick_switch),
            gesture: None,
            primary_target: SwitchTarget::default(),
            confirmation: None,
            toasts: ToastQueue::new(settings.toast_duration),
            ledger: OptimisticLedger::new(),
            deferred: Vec::new(),
        }
    }

    // ========== Accessors ==========

    pub fn settings(&self) -> &HubSettings {
        &self.settings
    }

    pub fn workspaces(&self) -> &[Workspace] {
        &self.workspaces
    }

    pub fn workspace(&self, id: WorkspaceId) -> Option<&Workspace> {
        self.workspaces.iter().find(|w| w.id == id)
    }

    pub fn current_workspace(&self) -> Option<WorkspaceId> {
        self.current
    }

    /// Active session of the current workspace
    pub fn active_session(&self) -> Option<SessionId> {
        self.current_state().and_then(|s| s.active.active())
    }

    pub fn open_sessions(&self) -> &[SessionId] {
        self.current_state()
            .map(|s| s.open.open_ids())
            .unwrap_or_default()
    }

    pub fn split_sessions(&self) -> &[SessionId] {
        self.current_state()
            .map(|s| s.open.split_ids())
            .unwrap_or_default()
    }

    pub fn is_pinned(&self, id: SessionId) -> bool {
        self.current_state().is_some_and(|s| s.open.is_pinned(id))
    }

    /// Open sessions of the current workspace in render order
    pub fn display_sessions(&self) -> Vec<SessionId> {
        self.current_state()
            .map(|s| s.display().to_vec())
            .unwrap_or_default()
    }

    pub fn undo_stack(&self) -> &UndoStack {
        &self.undo
    }

    pub fn confirmation(&self) -> Option<&Confirmation> {
        self.confirmation.as_ref()
    }

    pub fn toasts(&self) -> &ToastQueue {
        &self.toasts
    }

    pub fn primary_target(&self) -> SwitchTarget {
        self.primary_target
    }

    pub fn set_primary_target(&mut self, target: SwitchTarget) {
        self.primary_target = target;
    }

    /// List the in-progress quick-switch gesture is cycling
    pub fn quick_switch_target(&self) -> Option<SwitchTarget> {
        self.gesture
    }

    pub fn is_selected(&self, pane: Pane, id: uuid::Uuid) -> bool {
        match pane {
            Pane::Workspaces => self.workspace_selection.is_selected(WorkspaceId(id)),
            Pane::Sessions => self.session_selection.is_selected(SessionId(id)),
        }
    }

    pub fn selection_len(&self, pane: Pane) -> usize {
        match pane {
            Pane::Workspaces => self.workspace_selection.len(),
            Pane::Sessions => self.session_selection.len(),
        }
    }

    pub fn pending_requests(&self) -> usize {
        self.ledger.len()
    }

    /// Earliest instant at which `tick` has something to do
    pub fn next_deadline(&self) -> Option<Instant> {
        [
            self.workspace_switch.next_deadline(),
            self.session_switch.next_deadline(),
            self.undo.next_deadline(),
            self.toasts.next_deadline(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    fn current_state(&self) -> Option<&WorkspaceState> {
        self.current.and_then(|id| self.states.get(&id))
    }

    fn current_state_mut(&mut self) -> Option<(WorkspaceId, &mut WorkspaceState)> {
        let id = self.current?;
        self.states.get_mut(&id).map(|state| (id, state))
    }

    fn workspace_index(&self, id: WorkspaceId) -> Option<usize> {
        self.workspaces.iter().position(|w| w.id == id)
    }

    fn workspace_ids(&self) -> Vec<WorkspaceId> {
        self.workspaces.iter().map(|w| w.id).collect()
    }

    // ========== Timers ==========

    /// Fire every timer that came due
    pub fn tick(&mut self) {
        let now = self.clock.now();
        if let Some(event) = self.workspace_switch.tick(now) {
            tracing::debug!(?event, "Workspace switcher opened");
        }
        if let Some(event) = self.session_switch.tick(now) {
            tracing::debug!(?event, "Session switcher opened");
        }
        for item in self.undo.poll(now) {
            self.finalize_archive(item);
        }
        self.toasts.poll(now);
    }

    /// Effects that timers raised since the last call
    ///
    /// Drivers collect these after every entry point, next to the effects it
    /// returned.
    pub fn take_deferred(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.deferred)
    }

    /// The undo window for `item` closed
    fn finalize_archive(&mut self, item: UndoItem) {
        match item {
            UndoItem::Workspace { chat_id, .. } => {
                if self.archived.remove(&chat_id).is_some() {
                    self.forget_workspace(chat_id);
                    tracing::info!(workspace_id = %chat_id, "Workspace archive is final");
                }
            }
            UndoItem::SubChat {
                sub_chat_id,
                chat_id,
                ..
            } => {
                let Some(state) = self.states.get(&chat_id) else {
                    return;
                };
                // Reopened during the window, or gone from the backend already
                if state.open.is_open(sub_chat_id) || !state.registry.contains(sub_chat_id) {
                    return;
                }
                let request = self
                    .ledger
                    .begin(Pending::Compensate(Compensation::ReopenSession {
                        workspace_id: chat_id,
                        session_id: sub_chat_id,
                    }));
                self.deferred.push(Effect::ArchiveSession {
                    request,
                    session_id: sub_chat_id,
                });
                tracing::info!(session_id = %sub_chat_id, workspace_id = %chat_id, "Chat archive is final");
            }
        }
    }

    /// Drop a workspace's session state together with its pending undo entries
    fn forget_workspace(&mut self, workspace_id: WorkspaceId) {
        self.states.remove(&workspace_id);
        self.undo.discard_workspace(workspace_id);
    }

    // ========== Loading ==========

    pub fn load_workspaces(&mut self) -> Vec<Effect> {
        self.tick();
        vec![Effect::RefetchWorkspaces]
    }

    pub fn load_sessions(&mut self, workspace_id: WorkspaceId) -> Vec<Effect> {
        self.tick();
        let state = self
            .states
            .entry(workspace_id)
            .or_insert_with(|| WorkspaceState::new(workspace_id));
        state.fetch_requested = true;
        vec![Effect::RefetchSessions(workspace_id)]
    }

    // ========== Workspace navigation ==========

    pub fn select_workspace(&mut self, id: WorkspaceId) -> Vec<Effect> {
        self.tick();
        self.enter_workspace(id)
    }

    fn enter_workspace(&mut self, id: WorkspaceId) -> Vec<Effect> {
        if self.workspace_index(id).is_none() {
            return Vec::new();
        }
        if self.current != Some(id) {
            tracing::debug!(workspace_id = %id, "Workspace selected");
            self.current = Some(id);
            self.session_selection.clear();
            if self.gesture == Some(SwitchTarget::Sessions) {
                self.session_switch.cancel();
                self.gesture = None;
            }
        }
        self.workspace_recent.retain(|w| *w != id);
        self.workspace_recent.insert(0, id);

        let state = self
            .states
            .entry(id)
            .or_insert_with(|| WorkspaceState::new(id));
        if state.loaded || state.fetch_requested {
            return Vec::new();
        }
        state.fetch_requested = true;
        vec![Effect::RefetchSessions(id)]
    }

    /// Move off `removed` after it left the list from slot `index`
    fn leave_workspace(&mut self, removed: WorkspaceId, index: usize) -> Vec<Effect> {
        if self.current != Some(removed) {
            return Vec::new();
        }
        self.current = None;
        self.session_selection.clear();
        let next = self
            .workspace_recent
            .iter()
            .copied()
            .find(|id| *id != removed && self.workspace_index(*id).is_some())
            .or_else(|| {
                self.workspaces
                    .get(index)
                    .or_else(|| index.checked_sub(1).and_then(|i| self.workspaces.get(i)))
                    .map(|w| w.id)
            });
        match next {
            Some(next) => self.enter_workspace(next),
            None => Vec::new(),
        }
    }

    // ========== Session navigation ==========

    /// Open `id` as a tab in the current workspace and focus it
    pub fn open_session(&mut self, id: SessionId) -> bool {
        self.tick();
        let Some((_, state)) = self.current_state_mut() else {
            return false;
        };
        if !state.registry.contains(id) {
            return false;
        }
        state.open.add_to_open(id);
        state.focus(id);
        true
    }

    /// Focus an already open session
    pub fn focus_session(&mut self, id: SessionId) -> bool {
        self.tick();
        self.focus_open(id)
    }

    fn focus_open(&mut self, id: SessionId) -> bool {
        let Some((workspace_id, state)) = self.current_state_mut() else {
            return false;
        };
        if !state.open.is_open(id) {
            return false;
        }
        state.focus(id);
        tracing::debug!(workspace_id = %workspace_id, session_id = %id, "Session focused");
        true
    }

    pub fn new_session(&mut self) -> Vec<Effect> {
        self.tick();
        let Some(workspace_id) = self.current else {
            return Vec::new();
        };
        let request = self.ledger.begin(Pending::CreateSession { workspace_id });
        vec![Effect::CreateSession {
            request,
            workspace_id,
            mode: SessionMode::default(),
        }]
    }

    fn session_created(&mut self, request: RequestId, result: Result<Session, BackendError>) {
        let Some(Pending::CreateSession { workspace_id }) = self.ledger.settle(request) else {
            tracing::warn!(%request, "Unexpected session creation result");
            return;
        };
        let now = self.clock.now();
        match result {
            Ok(session) => {
                let id = session.id;
                let state = self
                    .states
                    .entry(workspace_id)
                    .or_insert_with(|| WorkspaceState::new(workspace_id));
                state.registry.upsert(session);
                state.open.add_to_open(id);
                state.focus(id);
                tracing::info!(workspace_id = %workspace_id, session_id = %id, "Chat created");
            }
            Err(e) => {
                tracing::warn!(workspace_id = %workspace_id, error = %e, "Failed to create chat");
                self.toasts.error(format!("Couldn't create chat: {e}"), now);
            }
        }
    }

    /// Record activity in a session; flags it unless it is visibly focused
    pub fn session_activity(&mut self, workspace_id: WorkspaceId, id: SessionId, at: DateTime<Utc>) {
        self.tick();
        let current = self.current;
        let Some(state) = self.states.get_mut(&workspace_id) else {
            return;
        };
        if !state.registry.touch(id, at) {
            return;
        }
        let visible = current == Some(workspace_id)
            && state.active.is_visibly_focused(id, state.open.split_ids());
        if !visible {
            state.active.mark_unseen(id);
        }
    }

    // ========== Archive ==========

    /// Archive an open chat of the current workspace
    ///
    /// Local only; the chat can be restored with `undo` until the window
    /// closes. Archiving the last open chat asks to archive the workspace.
    pub fn archive_session(&mut self, id: SessionId) -> Vec<Effect> {
        self.tick();
        let Some((workspace_id, state)) = self.current_state_mut() else {
            return Vec::new();
        };
        if !state.open.is_open(id) {
            return Vec::new();
        }
        if state.open.len() == 1 {
            self.ask_archive_workspace(workspace_id);
            return Vec::new();
        }
        if self.close_session(workspace_id, id) {
            let now = self.clock.now();
            self.toasts.info("Chat archived", now);
        }
        Vec::new()
    }

    pub fn archive_selected_sessions(&mut self) -> Vec<Effect> {
        self.tick();
        let Some(workspace_id) = self.current else {
            return Vec::new();
        };
        let Some(state) = self.states.get(&workspace_id) else {
            return Vec::new();
        };
        let open_count = state.open.len();
        let ids = self.session_selection.ordered(state.open.open_ids());
        if ids.is_empty() {
            return Vec::new();
        }
        if ids.len() >= open_count {
            self.ask_archive_workspace(workspace_id);
            return Vec::new();
        }

        let archived = ids
            .into_iter()
            .filter(|id| self.close_session(workspace_id, *id))
            .count();
        self.session_selection.clear();
        let now = self.clock.now();
        self.toasts.info(format!("Archived {archived} chats"), now);
        tracing::info!(workspace_id = %workspace_id, count = archived, "Archived selected chats");
        Vec::new()
    }

    fn close_session(&mut self, workspace_id: WorkspaceId, id: SessionId) -> bool {
        let policy = self.settings.reassign_policy;
        let Some(state) = self.states.get_mut(&workspace_id) else {
            return false;
        };
        let Some(position) = state.close(id, policy) else {
            return false;
        };
        self.session_selection.remove(id);
        self.undo.push(
            UndoItem::SubChat {
                sub_chat_id: id,
                chat_id: workspace_id,
                position,
            },
            self.clock.now(),
        );
        tracing::info!(workspace_id = %workspace_id, session_id = %id, position, "Chat archived");
        true
    }

    fn ask_archive_workspace(&mut self, workspace_id: WorkspaceId) {
        let name = self
            .workspace(workspace_id)
            .map(|w| w.name.clone())
            .unwrap_or_default();
        tracing::debug!(workspace_id = %workspace_id, "Last open chat; confirming workspace archive");
        self.confirmation = Some(Confirmation::ArchiveWorkspace { workspace_id, name });
    }

    /// Archive a workspace optimistically
    pub fn archive_workspace(&mut self, id: WorkspaceId) -> Vec<Effect> {
        self.tick();
        let Some(index) = self.workspace_index(id) else {
            return Vec::new();
        };
        let workspace = self.workspaces.remove(index);
        self.workspace_selection.remove(id);
        self.workspace_recent.retain(|w| *w != id);

        let now = self.clock.now();
        self.undo.push(
            UndoItem::Workspace {
                chat_id: id,
                is_remote: workspace.is_remote,
            },
            now,
        );
        self.toasts
            .info(format!("Archived workspace {}", workspace.name), now);
        tracing::info!(workspace_id = %id, "Archiving workspace");

        self.archived.insert(id, (workspace.clone(), index));
        let request = self
            .ledger
            .begin(Pending::Compensate(Compensation::UnarchiveWorkspace {
                workspace,
                index,
            }));

        let mut effects = vec![Effect::ArchiveWorkspace {
            request,
            workspace_id: id,
        }];
        effects.extend(self.leave_workspace(id, index));
        effects
    }

    /// Archive every selected workspace in one batch
    ///
    /// Nothing changes locally until the backend confirms each id.
    pub fn archive_selected_workspaces(&mut self) -> Vec<Effect> {
        self.tick();
        let ids: Vec<WorkspaceId> = self
            .workspace_selection
            .ordered(&self.workspace_ids())
            .into_iter()
            .filter(|id| !self.ledger.archive_pending(*id))
            .collect();
        if ids.is_empty() {
            return Vec::new();
        }
        self.workspace_selection.clear();
        tracing::info!(count = ids.len(), "Archiving selected workspaces");
        let request = self
            .ledger
            .begin(Pending::BatchArchive { ids: ids.clone() });
        vec![Effect::ArchiveWorkspaces { request, ids }]
    }

    fn batch_archived(
        &mut self,
        request: RequestId,
        results: Vec<(WorkspaceId, Result<(), BackendError>)>,
    ) -> Vec<Effect> {
        let Some(Pending::BatchArchive { ids }) = self.ledger.settle(request) else {
            tracing::warn!(%request, "Unexpected batch archive result");
            return Vec::new();
        };
        let now = self.clock.now();
        let mut effects = Vec::new();
        let mut failed = 0;
        let mut confirmed = 0;

        for (id, result) in results {
            if !ids.contains(&id) {
                continue;
            }
            match result {
                Ok(()) => {
                    confirmed += 1;
                    let Some(index) = self.workspace_index(id) else {
                        continue;
                    };
                    let workspace = self.workspaces.remove(index);
                    self.workspace_recent.retain(|w| *w != id);
                    self.undo.push(
                        UndoItem::Workspace {
                            chat_id: id,
                            is_remote: workspace.is_remote,
                        },
                        now,
                    );
                    self.archived.insert(id, (workspace, index));
                    effects.extend(self.leave_workspace(id, index));
                }
                Err(e) => {
                    failed += 1;
                    tracing::warn!(workspace_id = %id, error = %e, "Batch archive failed for workspace");
                }
            }
        }

        if failed > 0 {
            self.toasts.error(
                format!("Couldn't archive {failed} of {} workspaces", ids.len()),
                now,
            );
        } else if confirmed > 0 {
            self.toasts
                .info(format!("Archived {confirmed} workspaces"), now);
        }
        if confirmed > 0 {
            effects.push(Effect::RefetchWorkspaces);
        }
        effects
    }

    // ========== Confirmation ==========

    /// Accept the pending confirmation
    pub fn confirm(&mut self) -> Vec<Effect> {
        self.tick();
        match self.confirmation.take() {
            Some(Confirmation::ArchiveWorkspace { workspace_id, .. }) => {
                self.session_selection.clear();
                self.archive_workspace(workspace_id)
            }
            None => Vec::new(),
        }
    }

    pub fn cancel_confirmation(&mut self) {
        self.tick();
        if self.confirmation.take().is_some() {
            tracing::debug!("Confirmation cancelled");
        }
    }

    // ========== Undo ==========

    /// Reverse the newest archive still inside its window
    ///
    /// Restores membership and order, never focus.
    pub fn undo(&mut self) -> Vec<Effect> {
        self.tick();
        let Some(item) = self.undo.undo() else {
            tracing::debug!("Nothing to undo");
            return Vec::new();
        };
        tracing::info!(?item, "Undo");

        match item {
            UndoItem::SubChat {
                sub_chat_id,
                chat_id,
                position,
            } => {
                if let Some(state) = self.states.get_mut(&chat_id) {
                    if state.registry.contains(sub_chat_id) {
                        state.open.insert_at(sub_chat_id, position);
                    }
                }
                Vec::new()
            }
            UndoItem::Workspace { chat_id, .. } => {
                let Some((workspace, index)) = self.archived.remove(&chat_id) else {
                    return Vec::new();
                };
                if self.workspace_index(chat_id).is_none() {
                    let index = index.min(self.workspaces.len());
                    self.workspaces.insert(index, workspace);
                }
                self.states
                    .entry(chat_id)
                    .or_insert_with(|| WorkspaceState::new(chat_id));

                let request = self
                    .ledger
                    .begin(Pending::Compensate(Compensation::RearchiveWorkspace {
                        workspace_id: chat_id,
                    }));
                let mut effects = vec![Effect::RestoreWorkspace {
                    request,
                    workspace_id: chat_id,
                }];
                if self.current.is_none() {
                    effects.extend(self.enter_workspace(chat_id));
                }
                effects
            }
        }
    }

    // ========== Pins and split ==========

    pub fn toggle_pin(&mut self, id: SessionId) -> Vec<Effect> {
        self.tick();
        let Some((workspace_id, state)) = self.current_state_mut() else {
            return Vec::new();
        };
        if !state.open.is_open(id) && !state.open.is_pinned(id) {
            return Vec::new();
        }
        state.open.toggle_pin(id);
        vec![Effect::SavePins {
            workspace_id,
            pinned: state.open.pinned_ids().to_vec(),
        }]
    }

    /// Pin every selected chat, or unpin them all if all are pinned already
    pub fn pin_selected_sessions(&mut self) -> Vec<Effect> {
        self.tick();
        let Some(workspace_id) = self.current else {
            return Vec::new();
        };
        let Some(state) = self.states.get_mut(&workspace_id) else {
            return Vec::new();
        };
        let ids = self.session_selection.ordered(state.open.open_ids());
        if ids.is_empty() {
            return Vec::new();
        }
        let pin = ids.iter().any(|id| !state.open.is_pinned(*id));
        let changed = ids
            .iter()
            .filter(|id| state.open.set_pin(**id, pin))
            .count();
        if changed == 0 {
            return Vec::new();
        }
        vec![Effect::SavePins {
            workspace_id,
            pinned: state.open.pinned_ids().to_vec(),
        }]
    }

    /// Show `id` next to the active chat (or add it to the existing split)
    pub fn add_to_split(&mut self, id: SessionId) -> bool {
        self.tick();
        let Some((_, state)) = self.current_state_mut() else {
            return false;
        };
        let Some(anchor) = state.active.active() else {
            return false;
        };
        if !state.registry.contains(id) {
            return false;
        }
        state.open.add_to_open(id);
        state.open.add_to_split(anchor, id)
    }

    pub fn remove_from_split(&mut self, id: SessionId) -> bool {
        self.tick();
        self.current_state_mut()
            .is_some_and(|(_, state)| state.open.remove_from_split(id))
    }

    pub fn close_split(&mut self) {
        self.tick();
        if let Some((_, state)) = self.current_state_mut() {
            state.open.close_split();
        }
    }

    // ========== Optimistic session edits ==========

    pub fn rename_session(&mut self, id: SessionId, name: &str) -> Vec<Effect> {
        self.tick();
        let name = name.trim();
        if name.is_empty() {
            return Vec::new();
        }
        let Some((workspace_id, state)) = self.current_state_mut() else {
            return Vec::new();
        };
        let Some(previous) = state.registry.rename(id, Some(name.to_string())) else {
            return Vec::new();
        };
        if previous.as_deref() == Some(name) {
            return Vec::new();
        }
        let request = self
            .ledger
            .begin(Pending::Compensate(Compensation::RestoreSessionName {
                workspace_id,
                session_id: id,
                previous,
            }));
        vec![Effect::RenameSession {
            request,
            session_id: id,
            name: name.to_string(),
        }]
    }

    pub fn toggle_mode(&mut self, id: SessionId) -> Vec<Effect> {
        self.tick();
        let Some((workspace_id, state)) = self.current_state_mut() else {
            return Vec::new();
        };
        let Some(current) = state.registry.get(id).map(|s| s.mode) else {
            return Vec::new();
        };
        let mode = current.toggled();
        state.registry.set_mode(id, mode);
        let request = self
            .ledger
            .begin(Pending::Compensate(Compensation::RestoreSessionMode {
                workspace_id,
                session_id: id,
                previous: current,
            }));
        vec![Effect::SetSessionMode {
            request,
            session_id: id,
            mode,
        }]
    }

    // ========== Quick switch ==========

    fn workspace_candidates(&self) -> Vec<WorkspaceId> {
        let listed = self.workspace_ids();
        let recent = self
            .workspace_recent
            .iter()
            .copied()
            .filter(|id| listed.contains(id));
        build_candidates(
            self.current,
            recent.chain(listed.iter().copied()).collect::<Vec<_>>(),
            self.settings.quick_switch.candidate_limit,
        )
    }

    fn session_candidates(&self) -> Vec<SessionId> {
        let Some(state) = self.current_state() else {
            return Vec::new();
        };
        let recent = state
            .recent
            .iter()
            .copied()
            .filter(|id| state.open.is_open(*id));
        build_candidates(
            state.active.active(),
            recent.chain(state.display().iter()).collect::<Vec<_>>(),
            self.settings.quick_switch.candidate_limit,
        )
    }

    /// Chord pressed for `target`
    pub fn quick_switch_press(&mut self, target: SwitchTarget, reverse: bool) {
        self.tick();
        if self.gesture.is_some_and(|g| g != target) {
            self.end_gesture_without_commit();
        }
        let now = self.clock.now();
        let armed = match target {
            SwitchTarget::Workspaces => {
                let candidates = self.workspace_candidates();
                !matches!(
                    self.workspace_switch.press(candidates, reverse, now),
                    QuickSwitchEvent::Inert | QuickSwitchEvent::Ignored
                )
            }
            SwitchTarget::Sessions => {
                let candidates = self.session_candidates();
                !matches!(
                    self.session_switch.press(candidates, reverse, now),
                    QuickSwitchEvent::Inert | QuickSwitchEvent::Ignored
                )
            }
        };
        if armed {
            self.gesture = Some(target);
        }
    }

    /// Chord modifier released: commit
    pub fn quick_switch_release(&mut self) -> Vec<Effect> {
        self.tick();
        match self.gesture.take() {
            Some(SwitchTarget::Workspaces) => {
                let live = self.workspace_candidates();
                let event = self.workspace_switch.release(&live);
                self.finish_workspace_gesture(event)
            }
            Some(SwitchTarget::Sessions) => {
                let live = self.session_candidates();
                let event = self.session_switch.release(&live);
                self.finish_session_gesture(event);
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    /// Enter while the overlay is open
    pub fn quick_switch_confirm(&mut self) -> Vec<Effect> {
        self.tick();
        match self.gesture {
            Some(SwitchTarget::Workspaces) if self.workspace_switch.is_open() => {
                self.gesture = None;
                let event = self.workspace_switch.confirm();
                self.finish_workspace_gesture(event)
            }
            Some(SwitchTarget::Sessions) if self.session_switch.is_open() => {
                self.gesture = None;
                let event = self.session_switch.confirm();
                self.finish_session_gesture(event);
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    /// Escape: end the gesture without switching
    pub fn quick_switch_cancel(&mut self) {
        self.tick();
        self.end_gesture_without_commit();
    }

    fn end_gesture_without_commit(&mut self) {
        match self.gesture.take() {
            Some(SwitchTarget::Workspaces) => {
                self.workspace_switch.cancel();
            }
            Some(SwitchTarget::Sessions) => {
                self.session_switch.cancel();
            }
            None => {}
        }
    }

    fn finish_workspace_gesture(&mut self, event: QuickSwitchEvent<WorkspaceId>) -> Vec<Effect> {
        match event {
            QuickSwitchEvent::Committed(id) => {
                tracing::info!(workspace_id = %id, "Quick switch to workspace");
                self.enter_workspace(id)
            }
            _ => Vec::new(),
        }
    }

    fn finish_session_gesture(&mut self, event: QuickSwitchEvent<SessionId>) {
        if let QuickSwitchEvent::Committed(id) = event {
            tracing::info!(session_id = %id, "Quick switch to chat");
            self.focus_open(id);
        }
    }

    pub fn swap_quick_switch_targets(&mut self) -> Vec<Effect> {
        self.tick();
        self.end_gesture_without_commit();
        self.primary_target = self.primary_target.other();
        tracing::info!(primary = self.primary_target.as_str(), "Quick switch targets swapped");
        vec![Effect::SaveQuickSwitchTarget(self.primary_target)]
    }

    // ========== Selection ==========

    fn session_order(&self) -> Vec<SessionId> {
        self.display_sessions()
    }

    /// Returns true if `id` is now selected
    pub fn toggle_selection(&mut self, pane: Pane, id: uuid::Uuid) -> bool {
        self.tick();
        match pane {
            Pane::Workspaces => self.workspace_selection.toggle(WorkspaceId(id)),
            Pane::Sessions => self.session_selection.toggle(SessionId(id)),
        }
    }

    /// Extend the selection to `target`. Returns how many items were added.
    pub fn shift_select(&mut self, pane: Pane, target: uuid::Uuid) -> usize {
        self.tick();
        match pane {
            Pane::Workspaces => {
                let order = self.workspace_ids();
                let anchor = self.workspace_selection.resolve_anchor(self.current, &order);
                self.workspace_selection
                    .select_range(anchor, WorkspaceId(target), &order)
            }
            Pane::Sessions => {
                let order = self.session_order();
                let anchor = self
                    .session_selection
                    .resolve_anchor(self.active_session(), &order);
                self.session_selection
                    .select_range(anchor, SessionId(target), &order)
            }
        }
    }

    pub fn select_all(&mut self, pane: Pane) {
        self.tick();
        match pane {
            Pane::Workspaces => {
                let ids = self.workspace_ids();
                self.workspace_selection.select_all(ids);
            }
            Pane::Sessions => {
                let ids = self.session_order();
                self.session_selection.select_all(ids);
            }
        }
    }

    pub fn clear_selection(&mut self, pane: Pane) {
        self.tick();
        match pane {
            Pane::Workspaces => self.workspace_selection.clear(),
            Pane::Sessions => self.session_selection.clear(),
        }
    }

    // ========== Effect results ==========

    pub fn apply_result(&mut self, result: EffectResult) -> Vec<Effect> {
        self.tick();
        match result {
            EffectResult::WorkspacesLoaded(Ok(workspaces)) => self.workspaces_loaded(workspaces),
            EffectResult::WorkspacesLoaded(Err(e)) => {
                tracing::warn!(error = %e, "Failed to load workspaces");
                let now = self.clock.now();
                self.toasts
                    .error(format!("Couldn't load workspaces: {e}"), now);
                Vec::new()
            }
            EffectResult::SessionsLoaded {
                workspace_id,
                result,
                pins,
            } => {
                self.sessions_loaded(workspace_id, result, pins);
                Vec::new()
            }
            EffectResult::Mutation { request, result } => self.mutation_settled(request, result),
            EffectResult::SessionCreated { request, result } => {
                self.session_created(request, result);
                Vec::new()
            }
            EffectResult::BatchArchived { request, results } => {
                self.batch_archived(request, results)
            }
            EffectResult::PreferenceFailed(message) => {
                tracing::warn!(error = %message, "Failed to save preference");
                let now = self.clock.now();
                self.toasts
                    .error(format!("Couldn't save preference: {message}"), now);
                Vec::new()
            }
        }
    }

    fn workspaces_loaded(&mut self, fetched: Vec<Workspace>) -> Vec<Effect> {
        let mut list: Vec<Workspace> = fetched
            .into_iter()
            .filter(|w| {
                !w.is_archived()
                    && !self.archived.contains_key(&w.id)
                    && !self.ledger.archive_pending(w.id)
            })
            .collect();

        // Keep restores the backend has not confirmed yet
        for (index, workspace) in self.workspaces.iter().enumerate() {
            if self.ledger.restore_pending(workspace.id) && !list.iter().any(|w| w.id == workspace.id) {
                list.insert(index.min(list.len()), workspace.clone());
            }
        }

        self.workspaces = list;
        for workspace in &self.workspaces {
            self.states
                .entry(workspace.id)
                .or_insert_with(|| WorkspaceState::new(workspace.id));
        }
        let listed = self.workspace_ids();
        self.workspace_selection.retain(|id| listed.contains(id));
        self.workspace_recent.retain(|id| listed.contains(id));
        tracing::debug!(count = listed.len(), "Workspaces loaded");

        match self.current {
            Some(current) if listed.contains(&current) => Vec::new(),
            _ => {
                self.current = None;
                match listed.first() {
                    Some(first) => self.enter_workspace(*first),
                    None => Vec::new(),
                }
            }
        }
    }

    fn sessions_loaded(
        &mut self,
        workspace_id: WorkspaceId,
        result: Result<Vec<Session>, BackendError>,
        pins: Vec<SessionId>,
    ) {
        let policy = self.settings.reassign_policy;
        let state = self
            .states
            .entry(workspace_id)
            .or_insert_with(|| WorkspaceState::new(workspace_id));
        state.fetch_requested = false;

        let sessions = match result {
            Ok(sessions) => sessions,
            Err(e) => {
                tracing::warn!(workspace_id = %workspace_id, error = %e, "Failed to load chats");
                let now = self.clock.now();
                self.toasts.error(format!("Couldn't load chats: {e}"), now);
                return;
            }
        };

        state.registry.replace_all(sessions);
        let registry = &state.registry;
        let dropped = self.undo.discard_where(|item| match item {
            UndoItem::SubChat {
                sub_chat_id,
                chat_id,
                ..
            } => *chat_id == workspace_id && !registry.contains(*sub_chat_id),
            UndoItem::Workspace { .. } => false,
        });
        if dropped > 0 {
            tracing::debug!(workspace_id = %workspace_id, dropped, "Dropped undo entries of vanished chats");
        }
        let stale: Vec<SessionId> = state
            .open
            .open_ids()
            .iter()
            .copied()
            .filter(|id| !state.registry.contains(*id))
            .collect();
        for id in stale {
            state.close(id, policy);
            state.active.forget(id);
        }

        if !state.loaded {
            state.loaded = true;
            let by_recency: Vec<SessionId> =
                state.registry.by_recency().iter().map(|s| s.id).collect();
            for id in &by_recency {
                state.open.add_to_open(*id);
            }
            state
                .open
                .set_pinned(pins.into_iter().filter(|id| state.registry.contains(*id)));
            if state.active.active().is_none() {
                if let Some(first) = state.display().iter().next() {
                    state.focus(first);
                }
            }
        }
        tracing::debug!(workspace_id = %workspace_id, count = state.registry.len(), "Chats loaded");
    }

    fn mutation_settled(&mut self, request: RequestId, result: Result<(), BackendError>) -> Vec<Effect> {
        let compensation = match self.ledger.settle(request) {
            Some(Pending::Compensate(compensation)) => compensation,
            Some(other) => {
                tracing::warn!(%request, ?other, "Mutation result for a different request kind");
                return Vec::new();
            }
            None => {
                tracing::debug!(%request, "Result for a request that already settled");
                return Vec::new();
            }
        };

        match result {
            Ok(()) => match compensation {
                Compensation::UnarchiveWorkspace { .. } | Compensation::RearchiveWorkspace { .. } => {
                    vec![Effect::RefetchWorkspaces]
                }
                _ => Vec::new(),
            },
            Err(e) => {
                tracing::warn!(%request, error = %e, operation = compensation.describe(), "Rolling back");
                let now = self.clock.now();
                self.toasts
                    .error(format!("Couldn't {}: {e}", compensation.describe()), now);
                self.compensate(compensation)
            }
        }
    }

    fn compensate(&mut self, compensation: Compensation) -> Vec<Effect> {
        match compensation {
            Compensation::RestoreSessionName {
                workspace_id,
                session_id,
                previous,
            } => {
                if let Some(state) = self.states.get_mut(&workspace_id) {
                    state.registry.rename(session_id, previous);
                }
                Vec::new()
            }
            Compensation::RestoreSessionMode {
                workspace_id,
                session_id,
                previous,
            } => {
                if let Some(state) = self.states.get_mut(&workspace_id) {
                    state.registry.set_mode(session_id, previous);
                }
                Vec::new()
            }
            Compensation::UnarchiveWorkspace { workspace, index } => {
                let id = workspace.id;
                self.archived.remove(&id);
                self.undo.expire(&UndoItem::Workspace {
                    chat_id: id,
                    is_remote: workspace.is_remote,
                });
                if self.workspace_index(id).is_none() {
                    let index = index.min(self.workspaces.len());
                    self.workspaces.insert(index, workspace);
                }
                self.states
                    .entry(id)
                    .or_insert_with(|| WorkspaceState::new(id));
                if self.current.is_none() {
                    return self.enter_workspace(id);
                }
                Vec::new()
            }
            Compensation::RearchiveWorkspace { workspace_id } => {
                let Some(index) = self.workspace_index(workspace_id) else {
                    return Vec::new();
                };
                self.workspaces.remove(index);
                self.workspace_selection.remove(workspace_id);
                self.workspace_recent.retain(|w| *w != workspace_id);
                self.forget_workspace(workspace_id);
                self.leave_workspace(workspace_id, index)
            }
            Compensation::ReopenSession {
                workspace_id,
                session_id,
            } => {
                if let Some(state) = self.states.get_mut(&workspace_id) {
                    if state.registry.contains(session_id) {
                        state.open.add_to_open(session_id);
                    }
                }
                Vec::new()
            }
        }
    }

    // ========== Snapshot ==========

    pub fn snapshot(&self) -> HubSnapshot {
        let workspaces = self
            .workspaces
            .iter()
            .map(|w| WorkspaceRow {
                id: w.id,
                name: w.name.clone(),
                branch: w.branch.clone(),
                is_remote: w.is_remote,
                current: self.current == Some(w.id),
                selected: self.workspace_selection.is_selected(w.id),
                unseen: self.states.get(&w.id).is_some_and(|s| s.has_unseen()),
            })
            .collect();

        let (sessions, pinned_rows, split) = match self.current_state() {
            Some(state) => {
                let display = state.display();
                let rows = display
                    .iter()
                    .map(|id| {
                        let session = state.registry.get(id);
                        SessionRow {
                            id,
                            name: session
                                .map(|s| s.display_name().to_string())
                                .unwrap_or_default(),
                            mode: session.map(|s| s.mode).unwrap_or_default(),
                            pinned: state.open.is_pinned(id),
                            in_split: state.open.in_split(id),
                            active: state.active.active() == Some(id),
                            focused: state.active.is_visibly_focused(id, state.open.split_ids()),
                            unseen: state.active.has_unseen(id),
                            selected: self.session_selection.is_selected(id),
                        }
                    })
                    .collect();
                (rows, display.pinned.len(), state.open.split_ids().to_vec())
            }
            None => (Vec::new(), 0, Vec::new()),
        };

        HubSnapshot {
            current_workspace: self.current,
            primary_target: self.primary_target,
            workspaces,
            sessions,
            pinned_rows,
            split,
            undo: self.undo.entries().iter().map(|e| e.item.clone()).collect(),
            quick_switch: self.quick_switch_view(),
            confirmation: self.confirmation.clone(),
            toasts: self.toasts.iter().cloned().collect(),
        }
    }

    fn quick_switch_view(&self) -> Option<QuickSwitchView> {
        match self.gesture? {
            SwitchTarget::Workspaces => Some(QuickSwitchView {
                target: SwitchTarget::Workspaces,
                state: self.workspace_switch.state(),
                items: self
                    .workspace_switch
                    .snapshot()
                    .iter()
                    .map(|id| {
                        self.workspace(*id)
                            .map(|w| w.name.clone())
                            .unwrap_or_else(|| id.to_string())
                    })
                    .collect(),
                selected: self.workspace_switch.selected_index(),
            }),
            SwitchTarget::Sessions => {
                let state = self.current_state();
                Some(QuickSwitchView {
                    target: SwitchTarget::Sessions,
                    state: self.session_switch.state(),
                    items: self
                        .session_switch
                        .snapshot()
                        .iter()
                        .map(|id| {
                            state
                                .and_then(|s| s.registry.get(*id))
                                .map(|s| s.display_name().to_string())
                                .unwrap_or_else(|| id.to_string())
                        })
                        .collect(),
                    selected: self.session_switch.selected_index(),
                })
            }
        }
    }
}

impl std::fmt::Debug for SessionHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHub")
            .field("workspaces", &self.workspaces.len())
            .field("current", &self.current)
            .field("undo", &self.undo.len())
            .field("pending", &self.ledger.len())
            .finish()
    }
}
