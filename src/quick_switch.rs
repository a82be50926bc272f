//! Hold-to-preview quick switching
//!
//! The gesture is a small state machine:
//!
//! ```text
//! Idle --press--> Holding --hold delay--> Open --release--> Idle (commit selection)
//!                    |                      |
//!                    +--release--> Idle     +--escape--> Idle (no commit)
//!                       (commit live neighbour, dialog never shown)
//! ```
//!
//! Candidates are frozen when the gesture starts; cycling never looks at live
//! data. Only the quick-tap path reads the live list, since no dialog was
//! ever shown for it.

use std::str::FromStr;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::timer::{TimerId, TimerQueue};

pub const DEFAULT_HOLD_DELAY: Duration = Duration::from_millis(50);
pub const DEFAULT_CANDIDATE_LIMIT: usize = 5;

/// Which list a quick-switch chord cycles through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchTarget {
    #[default]
    Workspaces,
    Sessions,
}

impl SwitchTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwitchTarget::Workspaces => "workspaces",
            SwitchTarget::Sessions => "sessions",
        }
    }

    pub fn other(&self) -> SwitchTarget {
        match self {
            SwitchTarget::Workspaces => SwitchTarget::Sessions,
            SwitchTarget::Sessions => SwitchTarget::Workspaces,
        }
    }
}

impl FromStr for SwitchTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "workspaces" | "workspace" => Ok(SwitchTarget::Workspaces),
            "sessions" | "session" => Ok(SwitchTarget::Sessions),
            other => Err(format!("unknown quick-switch target: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuickSwitchState {
    Idle,
    Holding,
    Open,
}

/// What a controller call did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuickSwitchEvent<T> {
    /// Nothing to switch to; the gesture never started
    Inert,
    /// Holding; the dialog opens when the delay elapses
    Armed,
    Opened { selected: usize },
    Moved { selected: usize },
    /// Switch to this item
    Committed(T),
    Cancelled,
    /// The call does not apply in the current state
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuickSwitchSettings {
    pub hold_delay: Duration,
    pub candidate_limit: usize,
}

impl Default for QuickSwitchSettings {
    fn default() -> Self {
        Self {
            hold_delay: DEFAULT_HOLD_DELAY,
            candidate_limit: DEFAULT_CANDIDATE_LIMIT,
        }
    }
}

/// Active item first, then the rest in the given order, without duplicates
pub fn build_candidates<T: Copy + PartialEq>(
    active: Option<T>,
    ordered: impl IntoIterator<Item = T>,
    limit: usize,
) -> Vec<T> {
    let mut candidates: Vec<T> = active.into_iter().collect();
    for item in ordered {
        if candidates.len() >= limit {
            break;
        }
        if !candidates.contains(&item) {
            candidates.push(item);
        }
    }
    candidates.truncate(limit);
    candidates
}

#[derive(Debug)]
pub struct QuickSwitchController<T> {
    settings: QuickSwitchSettings,
    state: QuickSwitchState,
    snapshot: Vec<T>,
    selected: usize,
    reverse: bool,
    hold_timer: Option<TimerId>,
    timers: TimerQueue<()>,
}

impl<T: Copy + PartialEq> QuickSwitchController<T> {
    pub fn new(settings: QuickSwitchSettings) -> Self {
        Self {
            settings,
            state: QuickSwitchState::Idle,
            snapshot: Vec::new(),
            selected: 0,
            reverse: false,
            hold_timer: None,
            timers: TimerQueue::new(),
        }
    }

    pub fn state(&self) -> QuickSwitchState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == QuickSwitchState::Open
    }

    /// Frozen candidates of the gesture in progress
    pub fn snapshot(&self) -> &[T] {
        &self.snapshot
    }

    /// Highlighted index, only while the dialog is shown
    pub fn selected_index(&self) -> Option<usize> {
        self.is_open().then_some(self.selected)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// Chord pressed
    ///
    /// From `Idle` this freezes `candidates` and arms the hold timer. A repeat
    /// press while holding opens the dialog at once and advances; while open it
    /// advances (or steps back when `reverse`).
    pub fn press(&mut self, candidates: Vec<T>, reverse: bool, now: Instant) -> QuickSwitchEvent<T> {
        match self.state {
            QuickSwitchState::Idle => {
                let mut candidates = candidates;
                candidates.truncate(self.settings.candidate_limit);
                if candidates.is_empty() {
                    return QuickSwitchEvent::Inert;
                }
                self.snapshot = candidates;
                self.reverse = reverse;
                self.selected = 0;
                self.state = QuickSwitchState::Holding;
                self.hold_timer = Some(self.timers.schedule(now + self.settings.hold_delay, ()));
                tracing::debug!(candidates = self.snapshot.len(), reverse, "Quick switch armed");
                QuickSwitchEvent::Armed
            }
            QuickSwitchState::Holding => {
                self.open();
                let selected = self.step(reverse);
                QuickSwitchEvent::Moved { selected }
            }
            QuickSwitchState::Open => {
                let selected = self.step(reverse);
                QuickSwitchEvent::Moved { selected }
            }
        }
    }

    /// Fire the hold timer if it is due
    pub fn tick(&mut self, now: Instant) -> Option<QuickSwitchEvent<T>> {
        let fired = self.timers.take_due(now);
        if fired.is_empty() || self.state != QuickSwitchState::Holding {
            return None;
        }
        self.hold_timer = None;
        let selected = self.open();
        Some(QuickSwitchEvent::Opened { selected })
    }

    /// Modifier released
    ///
    /// Before the dialog opened this is a quick tap: switch to the neighbour of
    /// the active item in `live`. Once open, commit the highlighted item.
    pub fn release(&mut self, live: &[T]) -> QuickSwitchEvent<T> {
        match self.state {
            QuickSwitchState::Idle => QuickSwitchEvent::Ignored,
            QuickSwitchState::Holding => {
                let target = if live.len() < 2 {
                    None
                } else if self.reverse {
                    live.last().copied()
                } else {
                    live.get(1).copied()
                };
                self.reset();
                match target {
                    Some(item) => QuickSwitchEvent::Committed(item),
                    None => QuickSwitchEvent::Cancelled,
                }
            }
            QuickSwitchState::Open => self.commit(),
        }
    }

    /// Commit the highlighted item (Enter)
    pub fn confirm(&mut self) -> QuickSwitchEvent<T> {
        if self.state == QuickSwitchState::Open {
            self.commit()
        } else {
            QuickSwitchEvent::Ignored
        }
    }

    /// Abort without switching (Escape)
    pub fn cancel(&mut self) -> QuickSwitchEvent<T> {
        if self.state == QuickSwitchState::Idle {
            return QuickSwitchEvent::Ignored;
        }
        self.reset();
        QuickSwitchEvent::Cancelled
    }

    fn open(&mut self) -> usize {
        if let Some(timer) = self.hold_timer.take() {
            self.timers.cancel(timer);
        }
        let len = self.snapshot.len();
        self.selected = if len == 1 {
            0
        } else if self.reverse {
            len - 1
        } else {
            1
        };
        self.state = QuickSwitchState::Open;
        tracing::debug!(selected = self.selected, "Quick switch opened");
        self.selected
    }

    fn step(&mut self, reverse: bool) -> usize {
        let len = self.snapshot.len();
        if len > 0 {
            self.selected = if reverse {
                (self.selected + len - 1) % len
            } else {
                (self.selected + 1) % len
            };
        }
        self.selected
    }

    fn commit(&mut self) -> QuickSwitchEvent<T> {
        let item = self.snapshot.get(self.selected).copied();
        self.reset();
        match item {
            Some(item) => QuickSwitchEvent::Committed(item),
            None => QuickSwitchEvent::Cancelled,
        }
    }

    fn reset(&mut self) {
        if let Some(timer) = self.hold_timer.take() {
            self.timers.cancel(timer);
        }
        self.state = QuickSwitchState::Idle;
        self.snapshot.clear();
        self.selected = 0;
        self.reverse = false;
    }

    #[cfg(test)]
    fn pending_timers(&self) -> usize {
        self.timers.len()
    }
}

impl<T: Copy + PartialEq> Default for QuickSwitchController<T> {
    fn default() -> Self {
        Self::new(QuickSwitchSettings::default())
    }
}
