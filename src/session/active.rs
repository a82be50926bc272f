//! Focus tracking for one workspace's open sessions

use std::collections::HashSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::data::SessionId;

/// How a new active session is picked after the active one is closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReassignPolicy {
    /// The previously focused session if still open, else the neighbour
    #[default]
    PreferPrevious,
    /// The session that slid into the closed one's slot, else the one before it
    PreferNext,
    /// Leave nothing focused
    Clear,
}

impl FromStr for ReassignPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prefer-previous" | "previous" => Ok(ReassignPolicy::PreferPrevious),
            "prefer-next" | "next" => Ok(ReassignPolicy::PreferNext),
            "clear" | "none" => Ok(ReassignPolicy::Clear),
            other => Err(format!("unknown reassign policy: {other}")),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ActiveSessionPointer {
    active: Option<SessionId>,
    previous: Option<SessionId>,
    unseen: HashSet<SessionId>,
}

impl ActiveSessionPointer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<SessionId> {
        self.active
    }

    pub fn previous(&self) -> Option<SessionId> {
        self.previous
    }

    /// Focus `id` and clear its unseen-changes flag
    pub fn set_active(&mut self, id: SessionId) {
        if self.active != Some(id) {
            self.previous = self.active;
        }
        self.active = Some(id);
        self.unseen.remove(&id);
    }

    pub fn clear(&mut self) {
        if self.active.is_some() {
            self.previous = self.active;
        }
        self.active = None;
    }

    /// Flag background activity. The focused session is never flagged.
    pub fn mark_unseen(&mut self, id: SessionId) -> bool {
        if self.active == Some(id) {
            return false;
        }
        self.unseen.insert(id)
    }

    pub fn has_unseen(&self, id: SessionId) -> bool {
        self.unseen.contains(&id)
    }

    /// Forget a session entirely (e.g. its workspace went away)
    pub fn forget(&mut self, id: SessionId) {
        self.unseen.remove(&id);
        if self.previous == Some(id) {
            self.previous = None;
        }
        if self.active == Some(id) {
            self.active = None;
        }
    }

    /// Whether `id` renders as focused
    ///
    /// All panes of a split that contains the active session render focused.
    pub fn is_visibly_focused(&self, id: SessionId, split: &[SessionId]) -> bool {
        let Some(active) = self.active else {
            return false;
        };
        if id == active {
            return true;
        }
        split.len() >= 2 && split.contains(&active) && split.contains(&id)
    }

    /// Pick a new active session after `removed` left the open set
    ///
    /// `removed_index` is where `removed` sat in the open order and `open` is
    /// the order after removal. Does nothing if `removed` was not active.
    pub fn reassign_after_removal(
        &mut self,
        removed: SessionId,
        removed_index: usize,
        open: &[SessionId],
        policy: ReassignPolicy,
    ) -> Option<SessionId> {
        if self.previous == Some(removed) {
            self.previous = None;
        }
        if self.active != Some(removed) {
            return self.active;
        }

        let neighbour = open
            .get(removed_index)
            .or_else(|| removed_index.checked_sub(1).and_then(|i| open.get(i)))
            .or_else(|| open.last())
            .copied();

        let next = match policy {
            ReassignPolicy::PreferPrevious => self
                .previous
                .filter(|prev| open.contains(prev))
                .or(neighbour),
            ReassignPolicy::PreferNext => neighbour,
            ReassignPolicy::Clear => None,
        };

        // The removed session is gone; it must not become `previous`
        self.active = next;
        self.unseen.remove(&removed);
        if let Some(id) = next {
            self.unseen.remove(&id);
        }
        next
    }
}
