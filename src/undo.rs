//! Time-bounded undo log for archive operations
//!
//! Entries are LIFO. Each entry owns exactly one expiry timer; undo and expiry
//! both remove the entry and cancel that timer.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::data::{SessionId, WorkspaceId};
use crate::timer::{TimerId, TimerQueue};

pub const DEFAULT_UNDO_WINDOW: Duration = Duration::from_secs(10);

/// A reversible archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UndoItem {
    Workspace {
        chat_id: WorkspaceId,
        is_remote: bool,
    },
    SubChat {
        sub_chat_id: SessionId,
        chat_id: WorkspaceId,
        /// Index the session held in the open order before archiving
        position: usize,
    },
}

impl UndoItem {
    pub fn workspace_id(&self) -> WorkspaceId {
        match self {
            UndoItem::Workspace { chat_id, .. } | UndoItem::SubChat { chat_id, .. } => *chat_id,
        }
    }

    /// Whether both items reverse the same archive target
    pub fn same_target(&self, other: &UndoItem) -> bool {
        match (self, other) {
            (UndoItem::Workspace { chat_id: a, .. }, UndoItem::Workspace { chat_id: b, .. }) => {
                a == b
            }
            (
                UndoItem::SubChat { sub_chat_id: a, .. },
                UndoItem::SubChat { sub_chat_id: b, .. },
            ) => a == b,
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UndoEntry {
    pub item: UndoItem,
    pub expires_at: Instant,
    timer: TimerId,
}

#[derive(Debug)]
pub struct UndoStack {
    window: Duration,
    entries: Vec<UndoEntry>,
    timers: TimerQueue<UndoItem>,
}

impl UndoStack {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            entries: Vec::new(),
            timers: TimerQueue::new(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Record an archive. An entry for the same target is replaced, along with its timer.
    pub fn push(&mut self, item: UndoItem, now: Instant) {
        if let Some(pos) = self.entries.iter().position(|e| e.item.same_target(&item)) {
            let stale = self.entries.remove(pos);
            self.timers.cancel(stale.timer);
        }

        let expires_at = now + self.window;
        let timer = self.timers.schedule(expires_at, item.clone());
        tracing::debug!(?item, "Undo entry pushed");
        self.entries.push(UndoEntry {
            item,
            expires_at,
            timer,
        });
    }

    /// Pop the newest entry and cancel its timer
    pub fn undo(&mut self) -> Option<UndoItem> {
        let entry = self.entries.pop()?;
        self.timers.cancel(entry.timer);
        Some(entry.item)
    }

    /// End the undo window for `item` early. Returns false if it was not pending.
    pub fn expire(&mut self, item: &UndoItem) -> bool {
        let Some(pos) = self.entries.iter().position(|e| e.item == *item) else {
            return false;
        };
        let entry = self.entries.remove(pos);
        self.timers.cancel(entry.timer);
        true
    }

    /// Fire every timer due at `now`, returning the items whose window closed
    pub fn poll(&mut self, now: Instant) -> Vec<UndoItem> {
        let mut expired = Vec::new();
        for (_, item) in self.timers.take_due(now) {
            // Match by value; the stack may have shifted since scheduling
            if let Some(pos) = self.entries.iter().position(|e| e.item == item) {
                self.entries.remove(pos);
                tracing::debug!(?item, "Undo window closed");
                expired.push(item);
            }
        }
        expired
    }

    /// Drop every entry that belongs to `workspace_id`
    pub fn discard_workspace(&mut self, workspace_id: WorkspaceId) {
        self.discard_where(|item| item.workspace_id() == workspace_id);
    }

    /// Drop the entries matching `pred` without firing them. Returns how many went.
    pub fn discard_where(&mut self, mut pred: impl FnMut(&UndoItem) -> bool) -> usize {
        let timers = &mut self.timers;
        let before = self.entries.len();
        self.entries.retain(|entry| {
            let drop_it = pred(&entry.item);
            if drop_it {
                timers.cancel(entry.timer);
            }
            !drop_it
        });
        before - self.entries.len()
    }

    pub fn peek(&self) -> Option<&UndoItem> {
        self.entries.last().map(|e| &e.item)
    }

    /// Oldest first
    pub fn entries(&self) -> &[UndoEntry] {
        &self.entries
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new(DEFAULT_UNDO_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sub_chat(position: usize) -> UndoItem {
        UndoItem::SubChat {
            sub_chat_id: SessionId::new(),
            chat_id: WorkspaceId::new(),
            position,
        }
    }

    #[test]
    fn test_undo_is_lifo_and_cancels_timer() {
        let now = Instant::now();
        let mut stack = UndoStack::default();
        let first = sub_chat(0);
        let second = sub_chat(1);
        stack.push(first.clone(), now);
        stack.push(second.clone(), now + Duration::from_secs(1));

        assert_eq!(stack.undo(), Some(second));
        assert_eq!(stack.pending_timers(), 1);
        assert_eq!(stack.undo(), Some(first));
        assert_eq!(stack.pending_timers(), 0);
        assert_eq!(stack.undo(), None);
    }

    #[test]
    fn test_expiry_is_final_and_keeps_older_entries() {
        let now = Instant::now();
        let mut stack = UndoStack::default();
        let older = sub_chat(0);
        let newer = sub_chat(1);
        stack.push(older.clone(), now);
        stack.push(newer.clone(), now + Duration::from_secs(5));

        // Only the older entry's window has closed
        let expired = stack.poll(now + Duration::from_secs(10));
        assert_eq!(expired, vec![older]);
        assert_eq!(stack.undo(), Some(newer));
        assert_eq!(stack.undo(), None);
    }

    #[test]
    fn test_expired_newest_never_resurrects() {
        let now = Instant::now();
        let mut stack = UndoStack::default();
        let older = sub_chat(0);
        let newer = sub_chat(1);
        stack.push(older.clone(), now + Duration::from_secs(5));
        stack.push(newer.clone(), now);

        assert_eq!(stack.poll(now + DEFAULT_UNDO_WINDOW), vec![newer]);
        assert_eq!(stack.undo(), Some(older));
    }

    #[test]
    fn test_push_same_target_replaces_entry() {
        let now = Instant::now();
        let mut stack = UndoStack::default();
        let chat_id = WorkspaceId::new();
        let item = UndoItem::Workspace {
            chat_id,
            is_remote: false,
        };
        stack.push(item.clone(), now);
        stack.push(item.clone(), now + Duration::from_secs(4));

        assert_eq!(stack.len(), 1);
        assert_eq!(stack.pending_timers(), 1);
        // The first timer was cancelled, so nothing fires at the original deadline
        assert!(stack.poll(now + DEFAULT_UNDO_WINDOW).is_empty());
        assert_eq!(
            stack.poll(now + DEFAULT_UNDO_WINDOW + Duration::from_secs(4)),
            vec![item]
        );
    }

    #[test]
    fn test_expire_by_value() {
        let now = Instant::now();
        let mut stack = UndoStack::default();
        let a = sub_chat(0);
        let b = sub_chat(1);
        stack.push(a.clone(), now);
        stack.push(b.clone(), now);

        assert!(stack.expire(&a));
        assert!(!stack.expire(&a));
        assert_eq!(stack.pending_timers(), 1);
        assert_eq!(stack.peek(), Some(&b));
    }

    #[test]
    fn test_discard_workspace_cancels_its_entries() {
        let now = Instant::now();
        let mut stack = UndoStack::default();
        let ws = WorkspaceId::new();
        stack.push(
            UndoItem::SubChat {
                sub_chat_id: SessionId::new(),
                chat_id: ws,
                position: 0,
            },
            now,
        );
        let other = sub_chat(0);
        stack.push(other.clone(), now);

        stack.discard_workspace(ws);
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.pending_timers(), 1);
        assert_eq!(stack.peek(), Some(&other));
    }

    #[test]
    fn test_discard_where_reports_count_and_never_fires() {
        let now = Instant::now();
        let mut stack = UndoStack::default();
        let keep = sub_chat(0);
        stack.push(sub_chat(3), now);
        stack.push(keep.clone(), now);
        stack.push(sub_chat(5), now);

        let dropped = stack.discard_where(|item| {
            matches!(item, UndoItem::SubChat { position, .. } if *position > 0)
        });
        assert_eq!(dropped, 2);
        assert_eq!(stack.pending_timers(), 1);
        assert_eq!(stack.poll(now + DEFAULT_UNDO_WINDOW), vec![keep]);
        assert_eq!(stack.discard_where(|_| true), 0);
    }

    #[test]
    fn test_serializes_with_type_tag() {
        let item = UndoItem::Workspace {
            chat_id: WorkspaceId::new(),
            is_remote: true,
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "workspace");
        assert_eq!(json["is_remote"], true);
    }

    proptest! {
        #[test]
        fn prop_undo_returns_pushes_in_reverse(count in 0usize..20) {
            let now = Instant::now();
            let mut stack = UndoStack::default();
            let items: Vec<UndoItem> = (0..count).map(sub_chat).collect();
            for item in &items {
                stack.push(item.clone(), now);
            }

            let mut undone = Vec::new();
            while let Some(item) = stack.undo() {
                undone.push(item);
            }
            undone.reverse();
            prop_assert_eq!(undone, items);
            prop_assert_eq!(stack.pending_timers(), 0);
        }

        #[test]
        fn prop_poll_leaves_only_unexpired_in_order(
            offsets in proptest::collection::vec(0u64..20_000, 0..16),
            poll_at in 0u64..30_000,
        ) {
            let base = Instant::now();
            let mut stack = UndoStack::default();
            let mut pushed = Vec::new();
            for (i, offset) in offsets.iter().enumerate() {
                let item = sub_chat(i);
                stack.push(item.clone(), base + Duration::from_millis(*offset));
                pushed.push((item, *offset));
            }

            let now = base + Duration::from_millis(poll_at);
            stack.poll(now);

            let window = DEFAULT_UNDO_WINDOW.as_millis() as u64;
            let expected: Vec<UndoItem> = pushed
                .into_iter()
                .filter(|(_, offset)| offset + window > poll_at)
                .map(|(item, _)| item)
                .collect();
            let remaining: Vec<UndoItem> = stack.entries().iter().map(|e| e.item.clone()).collect();
            prop_assert_eq!(remaining, expected);
            prop_assert_eq!(stack.pending_timers(), stack.len());
        }
    }
}
