//! Sessions currently shown as tabs for one workspace
//!
//! Invariants kept by every mutation:
//! - `open` has no duplicates and keeps insertion order.
//! - `split` is either empty or has at least two members, all of them open.
//! - pin state survives leaving the open set.

use crate::data::SessionId;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenSessionSet {
    open: Vec<SessionId>,
    pinned: Vec<SessionId>,
    split: Vec<SessionId>,
}

impl OpenSessionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `id` if it is not already open. Returns true if it was added.
    pub fn add_to_open(&mut self, id: SessionId) -> bool {
        if self.open.contains(&id) {
            return false;
        }
        self.open.push(id);
        true
    }

    /// Re-open `id` at a previously recorded position (clamped to the current length)
    pub fn insert_at(&mut self, id: SessionId, index: usize) -> bool {
        if self.open.contains(&id) {
            return false;
        }
        let index = index.min(self.open.len());
        self.open.insert(index, id);
        true
    }

    /// Close `id`, returning the index it occupied
    ///
    /// A split that loses a member is normalised the same way as
    /// [`OpenSessionSet::remove_from_split`].
    pub fn remove_from_open(&mut self, id: SessionId) -> Option<usize> {
        let index = self.open.iter().position(|open| *open == id)?;
        self.open.remove(index);
        self.remove_from_split(id);
        Some(index)
    }

    /// Flip the pin flag, returning the new state
    pub fn toggle_pin(&mut self, id: SessionId) -> bool {
        if let Some(pos) = self.pinned.iter().position(|p| *p == id) {
            self.pinned.remove(pos);
            false
        } else {
            self.pinned.push(id);
            true
        }
    }

    /// Force the pin flag to `pinned`. Returns true if anything changed.
    pub fn set_pin(&mut self, id: SessionId, pinned: bool) -> bool {
        if self.is_pinned(id) == pinned {
            return false;
        }
        self.toggle_pin(id);
        true
    }

    /// Replace the pin set (loading persisted state)
    pub fn set_pinned(&mut self, ids: impl IntoIterator<Item = SessionId>) {
        self.pinned.clear();
        for id in ids {
            if !self.pinned.contains(&id) {
                self.pinned.push(id);
            }
        }
    }

    /// Add `id` to the split view
    ///
    /// With no split active, a new split of `[anchor, id]` is created. Both
    /// sessions must be open and distinct; otherwise nothing happens.
    pub fn add_to_split(&mut self, anchor: SessionId, id: SessionId) -> bool {
        if !self.is_open(id) {
            return false;
        }
        if self.split.is_empty() {
            if anchor == id || !self.is_open(anchor) {
                return false;
            }
            self.split = vec![anchor, id];
            return true;
        }
        if self.split.contains(&id) {
            return false;
        }
        self.split.push(id);
        true
    }

    /// Drop `id` from the split. A split left with one member collapses entirely.
    pub fn remove_from_split(&mut self, id: SessionId) -> bool {
        let Some(pos) = self.split.iter().position(|s| *s == id) else {
            return false;
        };
        self.split.remove(pos);
        if self.split.len() < 2 {
            self.split.clear();
        }
        true
    }

    pub fn close_split(&mut self) {
        self.split.clear();
    }

    pub fn is_open(&self, id: SessionId) -> bool {
        self.open.contains(&id)
    }

    pub fn is_pinned(&self, id: SessionId) -> bool {
        self.pinned.contains(&id)
    }

    pub fn in_split(&self, id: SessionId) -> bool {
        self.split.contains(&id)
    }

    pub fn open_ids(&self) -> &[SessionId] {
        &self.open
    }

    pub fn pinned_ids(&self) -> &[SessionId] {
        &self.pinned
    }

    pub fn split_ids(&self) -> &[SessionId] {
        &self.split
    }

    pub fn len(&self) -> usize {
        self.open.len()
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids<const N: usize>() -> [SessionId; N] {
        std::array::from_fn(|_| SessionId::new())
    }

    #[test]
    fn test_add_to_open_is_idempotent() {
        let [a, b] = ids();
        let mut set = OpenSessionSet::new();

        assert!(set.add_to_open(a));
        assert!(set.add_to_open(b));
        let once = set.clone();
        assert!(!set.add_to_open(b));
        assert_eq!(set, once);
        assert_eq!(set.open_ids(), &[a, b]);
    }

    #[test]
    fn test_remove_returns_index_and_insert_at_restores_order() {
        let [a, b, c] = ids();
        let mut set = OpenSessionSet::new();
        for id in [a, b, c] {
            set.add_to_open(id);
        }

        assert_eq!(set.remove_from_open(b), Some(1));
        assert_eq!(set.open_ids(), &[a, c]);
        assert_eq!(set.remove_from_open(b), None);

        assert!(set.insert_at(b, 1));
        assert_eq!(set.open_ids(), &[a, b, c]);
    }

    #[test]
    fn test_insert_at_clamps_to_length() {
        let [a, b] = ids();
        let mut set = OpenSessionSet::new();
        set.add_to_open(a);

        assert!(set.insert_at(b, 10));
        assert_eq!(set.open_ids(), &[a, b]);
    }

    #[test]
    fn test_pin_state_survives_closing() {
        let [a] = ids();
        let mut set = OpenSessionSet::new();
        set.add_to_open(a);

        assert!(set.toggle_pin(a));
        set.remove_from_open(a);
        assert!(set.is_pinned(a));
        assert!(!set.is_open(a));

        assert!(!set.toggle_pin(a));
        assert!(!set.is_pinned(a));
    }

    #[test]
    fn test_split_requires_two_open_members() {
        let [a, b, c] = ids();
        let mut set = OpenSessionSet::new();
        set.add_to_open(a);
        set.add_to_open(b);

        // Anchor and target must differ
        assert!(!set.add_to_split(a, a));
        // Closed sessions cannot join
        assert!(!set.add_to_split(a, c));
        assert!(set.split_ids().is_empty());

        assert!(set.add_to_split(a, b));
        assert_eq!(set.split_ids(), &[a, b]);

        set.add_to_open(c);
        assert!(set.add_to_split(a, c));
        assert_eq!(set.split_ids(), &[a, b, c]);
    }

    #[test]
    fn test_split_of_one_collapses() {
        let [a, b, c] = ids();
        let mut set = OpenSessionSet::new();
        for id in [a, b, c] {
            set.add_to_open(id);
        }
        set.add_to_split(a, b);
        set.add_to_split(a, c);

        assert!(set.remove_from_split(c));
        assert_eq!(set.split_ids(), &[a, b]);

        // Closing a member normalises the split too
        set.remove_from_open(a);
        assert!(set.split_ids().is_empty());
    }

    #[test]
    fn test_set_pinned_dedupes() {
        let [a, b] = ids();
        let mut set = OpenSessionSet::new();
        set.set_pinned([a, b, a]);
        assert_eq!(set.pinned_ids(), &[a, b]);
    }
}
