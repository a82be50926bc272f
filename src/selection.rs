//! Multi-select over a list of sessions or workspaces
//!
//! Multi-select mode is not a separate flag: it is on whenever something is
//! selected.

use std::collections::HashSet;
use std::hash::Hash;

#[derive(Debug, Clone)]
pub struct SelectionController<T> {
    selected: HashSet<T>,
}

impl<T: Copy + Eq + Hash> SelectionController<T> {
    pub fn new() -> Self {
        Self {
            selected: HashSet::new(),
        }
    }

    /// Flip one item. Returns true if it is now selected.
    pub fn toggle(&mut self, id: T) -> bool {
        if self.selected.remove(&id) {
            false
        } else {
            self.selected.insert(id);
            true
        }
    }

    /// Anchor for a shift-select
    ///
    /// The active item if it is listed, else the first selected item in list
    /// order. `None` means the target should be selected alone.
    pub fn resolve_anchor(&self, active: Option<T>, order: &[T]) -> Option<T> {
        if let Some(active) = active.filter(|a| order.contains(a)) {
            return Some(active);
        }
        order.iter().copied().find(|id| self.selected.contains(id))
    }

    /// Union the inclusive range between `anchor` and `target` into the selection
    ///
    /// Never narrows an existing selection. If either end is missing from
    /// `order`, only `target` is added. Returns the number of newly selected items.
    pub fn select_range(&mut self, anchor: Option<T>, target: T, order: &[T]) -> usize {
        let Some(target_idx) = order.iter().position(|id| *id == target) else {
            return usize::from(self.selected.insert(target));
        };
        let anchor_idx = anchor
            .and_then(|anchor| order.iter().position(|id| *id == anchor))
            .unwrap_or(target_idx);

        let (lo, hi) = if anchor_idx <= target_idx {
            (anchor_idx, target_idx)
        } else {
            (target_idx, anchor_idx)
        };
        order[lo..=hi]
            .iter()
            .filter(|id| self.selected.insert(**id))
            .count()
    }

    pub fn select_all(&mut self, ids: impl IntoIterator<Item = T>) {
        self.selected.extend(ids);
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Keep only items for which `keep` holds (drop vanished ids after a refetch)
    pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) {
        self.selected.retain(|id| keep(id));
    }

    pub fn remove(&mut self, id: T) -> bool {
        self.selected.remove(&id)
    }

    pub fn is_selected(&self, id: T) -> bool {
        self.selected.contains(&id)
    }

    pub fn is_multi_select(&self) -> bool {
        !self.selected.is_empty()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Selected items in `order`; items not listed are omitted
    pub fn ordered(&self, order: &[T]) -> Vec<T> {
        order
            .iter()
            .copied()
            .filter(|id| self.selected.contains(id))
            .collect()
    }
}

impl<T: Copy + Eq + Hash> Default for SelectionController<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_toggle_enters_and_leaves_multi_select() {
        let mut sel = SelectionController::new();
        assert!(!sel.is_multi_select());
        assert!(sel.toggle(1));
        assert!(sel.is_multi_select());
        assert!(!sel.toggle(1));
        assert!(!sel.is_multi_select());
    }

    #[test]
    fn test_select_range_is_additive() {
        let order = [1, 2, 3, 4, 5, 6];
        let mut sel = SelectionController::new();

        sel.select_range(Some(3), 5, &order);
        assert_eq!(sel.ordered(&order), vec![3, 4, 5]);

        // Same anchor, narrower target: nothing is dropped
        sel.select_range(Some(3), 4, &order);
        assert_eq!(sel.ordered(&order), vec![3, 4, 5]);

        // Backwards from the anchor
        sel.select_range(Some(3), 1, &order);
        assert_eq!(sel.ordered(&order), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_anchor_resolution() {
        let order = [1, 2, 3, 4];
        let mut sel = SelectionController::new();

        assert_eq!(sel.resolve_anchor(Some(2), &order), Some(2));
        // Active item not in this list
        assert_eq!(sel.resolve_anchor(Some(9), &order), None);

        sel.toggle(4);
        sel.toggle(3);
        assert_eq!(sel.resolve_anchor(Some(9), &order), Some(3));
        assert_eq!(sel.resolve_anchor(None, &order), Some(3));
    }

    #[test]
    fn test_range_without_anchor_selects_target_alone() {
        let order = [1, 2, 3];
        let mut sel = SelectionController::new();
        assert_eq!(sel.select_range(None, 2, &order), 1);
        assert_eq!(sel.ordered(&order), vec![2]);

        // Unknown target is still selected
        assert_eq!(sel.select_range(Some(1), 7, &order), 1);
        assert!(sel.is_selected(7));
    }

    #[test]
    fn test_select_all_retain_and_clear() {
        let mut sel = SelectionController::new();
        sel.select_all([1, 2, 3]);
        assert_eq!(sel.len(), 3);

        sel.retain(|id| *id != 2);
        assert!(!sel.is_selected(2));

        sel.clear();
        assert!(sel.is_empty());
    }

    proptest! {
        #[test]
        fn prop_select_range_never_narrows(
            len in 1usize..30,
            anchor in 0usize..30,
            b in 0usize..30,
            c in 0usize..30,
        ) {
            let order: Vec<usize> = (0..len).collect();
            let (anchor, b, c) = (anchor % len, b % len, c % len);

            let mut sel = SelectionController::new();
            sel.select_range(Some(anchor), b, &order);
            let first: HashSet<usize> = sel.ordered(&order).into_iter().collect();
            sel.select_range(Some(anchor), c, &order);
            let second: HashSet<usize> = sel.ordered(&order).into_iter().collect();

            let range = |x: usize, y: usize| (x.min(y)..=x.max(y)).collect::<HashSet<_>>();
            let expected: HashSet<usize> = range(anchor, b).union(&range(anchor, c)).copied().collect();

            prop_assert!(first.is_subset(&second));
            prop_assert_eq!(second, expected);
        }
    }
}
