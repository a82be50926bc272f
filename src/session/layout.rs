//! Rendered ordering of a workspace's open sessions

use serde::Serialize;

use super::open_set::OpenSessionSet;
use super::registry::SessionRegistry;
use crate::data::SessionId;

/// Open sessions in the order the list renders them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DisplayList {
    pub pinned: Vec<SessionId>,
    pub unpinned: Vec<SessionId>,
}

impl DisplayList {
    /// Pinned rows first, then unpinned
    pub fn iter(&self) -> impl Iterator<Item = SessionId> + '_ {
        self.pinned.iter().chain(self.unpinned.iter()).copied()
    }

    pub fn to_vec(&self) -> Vec<SessionId> {
        self.iter().collect()
    }

    pub fn len(&self) -> usize {
        self.pinned.len() + self.unpinned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pinned.is_empty() && self.unpinned.is_empty()
    }

    pub fn position(&self, id: SessionId) -> Option<usize> {
        self.iter().position(|s| s == id)
    }
}

/// Order open sessions for display
///
/// Each partition is sorted by `updated_at` descending. Split members are then
/// lifted out of both partitions and re-inserted as one contiguous run, in
/// split order, into the partition holding the first split member, at the
/// slot of the earliest member already there.
pub fn display_order(open: &OpenSessionSet, registry: &SessionRegistry) -> DisplayList {
    let mut pinned = Vec::new();
    let mut unpinned = Vec::new();
    for id in open.open_ids().iter().copied() {
        if open.is_pinned(id) {
            pinned.push(id);
        } else {
            unpinned.push(id);
        }
    }

    // Unknown sessions (not fetched yet) sort last; sort_by is stable
    let recency = |id: &SessionId| std::cmp::Reverse(registry.updated_at(*id));
    pinned.sort_by_key(recency);
    unpinned.sort_by_key(recency);

    let split = open.split_ids();
    if let Some(first) = split.first() {
        let first_pinned = open.is_pinned(*first);
        let home = if first_pinned {
            &mut pinned
        } else {
            &mut unpinned
        };
        let slot = home
            .iter()
            .position(|id| split.contains(id))
            .unwrap_or(home.len());
        home.retain(|id| !split.contains(id));
        let at = slot.min(home.len());
        home.splice(at..at, split.iter().copied());

        let away = if first_pinned {
            &mut unpinned
        } else {
            &mut pinned
        };
        away.retain(|id| !split.contains(id));
    }

    DisplayList { pinned, unpinned }
}
