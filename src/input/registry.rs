//! Process-wide shortcut registry
//!
//! Every surface that listens for keys attaches its actions here and holds the
//! returned guards for as long as it is mounted. Dropping a guard detaches the
//! action, so teardown cannot leak a listener, and attaching an action twice is
//! rejected instead of silently doubling up.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::action::Action;
use crate::error::InputError;

type Owners = Mutex<HashMap<Action, &'static str>>;

#[derive(Debug, Clone, Default)]
pub struct ShortcutRegistry {
    owners: Arc<Owners>,
}

impl ShortcutRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `action` on behalf of `owner`
    pub fn register(&self, action: Action, owner: &'static str) -> Result<ShortcutGuard, InputError> {
        let mut owners = self.owners.lock();
        if let Some(existing) = owners.get(&action) {
            tracing::warn!(?action, owner, existing, "Shortcut already registered");
            return Err(InputError::AlreadyRegistered(action));
        }
        owners.insert(action, owner);
        Ok(ShortcutGuard {
            owners: Arc::downgrade(&self.owners),
            action,
        })
    }

    /// Attach several actions at once. Nothing stays attached if one of them fails.
    pub fn register_all(
        &self,
        actions: &[Action],
        owner: &'static str,
    ) -> Result<Vec<ShortcutGuard>, InputError> {
        actions
            .iter()
            .map(|action| self.register(*action, owner))
            .collect()
    }

    pub fn is_registered(&self, action: Action) -> bool {
        self.owners.lock().contains_key(&action)
    }

    pub fn owner(&self, action: Action) -> Option<&'static str> {
        self.owners.lock().get(&action).copied()
    }

    pub fn len(&self) -> usize {
        self.owners.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.lock().is_empty()
    }
}

/// Keeps one action attached; detaches it on drop
#[derive(Debug)]
#[must_use = "dropping the guard unregisters the shortcut"]
pub struct ShortcutGuard {
    owners: Weak<Owners>,
    action: Action,
}

impl ShortcutGuard {
    pub fn action(&self) -> Action {
        self.action
    }
}

impl Drop for ShortcutGuard {
    fn drop(&mut self) {
        if let Some(owners) = self.owners.upgrade() {
            owners.lock().remove(&self.action);
        }
    }
}
