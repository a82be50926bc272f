//! Persisted user preferences
//!
//! The key/value backing store is an external collaborator; [`Preferences`]
//! layers the typed keys this crate cares about on top of it.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::app_state::AppStateStore;
use super::database::DatabaseError;
use super::models::{SessionId, WorkspaceId};
use crate::quick_switch::SwitchTarget;

const PINS_PREFIX: &str = "pins/";
const QUICK_SWITCH_PRIMARY_KEY: &str = "quick_switch/primary_target";

/// Raw key/value preference storage
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, DatabaseError>;
    fn set(&self, key: &str, value: &str) -> Result<(), DatabaseError>;
    fn delete(&self, key: &str) -> Result<(), DatabaseError>;
}

/// Preferences kept in the `app_state` table
#[derive(Clone)]
pub struct SqlitePreferences {
    store: AppStateStore,
}

impl SqlitePreferences {
    pub fn new(store: AppStateStore) -> Self {
        Self { store }
    }
}

impl PreferenceStore for SqlitePreferences {
    fn get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        Ok(self.store.get(key)?)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        Ok(self.store.set(key, value)?)
    }

    fn delete(&self, key: &str) -> Result<(), DatabaseError> {
        Ok(self.store.delete(key)?)
    }
}

/// Process-local preferences (tests, tape replay)
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), DatabaseError> {
        self.values.lock().remove(key);
        Ok(())
    }
}

/// Typed access to the preferences this crate persists
#[derive(Clone)]
pub struct Preferences {
    store: Arc<dyn PreferenceStore>,
}

impl Preferences {
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryPreferences::new()))
    }

    fn pins_key(workspace_id: WorkspaceId) -> String {
        format!("{PINS_PREFIX}{workspace_id}")
    }

    /// Pinned sessions of a workspace, in pin order
    pub fn load_pins(&self, workspace_id: WorkspaceId) -> Result<Vec<SessionId>, DatabaseError> {
        let key = Self::pins_key(workspace_id);
        let Some(raw) = self.store.get(&key)? else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&raw).map_err(|e| DatabaseError::CorruptValue {
            key,
            reason: e.to_string(),
        })
    }

    pub fn save_pins(
        &self,
        workspace_id: WorkspaceId,
        pinned: &[SessionId],
    ) -> Result<(), DatabaseError> {
        let key = Self::pins_key(workspace_id);
        if pinned.is_empty() {
            return self.store.delete(&key);
        }
        let raw = serde_json::to_string(pinned).map_err(|e| DatabaseError::CorruptValue {
            key: key.clone(),
            reason: e.to_string(),
        })?;
        self.store.set(&key, &raw)
    }

    /// Which list the primary quick-switch chord cycles through
    pub fn quick_switch_primary(&self) -> Result<SwitchTarget, DatabaseError> {
        match self.store.get(QUICK_SWITCH_PRIMARY_KEY)? {
            None => Ok(SwitchTarget::default()),
            Some(raw) => raw.parse().map_err(|reason| DatabaseError::CorruptValue {
                key: QUICK_SWITCH_PRIMARY_KEY.to_string(),
                reason,
            }),
        }
    }

    pub fn set_quick_switch_primary(&self, target: SwitchTarget) -> Result<(), DatabaseError> {
        self.store.set(QUICK_SWITCH_PRIMARY_KEY, target.as_str())
    }
}

impl std::fmt::Debug for Preferences {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Preferences").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Database;

    #[test]
    fn test_pins_round_trip_in_sqlite() {
        let db = Database::open_in_memory().unwrap();
        let prefs = Preferences::new(Arc::new(SqlitePreferences::new(AppStateStore::new(
            db.connection(),
        ))));
        let ws = WorkspaceId::new();
        let pins = vec![SessionId::new(), SessionId::new()];

        prefs.save_pins(ws, &pins).unwrap();
        assert_eq!(prefs.load_pins(ws).unwrap(), pins);

        prefs.save_pins(ws, &[]).unwrap();
        assert!(prefs.load_pins(ws).unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_pins_are_reported() {
        let store = Arc::new(MemoryPreferences::new());
        let ws = WorkspaceId::new();
        store.set(&format!("pins/{ws}"), "not json").unwrap();

        let prefs = Preferences::new(store);
        assert!(matches!(
            prefs.load_pins(ws),
            Err(DatabaseError::CorruptValue { .. })
        ));
    }

    #[test]
    fn test_quick_switch_primary_defaults_and_persists() {
        let prefs = Preferences::in_memory();
        assert_eq!(prefs.quick_switch_primary().unwrap(), SwitchTarget::Workspaces);

        prefs.set_quick_switch_primary(SwitchTarget::Sessions).unwrap();
        assert_eq!(prefs.quick_switch_primary().unwrap(), SwitchTarget::Sessions);
    }
}
