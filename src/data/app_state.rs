//! Key/value rows in the `app_state` table

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppStateStore {
    conn: Arc<Mutex<Connection>>,
}

impl AppStateStore {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// Insert or overwrite `key`
    pub fn set(&self, key: &str, value: &str) -> SqliteResult<()> {
        self.conn.lock().execute(
            "INSERT INTO app_state (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> SqliteResult<Option<String>> {
        self.conn
            .lock()
            .query_row(
                "SELECT value FROM app_state WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
    }

    pub fn delete(&self, key: &str) -> SqliteResult<()> {
        self.conn
            .lock()
            .execute("DELETE FROM app_state WHERE key = ?1", params![key])?;
        Ok(())
    }
}
