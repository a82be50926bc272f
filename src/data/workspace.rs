//! Workspace data access object

use super::models::{Workspace, WorkspaceId};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::Arc;
use uuid::Uuid;

const WORKSPACE_COLUMNS: &str =
    "id, project_id, name, branch, is_remote, created_at, updated_at, archived_at";

/// Data access object for Workspace operations
#[derive(Clone)]
pub struct WorkspaceStore {
    conn: Arc<Mutex<Connection>>,
}

impl WorkspaceStore {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// Insert a new workspace
    pub fn create(&self, workspace: &Workspace) -> SqliteResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO workspaces (id, project_id, name, branch, is_remote, created_at, updated_at, archived_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                workspace.id.to_string(),
                workspace.project_id.to_string(),
                workspace.name,
                workspace.branch,
                workspace.is_remote as i32,
                workspace.created_at.to_rfc3339(),
                workspace.updated_at.to_rfc3339(),
                workspace.archived_at.map(|at| at.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    /// Get a workspace by ID (archived or not)
    pub fn get_by_id(&self, id: WorkspaceId) -> SqliteResult<Option<Workspace>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {WORKSPACE_COLUMNS} FROM workspaces WHERE id = ?1"
        ))?;

        let mut rows = stmt.query(params![id.to_string()])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::row_to_workspace(row)?))
        } else {
            Ok(None)
        }
    }

    /// Get all active (non-archived) workspaces, most recently updated first
    pub fn get_all(&self) -> SqliteResult<Vec<Workspace>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {WORKSPACE_COLUMNS} FROM workspaces WHERE archived_at IS NULL ORDER BY updated_at DESC, name"
        ))?;

        let workspaces = stmt
            .query_map([], Self::row_to_workspace)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(workspaces)
    }

    /// Mark a workspace as archived. Returns false if no such workspace exists.
    pub fn archive(&self, id: WorkspaceId, at: DateTime<Utc>) -> SqliteResult<bool> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE workspaces SET archived_at = ?2 WHERE id = ?1",
            params![id.to_string(), at.to_rfc3339()],
        )?;
        Ok(changed > 0)
    }

    /// Clear the archived flag. Returns false if no such workspace exists.
    pub fn unarchive(&self, id: WorkspaceId) -> SqliteResult<bool> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE workspaces SET archived_at = NULL WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(changed > 0)
    }

    /// Bump the recency timestamp
    pub fn touch(&self, id: WorkspaceId, at: DateTime<Utc>) -> SqliteResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE workspaces SET updated_at = ?2 WHERE id = ?1",
            params![id.to_string(), at.to_rfc3339()],
        )?;
        Ok(())
    }

    fn row_to_workspace(row: &rusqlite::Row) -> SqliteResult<Workspace> {
        let id_str: String = row.get(0)?;
        let project_id_str: String = row.get(1)?;
        let is_remote: i32 = row.get(4)?;
        let created_at_str: String = row.get(5)?;
        let updated_at_str: String = row.get(6)?;
        let archived_at_str: Option<String> = row.get(7)?;

        Ok(Workspace {
            id: WorkspaceId(parse_uuid(0, &id_str)?),
            project_id: parse_uuid(1, &project_id_str)?,
            name: row.get(2)?,
            branch: row.get(3)?,
            is_remote: is_remote != 0,
            created_at: parse_timestamp(&created_at_str),
            updated_at: parse_timestamp(&updated_at_str),
            archived_at: archived_at_str.map(|s| parse_timestamp(&s)),
        })
    }
}

pub(crate) fn parse_uuid(column: usize, value: &str) -> SqliteResult<Uuid> {
    Uuid::parse_str(value).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
    })
}

pub(crate) fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Database;

    fn setup_db() -> (Database, WorkspaceStore) {
        let db = Database::open_in_memory().unwrap();
        let store = WorkspaceStore::new(db.connection());
        (db, store)
    }

    #[test]
    fn test_create_and_get() {
        let (_db, store) = setup_db();

        let ws = Workspace::new(Uuid::new_v4(), "bold-fox", "dev/bold-fox", true, Utc::now());
        store.create(&ws).unwrap();

        let retrieved = store.get_by_id(ws.id).unwrap().unwrap();
        assert_eq!(retrieved.name, "bold-fox");
        assert_eq!(retrieved.branch, "dev/bold-fox");
        assert!(retrieved.is_remote);
        assert!(!retrieved.is_archived());
    }

    #[test]
    fn test_archive_hides_from_get_all() {
        let (_db, store) = setup_db();

        let ws = Workspace::new(Uuid::new_v4(), "main", "main", false, Utc::now());
        store.create(&ws).unwrap();

        assert!(store.archive(ws.id, Utc::now()).unwrap());
        assert!(store.get_all().unwrap().is_empty());
        assert!(store.get_by_id(ws.id).unwrap().unwrap().is_archived());

        assert!(store.unarchive(ws.id).unwrap());
        assert_eq!(store.get_all().unwrap().len(), 1);
    }

    #[test]
    fn test_archive_unknown_workspace() {
        let (_db, store) = setup_db();
        assert!(!store.archive(WorkspaceId::new(), Utc::now()).unwrap());
    }

    #[test]
    fn test_get_all_orders_by_recency() {
        let (_db, store) = setup_db();
        let now = Utc::now();

        let older = Workspace::new(Uuid::new_v4(), "older", "a", false, now);
        let newer = Workspace::new(
            Uuid::new_v4(),
            "newer",
            "b",
            false,
            now + chrono::Duration::seconds(5),
        );
        store.create(&older).unwrap();
        store.create(&newer).unwrap();

        let names: Vec<_> = store.get_all().unwrap().into_iter().map(|w| w.name).collect();
        assert_eq!(names, vec!["newer".to_string(), "older".to_string()]);
    }
}
