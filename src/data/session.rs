//! Session data access object

use super::models::{Session, SessionId, SessionMode, WorkspaceId};
use super::workspace::{parse_timestamp, parse_uuid};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::Arc;

const SESSION_COLUMNS: &str = "id, workspace_id, name, mode, created_at, updated_at, archived_at";

/// Data access object for sessions (sub-chats)
#[derive(Clone)]
pub struct SessionStore {
    conn: Arc<Mutex<Connection>>,
}

impl SessionStore {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// Insert a new session
    pub fn create(&self, session: &Session) -> SqliteResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO sessions (id, workspace_id, name, mode, created_at, updated_at, archived_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                session.id.to_string(),
                session.workspace_id.to_string(),
                session.name,
                session.mode.as_str(),
                session.created_at.to_rfc3339(),
                session.updated_at.to_rfc3339(),
                session.archived_at.map(|at| at.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    pub fn get_by_id(&self, id: SessionId) -> SqliteResult<Option<Session>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"
        ))?;

        let mut rows = stmt.query(params![id.to_string()])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::row_to_session(row)?))
        } else {
            Ok(None)
        }
    }

    /// Unarchived sessions of a workspace, most recently updated first
    pub fn get_by_workspace(&self, workspace_id: WorkspaceId) -> SqliteResult<Vec<Session>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions
             WHERE workspace_id = ?1 AND archived_at IS NULL ORDER BY updated_at DESC"
        ))?;

        let sessions = stmt
            .query_map(params![workspace_id.to_string()], Self::row_to_session)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(sessions)
    }

    /// Rename a session. Returns false if the session does not exist.
    pub fn rename(&self, id: SessionId, name: &str, at: DateTime<Utc>) -> SqliteResult<bool> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE sessions SET name = ?2, updated_at = ?3 WHERE id = ?1",
            params![id.to_string(), name, at.to_rfc3339()],
        )?;
        Ok(changed > 0)
    }

    /// Change the interaction mode. Returns false if the session does not exist.
    pub fn set_mode(&self, id: SessionId, mode: SessionMode) -> SqliteResult<bool> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE sessions SET mode = ?2 WHERE id = ?1",
            params![id.to_string(), mode.as_str()],
        )?;
        Ok(changed > 0)
    }

    /// Returns false if the session does not exist
    pub fn archive(&self, id: SessionId, at: DateTime<Utc>) -> SqliteResult<bool> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE sessions SET archived_at = ?2 WHERE id = ?1",
            params![id.to_string(), at.to_rfc3339()],
        )?;
        Ok(changed > 0)
    }

    pub fn unarchive(&self, id: SessionId) -> SqliteResult<bool> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE sessions SET archived_at = NULL WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(changed > 0)
    }

    fn row_to_session(row: &rusqlite::Row) -> SqliteResult<Session> {
        let id_str: String = row.get(0)?;
        let workspace_id_str: String = row.get(1)?;
        let mode_str: String = row.get(3)?;
        let created_at_str: String = row.get(4)?;
        let updated_at_str: String = row.get(5)?;
        let archived_at_str: Option<String> = row.get(6)?;

        Ok(Session {
            id: SessionId(parse_uuid(0, &id_str)?),
            workspace_id: WorkspaceId(parse_uuid(1, &workspace_id_str)?),
            name: row.get(2)?,
            mode: mode_str.parse().unwrap_or_default(),
            created_at: parse_timestamp(&created_at_str),
            updated_at: parse_timestamp(&updated_at_str),
            archived_at: archived_at_str.map(|s| parse_timestamp(&s)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Database, Workspace, WorkspaceStore};
    use uuid::Uuid;

    fn setup_db() -> (Database, WorkspaceStore, SessionStore) {
        let db = Database::open_in_memory().unwrap();
        let workspaces = WorkspaceStore::new(db.connection());
        let sessions = SessionStore::new(db.connection());
        (db, workspaces, sessions)
    }

    #[test]
    fn test_create_and_list_by_workspace() {
        let (_db, workspaces, sessions) = setup_db();
        let ws = Workspace::new(Uuid::new_v4(), "main", "main", false, Utc::now());
        workspaces.create(&ws).unwrap();

        let first = Session::new(ws.id, SessionMode::Agent, Utc::now()).with_name("first");
        let second = Session::new(
            ws.id,
            SessionMode::Plan,
            Utc::now() + chrono::Duration::seconds(1),
        );
        sessions.create(&first).unwrap();
        sessions.create(&second).unwrap();

        let listed = sessions.get_by_workspace(ws.id).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[0].mode, SessionMode::Plan);
        assert_eq!(listed[1].name.as_deref(), Some("first"));
    }

    #[test]
    fn test_rename_and_mode() {
        let (_db, workspaces, sessions) = setup_db();
        let ws = Workspace::new(Uuid::new_v4(), "main", "main", false, Utc::now());
        workspaces.create(&ws).unwrap();
        let session = Session::new(ws.id, SessionMode::Agent, Utc::now());
        sessions.create(&session).unwrap();

        assert!(sessions.rename(session.id, "renamed", Utc::now()).unwrap());
        assert!(sessions.set_mode(session.id, SessionMode::Plan).unwrap());

        let stored = sessions.get_by_id(session.id).unwrap().unwrap();
        assert_eq!(stored.name.as_deref(), Some("renamed"));
        assert_eq!(stored.mode, SessionMode::Plan);

        assert!(!sessions.rename(SessionId::new(), "ghost", Utc::now()).unwrap());
    }

    #[test]
    fn test_archived_sessions_are_not_listed() {
        let (_db, workspaces, sessions) = setup_db();
        let ws = Workspace::new(Uuid::new_v4(), "main", "main", false, Utc::now());
        workspaces.create(&ws).unwrap();
        let session = Session::new(ws.id, SessionMode::Agent, Utc::now());
        sessions.create(&session).unwrap();

        assert!(sessions.archive(session.id, Utc::now()).unwrap());
        assert!(sessions.get_by_workspace(ws.id).unwrap().is_empty());
        assert!(sessions.get_by_id(session.id).unwrap().unwrap().is_archived());

        assert!(sessions.unarchive(session.id).unwrap());
        assert_eq!(sessions.get_by_workspace(ws.id).unwrap().len(), 1);
        assert!(!sessions.archive(SessionId::new(), Utc::now()).unwrap());
    }

    #[test]
    fn test_sessions_cascade_with_workspace() {
        let (db, workspaces, sessions) = setup_db();
        let ws = Workspace::new(Uuid::new_v4(), "main", "main", false, Utc::now());
        workspaces.create(&ws).unwrap();
        sessions
            .create(&Session::new(ws.id, SessionMode::Agent, Utc::now()))
            .unwrap();

        db.with_connection(|conn| {
            conn.execute("DELETE FROM workspaces WHERE id = ?1", params![ws.id.to_string()])
        })
        .unwrap();

        assert!(sessions.get_by_workspace(ws.id).unwrap().is_empty());
    }
}
