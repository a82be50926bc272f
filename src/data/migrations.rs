//! Versioned schema steps
//!
//! Applied steps are recorded in `schema_migrations`; each runs once, in
//! version order, inside its own transaction.

use std::collections::HashSet;

use rusqlite::{params, Connection, Transaction};

pub struct Migration {
    pub version: i64,
    pub name: &'static str,
    pub sql: &'static str,
}

/// Append only; never edit a step that has shipped
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "workspaces",
        sql: r#"
            CREATE TABLE IF NOT EXISTS workspaces (
                id TEXT PRIMARY KEY,
                project_id TEXT NOT NULL,
                name TEXT NOT NULL,
                branch TEXT NOT NULL,
                is_remote INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                archived_at TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_workspaces_active
                ON workspaces(archived_at, updated_at);
        "#,
    },
    Migration {
        version: 2,
        name: "sessions",
        sql: r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                workspace_id TEXT NOT NULL REFERENCES workspaces(id) ON DELETE CASCADE,
                name TEXT,
                mode TEXT NOT NULL DEFAULT 'agent',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_workspace ON sessions(workspace_id);
        "#,
    },
    Migration {
        version: 3,
        name: "app_state",
        sql: r#"
            CREATE TABLE IF NOT EXISTS app_state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
        "#,
    },
    Migration {
        version: 4,
        name: "session_archive",
        sql: "ALTER TABLE sessions ADD COLUMN archived_at TEXT;",
    },
];

fn applied_versions(conn: &Connection) -> rusqlite::Result<HashSet<i64>> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
    )?;
    let mut stmt = conn.prepare("SELECT version FROM schema_migrations")?;
    let versions = stmt.query_map([], |row| row.get(0))?.collect();
    versions
}

fn apply(tx: &Transaction<'_>, migration: &Migration) -> rusqlite::Result<()> {
    tx.execute_batch(migration.sql)?;
    tx.execute(
        "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
        params![
            migration.version,
            migration.name,
            chrono::Utc::now().to_rfc3339()
        ],
    )?;
    Ok(())
}

/// Bring the schema up to the latest version
pub fn run_migrations(conn: &mut Connection) -> rusqlite::Result<()> {
    let applied = applied_versions(conn)?;
    let pending = MIGRATIONS
        .iter()
        .filter(|m| !applied.contains(&m.version));

    for migration in pending {
        tracing::info!(version = migration.version, name = migration.name, "Applying migration");
        let tx = conn.transaction()?;
        if let Err(e) = apply(&tx, migration) {
            tracing::error!(version = migration.version, error = %e, "Migration failed");
            return Err(e);
        }
        tx.commit()?;
    }
    Ok(())
}
