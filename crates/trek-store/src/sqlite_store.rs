//! SQLite-backed tracker store.
//!
//! Holds projects, tickets, and agent sessions in `.trek/trek.db` (WAL mode).
//! Reads implement [`TrackerStore`]; the writer helpers belong to the ticket
//! workflow and are never called by the inference or filtering engines.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;
use trek_core::{ProjectSnapshot, SessionSnapshot, TicketSnapshot, TicketStatus};

use crate::error::StoreError;
use crate::TrackerStore;

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS projects (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tickets (
    id TEXT PRIMARY KEY,
    project_id TEXT REFERENCES projects(id),
    title TEXT,
    status TEXT NOT NULL DEFAULT 'backlog'
);
CREATE INDEX IF NOT EXISTS idx_tickets_project ON tickets(project_id);
CREATE INDEX IF NOT EXISTS idx_tickets_status ON tickets(status);

CREATE TABLE IF NOT EXISTS sessions (
    rowid INTEGER PRIMARY KEY,
    id TEXT UNIQUE NOT NULL,
    ticket_id TEXT,
    project_id TEXT,
    started_at TEXT NOT NULL,
    ended_at TEXT
);
CREATE INDEX IF NOT EXISTS idx_sessions_active ON sessions(ended_at) WHERE ended_at IS NULL;

CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
";

const SCHEMA_VERSION: u32 = 1;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open an existing trek.db.
    pub fn open(db_path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(db_path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.apply_pragmas()?;
        Ok(store)
    }

    /// Open or create trek.db with full schema.
    pub fn open_or_create(db_path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.apply_pragmas()?;
        store.apply_schema()?;
        Ok(store)
    }

    /// In-memory store with full schema. Used by tests and previews.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let store = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        };
        store.apply_schema()?;
        Ok(store)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A panic while holding the guard cannot leave a connection half-written
        // (every write is a single statement), so a poisoned lock is still usable.
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply_pragmas(&self) -> Result<(), StoreError> {
        self.conn().execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;
        Ok(())
    }

    fn apply_schema(&self) -> Result<(), StoreError> {
        let conn = self.conn();
        conn.execute_batch(SCHEMA_SQL)?;
        conn.execute(
            "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('version', ?1)",
            params![SCHEMA_VERSION.to_string()],
        )?;
        debug!(version = SCHEMA_VERSION, "tracker schema applied");
        Ok(())
    }

    // ── Writers ─────────────────────────────────────────────────────

    pub fn insert_project(&self, id: &str, name: &str) -> Result<(), StoreError> {
        self.conn().execute(
            "INSERT INTO projects (id, name) VALUES (?1, ?2)",
            params![id, name],
        )?;
        Ok(())
    }

    pub fn insert_ticket(
        &self,
        id: &str,
        project_id: Option<&str>,
        title: Option<&str>,
        status: TicketStatus,
    ) -> Result<(), StoreError> {
        self.conn().execute(
            "INSERT INTO tickets (id, project_id, title, status) VALUES (?1, ?2, ?3, ?4)",
            params![id, project_id, title, status.as_str()],
        )?;
        Ok(())
    }

    /// Overwrite a ticket's status. Transition validity is the workflow's concern.
    pub fn set_ticket_status(&self, id: &str, status: TicketStatus) -> Result<(), StoreError> {
        self.conn().execute(
            "UPDATE tickets SET status = ?2 WHERE id = ?1",
            params![id, status.as_str()],
        )?;
        Ok(())
    }

    /// Record a new active session, stamped with the current time.
    pub fn start_session(
        &self,
        id: &str,
        ticket_id: Option<&str>,
        project_id: Option<&str>,
    ) -> Result<(), StoreError> {
        self.conn().execute(
            "INSERT INTO sessions (id, ticket_id, project_id, started_at) VALUES (?1, ?2, ?3, ?4)",
            params![id, ticket_id, project_id, now_rfc3339()],
        )?;
        Ok(())
    }

    pub fn end_session(&self, id: &str) -> Result<(), StoreError> {
        self.conn().execute(
            "UPDATE sessions SET ended_at = ?2 WHERE id = ?1 AND ended_at IS NULL",
            params![id, now_rfc3339()],
        )?;
        Ok(())
    }
}

impl TrackerStore for SqliteStore {
    fn get_ticket(&self, id: &str) -> Result<Option<TicketSnapshot>, StoreError> {
        let row: Option<(String, Option<String>, Option<String>, String)> = self
            .conn()
            .query_row(
                "SELECT t.id, p.id, t.title, t.status
                 FROM tickets t LEFT JOIN projects p ON p.id = t.project_id
                 WHERE t.id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?;

        let Some((id, project_id, title, status)) = row else {
            return Ok(None);
        };
        let status: TicketStatus = status.parse().map_err(|e: trek_core::ParseError| {
            StoreError::Malformed {
                table: "tickets",
                id: id.clone(),
                reason: e.to_string(),
            }
        })?;
        Ok(Some(TicketSnapshot {
            id,
            status,
            project_id,
            title,
        }))
    }

    fn get_active_session(&self, id: &str) -> Result<Option<SessionSnapshot>, StoreError> {
        let session = self
            .conn()
            .query_row(
                "SELECT id, ticket_id, project_id, started_at, ended_at
                 FROM sessions WHERE id = ?1 AND ended_at IS NULL",
                params![id],
                map_session_row,
            )
            .optional()?;
        Ok(session)
    }

    fn list_active_sessions(&self) -> Result<Vec<SessionSnapshot>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, ticket_id, project_id, started_at, ended_at
             FROM sessions WHERE ended_at IS NULL ORDER BY rowid",
        )?;
        let sessions = stmt
            .query_map([], map_session_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sessions)
    }

    fn get_project(&self, id: &str) -> Result<Option<ProjectSnapshot>, StoreError> {
        let project = self
            .conn()
            .query_row(
                "SELECT id, name FROM projects WHERE id = ?1",
                params![id],
                |row| {
                    Ok(ProjectSnapshot {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(project)
    }
}

impl Drop for SqliteStore {
    fn drop(&mut self) {
        // Merge WAL back into main DB so users see a single file when idle.
        let _ = self
            .conn()
            .execute_batch("PRAGMA wal_checkpoint(TRUNCATE);");
    }
}

fn map_session_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SessionSnapshot> {
    Ok(SessionSnapshot {
        id: row.get(0)?,
        ticket_id: row.get(1)?,
        project_id: row.get(2)?,
        started_at: row.get(3)?,
        ended_at: row.get(4)?,
    })
}

fn now_rfc3339() -> String {
    let now = time::OffsetDateTime::now_utc();
    now.format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| now.unix_timestamp().to_string())
}
