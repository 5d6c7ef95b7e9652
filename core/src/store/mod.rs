//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database. Engine components call
//! store methods — they never execute SQL directly.

mod config;
mod distribution;
mod partner;
mod rule;
mod sale;

use crate::error::EngineResult;
use chrono::Utc;
use rusqlite::{params, Connection};

pub struct DeskStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
}

impl DeskStore {
    pub fn open(path: &str) -> EngineResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> EngineResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn, path: None })
    }

    /// Reopen a new connection to the same database.
    /// For in-memory databases, this returns a fresh isolated database.
    pub fn reopen(&self) -> EngineResult<Self> {
        match &self.path {
            Some(p) => Self::open(p),
            None => Self::in_memory(),
        }
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> EngineResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_rules.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/003_distribution.sql"))?;
        Ok(())
    }

    // ── Audit log ──────────────────────────────────────────────

    pub(crate) fn append_audit(
        &self,
        entity: &str,
        entity_id: &str,
        field: &str,
        old_value: Option<&str>,
        new_value: &str,
        actor: &str,
    ) -> EngineResult<()> {
        self.conn.execute(
            "INSERT INTO audit_log (entity, entity_id, field, old_value, new_value, actor, changed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                entity,
                entity_id,
                field,
                old_value,
                new_value,
                actor,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Every audit entry for one entity, oldest first.
    pub fn audit_for_entity(&self, entity_id: &str) -> EngineResult<Vec<AuditEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT entity, entity_id, field, old_value, new_value, actor, changed_at
             FROM audit_log WHERE entity_id = ?1 ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map(params![entity_id], |row| {
                Ok(AuditEntry {
                    entity: row.get(0)?,
                    entity_id: row.get(1)?,
                    field: row.get(2)?,
                    old_value: row.get(3)?,
                    new_value: row.get(4)?,
                    actor: row.get(5)?,
                    changed_at: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}

/// One who/when record for a status transition.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub entity: String,
    pub entity_id: String,
    pub field: String,
    pub old_value: Option<String>,
    pub new_value: String,
    pub actor: String,
    pub changed_at: String,
}
