//! Event log - what the CLI did, kept in `logs.duckdb`
//!
//! Each row names an event, the command that produced it and, for refusals
//! and failures, the `Error::kind` tag. Nothing that identifies a person is
//! stored; the login history lives in the record store instead.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Result};
use chrono::Utc;
use duckdb::{params, Connection, Row};
use serde::Serialize;

use crate::domain::result::Error;
use crate::log_migrations::LOG_MIGRATIONS;
use crate::services::MigrationService;

/// File name of the event database inside the data directory
pub const EVENT_DB_FILENAME: &str = "logs.duckdb";

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Millisecond clock in the high bits, a wrapping per-process sequence below
fn next_id(now_ms: i64) -> u64 {
    ((now_ms as u64) << 16) | (SEQUENCE.fetch_add(1, Ordering::Relaxed) & 0xFFFF)
}

/// An event about to be recorded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub event: String,
    pub command: Option<String>,
    pub error_kind: Option<&'static str>,
}

impl LogEvent {
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            command: None,
            error_kind: None,
        }
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Tag the event with the kind of error, never its message
    pub fn with_error(mut self, error: &Error) -> Self {
        self.error_kind = Some(error.kind());
        self
    }

    /// `<command>_succeeded`, `<command>_rejected` or `<command>_failed`
    pub fn outcome<T>(command: &str, result: &crate::domain::result::Result<T>) -> Self {
        match result {
            Ok(_) => Self::new(format!("{}_succeeded", command)).with_command(command),
            Err(e) => {
                let outcome = if e.is_rejection() { "rejected" } else { "failed" };
                Self::new(format!("{}_{}", command, outcome))
                    .with_command(command)
                    .with_error(e)
            }
        }
    }
}

/// A stored event
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub id: u64,
    pub recorded_at: i64,
    pub app_version: String,
    pub event: String,
    pub command: Option<String>,
    pub error_kind: Option<String>,
}

impl LogEntry {
    fn from_row(row: &Row<'_>) -> duckdb::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            recorded_at: row.get(1)?,
            app_version: row.get(2)?,
            event: row.get(3)?,
            command: row.get(4)?,
            error_kind: row.get(5)?,
        })
    }
}

pub struct EventLog {
    conn: Mutex<Connection>,
    db_path: PathBuf,
    app_version: String,
}

impl EventLog {
    /// Open or create `logs.duckdb` in `data_dir` and migrate it
    pub fn open(data_dir: &Path, app_version: impl Into<String>) -> Result<Self> {
        let db_path = data_dir.join(EVENT_DB_FILENAME);
        let conn = Connection::open(&db_path)?;
        MigrationService::with_migrations(&conn, LOG_MIGRATIONS).run_pending()?;

        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
            app_version: app_version.into(),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| anyhow!("Event log lock poisoned: {}", e))
    }

    pub fn record(&self, event: &LogEvent) -> Result<()> {
        let now = Utc::now().timestamp_millis();
        self.conn()?.execute(
            "INSERT INTO sys_events (id, recorded_at, app_version, event, command, error_kind)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                next_id(now),
                now,
                &self.app_version,
                &event.event,
                &event.command,
                event.error_kind,
            ],
        )?;
        Ok(())
    }

    /// Newest first; only refusals and failures when `errors_only`
    pub fn recent(&self, limit: usize, errors_only: bool) -> Result<Vec<LogEntry>> {
        let filter = if errors_only { "WHERE error_kind IS NOT NULL" } else { "" };
        let sql = format!(
            "SELECT id, recorded_at, app_version, event, command, error_kind
             FROM sys_events {} ORDER BY recorded_at DESC, id DESC LIMIT ?",
            filter
        );

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map([limit as i64], LogEntry::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Total rows and rows carrying an error kind
    pub fn counts(&self) -> Result<(u64, u64)> {
        let (total, errors): (i64, i64) = self.conn()?.query_row(
            "SELECT COUNT(*), COUNT(error_kind) FROM sys_events",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok((total as u64, errors as u64))
    }

    /// Drop events recorded before `cutoff_ms`; returns how many went
    pub fn prune_before(&self, cutoff_ms: i64) -> Result<u64> {
        let deleted = self
            .conn()?
            .execute("DELETE FROM sys_events WHERE recorded_at < ?", [cutoff_ms])?;
        Ok(deleted as u64)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}
