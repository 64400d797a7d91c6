//! Event log migrations for `logs.duckdb`
//!
//! Kept apart from the record store migrations: the event log lives in its
//! own database file and can be deleted without touching accounts.

/// Embedded at compile time, applied in order by `EventLog`.
pub const LOG_MIGRATIONS: &[(&str, &str)] = &[
    ("000_migrations.sql", include_str!("000_migrations.sql")),
    ("001_event_log.sql", include_str!("001_event_log.sql")),
];
