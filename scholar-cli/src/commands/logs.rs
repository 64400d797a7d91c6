//! Logs command - inspect and prune the operation event log

use anyhow::{bail, Result};
use chrono::{Duration, Local, TimeZone, Utc};
use clap::Subcommand;
use colored::Colorize;
use dialoguer::Confirm;

use scholar_core::services::LogEntry;

use super::open_event_log;
use crate::output;

#[derive(Subcommand)]
pub enum LogsCommands {
    /// Show recent events, newest first
    List {
        #[arg(short, long, default_value = "50")]
        limit: usize,
        /// Only refused or failed operations
        #[arg(long)]
        errors: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete events older than a number of days
    Clear {
        #[arg(long, default_value = "30")]
        older_than_days: u32,
        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Event counts and database location
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn event_row(entry: LogEntry) -> Vec<String> {
    let when = Local
        .timestamp_millis_opt(entry.recorded_at)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| entry.recorded_at.to_string());
    let kind = match entry.error_kind {
        Some(kind) => kind.red().to_string(),
        None => String::new(),
    };
    vec![when, entry.event, entry.command.unwrap_or_default(), kind, entry.app_version]
}

pub fn run(command: LogsCommands) -> Result<()> {
    let log = open_event_log()?;

    match command {
        LogsCommands::List { limit, errors, json } => {
            let entries = log.recent(limit, errors)?;

            if json {
                output::json(&entries)?;
                return Ok(());
            }
            if entries.is_empty() {
                println!("No events recorded.");
                return Ok(());
            }

            let mut table = output::create_table();
            table.set_header(vec!["Time", "Event", "Command", "Error", "Version"]);
            for entry in entries {
                table.add_row(event_row(entry));
            }
            println!("{}", table);
        }
        LogsCommands::Clear {
            older_than_days,
            force,
            json,
        } => {
            if !force && !json {
                if !atty::is(atty::Stream::Stdin) {
                    bail!("Refusing to clear events without confirmation; pass --force");
                }
                let confirmed = Confirm::new()
                    .with_prompt(format!("Delete events older than {} days?", older_than_days))
                    .default(false)
                    .interact()?;
                if !confirmed {
                    println!("Cancelled.");
                    return Ok(());
                }
            }

            let cutoff = Utc::now() - Duration::days(i64::from(older_than_days));
            let deleted = log.prune_before(cutoff.timestamp_millis())?;

            if json {
                output::json(&serde_json::json!({ "deleted": deleted }))?;
            } else {
                output::success(&format!("Deleted {} events", deleted));
            }
        }
        LogsCommands::Stats { json } => {
            let (total, errors) = log.counts()?;
            let size = std::fs::metadata(log.db_path()).map(|m| m.len()).unwrap_or(0);

            if json {
                output::json(&serde_json::json!({
                    "total": total,
                    "errors": errors,
                    "path": log.db_path(),
                    "size_bytes": size,
                }))?;
            } else {
                println!("{}", "Event log".bold());
                println!("  Events:   {}", total);
                println!("  Errors:   {}", errors);
                println!("  Database: {}", log.db_path().display());
                println!("  Size:     {}", output::format_size(size));
            }
        }
    }

    Ok(())
}
