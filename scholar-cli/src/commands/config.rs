//! Config command - inspect and change settings.json

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use scholar_core::config::{Config, StorageBackend, EVENT_LOG_ENV, STORAGE_BACKEND_ENV};

use super::get_scholar_dir;
use crate::output;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change stored settings
    Set {
        /// Storage backend: json, duckdb or memory
        #[arg(long)]
        backend: Option<StorageBackend>,
        /// Record events in logs.duckdb
        #[arg(long)]
        events: Option<bool>,
    },
}

pub fn run(command: ConfigCommands) -> Result<()> {
    let scholar_dir = get_scholar_dir()?;

    match command {
        ConfigCommands::Show { json } => {
            let config = Config::load(&scholar_dir)?;
            if json {
                println!(
                    "{}",
                    serde_json::json!({
                        "directory": scholar_dir.to_string_lossy(),
                        "storageBackend": config.storage_backend,
                        "eventLog": config.event_log,
                    })
                );
                return Ok(());
            }

            println!("{}", "Configuration".bold());
            println!("  Directory: {}", scholar_dir.display());
            println!("  Backend:   {}", config.storage_backend);
            println!("  Event log: {}", if config.event_log { "on" } else { "off" });
        }
        ConfigCommands::Set { backend, events } => {
            if backend.is_none() && events.is_none() {
                output::warning("Nothing to change; pass --backend or --events");
                return Ok(());
            }

            std::fs::create_dir_all(&scholar_dir)?;
            let mut config = Config::load(&scholar_dir)?;
            if let Some(backend) = backend {
                config.storage_backend = backend;
            }
            if let Some(events) = events {
                config.event_log = events;
            }
            config.save(&scholar_dir)?;
            output::success("Settings saved");

            for var in [STORAGE_BACKEND_ENV, EVENT_LOG_ENV] {
                if std::env::var(var).is_ok() {
                    output::warning(&format!("{} is set and overrides the stored value", var));
                }
            }
        }
    }

    Ok(())
}
