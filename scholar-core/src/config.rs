//! Configuration management
//!
//! Settings live in `<data_dir>/settings.json`:
//! ```json
//! {
//!   "storage": { "backend": "json" },
//!   "logging": { "events": true }
//! }
//! ```
//! Keys this crate does not manage are preserved when saving.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::result::{Error, Result};

/// Environment override for `storage.backend`
pub const STORAGE_BACKEND_ENV: &str = "SCHOLAR_STORAGE_BACKEND";

/// Environment override for `logging.events`
pub const EVENT_LOG_ENV: &str = "SCHOLAR_EVENT_LOG";

/// Which `KeyValueStore` adapter backs the record store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// One JSON file per collection
    #[default]
    Json,
    /// `scholar.duckdb`
    DuckDb,
    /// Nothing persisted
    Memory,
}

impl FromStr for StorageBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "duckdb" => Ok(Self::DuckDb),
            "memory" => Ok(Self::Memory),
            other => Err(Error::config(format!("Unknown storage backend: {}", other))),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Json => "json",
            Self::DuckDb => "duckdb",
            Self::Memory => "memory",
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    storage: StorageSettings,
    #[serde(default)]
    logging: LoggingSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StorageSettings {
    #[serde(default)]
    backend: StorageBackend,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoggingSettings {
    #[serde(default = "default_true")]
    events: bool,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            events: true,
            other: HashMap::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Scholar configuration (simplified view of settings)
#[derive(Debug, Clone)]
pub struct Config {
    pub storage_backend: StorageBackend,
    /// Record events in `logs.duckdb`
    pub event_log: bool,
    // Keep the raw settings for preservation when saving
    _raw_settings: SettingsFile,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_backend: StorageBackend::default(),
            event_log: true,
            _raw_settings: SettingsFile::default(),
        }
    }
}

impl Config {
    /// Load config from the data directory, then apply environment overrides
    ///
    /// A missing or malformed settings file yields defaults. An unknown
    /// backend named in the environment is an error.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let raw = Self::read_settings(data_dir)?;

        let storage_backend = match std::env::var(STORAGE_BACKEND_ENV) {
            Ok(value) if !value.trim().is_empty() => value.parse()?,
            _ => raw.storage.backend,
        };

        let event_log = match std::env::var(EVENT_LOG_ENV).ok().as_deref() {
            Some("true" | "1" | "yes" | "TRUE" | "YES") => true,
            Some("false" | "0" | "no" | "FALSE" | "NO") => false,
            _ => raw.logging.events,
        };

        Ok(Self {
            storage_backend,
            event_log,
            _raw_settings: raw,
        })
    }

    /// Save config, preserving settings this crate doesn't manage
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let mut settings = Self::read_settings(data_dir)?;
        settings.storage.backend = self.storage_backend;
        settings.logging.events = self.event_log;

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(data_dir.join("settings.json"), content)?;
        Ok(())
    }

    fn read_settings(data_dir: &Path) -> Result<SettingsFile> {
        let settings_path = data_dir.join("settings.json");
        if !settings_path.exists() {
            return Ok(SettingsFile::default());
        }

        let content = std::fs::read_to_string(&settings_path)?;
        Ok(serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = %settings_path.display(), "Ignoring malformed settings: {}", e);
            SettingsFile::default()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_without_settings_file() {
        let dir = tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.storage_backend, StorageBackend::Json);
        assert!(config.event_log);
    }

    #[test]
    fn test_save_preserves_unmanaged_keys() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("settings.json"),
            r#"{"storage":{"backend":"memory","path":"x"},"theme":"dark"}"#,
        )
        .unwrap();

        let mut config = Config::load(dir.path()).unwrap();
        assert_eq!(config._raw_settings.storage.backend, StorageBackend::Memory);
        config.storage_backend = StorageBackend::DuckDb;
        config.event_log = false;
        config.save(dir.path()).unwrap();

        let saved: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("settings.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(saved["storage"]["backend"], "duckdb");
        assert_eq!(saved["storage"]["path"], "x");
        assert_eq!(saved["logging"]["events"], false);
        assert_eq!(saved["theme"], "dark");
    }

    #[test]
    fn test_malformed_settings_fall_back_to_defaults() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("settings.json"), "{{{").unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert!(config.event_log);
    }

    #[test]
    fn test_backend_names_parse() {
        assert_eq!("DuckDB".parse::<StorageBackend>().unwrap(), StorageBackend::DuckDb);
        assert_eq!(" json ".parse::<StorageBackend>().unwrap(), StorageBackend::Json);
        assert!("sqlite".parse::<StorageBackend>().is_err());
        assert_eq!(StorageBackend::DuckDb.to_string(), "duckdb");
    }
}
