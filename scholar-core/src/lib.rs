//! Scholar Core - accounts, sessions and role authorization
//!
//! This crate follows hexagonal architecture:
//!
//! - **domain**: Users, sessions, login records and the role resolver
//! - **ports**: The `KeyValueStore` persistence trait
//! - **adapters**: JSON file, DuckDB and in-memory stores
//! - **store**: Typed collections over a `KeyValueStore`
//! - **services**: Credentials, audit log, admin self-heal, session provider,
//!   event log

pub mod adapters;
pub mod config;
pub mod domain;
mod log_migrations;
pub mod migrations;
pub mod ports;
pub mod services;
pub mod store;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use adapters::{DuckDbStore, JsonFileStore, MemoryStore};
use config::{Config, StorageBackend};
use ports::KeyValueStore;
use services::{AdminSelfHeal, HealReport, SessionProvider};

// Re-export commonly used types at crate root
pub use domain::result::{Error, OperationResult, Result};
pub use domain::{is_admin, is_teacher, LoginRecord, Registration, Role, SessionUser, User};
pub use services::{EventLog, LogEvent, DEFAULT_ADMIN_PASSWORD, SUPER_ADMIN_EMAIL};
pub use store::RecordStore;

/// Database file used by the DuckDB backend
pub const RECORD_DB_FILENAME: &str = "scholar.duckdb";

/// Main context for Scholar operations
///
/// The composition root: owns the configuration, the record store and the
/// session provider. Nothing runs at construction time; call `init` once
/// before handing the provider to anyone.
pub struct ScholarContext {
    pub config: Config,
    pub data_dir: PathBuf,
    pub store: RecordStore,
    pub sessions: SessionProvider,
    self_heal: AdminSelfHeal,
    heal_report: Option<HealReport>,
}

impl ScholarContext {
    /// Build a context from the settings in `data_dir`
    pub fn new(data_dir: &Path) -> Result<Self> {
        let config = Config::load(data_dir)?;
        let store = Self::open_store(&config, data_dir)?;
        Ok(Self::with_store(config, data_dir, store))
    }

    /// Build a context around an existing store
    pub fn with_store(config: Config, data_dir: &Path, store: RecordStore) -> Self {
        Self {
            config,
            data_dir: data_dir.to_path_buf(),
            sessions: SessionProvider::new(store.clone()),
            self_heal: AdminSelfHeal::new(store.clone()),
            store,
            heal_report: None,
        }
    }

    /// `new` followed by `init`
    pub fn open(data_dir: &Path) -> Result<Self> {
        let mut context = Self::new(data_dir)?;
        context.init()?;
        Ok(context)
    }

    /// Open the `KeyValueStore` adapter named by the configuration
    pub fn open_store(config: &Config, data_dir: &Path) -> Result<RecordStore> {
        let backend: Arc<dyn KeyValueStore> = match config.storage_backend {
            StorageBackend::Json => Arc::new(JsonFileStore::new(data_dir)?),
            StorageBackend::DuckDb => {
                std::fs::create_dir_all(data_dir)?;
                Arc::new(DuckDbStore::new(&data_dir.join(RECORD_DB_FILENAME))?)
            }
            StorageBackend::Memory => Arc::new(MemoryStore::new()),
        };
        tracing::debug!(backend = backend.name(), dir = %data_dir.display(), "Opened record store");
        Ok(RecordStore::new(backend))
    }

    /// Run the admin self-heal, then load the session
    ///
    /// Only the first call does any work; later calls return the first
    /// report.
    pub fn init(&mut self) -> Result<HealReport> {
        if let Some(report) = &self.heal_report {
            return Ok(report.clone());
        }

        let report = self.self_heal.run()?;
        self.sessions.init();
        self.heal_report = Some(report.clone());
        Ok(report)
    }

    pub fn is_initialized(&self) -> bool {
        self.heal_report.is_some()
    }
}
