//! Service layer - business logic orchestration
//!
//! Services coordinate the domain and the record store. The session
//! provider composes the others and is what callers normally hold.

pub mod audit;
pub mod credentials;
pub mod event_log;
pub mod migration;
pub mod self_heal;
pub mod session;

pub use audit::LoginAuditLog;
pub use credentials::{CredentialService, LoginSuccess};
pub use event_log::{EventLog, LogEntry, LogEvent, EVENT_DB_FILENAME};
pub use migration::{MigrationResult, MigrationService};
pub use self_heal::{AdminSelfHeal, HealReport, Promotion, DEFAULT_ADMIN_PASSWORD, SUPER_ADMIN_EMAIL};
pub use session::{ActiveSession, SessionProvider, SessionState};
