//! CLI command implementations

pub mod account;
pub mod admin;
pub mod config;
pub mod logs;
pub mod session;

use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use dialoguer::Password;
use regex::Regex;
use serde::Serialize;

use scholar_core::config::Config;
use scholar_core::{EventLog, LogEvent, OperationResult, ScholarContext};

use crate::output;

/// Password environment fallback for non-interactive use
pub const PASSWORD_ENV: &str = "SCHOLAR_PASSWORD";

/// Open the event log at the data directory
pub fn open_event_log() -> Result<EventLog> {
    let scholar_dir = get_scholar_dir()?;
    std::fs::create_dir_all(&scholar_dir)?;
    EventLog::open(&scholar_dir, env!("CARGO_PKG_VERSION"))
}

/// Event log for operations, None when disabled or unavailable
pub fn get_logger(config: &Config) -> Option<EventLog> {
    if !config.event_log {
        return None;
    }
    match open_event_log() {
        Ok(log) => Some(log),
        Err(e) => {
            tracing::warn!(error = %e, "Event log unavailable");
            None
        }
    }
}

/// Record an event; a failed write never fails the command
pub fn log_event(logger: &Option<EventLog>, event: LogEvent) {
    if let Some(log) = logger {
        if let Err(e) = log.record(&event) {
            tracing::warn!(error = %e, event = %event.event, "Event not recorded");
        }
    }
}

/// Get the scholar directory from environment or default
pub fn get_scholar_dir() -> Result<PathBuf> {
    if let Ok(dir) = env::var("SCHOLAR_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".scholar"))
        .ok_or_else(|| anyhow!("Could not find home directory; set SCHOLAR_DIR"))
}

/// Open the context and run startup self-heal
pub fn get_context() -> Result<ScholarContext> {
    let scholar_dir = get_scholar_dir()?;

    std::fs::create_dir_all(&scholar_dir)
        .with_context(|| format!("Failed to create scholar directory: {:?}", scholar_dir))?;

    let ctx = ScholarContext::open(&scholar_dir).context("Failed to initialize scholar context")?;
    tracing::debug!(
        dir = %scholar_dir.display(),
        backend = ctx.store.backend_name(),
        "Context ready"
    );
    Ok(ctx)
}

/// Get password from flag, `SCHOLAR_PASSWORD`, or prompt
pub fn password_or_prompt(password_flag: Option<String>, prompt: &str) -> Result<String> {
    if let Some(p) = password_flag {
        return Ok(p);
    }

    if let Ok(p) = env::var(PASSWORD_ENV) {
        return Ok(p);
    }

    if !atty::is(atty::Stream::Stdin) {
        bail!("No password given: pass --password or set {}", PASSWORD_ENV);
    }

    Ok(Password::new().with_prompt(prompt).interact()?)
}

/// Prompt twice for a new password unless one was given
pub fn new_password_or_prompt(password_flag: Option<String>) -> Result<String> {
    if let Some(p) = password_flag {
        return Ok(p);
    }

    if !atty::is(atty::Stream::Stdin) {
        bail!("No password given and stdin is not a terminal; pass it as a flag");
    }

    Ok(Password::new()
        .with_prompt("New password")
        .with_confirmation("Confirm new password", "Passwords do not match")
        .interact()?)
}

/// Loose `local@domain.tld` check
pub fn looks_like_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")
        .map(|re| re.is_match(email))
        .unwrap_or(true)
}

/// Warn about an odd-looking email; the core accepts any string
pub fn warn_on_email_shape(email: &str, json: bool) {
    if !json && !looks_like_email(email) {
        output::warning(&format!("'{}' does not look like an email address", email));
    }
}

/// Refuse unless the session belongs to an admin
pub fn require_admin(ctx: &ScholarContext) -> Result<()> {
    if !ctx.sessions.is_authenticated() {
        bail!("Not signed in. Run 'scholar login' first.");
    }
    if !ctx.sessions.is_admin() {
        bail!("Administrator access required");
    }
    Ok(())
}

/// Report a core operation: JSON envelope or human output, plus an event
///
/// Failures are recorded by error kind only, never with the message, which
/// may carry an email.
pub fn finish<T: Serialize>(
    logger: &Option<EventLog>,
    command: &str,
    result: scholar_core::Result<T>,
    json: bool,
    on_success: impl FnOnce(&T),
) -> Result<()> {
    log_event(logger, LogEvent::outcome(command, &result));

    if json {
        let failed = result.is_err();
        let envelope: OperationResult<T> = result.into();
        output::json(&envelope)?;
        if failed {
            std::process::exit(1);
        }
        return Ok(());
    }

    let value = result?;
    on_success(&value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_shape() {
        assert!(looks_like_email("a@x.com"));
        assert!(looks_like_email("first.last@school.edu"));
        assert!(!looks_like_email("a@x"));
        assert!(!looks_like_email("not an email"));
        assert!(!looks_like_email("@x.com"));
    }

    #[test]
    fn test_password_flag_wins() {
        let password = password_or_prompt(Some("from-flag".to_string()), "Password").unwrap();
        assert_eq!(password, "from-flag");
    }
}
