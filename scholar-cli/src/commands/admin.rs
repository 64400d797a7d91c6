//! Admin commands - user listing, login history, promotion

use anyhow::Result;
use chrono::{Local, TimeZone};
use clap::Subcommand;
use colored::Colorize;

use scholar_core::services::LoginAuditLog;
use scholar_core::{OperationResult, SessionUser};

use super::{finish, get_context, get_logger, require_admin, warn_on_email_shape};
use crate::output;

#[derive(Subcommand)]
pub enum AdminCommands {
    /// Grant admin and teacher roles, creating the account if needed
    Promote {
        email: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Repair admin rights for an email (same as promote)
    FixEmail {
        email: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn format_timestamp(timestamp_ms: i64) -> String {
    Local
        .timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp_ms.to_string())
}

fn roles_cell(user: &SessionUser) -> String {
    match &user.roles {
        Some(roles) if !roles.is_empty() => roles
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", "),
        _ => String::new(),
    }
}

/// List every account, without passwords
pub fn run_users(json: bool) -> Result<()> {
    let ctx = get_context()?;
    require_admin(&ctx)?;
    let users = ctx.sessions.list_users();

    if json {
        output::json(&OperationResult::ok(users))?;
        return Ok(());
    }

    if users.is_empty() {
        println!("No users found.");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["Name", "Email", "Role", "Roles", "School", "Class"]);
    for user in &users {
        table.add_row(vec![
            user.full_name(),
            user.email.clone(),
            user.role.to_string(),
            roles_cell(user),
            user.school.clone().unwrap_or_default(),
            user.class_year.clone().unwrap_or_default(),
        ]);
    }
    println!("{}", table);
    println!("{}", format!("{} users", users.len()).dimmed());
    Ok(())
}

/// Successful logins, newest first
pub fn run_logins(limit: Option<usize>, json: bool) -> Result<()> {
    let ctx = get_context()?;
    require_admin(&ctx)?;
    let records = LoginAuditLog::new(ctx.store.clone()).recent(limit);

    if json {
        output::json(&OperationResult::ok(records))?;
        return Ok(());
    }

    if records.is_empty() {
        println!("No logins recorded.");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["Time", "Name", "Email", "Role"]);
    for record in &records {
        table.add_row(vec![
            format_timestamp(record.timestamp),
            record.user_name.clone(),
            record.email.clone(),
            record.role.to_string(),
        ]);
    }
    println!("{}", table);
    Ok(())
}

pub fn run(command: AdminCommands) -> Result<()> {
    let (email, json, label) = match command {
        AdminCommands::Promote { email, json } => (email, json, "promote"),
        AdminCommands::FixEmail { email, json } => (email, json, "fix_email"),
    };
    warn_on_email_shape(&email, json);

    let mut ctx = get_context()?;
    require_admin(&ctx)?;
    let logger = get_logger(&ctx.config);
    let result = ctx.sessions.try_promote_to_admin_and_teacher(&email);

    finish(&logger, label, result, json, |promotion| {
        if promotion.created {
            output::success(&format!("Created {} with admin and teacher roles", promotion.user.email));
            output::warning("The new account uses the default admin password; change it after signing in");
        } else {
            output::success(&format!("{} now has admin and teacher roles", promotion.user.email));
        }
    })
}
