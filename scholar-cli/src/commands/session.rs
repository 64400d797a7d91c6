//! Session commands - login, logout, whoami, passwd

use anyhow::Result;
use colored::Colorize;

use scholar_core::{Error, OperationResult};

use super::{finish, get_context, get_logger, new_password_or_prompt, password_or_prompt, warn_on_email_shape};
use crate::output;

pub fn run_login(email: &str, password: Option<String>, json: bool) -> Result<()> {
    warn_on_email_shape(email, json);
    let password = password_or_prompt(password, "Password")?;

    let mut ctx = get_context()?;
    let logger = get_logger(&ctx.config);
    let result = ctx.sessions.try_login(email, &password);

    finish(&logger, "login", result, json, |user| {
        output::success(&format!("Signed in as {} <{}>", user.full_name(), user.email));
        if ctx.sessions.is_admin() {
            output::info("Administrator privileges active");
        }
    })
}

pub fn run_logout(json: bool) -> Result<()> {
    let mut ctx = get_context()?;
    let logger = get_logger(&ctx.config);
    let was_signed_in = ctx.sessions.is_authenticated();
    let result = ctx.sessions.try_logout();

    finish(&logger, "logout", result, json, |_| {
        if was_signed_in {
            output::success("Signed out");
        } else {
            output::info("No one was signed in");
        }
    })
}

pub fn run_whoami(json: bool) -> Result<()> {
    let ctx = get_context()?;

    if json {
        let envelope = match ctx.sessions.session() {
            Some(active) => OperationResult::ok(active.clone()),
            None => OperationResult::fail(Error::NotAuthenticated.to_string()),
        };
        output::json(&envelope)?;
        return Ok(());
    }

    let Some(active) = ctx.sessions.session() else {
        output::warning("Not signed in");
        return Ok(());
    };

    let user = &active.user;
    println!("{}", user.full_name().bold());
    println!("  Email:  {}", user.email);
    println!("  Role:   {}", user.role);
    if let Some(roles) = &user.roles {
        let tags: Vec<String> = roles.iter().map(ToString::to_string).collect();
        println!("  Roles:  {}", tags.join(", "));
    }
    if let Some(school) = &user.school {
        println!("  School: {}", school);
    }
    if let Some(class_year) = &user.class_year {
        println!("  Class:  {}", class_year);
    }

    let mut flags = Vec::new();
    if active.is_admin {
        flags.push("admin".green().to_string());
    }
    if active.is_teacher {
        flags.push("teacher".cyan().to_string());
    }
    if !flags.is_empty() {
        println!("  Access: {}", flags.join(" "));
    }
    Ok(())
}

pub fn run_passwd(current: Option<String>, new: Option<String>, json: bool) -> Result<()> {
    let mut ctx = get_context()?;
    let logger = get_logger(&ctx.config);

    let result = if ctx.sessions.is_authenticated() {
        let current = password_or_prompt(current, "Current password")?;
        let new = new_password_or_prompt(new)?;
        ctx.sessions.try_change_password(&current, &new)
    } else {
        Err(Error::NotAuthenticated)
    };

    finish(&logger, "passwd", result, json, |_| {
        output::success("Password changed");
    })
}
