//! Account commands - register and profile

use anyhow::{Context, Result};
use clap::Args;

use scholar_core::{Error, Registration, Role, ScholarContext};

use super::{finish, get_context, get_logger, new_password_or_prompt, require_admin, warn_on_email_shape};
use crate::output;

#[derive(Args)]
pub struct RegisterArgs {
    /// Email address (the account's unique key)
    #[arg(long)]
    pub email: String,
    /// Password (prompted when omitted)
    #[arg(short, long)]
    pub password: Option<String>,
    #[arg(long, default_value = "")]
    pub first_name: String,
    #[arg(long, default_value = "")]
    pub last_name: String,
    /// Primary role: admin, teacher, student or any custom tag.
    /// Anything but student needs a signed-in admin.
    #[arg(long, default_value = "student")]
    pub role: String,
    #[arg(long)]
    pub school: Option<String>,
    #[arg(long)]
    pub class_year: Option<String>,
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ProfileArgs {
    #[arg(long)]
    pub first_name: Option<String>,
    #[arg(long)]
    pub last_name: Option<String>,
    #[arg(long)]
    pub school: Option<String>,
    #[arg(long)]
    pub class_year: Option<String>,
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Self-registration is student-only; other roles are granted by an admin
pub fn authorize_role(ctx: &ScholarContext, role: &Role) -> Result<()> {
    if *role == Role::Student {
        return Ok(());
    }
    require_admin(ctx).with_context(|| format!("Registering a '{}' account", role))
}

/// Create an account; does not sign in
pub fn run_register(args: RegisterArgs) -> Result<()> {
    warn_on_email_shape(&args.email, args.json);
    let role = Role::from(args.role.as_str());

    let mut ctx = get_context()?;
    authorize_role(&ctx, &role)?;
    let password = new_password_or_prompt(args.password)?;

    let mut registration = Registration::new(args.email, password)
        .with_name(args.first_name, args.last_name)
        .with_role(role);
    if let Some(school) = args.school {
        registration = registration.with_school(school);
    }
    if let Some(class_year) = args.class_year {
        registration = registration.with_class_year(class_year);
    }

    let logger = get_logger(&ctx.config);
    let result = ctx.sessions.try_register(registration);

    finish(&logger, "register", result, args.json, |user| {
        output::success(&format!("Registered {} as {}", user.email, user.role));
        output::info("Run 'scholar login' to sign in");
    })
}

/// Edit the signed-in user's profile
pub fn run_profile(args: ProfileArgs) -> Result<()> {
    let mut ctx = get_context()?;
    let logger = get_logger(&ctx.config);

    let result = match ctx.sessions.user().cloned() {
        Some(mut user) => {
            if let Some(first_name) = args.first_name {
                user.first_name = first_name;
            }
            if let Some(last_name) = args.last_name {
                user.last_name = last_name;
            }
            if let Some(school) = args.school {
                user.school = Some(school);
            }
            if let Some(class_year) = args.class_year {
                user.class_year = Some(class_year);
            }
            ctx.sessions.try_update_user_profile(&user)
        }
        None => Err(Error::NotAuthenticated),
    };

    finish(&logger, "profile", result, args.json, |user| {
        output::success(&format!("Profile updated for {}", user.full_name()));
    })
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use scholar_core::config::Config;
    use scholar_core::{RecordStore, DEFAULT_ADMIN_PASSWORD, SUPER_ADMIN_EMAIL};

    use super::*;

    fn context() -> ScholarContext {
        let mut ctx = ScholarContext::with_store(Config::default(), Path::new("."), RecordStore::in_memory());
        ctx.init().unwrap();
        ctx
    }

    #[test]
    fn test_anyone_may_register_a_student() {
        let ctx = context();
        assert!(authorize_role(&ctx, &Role::Student).is_ok());
    }

    #[test]
    fn test_anonymous_cannot_register_privileged_roles() {
        let ctx = context();
        for role in [Role::Admin, Role::Teacher, Role::from("headmaster")] {
            let err = authorize_role(&ctx, &role).unwrap_err();
            assert!(format!("{:#}", err).contains("Not signed in"), "{:#}", err);
        }
    }

    #[test]
    fn test_student_session_cannot_register_admin() {
        let mut ctx = context();
        ctx.sessions
            .try_register(Registration::new("s@x.com".to_string(), "pw".to_string()))
            .unwrap();
        assert!(ctx.sessions.login("s@x.com", "pw"));

        let err = authorize_role(&ctx, &Role::Admin).unwrap_err();
        assert!(format!("{:#}", err).contains("Administrator access required"));
    }

    #[test]
    fn test_admin_may_register_any_role() {
        let mut ctx = context();
        assert!(ctx.sessions.login(SUPER_ADMIN_EMAIL, DEFAULT_ADMIN_PASSWORD));
        assert!(authorize_role(&ctx, &Role::Admin).is_ok());
        assert!(authorize_role(&ctx, &Role::Teacher).is_ok());
    }
}
