//! Session provider - the facade the rest of the application talks to
//!
//! Holds the signed-in user in memory with its derived `is_admin` /
//! `is_teacher` flags. The boolean methods are the outer contract: they
//! report success or failure and log anything that was not a plain refusal.
//! Each has a `try_*` sibling returning the reason.

use serde::Serialize;

use crate::domain::result::Result;
use crate::domain::{is_admin, is_teacher, LoginRecord, Registration, SessionUser, User};
use crate::services::audit::{sort_newest_first, LoginAuditLog};
use crate::services::credentials::CredentialService;
use crate::services::self_heal::{AdminSelfHeal, Promotion};
use crate::store::RecordStore;

/// The signed-in user with flags derived from its roles
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveSession {
    pub user: SessionUser,
    pub is_admin: bool,
    pub is_teacher: bool,
}

impl ActiveSession {
    fn derive(user: SessionUser) -> Self {
        Self {
            is_admin: is_admin(Some(&user)),
            is_teacher: is_teacher(Some(&user)),
            user,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Anonymous,
    Authenticated(ActiveSession),
}

pub struct SessionProvider {
    store: RecordStore,
    credentials: CredentialService,
    admin: AdminSelfHeal,
    audit: LoginAuditLog,
    state: SessionState,
    login_records: Vec<LoginRecord>,
}

impl SessionProvider {
    pub fn new(store: RecordStore) -> Self {
        let audit = LoginAuditLog::new(store.clone());
        Self {
            credentials: CredentialService::new(store.clone(), audit.clone()),
            admin: AdminSelfHeal::new(store.clone()),
            audit,
            store,
            state: SessionState::Anonymous,
            login_records: Vec::new(),
        }
    }

    /// Load the persisted session and login history
    ///
    /// Run after the admin self-heal so a healed super-admin session is
    /// picked up with its corrected roles.
    pub fn init(&mut self) {
        self.state = match self.store.read_session() {
            Some(user) => SessionState::Authenticated(ActiveSession::derive(user)),
            None => SessionState::Anonymous,
        };
        self.login_records = self.audit.all();
    }

    // === State ===

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn session(&self) -> Option<&ActiveSession> {
        match &self.state {
            SessionState::Authenticated(active) => Some(active),
            SessionState::Anonymous => None,
        }
    }

    pub fn user(&self) -> Option<&SessionUser> {
        self.session().map(|s| &s.user)
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.session().is_some_and(|s| s.is_admin)
    }

    pub fn is_teacher(&self) -> bool {
        self.session().is_some_and(|s| s.is_teacher)
    }

    /// Login history in insertion order
    pub fn login_records(&self) -> &[LoginRecord] {
        &self.login_records
    }

    /// Login history newest first
    pub fn recent_login_records(&self) -> Vec<LoginRecord> {
        let mut records = self.login_records.clone();
        sort_newest_first(&mut records);
        records
    }

    // === Boolean contract ===

    pub fn login(&mut self, email: &str, password: &str) -> bool {
        report("login", self.try_login(email, password))
    }

    pub fn register(&mut self, data: Registration) -> bool {
        report("register", self.try_register(data))
    }

    pub fn logout(&mut self) {
        report("logout", self.try_logout());
    }

    pub fn update_user_profile(&mut self, updated: &SessionUser) -> bool {
        report("update_user_profile", self.try_update_user_profile(updated))
    }

    pub fn change_password(&mut self, current_password: &str, new_password: &str) -> bool {
        report(
            "change_password",
            self.try_change_password(current_password, new_password),
        )
    }

    /// Every stored user, passwords included; never hand this to display code
    pub fn get_all_users(&self) -> Vec<User> {
        self.credentials.get_all_users()
    }

    /// Stored users without passwords
    pub fn list_users(&self) -> Vec<SessionUser> {
        self.credentials.list_users()
    }

    /// Alias of `promote_to_admin_and_teacher`
    pub fn fix_admin_email(&mut self, email: &str) -> bool {
        self.promote_to_admin_and_teacher(email)
    }

    pub fn promote_to_admin_and_teacher(&mut self, email: &str) -> bool {
        report(
            "promote_to_admin_and_teacher",
            self.try_promote_to_admin_and_teacher(email),
        )
    }

    // === Tagged results ===

    pub fn try_login(&mut self, email: &str, password: &str) -> Result<SessionUser> {
        let success = self.credentials.login(email, password)?;
        self.login_records.push(success.record);
        self.state = SessionState::Authenticated(ActiveSession::derive(success.session.clone()));
        Ok(success.session)
    }

    pub fn try_register(&mut self, data: Registration) -> Result<SessionUser> {
        self.credentials.register(data)
    }

    /// Forget the session in memory, then remove the persisted copy
    pub fn try_logout(&mut self) -> Result<()> {
        self.state = SessionState::Anonymous;
        self.store.clear_session()
    }

    pub fn try_update_user_profile(&mut self, updated: &SessionUser) -> Result<SessionUser> {
        let session = self.credentials.update_user_profile(updated)?;
        self.state = SessionState::Authenticated(ActiveSession::derive(session.clone()));
        Ok(session)
    }

    pub fn try_change_password(&mut self, current_password: &str, new_password: &str) -> Result<()> {
        self.credentials
            .change_password(current_password, new_password, self.user())
    }

    pub fn try_promote_to_admin_and_teacher(&mut self, email: &str) -> Result<Promotion> {
        let promotion = self.admin.promote_to_admin_and_teacher(email)?;

        if let SessionState::Authenticated(active) = &mut self.state {
            if active.user.email == email {
                let mut user = active.user.clone();
                user.role = promotion.user.role.clone();
                user.roles = promotion.user.roles.clone();
                *active = ActiveSession::derive(user);
            }
        }

        Ok(promotion)
    }
}

/// Collapse a tagged result into the boolean contract
fn report<T>(operation: &str, result: Result<T>) -> bool {
    match result {
        Ok(_) => true,
        Err(e) if e.is_rejection() => {
            tracing::debug!(operation, "Rejected: {}", e);
            false
        }
        Err(e) => {
            tracing::error!(operation, "Operation failed: {}", e);
            false
        }
    }
}
