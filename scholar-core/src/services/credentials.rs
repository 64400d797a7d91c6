//! Credential service - login, registration, profile and password changes
//!
//! Every operation is a read-modify-write of the whole `users` collection.
//! Passwords are compared as exact plaintext strings.

use chrono::Utc;

use crate::domain::result::{Error, Result};
use crate::domain::{LoginRecord, Registration, SessionUser, User};
use crate::services::audit::LoginAuditLog;
use crate::store::{RecordStore, USERS};

/// A successful login: the new session and the audit entry written for it
#[derive(Debug, Clone)]
pub struct LoginSuccess {
    pub session: SessionUser,
    pub record: LoginRecord,
}

#[derive(Clone)]
pub struct CredentialService {
    store: RecordStore,
    audit: LoginAuditLog,
}

impl CredentialService {
    pub fn new(store: RecordStore, audit: LoginAuditLog) -> Self {
        Self { store, audit }
    }

    /// Verify `email` + `password` and open a session
    ///
    /// On success a login record is appended and the password-free session
    /// is persisted. On failure no session is written.
    pub fn login(&self, email: &str, password: &str) -> Result<LoginSuccess> {
        let users = self.get_all_users();
        let user = users
            .iter()
            .find(|u| u.email == email && u.password == password)
            .ok_or(Error::InvalidCredentials)?;

        let session = user.to_session();

        // History first: a session is only persisted once its login is recorded
        let record = LoginRecord::for_session(&session, Utc::now().timestamp_millis());
        self.audit.append(&record)?;
        self.store.write_session(&session)?;

        tracing::debug!(user_id = %session.id, "Login succeeded");
        Ok(LoginSuccess { session, record })
    }

    /// Create a new account; does not sign it in
    pub fn register(&self, data: Registration) -> Result<SessionUser> {
        let mut users = self.get_all_users();
        if users.iter().any(|u| u.email == data.email) {
            return Err(Error::DuplicateEmail(data.email));
        }

        let user = data.into_user(User::generate_id());
        let session = user.to_session();
        users.push(user);
        self.store.write_collection(USERS, &users)?;

        tracing::debug!(user_id = %session.id, "Registered user");
        Ok(session)
    }

    /// Replace a user's profile fields, keeping the stored password
    ///
    /// The session is overwritten with `updated` even when no stored record
    /// has its id; the collection is then left as it was.
    pub fn update_user_profile(&self, updated: &SessionUser) -> Result<SessionUser> {
        let mut users = self.get_all_users();

        match users.iter_mut().find(|u| u.id == updated.id) {
            Some(existing) => {
                let password = std::mem::take(&mut existing.password);
                *existing = User::from_session(updated, password);
                self.store.write_collection(USERS, &users)?;
            }
            None => {
                tracing::warn!(
                    user_id = %updated.id,
                    "Profile update for unknown user; refreshing session only"
                );
            }
        }

        self.store.write_session(updated)?;
        Ok(updated.clone())
    }

    /// Change the password of the signed-in user
    ///
    /// Requires the current password. The session is not touched.
    pub fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
        session_user: Option<&SessionUser>,
    ) -> Result<()> {
        let session_user = session_user.ok_or(Error::NotAuthenticated)?;

        let mut users = self.get_all_users();
        let user = users
            .iter_mut()
            .find(|u| u.id == session_user.id && u.password == current_password)
            .ok_or(Error::InvalidCredentials)?;

        user.password = new_password.to_string();
        self.store.write_collection(USERS, &users)
    }

    /// The full collection, passwords included
    pub fn get_all_users(&self) -> Vec<User> {
        self.store.read_collection(USERS)
    }

    /// The full collection without passwords, for display
    pub fn list_users(&self) -> Vec<SessionUser> {
        self.get_all_users().iter().map(User::to_session).collect()
    }

    pub fn find_by_email(&self, email: &str) -> Option<User> {
        self.get_all_users().into_iter().find(|u| u.email == email)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::adapters::MemoryStore;
    use crate::domain::Role;
    use crate::ports::KeyValueStore;
    use crate::store::LOGIN_RECORDS;

    fn service() -> (CredentialService, RecordStore) {
        service_on(RecordStore::in_memory())
    }

    fn service_on(store: RecordStore) -> (CredentialService, RecordStore) {
        let audit = LoginAuditLog::new(store.clone());
        (CredentialService::new(store.clone(), audit), store)
    }

    /// Memory store that refuses writes to one key
    struct ReadOnlyKey {
        inner: MemoryStore,
        key: &'static str,
    }

    impl KeyValueStore for ReadOnlyKey {
        fn name(&self) -> &str {
            "read-only-key"
        }

        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn put(&self, key: &str, value: &str) -> Result<()> {
            if key == self.key {
                return Err(Error::storage("disk full"));
            }
            self.inner.put(key, value)
        }

        fn remove(&self, key: &str) -> Result<()> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn test_failed_audit_append_leaves_no_session() {
        let backend = ReadOnlyKey {
            inner: MemoryStore::new(),
            key: LOGIN_RECORDS,
        };
        let (creds, store) = service_on(RecordStore::new(Arc::new(backend)));
        creds.register(Registration::new("a@x.com", "pw")).unwrap();

        let err = creds.login("a@x.com", "pw").unwrap_err();
        assert!(!err.is_rejection());
        assert!(store.read_session().is_none());
        assert!(store.read_collection::<LoginRecord>(LOGIN_RECORDS).is_empty());
    }

    #[test]
    fn test_register_rejects_duplicate_email() {
        let (creds, _) = service();
        creds.register(Registration::new("a@x.com", "pw123456")).unwrap();

        let err = creds
            .register(Registration::new("a@x.com", "other"))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateEmail(_)));
        assert_eq!(creds.get_all_users().len(), 1);
    }

    #[test]
    fn test_email_match_is_case_sensitive() {
        let (creds, _) = service();
        creds.register(Registration::new("a@x.com", "pw")).unwrap();
        creds.register(Registration::new("A@x.com", "pw")).unwrap();
        assert_eq!(creds.get_all_users().len(), 2);
        assert!(creds.login("A@X.COM", "pw").is_err());
    }

    #[test]
    fn test_register_does_not_sign_in() {
        let (creds, store) = service();
        let created = creds.register(Registration::new("a@x.com", "pw")).unwrap();
        assert_eq!(created.role, Role::Student);
        assert!(store.read_session().is_none());
    }

    #[test]
    fn test_failed_login_writes_nothing() {
        let (creds, store) = service();
        creds.register(Registration::new("a@x.com", "pw123456")).unwrap();

        assert!(matches!(
            creds.login("a@x.com", "wrong"),
            Err(Error::InvalidCredentials)
        ));
        assert!(matches!(
            creds.login("nobody@x.com", "pw123456"),
            Err(Error::InvalidCredentials)
        ));
        assert!(store.read_session().is_none());
        assert!(store.read_collection::<LoginRecord>(crate::store::LOGIN_RECORDS).is_empty());
    }

    #[test]
    fn test_login_persists_session_and_audit() {
        let (creds, store) = service();
        creds
            .register(Registration::new("a@x.com", "pw123456").with_name("Ann", "Lee"))
            .unwrap();

        let success = creds.login("a@x.com", "pw123456").unwrap();
        assert_eq!(success.session.email, "a@x.com");
        assert_eq!(success.record.user_name, "Ann Lee");
        assert_eq!(store.read_session(), Some(success.session));
    }

    #[test]
    fn test_update_profile_keeps_stored_password() {
        let (creds, store) = service();
        let mut session = creds
            .register(Registration::new("a@x.com", "pw123456"))
            .unwrap();

        session.first_name = "Renamed".to_string();
        session.school = Some("North".to_string());
        creds.update_user_profile(&session).unwrap();

        let stored = creds.find_by_email("a@x.com").unwrap();
        assert_eq!(stored.first_name, "Renamed");
        assert_eq!(stored.school.as_deref(), Some("North"));
        assert_eq!(stored.password, "pw123456");
        assert_eq!(store.read_session(), Some(session));
    }

    #[test]
    fn test_update_profile_for_unknown_id_only_touches_session() {
        let (creds, store) = service();
        creds.register(Registration::new("a@x.com", "pw")).unwrap();
        let before = creds.get_all_users();

        let ghost = Registration::new("ghost@x.com", "pw")
            .into_user("missing-id".to_string())
            .to_session();
        creds.update_user_profile(&ghost).unwrap();

        assert_eq!(creds.get_all_users(), before);
        assert_eq!(store.read_session(), Some(ghost));
    }

    #[test]
    fn test_change_password() {
        let (creds, _) = service();
        let session = creds.register(Registration::new("a@x.com", "old-pw")).unwrap();

        assert!(matches!(
            creds.change_password("old-pw", "new-pw", None),
            Err(Error::NotAuthenticated)
        ));
        assert!(matches!(
            creds.change_password("wrong", "new-pw", Some(&session)),
            Err(Error::InvalidCredentials)
        ));

        creds.change_password("old-pw", "new-pw", Some(&session)).unwrap();
        assert!(creds.login("a@x.com", "old-pw").is_err());
        assert!(creds.login("a@x.com", "new-pw").is_ok());
    }

    #[test]
    fn test_list_users_hides_passwords() {
        let (creds, _) = service();
        creds.register(Registration::new("a@x.com", "secret-1")).unwrap();

        let json = serde_json::to_string(&creds.list_users()).unwrap();
        assert!(!json.contains("secret-1"));
        assert!(!json.contains("password"));
    }
}
