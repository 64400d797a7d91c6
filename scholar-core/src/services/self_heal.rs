//! Admin self-heal - keeps the super-admin account privileged
//!
//! `run` is called once per process start, before the session provider reads
//! the persisted session. Whatever happened to the stored data in between,
//! the super-admin email comes out of it with `role = admin` and
//! `roles ⊇ [admin, teacher]`.

use serde::Serialize;

use crate::domain::result::Result;
use crate::domain::role::ensure_admin_and_teacher;
use crate::domain::{Role, SessionUser, User};
use crate::store::{RecordStore, USERS};

/// The account that can never lose admin rights
pub const SUPER_ADMIN_EMAIL: &str = "admin@scholar.edu";

/// Password given to admin accounts synthesized by self-heal or promotion
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin12345";

const PLACEHOLDER_FIRST_NAME: &str = "Super";
const PLACEHOLDER_LAST_NAME: &str = "Admin";

/// What a self-heal pass changed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HealReport {
    /// The super-admin record did not exist and was created
    pub created: bool,
    /// An existing super-admin record had its roles corrected
    pub repaired: bool,
    /// The persisted session belonged to the super-admin and was corrected
    pub session_repaired: bool,
}

impl HealReport {
    pub fn changed_anything(&self) -> bool {
        self.created || self.repaired || self.session_repaired
    }
}

/// Outcome of a promotion
#[derive(Debug, Clone, Serialize)]
pub struct Promotion {
    pub user: SessionUser,
    /// No record existed for the email, so one was created
    pub created: bool,
}

#[derive(Clone)]
pub struct AdminSelfHeal {
    store: RecordStore,
}

impl AdminSelfHeal {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    /// Repair or create the super-admin account and its session
    pub fn run(&self) -> Result<HealReport> {
        let mut report = HealReport::default();
        let mut users: Vec<User> = self.store.read_collection(USERS);

        // Every record carrying the email is repaired, duplicates included
        let mut matched = false;
        for admin in users.iter_mut().filter(|u| u.email == SUPER_ADMIN_EMAIL) {
            matched = true;
            report.repaired |= ensure_admin_and_teacher(&mut admin.role, &mut admin.roles);
        }
        if !matched {
            users.push(placeholder_admin(SUPER_ADMIN_EMAIL));
            report.created = true;
        }

        if report.created || report.repaired {
            self.store.write_collection(USERS, &users)?;
        }

        if let Some(mut session) = self.store.read_session() {
            if session.email == SUPER_ADMIN_EMAIL
                && ensure_admin_and_teacher(&mut session.role, &mut session.roles)
            {
                self.store.write_session(&session)?;
                report.session_repaired = true;
            }
        }

        if report.changed_anything() {
            tracing::info!(
                created = report.created,
                repaired = report.repaired,
                session_repaired = report.session_repaired,
                "Super-admin account healed"
            );
        }

        Ok(report)
    }

    /// Make `email` an admin and a teacher, creating the account if needed
    ///
    /// Sets `role = admin` and `roles = [admin, teacher]` exactly. If the
    /// persisted session belongs to `email` it receives the same roles.
    pub fn promote_to_admin_and_teacher(&self, email: &str) -> Result<Promotion> {
        let mut users: Vec<User> = self.store.read_collection(USERS);

        let mut first = None;
        for (index, record) in users.iter_mut().enumerate().filter(|(_, u)| u.email == email) {
            grant_admin_and_teacher(&mut record.role, &mut record.roles);
            first.get_or_insert(index);
        }

        let created = first.is_none();
        let index = match first {
            Some(index) => index,
            None => {
                users.push(placeholder_admin(email));
                users.len() - 1
            }
        };
        let user = users[index].to_session();
        self.store.write_collection(USERS, &users)?;

        if let Some(mut session) = self.store.read_session() {
            if session.email == email {
                grant_admin_and_teacher(&mut session.role, &mut session.roles);
                self.store.write_session(&session)?;
            }
        }

        tracing::info!(user_id = %user.id, created, "Promoted user to admin and teacher");
        Ok(Promotion { user, created })
    }
}

fn grant_admin_and_teacher(role: &mut Role, roles: &mut Option<Vec<Role>>) {
    *role = Role::Admin;
    *roles = Some(vec![Role::Admin, Role::Teacher]);
}

fn placeholder_admin(email: &str) -> User {
    User {
        id: User::generate_id(),
        first_name: PLACEHOLDER_FIRST_NAME.to_string(),
        last_name: PLACEHOLDER_LAST_NAME.to_string(),
        email: email.to_string(),
        password: DEFAULT_ADMIN_PASSWORD.to_string(),
        role: Role::Admin,
        roles: Some(vec![Role::Admin, Role::Teacher]),
        school: None,
        class_year: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{is_admin, is_teacher, Registration};

    fn users(store: &RecordStore) -> Vec<User> {
        store.read_collection(USERS)
    }

    #[test]
    fn test_fresh_store_creates_single_admin() {
        let store = RecordStore::in_memory();
        let report = AdminSelfHeal::new(store.clone()).run().unwrap();
        assert!(report.created);

        let all = users(&store);
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].email, SUPER_ADMIN_EMAIL);
        assert_eq!(all[0].role, Role::Admin);
        assert!(is_teacher(Some(&all[0])));
    }

    #[test]
    fn test_demoted_admin_is_repaired_keeping_other_fields() {
        let store = RecordStore::in_memory();
        let mut admin = Registration::new(SUPER_ADMIN_EMAIL, "custom-pw")
            .with_name("Real", "Name")
            .with_role(Role::Student)
            .into_user("admin-id".to_string());
        admin.roles = Some(vec![Role::Other("mentor".to_string())]);
        store.write_collection(USERS, &[admin]).unwrap();

        let report = AdminSelfHeal::new(store.clone()).run().unwrap();
        assert!(report.repaired);
        assert!(!report.created);

        let all = users(&store);
        let healed = &all[0];
        assert_eq!(healed.id, "admin-id");
        assert_eq!(healed.password, "custom-pw");
        assert_eq!(healed.first_name, "Real");
        assert_eq!(healed.role, Role::Admin);
        assert!(healed.roles.as_ref().unwrap().contains(&Role::Other("mentor".to_string())));
        assert!(is_admin(Some(healed)) && is_teacher(Some(healed)));
    }

    #[test]
    fn test_duplicate_admin_records_are_all_repaired() {
        let store = RecordStore::in_memory();
        let first = Registration::new(SUPER_ADMIN_EMAIL, "pw-a").into_user("a".to_string());
        let second = Registration::new(SUPER_ADMIN_EMAIL, "pw-b").into_user("b".to_string());
        store.write_collection(USERS, &[first, second]).unwrap();

        let report = AdminSelfHeal::new(store.clone()).run().unwrap();
        assert!(report.repaired);
        assert!(!report.created);

        let all = users(&store);
        assert_eq!(all.len(), 2);
        for user in &all {
            assert_eq!(user.role, Role::Admin, "record {}", user.id);
            assert!(is_admin(Some(user)) && is_teacher(Some(user)));
        }
    }

    #[test]
    fn test_promote_repairs_every_record_for_the_email() {
        let store = RecordStore::in_memory();
        let first = Registration::new("t@x.com", "pw-a").into_user("a".to_string());
        let second = Registration::new("t@x.com", "pw-b").into_user("b".to_string());
        store.write_collection(USERS, &[first, second]).unwrap();

        let promotion = AdminSelfHeal::new(store.clone())
            .promote_to_admin_and_teacher("t@x.com")
            .unwrap();
        assert!(!promotion.created);
        assert_eq!(promotion.user.id, "a");

        let all = users(&store);
        assert_eq!(all.len(), 2);
        assert!(all
            .iter()
            .all(|u| u.role == Role::Admin && u.roles == Some(vec![Role::Admin, Role::Teacher])));
    }

    #[test]
    fn test_run_is_idempotent() {
        let store = RecordStore::in_memory();
        let heal = AdminSelfHeal::new(store.clone());

        heal.run().unwrap();
        let once = users(&store);
        let second = heal.run().unwrap();
        assert!(!second.changed_anything());
        assert_eq!(users(&store), once);
    }

    #[test]
    fn test_super_admin_session_is_repaired() {
        let store = RecordStore::in_memory();
        let mut session = Registration::new(SUPER_ADMIN_EMAIL, "pw")
            .into_user("admin-id".to_string())
            .to_session();
        session.role = Role::Student;
        store.write_session(&session).unwrap();

        let report = AdminSelfHeal::new(store.clone()).run().unwrap();
        assert!(report.session_repaired);
        let healed = store.read_session().unwrap();
        assert_eq!(healed.role, Role::Admin);
        assert!(is_teacher(Some(&healed)));
    }

    #[test]
    fn test_other_sessions_are_left_alone() {
        let store = RecordStore::in_memory();
        let session = Registration::new("pupil@x.com", "pw")
            .into_user("pupil".to_string())
            .to_session();
        store.write_session(&session).unwrap();

        let report = AdminSelfHeal::new(store.clone()).run().unwrap();
        assert!(!report.session_repaired);
        assert_eq!(store.read_session(), Some(session));
    }

    #[test]
    fn test_promote_existing_and_idempotent() {
        let store = RecordStore::in_memory();
        let teacher = Registration::new("t@x.com", "pw")
            .with_role(Role::Teacher)
            .into_user("t1".to_string());
        store.write_collection(USERS, &[teacher]).unwrap();
        let heal = AdminSelfHeal::new(store.clone());

        let first = heal.promote_to_admin_and_teacher("t@x.com").unwrap();
        assert!(!first.created);
        let after_once = users(&store);

        heal.promote_to_admin_and_teacher("t@x.com").unwrap();
        assert_eq!(users(&store), after_once);
        assert_eq!(after_once[0].role, Role::Admin);
        assert_eq!(after_once[0].roles, Some(vec![Role::Admin, Role::Teacher]));
        assert_eq!(after_once[0].password, "pw");
    }

    #[test]
    fn test_promote_creates_missing_account_and_updates_session() {
        let store = RecordStore::in_memory();
        let session = Registration::new("new@x.com", "pw")
            .into_user("stale-id".to_string())
            .to_session();
        store.write_session(&session).unwrap();

        let promotion = AdminSelfHeal::new(store.clone())
            .promote_to_admin_and_teacher("new@x.com")
            .unwrap();
        assert!(promotion.created);
        assert_eq!(users(&store).len(), 1);

        let session = store.read_session().unwrap();
        assert_eq!(session.id, "stale-id");
        assert_eq!(session.role, Role::Admin);
        assert_eq!(session.roles, Some(vec![Role::Admin, Role::Teacher]));
    }
}
