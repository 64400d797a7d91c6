//! User domain model
//!
//! `User` is the stored identity record and carries the plaintext password.
//! `SessionUser` is the same record with the password removed; it is the only
//! shape that is ever written as the active session or shown to callers.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

use super::role::{HasRoles, Role};

/// Stored identity record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<Role>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "text_or_number"
    )]
    pub class_year: Option<String>,
}

impl User {
    /// Generate a fresh opaque user id
    pub fn generate_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Password-free copy of this record
    pub fn to_session(&self) -> SessionUser {
        SessionUser::from(self)
    }

    /// Rebuild a stored record from a session-shaped value and a password
    pub fn from_session(session: &SessionUser, password: impl Into<String>) -> Self {
        Self {
            id: session.id.clone(),
            first_name: session.first_name.clone(),
            last_name: session.last_name.clone(),
            email: session.email.clone(),
            password: password.into(),
            role: session.role.clone(),
            roles: session.roles.clone(),
            school: session.school.clone(),
            class_year: session.class_year.clone(),
        }
    }

    pub fn full_name(&self) -> String {
        join_name(&self.first_name, &self.last_name)
    }
}

impl HasRoles for User {
    fn role(&self) -> &Role {
        &self.role
    }

    fn extra_roles(&self) -> &[Role] {
        self.roles.as_deref().unwrap_or_default()
    }
}

/// The signed-in user: a `User` without a password field
///
/// Deserializing a stored session that still contains a `password` key
/// silently drops it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<Role>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "text_or_number"
    )]
    pub class_year: Option<String>,
}

impl SessionUser {
    pub fn full_name(&self) -> String {
        join_name(&self.first_name, &self.last_name)
    }
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
            roles: user.roles.clone(),
            school: user.school.clone(),
            class_year: user.class_year.clone(),
        }
    }
}

impl HasRoles for SessionUser {
    fn role(&self) -> &Role {
        &self.role
    }

    fn extra_roles(&self) -> &[Role] {
        self.roles.as_deref().unwrap_or_default()
    }
}

/// Input for creating a new account
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
    pub password: String,
    /// Defaults to student when absent
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub roles: Option<Vec<Role>>,
    #[serde(default)]
    pub school: Option<String>,
    #[serde(default)]
    pub class_year: Option<String>,
}

impl Registration {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.first_name = first_name.into();
        self.last_name = last_name.into();
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn with_school(mut self, school: impl Into<String>) -> Self {
        self.school = Some(school.into());
        self
    }

    pub fn with_class_year(mut self, class_year: impl Into<String>) -> Self {
        self.class_year = Some(class_year.into());
        self
    }

    /// Turn the registration into a stored record under `id`
    pub fn into_user(self, id: String) -> User {
        User {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            password: self.password,
            role: self.role.unwrap_or_default(),
            roles: self.roles,
            school: self.school,
            class_year: self.class_year,
        }
    }
}

fn join_name(first: &str, last: &str) -> String {
    format!("{} {}", first, last).trim().to_string()
}

/// Older records store the class year as a number
fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<JsonValue>::deserialize(deserializer)? {
        Some(JsonValue::String(s)) => Some(s),
        Some(JsonValue::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        Registration::new("ada@school.edu", "secret123")
            .with_name("Ada", "Lovelace")
            .with_school("Analytical High")
            .into_user("user-1".to_string())
    }

    #[test]
    fn test_registration_defaults_to_student() {
        let user = sample_user();
        assert_eq!(user.role, Role::Student);
        assert!(user.roles.is_none());
        assert_eq!(user.full_name(), "Ada Lovelace");
    }

    #[test]
    fn test_session_has_no_password_field() {
        let session = sample_user().to_session();
        let json = serde_json::to_value(&session).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["firstName"], "Ada");
        assert_eq!(json["email"], "ada@school.edu");
    }

    #[test]
    fn test_session_drops_stored_password() {
        let raw = r#"{"id":"u1","email":"a@x.com","password":"leaked","role":"teacher"}"#;
        let session: SessionUser = serde_json::from_str(raw).unwrap();
        assert_eq!(session.role, Role::Teacher);
        let back = serde_json::to_string(&session).unwrap();
        assert!(!back.contains("leaked"));
    }

    #[test]
    fn test_class_year_accepts_numbers() {
        let raw = r#"{"id":"u1","email":"a@x.com","password":"pw","role":"student","classYear":2027}"#;
        let user: User = serde_json::from_str(raw).unwrap();
        assert_eq!(user.class_year.as_deref(), Some("2027"));
    }

    #[test]
    fn test_from_session_restores_password() {
        let user = sample_user();
        let rebuilt = User::from_session(&user.to_session(), user.password.clone());
        assert_eq!(rebuilt, user);
    }
}
