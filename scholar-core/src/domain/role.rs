//! Role tags and the role resolver
//!
//! A user carries one primary `role` plus an optional list of extra `roles`.
//! Permission checks OR the two together, so a user can be admin and teacher
//! at the same time.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Permission tag on a user record
///
/// Unknown tags read from storage are kept verbatim in `Other` so a
/// round-trip never loses data. They grant nothing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    Teacher,
    #[default]
    Student,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "admin",
            Role::Teacher => "teacher",
            Role::Student => "student",
            Role::Other(tag) => tag,
        }
    }
}

impl From<String> for Role {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "admin" => Role::Admin,
            "teacher" => Role::Teacher,
            "student" => Role::Student,
            _ => Role::Other(tag),
        }
    }
}

impl From<&str> for Role {
    fn from(tag: &str) -> Self {
        Role::from(tag.to_string())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anything carrying a primary role and optional extra roles
pub trait HasRoles {
    fn role(&self) -> &Role;

    /// Extra tags; empty when the record has none
    fn extra_roles(&self) -> &[Role];

    fn has_role(&self, role: &Role) -> bool {
        self.role() == role || self.extra_roles().contains(role)
    }
}

/// True when `user` is present and tagged admin by `role` or `roles`
pub fn is_admin<U: HasRoles + ?Sized>(user: Option<&U>) -> bool {
    user.is_some_and(|u| u.has_role(&Role::Admin))
}

/// True when `user` is present and tagged teacher by `role` or `roles`
pub fn is_teacher<U: HasRoles + ?Sized>(user: Option<&U>) -> bool {
    user.is_some_and(|u| u.has_role(&Role::Teacher))
}

/// Make `role` admin and make sure `roles` holds admin and teacher.
///
/// Other tags already present are kept in their original order. Returns
/// whether anything changed.
pub fn ensure_admin_and_teacher(role: &mut Role, roles: &mut Option<Vec<Role>>) -> bool {
    let mut changed = false;

    if *role != Role::Admin {
        *role = Role::Admin;
        changed = true;
    }

    let tags = roles.get_or_insert_with(Vec::new);
    for required in [Role::Admin, Role::Teacher] {
        if !tags.contains(&required) {
            tags.push(required);
            changed = true;
        }
    }

    changed
}
