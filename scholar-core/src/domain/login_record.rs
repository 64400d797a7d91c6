//! Login audit record

use serde::{Deserialize, Serialize};

use super::role::Role;
use super::user::SessionUser;

/// One successful login, as written to the `loginRecords` collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRecord {
    pub user_id: String,
    pub user_name: String,
    pub email: String,
    pub role: Role,
    /// Unix milliseconds
    pub timestamp: i64,
}

impl LoginRecord {
    pub fn for_session(user: &SessionUser, timestamp: i64) -> Self {
        Self {
            user_id: user.id.clone(),
            user_name: user.full_name(),
            email: user.email.clone(),
            role: user.role.clone(),
            timestamp,
        }
    }
}
