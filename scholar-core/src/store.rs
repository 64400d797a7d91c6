//! Durable record store - typed collections over a `KeyValueStore`
//!
//! Collections are read and written whole: callers load the full list,
//! change it and write the full list back. Reads never fail. A missing,
//! unreadable or malformed entry reads as empty so the application keeps
//! working with an empty user base instead of refusing to start.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::adapters::MemoryStore;
use crate::domain::result::Result;
use crate::domain::SessionUser;
use crate::ports::KeyValueStore;

/// Key of the user collection
pub const USERS: &str = "users";

/// Key of the login audit collection
pub const LOGIN_RECORDS: &str = "loginRecords";

/// Key of the persisted session (a single object, not a list)
pub const SESSION: &str = "user";

#[derive(Clone)]
pub struct RecordStore {
    backend: Arc<dyn KeyValueStore>,
}

impl RecordStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Store backed by process memory only
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Load a whole collection; empty when absent or unreadable
    pub fn read_collection<T: DeserializeOwned>(&self, name: &str) -> Vec<T> {
        self.read_value::<Option<Vec<T>>>(name)
            .flatten()
            .unwrap_or_default()
    }

    /// Replace a whole collection
    pub fn write_collection<T: Serialize>(&self, name: &str, items: &[T]) -> Result<()> {
        let content = serde_json::to_string(items)?;
        self.backend.put(name, &content)
    }

    /// Load the persisted session, if one exists and parses
    pub fn read_session(&self) -> Option<SessionUser> {
        self.read_value::<Option<SessionUser>>(SESSION).flatten()
    }

    pub fn write_session(&self, session: &SessionUser) -> Result<()> {
        let content = serde_json::to_string(session)?;
        self.backend.put(SESSION, &content)
    }

    pub fn clear_session(&self) -> Result<()> {
        self.backend.remove(SESSION)
    }

    fn read_value<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let content = match self.backend.get(key) {
            Ok(content) => content?,
            Err(e) => {
                tracing::warn!(key, backend = self.backend.name(), "Failed to read record: {}", e);
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, backend = self.backend.name(), "Ignoring malformed record: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LoginRecord, Registration, Role, User};

    fn user(email: &str) -> User {
        Registration::new(email, "pw").into_user(User::generate_id())
    }

    #[test]
    fn test_missing_collection_reads_empty() {
        let store = RecordStore::in_memory();
        assert!(store.read_collection::<User>(USERS).is_empty());
        assert!(store.read_collection::<LoginRecord>(LOGIN_RECORDS).is_empty());
        assert!(store.read_session().is_none());
    }

    #[test]
    fn test_write_replaces_whole_collection() {
        let store = RecordStore::in_memory();
        store
            .write_collection(USERS, &[user("a@x.com"), user("b@x.com")])
            .unwrap();
        store.write_collection(USERS, &[user("c@x.com")]).unwrap();

        let users: Vec<User> = store.read_collection(USERS);
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].email, "c@x.com");
    }

    #[test]
    fn test_malformed_data_reads_empty() {
        let backend = Arc::new(MemoryStore::new());
        backend.put(USERS, "{not json").unwrap();
        backend.put(SESSION, "[1,2,3]").unwrap();
        backend.put(LOGIN_RECORDS, "null").unwrap();

        let store = RecordStore::new(backend);
        assert!(store.read_collection::<User>(USERS).is_empty());
        assert!(store.read_collection::<LoginRecord>(LOGIN_RECORDS).is_empty());
        assert!(store.read_session().is_none());
    }

    #[test]
    fn test_session_round_trip_and_clear() {
        let store = RecordStore::in_memory();
        let mut session = user("a@x.com").to_session();
        session.role = Role::Teacher;

        store.write_session(&session).unwrap();
        assert_eq!(store.read_session(), Some(session));

        store.clear_session().unwrap();
        assert!(store.read_session().is_none());
    }
}
