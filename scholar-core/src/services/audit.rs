//! Login audit log - append-only history of successful logins

use crate::domain::result::Result;
use crate::domain::LoginRecord;
use crate::store::{RecordStore, LOGIN_RECORDS};

#[derive(Clone)]
pub struct LoginAuditLog {
    store: RecordStore,
}

impl LoginAuditLog {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    /// Append one record (read-modify-write of the whole collection)
    pub fn append(&self, record: &LoginRecord) -> Result<()> {
        let mut records = self.all();
        records.push(record.clone());
        self.store.write_collection(LOGIN_RECORDS, &records)
    }

    /// Every record in insertion order
    pub fn all(&self) -> Vec<LoginRecord> {
        self.store.read_collection(LOGIN_RECORDS)
    }

    pub fn count(&self) -> usize {
        self.all().len()
    }

    /// Newest first, optionally truncated to `limit` entries
    pub fn recent(&self, limit: Option<usize>) -> Vec<LoginRecord> {
        let mut records = self.all();
        sort_newest_first(&mut records);
        if let Some(limit) = limit {
            records.truncate(limit);
        }
        records
    }
}

/// Display order: descending timestamp, stable for equal timestamps
pub fn sort_newest_first(records: &mut [LoginRecord]) {
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;

    fn record(user_id: &str, timestamp: i64) -> LoginRecord {
        LoginRecord {
            user_id: user_id.to_string(),
            user_name: "Test User".to_string(),
            email: format!("{}@x.com", user_id),
            role: Role::Student,
            timestamp,
        }
    }

    #[test]
    fn test_append_keeps_insertion_order() {
        let log = LoginAuditLog::new(RecordStore::in_memory());
        log.append(&record("b", 200)).unwrap();
        log.append(&record("a", 100)).unwrap();
        log.append(&record("b", 200)).unwrap();

        let all = log.all();
        assert_eq!(all.len(), 3, "duplicates are kept");
        assert_eq!(all[0].user_id, "b");
        assert_eq!(all[1].user_id, "a");
    }

    #[test]
    fn test_recent_sorts_descending_and_limits() {
        let log = LoginAuditLog::new(RecordStore::in_memory());
        for (id, ts) in [("a", 100), ("b", 300), ("c", 200)] {
            log.append(&record(id, ts)).unwrap();
        }

        let recent = log.recent(Some(2));
        let ids: Vec<&str> = recent.iter().map(|r| r.user_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
        assert_eq!(log.recent(None).len(), 3);
        assert_eq!(log.count(), 3);
    }
}
