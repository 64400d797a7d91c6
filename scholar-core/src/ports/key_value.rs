//! Key-value store port - raw persistence abstraction

use crate::domain::result::Result;

/// Byte-level key-value persistence
///
/// Values are opaque JSON text. `put` fully replaces whatever was stored
/// under the key, and a successful `put` is visible to every later `get`
/// on the same store.
pub trait KeyValueStore: Send + Sync {
    /// Backend name (e.g., "json", "duckdb", "memory")
    fn name(&self) -> &str;

    /// Read the value stored under `key`, if any
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`
    fn put(&self, key: &str, value: &str) -> Result<()>;

    /// Delete `key`; deleting a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;
}
