//! Adapter implementations
//!
//! Adapters implement the `KeyValueStore` port with concrete technologies:
//! - JSON files in the data directory (default)
//! - DuckDB `sys_records` table
//! - In-process memory

pub mod duckdb;
pub mod json_file;
pub mod memory;

pub use self::duckdb::DuckDbStore;
pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
