//! Storage layer for qnet-daemon
//!
//! Append-only persistence of encoded measurements.

mod memory;
mod sqlite;
mod traits;

pub use memory::InMemoryRecordStore;
pub use sqlite::{SqliteRecordStore, TABLE_NAME};
pub use traits::{RecordStore, StorageResult};
