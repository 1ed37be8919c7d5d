//! Storage trait definitions

use crate::error::StorageError;
use async_trait::async_trait;
use qnet_types::{Record, RecordId, StoredRecord};

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Append-only record storage.
///
/// Records are never updated or reordered. Ids grow strictly with insertion
/// order. Scans re-read current state on every call.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Create the record table if it does not exist. Idempotent.
    async fn init_schema(&self) -> StorageResult<()>;

    /// Append a record and return its assigned id
    async fn insert(&self, record: &Record) -> StorageResult<RecordId>;

    /// Up to `limit` records, newest first
    async fn recent(&self, limit: usize) -> StorageResult<Vec<StoredRecord>>;

    /// Every record in insertion order
    async fn all(&self) -> StorageResult<Vec<StoredRecord>>;

    /// Number of stored records
    async fn count(&self) -> StorageResult<u64>;
}
