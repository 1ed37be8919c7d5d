//! In-memory storage implementation

use super::traits::*;
use async_trait::async_trait;
use qnet_types::{Record, RecordId, StoredRecord};
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory storage for development and testing
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordStore {
    records: Arc<RwLock<Vec<StoredRecord>>>,
}

impl InMemoryRecordStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn init_schema(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn insert(&self, record: &Record) -> StorageResult<RecordId> {
        // Id assignment and append happen under one write lock.
        let mut records = self.records.write().await;
        let next = records.last().map_or(1, |last| last.id.value() + 1);
        let id = RecordId::new(next);
        records.push(StoredRecord::new(id, record.clone()));
        Ok(id)
    }

    async fn recent(&self, limit: usize) -> StorageResult<Vec<StoredRecord>> {
        let records = self.records.read().await;
        Ok(records.iter().rev().take(limit).cloned().collect())
    }

    async fn all(&self) -> StorageResult<Vec<StoredRecord>> {
        let records = self.records.read().await;
        Ok(records.clone())
    }

    async fn count(&self) -> StorageResult<u64> {
        let records = self.records.read().await;
        Ok(records.len() as u64)
    }
}
