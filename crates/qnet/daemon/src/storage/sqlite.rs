//! SQLite storage implementation

use super::traits::*;
use crate::error::StorageError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use qnet_types::{Distribution, MetricSample, Record, RecordId, StoredRecord};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::Path;
use std::time::Duration;

/// Table holding one row per encoded measurement
pub const TABLE_NAME: &str = "network_test_records";

const SELECT_COLUMNS: &str =
    "SELECT id, download_speed, upload_speed, ping, jitter, distribution, timestamp FROM network_test_records";

/// SQLite-backed record store.
///
/// The pool holds a single connection, so concurrent inserts are serialized
/// by the store itself.
#[derive(Debug, Clone)]
pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    /// Open (creating if needed) the database file and initialize schema
    pub async fn connect(path: &Path, connect_timeout: Duration) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .busy_timeout(connect_timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(connect_timeout)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Close the pool, waiting for in-flight statements.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    fn row_to_record(row: &SqliteRow) -> StorageResult<StoredRecord> {
        let column = |e: sqlx::Error| StorageError::InvalidData(e.to_string());

        let id: i64 = row.try_get("id").map_err(column)?;
        let distribution_text: String = row.try_get("distribution").map_err(column)?;
        let timestamp: DateTime<Utc> = row.try_get("timestamp").map_err(column)?;

        let distribution = Distribution::from_json_text(&distribution_text)
            .map_err(|e| StorageError::InvalidData(format!("record {}: {}", id, e)))?;

        let sample = MetricSample::new(
            row.try_get("download_speed").map_err(column)?,
            row.try_get("upload_speed").map_err(column)?,
            row.try_get("ping").map_err(column)?,
            row.try_get("jitter").map_err(column)?,
            timestamp,
        );

        Ok(StoredRecord::new(
            RecordId::new(id),
            Record::new(sample, distribution),
        ))
    }

    fn rows_to_records(rows: &[SqliteRow]) -> StorageResult<Vec<StoredRecord>> {
        rows.iter().map(Self::row_to_record).collect()
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn init_schema(&self) -> StorageResult<()> {
        // Reads order by id, which the rowid already indexes.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS network_test_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                download_speed REAL NOT NULL,
                upload_speed REAL NOT NULL,
                ping REAL NOT NULL,
                jitter REAL NOT NULL,
                distribution TEXT NOT NULL,
                timestamp TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Query(e.to_string()))?;

        Ok(())
    }

    async fn insert(&self, record: &Record) -> StorageResult<RecordId> {
        let sample = &record.sample;
        let result = sqlx::query(
            r#"
            INSERT INTO network_test_records
                (download_speed, upload_speed, ping, jitter, distribution, timestamp)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(sample.download_speed)
        .bind(sample.upload_speed)
        .bind(sample.ping)
        .bind(sample.jitter)
        .bind(record.distribution.to_json_text())
        .bind(sample.timestamp)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Query(e.to_string()))?;

        Ok(RecordId::new(result.last_insert_rowid()))
    }

    async fn recent(&self, limit: usize) -> StorageResult<Vec<StoredRecord>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query(&format!("{} ORDER BY id DESC LIMIT ?", SELECT_COLUMNS))
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Query(e.to_string()))?;

        Self::rows_to_records(&rows)
    }

    async fn all(&self) -> StorageResult<Vec<StoredRecord>> {
        let rows = sqlx::query(&format!("{} ORDER BY id ASC", SELECT_COLUMNS))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Query(e.to_string()))?;

        Self::rows_to_records(&rows)
    }

    async fn count(&self) -> StorageResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM network_test_records")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StorageError::Query(e.to_string()))?;

        Ok(count.max(0) as u64)
    }
}
