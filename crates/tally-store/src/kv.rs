//! # Key-Value Repository
//!
//! The single write surface for all local persistence: string keys mapped
//! to JSON blob values.
//!
//! ## Why a kv surface instead of relational tables?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  The persistence model of a POS terminal is a handful of              │
//! │  single-writer documents (offline queue, audit log, daily totals,     │
//! │  terminal id, session snapshot), not a relational workload.           │
//! │                                                                        │
//! │  Every typed repository goes through this one surface:                 │
//! │                                                                        │
//! │    OfflineQueueRepository ──┐                                          │
//! │    AuditLogRepository ──────┼──► KvRepository ──► kv_store table      │
//! │    DailySalesRepository ────┤      get / set / remove                  │
//! │    TerminalRepository ──────┘                                          │
//! │                                                                        │
//! │  Tests inject `StoreConfig::in_memory()` and exercise the real        │
//! │  repositories against an isolated database.                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// Repository for string-keyed blob operations.
#[derive(Debug, Clone)]
pub struct KvRepository {
    pool: SqlitePool,
}

impl KvRepository {
    /// Creates a new KvRepository.
    pub fn new(pool: SqlitePool) -> Self {
        KvRepository { pool }
    }

    /// Gets the raw value stored under a key.
    pub async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let row = sqlx::query("SELECT value FROM kv_store WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.get::<String, _>("value")))
    }

    /// Sets the value stored under a key (upsert).
    pub async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        debug!(key = %key, bytes = value.len(), "kv set");

        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Removes a key. Removing an absent key is not an error.
    pub async fn remove(&self, key: &str) -> StoreResult<()> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Gets and deserializes the JSON document stored under a key.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        match self.get(key).await? {
            None => Ok(None),
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| StoreError::CorruptBlob {
                    key: key.to_string(),
                    reason: e.to_string(),
                }),
        }
    }

    /// Serializes and stores a JSON document under a key.
    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T) -> StoreResult<()> {
        let raw = serde_json::to_string(value).map_err(|e| StoreError::CorruptBlob {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        self.set(key, &raw).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
