//! Sync cache store
//!
//! Durable key/value records shared by every tender task:
//! - contract id → `true` once the contract is known to exist in the target
//!   registry (never recreated afterwards)
//! - tender id → last seen `dateModified` (tender skipped while unchanged)
//!
//! Contract and tender ids share one key space. Each operation is a single-key
//! read or upsert, so concurrent tasks need no transactions. Transient storage
//! failures are retried under the store's [`RetryPolicy`].

use crate::models::Tender;
use crate::utils::retry::{retry_with_policy, RetryPolicy};
use cbridge_common::time::now_rfc3339;
use cbridge_common::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

/// Stored value: a contract marker or a tender checkpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CacheValue {
    Flag(bool),
    Timestamp(String),
}

/// Cache store backed by the `cache_records` table
#[derive(Debug, Clone)]
pub struct CacheStore {
    pool: SqlitePool,
    retry: RetryPolicy,
}

impl CacheStore {
    pub fn new(pool: SqlitePool, retry: RetryPolicy) -> Self {
        Self { pool, retry }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Whether any value is stored under `key`
    pub async fn has(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }

    pub async fn get(&self, key: &str) -> Result<Option<CacheValue>> {
        let operation = format!("read cache key {}", key);
        let raw = retry_with_policy(
            &self.retry,
            &operation,
            Error::is_transient_storage,
            || fetch_value(&self.pool, key),
        )
        .await?;

        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Insert or overwrite `key` (last write wins)
    pub async fn put(&self, key: &str, value: &CacheValue) -> Result<()> {
        let encoded = serde_json::to_string(value)?;
        let operation = format!("write cache key {}", key);

        retry_with_policy(
            &self.retry,
            &operation,
            Error::is_transient_storage,
            || upsert_value(&self.pool, key, &encoded),
        )
        .await
    }

    /// True only for the `true` marker written after a confirmed create/exists
    pub async fn is_contract_synced(&self, contract_id: &str) -> Result<bool> {
        Ok(matches!(self.get(contract_id).await?, Some(CacheValue::Flag(true))))
    }

    pub async fn mark_contract_synced(&self, contract_id: &str) -> Result<()> {
        self.put(contract_id, &CacheValue::Flag(true)).await
    }

    /// True iff a checkpoint equal to the tender's `dateModified` is stored
    pub async fn is_tender_unchanged(&self, tender: &Tender) -> Result<bool> {
        let Some(date_modified) = tender.date_modified.as_deref() else {
            return Ok(false);
        };

        let stored = self.get(&tender.id.as_key()).await?;
        Ok(matches!(stored, Some(CacheValue::Timestamp(ts)) if ts == date_modified))
    }

    /// Store the tender checkpoint; no-op without a timestamp
    pub async fn record_tender_checkpoint(
        &self,
        tender_id: &str,
        date_modified: Option<&str>,
    ) -> Result<()> {
        match date_modified {
            Some(ts) if !ts.is_empty() => {
                self.put(tender_id, &CacheValue::Timestamp(ts.to_string()))
                    .await
            }
            _ => Ok(()),
        }
    }
}

async fn fetch_value(pool: &SqlitePool, key: &str) -> Result<Option<String>> {
    let value: Option<String> = sqlx::query_scalar("SELECT value FROM cache_records WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;

    Ok(value)
}

async fn upsert_value(pool: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO cache_records (key, value, updated_at)
        VALUES (?, ?, ?)
        ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(key)
    .bind(value)
    .bind(now_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}
