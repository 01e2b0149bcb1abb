//! [`ResultCache`] implementations.
//!
//! - **[`MemoryCache`]**: in-process moka cache with per-entry TTL.
//! - **[`SqliteCache`]**: `cache_entries` table; survives restarts and is
//!   shared between processes pointing at the same database.
//!
//! Both honour the TTL passed to [`ResultCache::put`]. Entries are never
//! updated in place by the search path; a key is rewritten only after its
//! previous entry expired.

use anyhow::{bail, Result};
use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::CacheConfig;
use crate::traits::ResultCache;

// ============ Memory ============

#[derive(Clone)]
struct Entry {
    value: String,
    ttl: Duration,
}

/// Expires each entry after the TTL it was written with.
struct PerEntryTtl;

impl Expiry<String, Entry> for PerEntryTtl {
    fn expire_after_create(&self, _key: &String, entry: &Entry, _created_at: Instant) -> Option<Duration> {
        Some(entry.ttl)
    }
}

pub struct MemoryCache {
    cache: Cache<String, Entry>,
}

impl MemoryCache {
    pub fn new(max_entries: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .expire_after(PerEntryTtl)
            .build();
        Self { cache }
    }
}

#[async_trait]
impl ResultCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.cache.get(key).await.map(|e| e.value))
    }

    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        self.cache.insert(key.to_string(), Entry { value, ttl }).await;
        Ok(())
    }
}

// ============ SQLite ============

pub struct SqliteCache {
    pool: SqlitePool,
}

impl SqliteCache {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[async_trait]
impl ResultCache for SqliteCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM cache_entries WHERE key = ? AND expires_at > ?")
                .bind(key)
                .bind(now_ms())
                .fetch_optional(&self.pool)
                .await?;
        Ok(value)
    }

    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let now = now_ms();
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);

        sqlx::query("DELETE FROM cache_entries WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await?;

        sqlx::query("INSERT OR REPLACE INTO cache_entries (key, value, expires_at) VALUES (?, ?, ?)")
            .bind(key)
            .bind(value)
            .bind(now.saturating_add(ttl_ms))
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// Create the configured [`ResultCache`]. `pool` backs the `sqlite` backend.
pub fn create_cache(config: &CacheConfig, pool: SqlitePool) -> Result<Arc<dyn ResultCache>> {
    match config.backend.as_str() {
        "memory" => Ok(Arc::new(MemoryCache::new(config.max_entries))),
        "sqlite" => Ok(Arc::new(SqliteCache::new(pool))),
        other => bail!("Unknown cache backend: {}", other),
    }
}
