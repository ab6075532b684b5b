//! Key-value cache store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use thiserror::Error;
use tokio::time::Instant;

/// Shortest TTL the store accepts.
pub const MIN_TTL: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
}

/// JSON key-value store with per-entry expiry.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError>;

    /// Store `value` under `key`. TTLs below [`MIN_TTL`] are raised to it.
    async fn put(&self, key: &str, value: Value, ttl: Duration) -> Result<(), CacheError>;
}

/// Clamp a requested TTL to the store's floor.
pub fn effective_ttl(ttl: Duration) -> Duration {
    ttl.max(MIN_TTL)
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Instant,
}

/// In-process store. Expired entries are dropped lazily on read.
#[derive(Debug, Clone, Default)]
pub struct MemoryKvStore {
    inner: Arc<DashMap<String, Entry>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[cfg(test)]
    fn insert_expiring_at(&self, key: &str, value: Value, expires_at: Instant) {
        self.inner.insert(key.to_string(), Entry { value, expires_at });
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        let now = Instant::now();
        if let Some(entry) = self.inner.get(key) {
            if entry.expires_at > now {
                return Ok(Some(entry.value.clone()));
            }
        }
        self.inner.remove_if(key, |_, entry| entry.expires_at <= now);
        Ok(None)
    }

    async fn put(&self, key: &str, value: Value, ttl: Duration) -> Result<(), CacheError> {
        let expires_at = Instant::now() + effective_ttl(ttl);
        self.inner.insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }
}
