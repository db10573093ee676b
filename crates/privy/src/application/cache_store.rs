//! Cache Store
//!
//! TTL-gated result cache in front of a [`CacheRepository`]. Expired records
//! are ignored on read and overwritten on the next write; nothing is purged.
//! Repository faults degrade to cache misses and never reach the caller.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, RwLock};

use crate::domain::{CacheError, CacheKey, CacheRecord};
use crate::ports::CacheRepository;

/// Default freshness window
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Shared result cache
pub struct CacheStore {
    repo: Arc<dyn CacheRepository>,
    ttl: Duration,
    max_entries: Option<usize>,
    /// Serializes writes so same-key writers land one after another and the
    /// entry bound is checked against a stable count
    write_lock: Mutex<()>,
}

impl CacheStore {
    pub fn new(repo: Arc<dyn CacheRepository>) -> Self {
        Self {
            repo,
            ttl: DEFAULT_TTL,
            max_entries: None,
            write_lock: Mutex::new(()),
        }
    }

    /// Purely in-memory store, lost on restart
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryCacheRepository::default()))
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Stop accepting new keys once `max` records exist
    pub fn with_max_entries(mut self, max: Option<usize>) -> Self {
        self.max_entries = max;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh record under `key`, if any
    pub async fn get(&self, key: &CacheKey) -> Option<CacheRecord> {
        match self.repo.load(key).await {
            Ok(Some(record)) if record.is_fresh(self.ttl, Utc::now()) => {
                tracing::debug!("Cache HIT for {} ('{}')", key, record.query);
                Some(record)
            }
            Ok(Some(_)) => {
                tracing::debug!("Cache entry expired: {}", key);
                None
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("⚠️  Cache read error for {}: {}", key, e);
                None
            }
        }
    }

    /// Create or replace the record under `key`
    pub async fn put(&self, key: &CacheKey, record: CacheRecord) {
        let _guard = self.write_lock.lock().await;

        if let Some(max) = self.max_entries {
            match self.at_capacity(key, max).await {
                Ok(false) => {}
                Ok(true) => {
                    tracing::warn!("⚠️  Cache full ({} entries), not storing {}", max, key);
                    return;
                }
                Err(e) => {
                    tracing::warn!("⚠️  Cache size check failed: {}", e);
                    return;
                }
            }
        }

        if let Err(e) = self.repo.store(key, &record).await {
            tracing::warn!("⚠️  Cache write error for {}: {}", key, e);
        }
    }

    async fn at_capacity(&self, key: &CacheKey, max: usize) -> Result<bool, CacheError> {
        if self.repo.contains(key).await? {
            return Ok(false);
        }
        Ok(self.repo.len().await? >= max)
    }
}

/// Process-local repository
#[derive(Default)]
pub struct InMemoryCacheRepository {
    entries: RwLock<HashMap<CacheKey, CacheRecord>>,
}

#[async_trait]
impl CacheRepository for InMemoryCacheRepository {
    async fn load(&self, key: &CacheKey) -> Result<Option<CacheRecord>, CacheError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn store(&self, key: &CacheKey, record: &CacheRecord) -> Result<(), CacheError> {
        self.entries
            .write()
            .await
            .insert(key.clone(), record.clone());
        Ok(())
    }

    async fn len(&self) -> Result<usize, CacheError> {
        Ok(self.entries.read().await.len())
    }
}
