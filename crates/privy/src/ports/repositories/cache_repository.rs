//! Cache Repository Port
//!
//! Persistence for capability results, one record per namespaced key.

use async_trait::async_trait;

use crate::domain::{CacheError, CacheKey, CacheRecord};

/// Repository interface for cached capability results
#[async_trait]
pub trait CacheRepository: Send + Sync {
    /// Load the record stored under `key`, fresh or not
    async fn load(&self, key: &CacheKey) -> Result<Option<CacheRecord>, CacheError>;

    /// Atomically create or replace the record under `key`
    async fn store(&self, key: &CacheKey, record: &CacheRecord) -> Result<(), CacheError>;

    /// Whether a record exists under `key`
    async fn contains(&self, key: &CacheKey) -> Result<bool, CacheError> {
        Ok(self.load(key).await?.is_some())
    }

    /// Number of stored records across all namespaces
    async fn len(&self) -> Result<usize, CacheError>;
}
