//! Cache Record Entity
//!
//! One persisted capability result. Failed results are stored too, so a
//! flaky endpoint is not hammered again inside the TTL window.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::Fingerprint;

/// Namespaced cache key: one namespace per capability
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub namespace: String,
    pub fingerprint: Fingerprint,
}

impl CacheKey {
    pub fn new(namespace: impl Into<String>, query: &str) -> Self {
        Self {
            namespace: namespace.into(),
            fingerprint: Fingerprint::of(query),
        }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.fingerprint)
    }
}

/// Persisted form: `{timestamp, query, result}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// When the result was produced (ISO-8601)
    pub timestamp: DateTime<Utc>,
    /// The original, un-normalized query
    pub query: String,
    /// Capability output, or the failure message when `failed`
    pub result: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub failed: bool,
}

impl CacheRecord {
    pub fn success(query: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            query: query.into(),
            result: result.into(),
            failed: false,
        }
    }

    pub fn failure(query: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            failed: true,
            ..Self::success(query, message)
        }
    }

    /// Set timestamp
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Fresh while strictly younger than `ttl`
    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        match chrono::Duration::from_std(ttl) {
            Ok(ttl) => now - self.timestamp < ttl,
            Err(_) => true,
        }
    }
}
