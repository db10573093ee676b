//! Fingerprint - stable cache key for a query
//!
//! Equivalent queries ("Weather  London", " weather london ") normalize to
//! the same string and therefore share one fingerprint.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Lower-case, trim and collapse internal whitespace runs to one space
pub fn normalize(query: &str) -> String {
    query
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// SHA-256 of a normalized query, hex encoded
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(query: &str) -> Self {
        let digest = Sha256::digest(normalize(query).as_bytes());
        Self(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
