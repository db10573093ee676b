//! Confirmation Policy Port
//!
//! Consulted before any side-effecting capability runs. Front-ends supply
//! their own policy: an interactive prompt for the CLI, an allow-list for the
//! HTTP service.

use std::collections::HashSet;

use async_trait::async_trait;

/// Decides whether a side-effecting invocation may proceed
#[async_trait]
pub trait ConfirmPolicy: Send + Sync {
    /// `capability` is the registered name, `description` a human-readable
    /// summary of what is about to happen
    async fn confirm(&self, capability: &str, description: &str) -> bool;
}

/// Refuses everything
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAll;

#[async_trait]
impl ConfirmPolicy for DenyAll {
    async fn confirm(&self, capability: &str, _description: &str) -> bool {
        tracing::debug!("Confirmation denied for {} (deny-all policy)", capability);
        false
    }
}

/// Allows only pre-authorized capabilities
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    allowed: HashSet<String>,
}

impl AllowList {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: names.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl ConfirmPolicy for AllowList {
    async fn confirm(&self, capability: &str, description: &str) -> bool {
        let allowed = self.allowed.contains(capability);
        if !allowed {
            tracing::info!("🚫 Not pre-authorized: {}", description);
        }
        allowed
    }
}
