//! Routing Rule Entity

use serde::{Deserialize, Serialize};

/// Maps a query pattern to a capability.
///
/// Priority is the rule's position in its list; the first match wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingRule {
    /// Regular expression matched against the lower-cased, trimmed query
    pub pattern: String,
    /// Name of a registered capability
    pub capability: String,
}

impl RoutingRule {
    pub fn new(pattern: impl Into<String>, capability: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            capability: capability.into(),
        }
    }
}
