//! Domain Errors
//!
//! Error types for capability invocation, reasoning-engine runs, the cache
//! store and startup configuration.

use std::time::Duration;

use thiserror::Error;

/// A capability (tool) failed
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CapabilityError {
    #[error("Unknown capability: {0}")]
    Unknown(String),

    #[error("{capability} timed out after {}s", after.as_secs_f32())]
    Timeout { capability: String, after: Duration },

    #[error("Command '{program}' not found in PATH")]
    MissingExecutable { program: String },

    #[error("'{program}' exited with status {code}: {stderr}")]
    NonZeroExit {
        program: String,
        code: i32,
        stderr: String,
    },

    #[error("{capability} failed: {message}")]
    Failed { capability: String, message: String },

    /// A failure served from the cache instead of re-invoking the capability
    #[error("{message} (cached)")]
    Replayed { capability: String, message: String },

    #[error("Run was cancelled before {0} could execute")]
    Cancelled(String),
}

impl CapabilityError {
    pub fn failed(capability: impl Into<String>, message: impl ToString) -> Self {
        Self::Failed {
            capability: capability.into(),
            message: message.to_string(),
        }
    }

    /// Whether this failure should be written to the cache.
    ///
    /// Cancellation and unknown names say nothing about the external
    /// endpoint, so they are never cached.
    pub fn is_cacheable(&self) -> bool {
        !matches!(
            self,
            Self::Unknown(_) | Self::Cancelled(_) | Self::Replayed { .. }
        )
    }
}

/// The reasoning engine faulted
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Reasoning engine unreachable: {0}")]
    Connection(String),

    #[error("Malformed reasoning engine output: {0}")]
    Protocol(String),

    #[error("Reasoning engine error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error(transparent)]
    Capability(#[from] CapabilityError),
}

/// Cache persistence errors
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache record is corrupt: {0}")]
    Corrupt(String),
}

/// Startup configuration errors; these abort the process before serving
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Capability '{0}' is registered twice")]
    DuplicateCapability(String),

    #[error("Routing rule #{index} targets unregistered capability '{capability}'")]
    UnknownRouteTarget { index: usize, capability: String },

    #[error("Routing rule #{index} has an invalid pattern: {message}")]
    InvalidPattern { index: usize, message: String },

    #[error("Failed to read config from {path}: {message}")]
    Read { path: String, message: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid setting {key}: {message}")]
    Invalid { key: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_mentions_timeout() {
        let err = CapabilityError::Timeout {
            capability: "weather_tool".to_string(),
            after: Duration::from_secs(10),
        };
        assert_eq!(err.to_string(), "weather_tool timed out after 10s");
    }

    #[test]
    fn test_cancellation_is_not_cacheable() {
        assert!(!CapabilityError::Cancelled("search_tool".to_string()).is_cacheable());
        assert!(!CapabilityError::Unknown("nope".to_string()).is_cacheable());
        assert!(CapabilityError::failed("search_tool", "503").is_cacheable());
    }
}
