//! Capability Port
//!
//! A named operation with one textual input and one textual output.

use async_trait::async_trait;

use crate::domain::{CapabilityDescriptor, CapabilityError};

/// Service interface for a callable tool
#[async_trait]
pub trait Capability: Send + Sync {
    /// Static description; must not change after registration
    fn descriptor(&self) -> &CapabilityDescriptor;

    /// Run the capability
    async fn invoke(&self, input: &str) -> Result<String, CapabilityError>;

    /// Convenience accessor for the registered name
    fn name(&self) -> &str {
        &self.descriptor().name
    }
}
