//! Capability Registry
//!
//! Immutable catalog of capabilities, built once at startup and shared
//! read-only (behind an `Arc`) by every run.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::{CapabilityDescriptor, ConfigError};
use crate::ports::Capability;

/// Collects capabilities before the registry is frozen
#[derive(Default)]
pub struct RegistryBuilder {
    entries: Vec<Arc<dyn Capability>>,
    index: HashMap<String, usize>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a capability; names must be unique
    pub fn register(mut self, capability: Arc<dyn Capability>) -> Result<Self, ConfigError> {
        let name = capability.name().to_string();
        if self.index.contains_key(&name) {
            return Err(ConfigError::DuplicateCapability(name));
        }
        self.index.insert(name, self.entries.len());
        self.entries.push(capability);
        Ok(self)
    }

    pub fn build(self) -> CapabilityRegistry {
        tracing::info!(
            "🧰 Capability registry ready: {}",
            self.entries
                .iter()
                .map(|c| c.name())
                .collect::<Vec<_>>()
                .join(", ")
        );
        CapabilityRegistry {
            entries: self.entries,
            index: self.index,
        }
    }
}

/// Read-only capability catalog
pub struct CapabilityRegistry {
    entries: Vec<Arc<dyn Capability>>,
    index: HashMap<String, usize>,
}

impl CapabilityRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Capability>> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    pub fn descriptor(&self, name: &str) -> Option<&CapabilityDescriptor> {
        self.get(name).map(|c| c.descriptor())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Descriptors in registration order
    pub fn all(&self) -> impl Iterator<Item = &CapabilityDescriptor> + '_ {
        self.entries.iter().map(|c| c.descriptor())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
