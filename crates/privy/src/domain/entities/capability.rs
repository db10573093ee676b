//! Capability Descriptor Entity
//!
//! Static description of a callable tool. Descriptors are built once at
//! startup and never change afterwards.

use std::time::Duration;

use serde::Serialize;
use serde_json::{json, Value};

use crate::domain::value_objects::Effect;

/// The single textual argument a capability takes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputShape {
    /// Argument name exposed to the reasoning engine (e.g. "query")
    pub parameter: String,
    pub description: String,
    pub required: bool,
}

impl InputShape {
    pub fn required(parameter: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            parameter: parameter.into(),
            description: description.into(),
            required: true,
        }
    }

    pub fn optional(parameter: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            required: false,
            ..Self::required(parameter, description)
        }
    }

    /// JSON schema of the argument object, as tool-calling engines expect it
    pub fn json_schema(&self) -> Value {
        let required: Vec<&str> = if self.required {
            vec![self.parameter.as_str()]
        } else {
            Vec::new()
        };
        let mut properties = serde_json::Map::new();
        properties.insert(
            self.parameter.clone(),
            json!({ "type": "string", "description": self.description }),
        );
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Pull the textual input out of engine-supplied arguments.
    ///
    /// Accepts either a JSON object carrying `parameter` or a bare string.
    /// Anything else is passed through as its JSON text.
    pub fn extract(&self, arguments: &Value) -> String {
        match arguments {
            Value::String(text) => text.clone(),
            Value::Object(map) => match map.get(&self.parameter) {
                Some(Value::String(text)) => text.clone(),
                Some(other) => other.to_string(),
                None => String::new(),
            },
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

/// What a capability is called, what it takes and what invoking it does
#[derive(Debug, Clone, Serialize)]
pub struct CapabilityDescriptor {
    pub name: String,
    pub description: String,
    pub input: InputShape,
    pub effect: Effect,
    /// Results are idempotent within the cache TTL
    pub cacheable: bool,
    /// Overrides the invoker's default per-call timeout
    #[serde(skip)]
    pub timeout: Option<Duration>,
}

impl CapabilityDescriptor {
    /// A read-only, non-cached capability
    pub fn new(name: impl Into<String>, description: impl Into<String>, input: InputShape) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input,
            effect: Effect::ReadOnly,
            cacheable: false,
            timeout: None,
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effect = effect;
        self
    }

    pub fn cacheable(mut self) -> Self {
        self.cacheable = true;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
