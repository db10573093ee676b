//! Diagnostics - service health, registered tools and a live search check

use privy::CapabilityDescriptor;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Characters of search output echoed back by `/test-search`
const PREVIEW_CHARS: usize = 500;

/// Health check response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            service: "privy-api".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// One registered capability
#[derive(Debug, Serialize, ToSchema)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    /// Name of the single input parameter
    pub parameter: String,
    /// `read_only` or `side_effect`
    pub effect: String,
    pub cacheable: bool,
}

impl From<&CapabilityDescriptor> for ToolInfo {
    fn from(descriptor: &CapabilityDescriptor) -> Self {
        Self {
            name: descriptor.name.clone(),
            description: descriptor.description.clone(),
            parameter: descriptor.input.parameter.clone(),
            effect: descriptor.effect.to_string(),
            cacheable: descriptor.cacheable,
        }
    }
}

/// Query for `/test-search`
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchCheckQuery {
    /// Search terms; a fixed factual question when omitted
    pub q: Option<String>,
}

/// Outcome of one direct `search_tool` call
#[derive(Debug, Serialize, ToSchema)]
pub struct SearchCheckResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_preview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchCheckResponse {
    pub fn completed(result: &str) -> Self {
        let length = result.chars().count();
        let preview = if length > PREVIEW_CHARS {
            format!("{}...", result.chars().take(PREVIEW_CHARS).collect::<String>())
        } else {
            result.to_string()
        };
        Self {
            status: "search_tool test completed".to_string(),
            result_length: Some(length),
            result_preview: Some(preview),
            error: None,
        }
    }

    pub fn failed(error: impl ToString) -> Self {
        Self {
            status: "search_tool test failed".to_string(),
            result_length: None,
            result_preview: None,
            error: Some(error.to_string()),
        }
    }
}
