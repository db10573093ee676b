//! SearXNG web search

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use privy::{Capability, CapabilityDescriptor, CapabilityError, InputShape};

const NAME: &str = "search_tool";

/// One SearXNG result
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

/// Web search through a local SearXNG instance's JSON API
pub struct SearchTool {
    client: Client,
    url: String,
    limit: usize,
    descriptor: CapabilityDescriptor,
}

impl SearchTool {
    pub fn new(client: Client, url: impl Into<String>, limit: usize) -> Self {
        Self {
            client,
            url: url.into(),
            limit,
            descriptor: CapabilityDescriptor::new(
                NAME,
                "Search the web for current, real-world facts: people, events, places, \
                 news and statistics.",
                InputShape::required("query", "Search terms"),
            )
            .cacheable()
            .with_timeout(Duration::from_secs(10)),
        }
    }
}

#[async_trait]
impl Capability for SearchTool {
    fn descriptor(&self) -> &CapabilityDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, input: &str) -> Result<String, CapabilityError> {
        tracing::info!("🔍 Local search: {}", input);

        let response = self
            .client
            .get(&self.url)
            .query(&[("q", input), ("format", "json"), ("language", "en")])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                CapabilityError::failed(NAME, format!("Error connecting to SearXNG instance: {}", e))
            })?;

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| CapabilityError::failed(NAME, format!("Unreadable SearXNG response: {}", e)))?;

        Ok(format_results(&body.results, self.limit))
    }
}

/// Render the first `limit` hits as the block the engine is prompted with
pub fn format_results(hits: &[SearchHit], limit: usize) -> String {
    if hits.is_empty() {
        return "No results found.".to_string();
    }

    let mut lines = vec!["--- SEARCH RESULTS ---".to_string()];
    for (i, hit) in hits.iter().take(limit).enumerate() {
        let title = hit.title.as_deref().unwrap_or("No Title");
        let url = hit.url.as_deref().unwrap_or("#");
        let snippet = hit
            .content
            .as_deref()
            .unwrap_or("No content available.")
            .replace('\n', " ");
        lines.push(format!(
            "{}. {}\n   URL: {}\n   Snippet: {}",
            i + 1,
            title,
            url,
            snippet
        ));
    }
    lines.join("\n") + "\n--- END ---"
}
