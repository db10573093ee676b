//! icanhazdadjoke

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CACHE_CONTROL, USER_AGENT};
use reqwest::Client;

use privy::{Capability, CapabilityDescriptor, CapabilityError, InputShape};

const NAME: &str = "dad_joke_tool";

/// Random dad joke; never cached so every call is a new joke
pub struct DadJokeTool {
    client: Client,
    url: String,
    descriptor: CapabilityDescriptor,
}

impl DadJokeTool {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            descriptor: CapabilityDescriptor::new(
                NAME,
                "Get a random dad joke.",
                InputShape::optional("query", "Ignored"),
            )
            .with_timeout(Duration::from_secs(10)),
        }
    }
}

#[async_trait]
impl Capability for DadJokeTool {
    fn descriptor(&self) -> &CapabilityDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, _input: &str) -> Result<String, CapabilityError> {
        tracing::info!("😄 Fetching dad joke...");

        let joke = self
            .client
            .get(&self.url)
            .header(ACCEPT, "text/plain")
            .header(USER_AGENT, "Privy Assistant")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| CapabilityError::failed(NAME, format!("Error fetching joke: {}", e)))?
            .text()
            .await
            .map_err(|e| CapabilityError::failed(NAME, format!("Error fetching joke: {}", e)))?;

        let joke = joke.trim();
        if joke.is_empty() {
            return Ok("Could not fetch a joke at this time.".to_string());
        }
        Ok(joke.to_string())
    }
}
