//! wttr.in weather lookup

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use privy::{Capability, CapabilityDescriptor, CapabilityError, InputShape};

const NAME: &str = "weather_tool";
const FORMAT: &str = "%l: %c %t %w %h";

/// Words dropped when a whole query ("what's the weather in london") is
/// passed instead of a bare location
const FILLER: &[&str] = &[
    "weather", "temperature", "forecast", "what", "whats", "what's", "is", "it", "the", "in",
    "for", "at", "of", "like", "today", "tonight", "tomorrow", "now", "right", "current",
    "currently", "how", "hows", "how's", "tell", "me", "show", "give", "please", "a", "there",
];

/// Current conditions from wttr.in's one-line format
pub struct WeatherTool {
    client: Client,
    base_url: String,
    descriptor: CapabilityDescriptor,
}

impl WeatherTool {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            descriptor: CapabilityDescriptor::new(
                NAME,
                "Get the current weather for a location.",
                InputShape::required("location", "City or place name, e.g. London"),
            )
            .cacheable()
            .with_timeout(Duration::from_secs(10)),
        }
    }

    fn url(&self, location: &str) -> String {
        format!(
            "{}/{}?format={}",
            self.base_url,
            urlencoding::encode(location),
            urlencoding::encode(FORMAT)
        )
    }
}

#[async_trait]
impl Capability for WeatherTool {
    fn descriptor(&self) -> &CapabilityDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, input: &str) -> Result<String, CapabilityError> {
        let location = extract_location(input);
        tracing::info!("🌦️ Weather for '{}'", location);

        let body = self
            .client
            .get(self.url(&location))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| CapabilityError::failed(NAME, e))?
            .text()
            .await
            .map_err(|e| CapabilityError::failed(NAME, e))?;

        let report = body.trim();
        if report.is_empty() {
            return Err(CapabilityError::failed(NAME, "empty response from wttr.in"));
        }
        Ok(report.to_string())
    }
}

/// Strip filler words and punctuation, keeping the place name.
///
/// Returns an empty string when nothing is left; wttr.in then geolocates
/// the caller.
pub fn extract_location(query: &str) -> String {
    query
        .split_whitespace()
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric() && c != '-' && c != '\''))
        .filter(|word| !word.is_empty())
        .filter(|word| !FILLER.contains(&word.to_lowercase().as_str()))
        .collect::<Vec<_>>()
        .join(" ")
}
