//! Fast Router
//!
//! Ordered, rule-based classifier that maps an unambiguous query straight to
//! a capability so the caller can skip reasoning-engine deliberation. A miss
//! only costs latency; a wrong hit misroutes conversation, so the default
//! patterns stay conservative.

use std::collections::HashMap;

use regex::Regex;

use crate::application::registry::CapabilityRegistry;
use crate::domain::{normalize, ConfigError, RoutingRule};

/// Built-in rules, highest priority first
pub fn default_rules() -> Vec<RoutingRule> {
    vec![
        RoutingRule::new(r"\b(weather|temperature|forecast)\b", "weather_tool"),
        RoutingRule::new(
            r"\b(tell me|give me|another|new|dad) (a )?jokes?\b|^jokes?[.!?]*$",
            "dad_joke_tool",
        ),
        RoutingRule::new(r"^(run|execute) \S", "terminal_tool"),
        RoutingRule::new(r"^(play|listen to|watch) \S", "youtube_tool"),
    ]
}

struct CompiledRule {
    regex: Regex,
    rule: RoutingRule,
}

/// First-match-wins rule list
pub struct FastRouter {
    rules: Vec<CompiledRule>,
}

impl FastRouter {
    /// Compile `rules`, failing on bad patterns or unknown targets
    pub fn new(rules: Vec<RoutingRule>, registry: &CapabilityRegistry) -> Result<Self, ConfigError> {
        let mut compiled = Vec::with_capacity(rules.len());
        for (index, rule) in rules.into_iter().enumerate() {
            if !registry.contains(&rule.capability) {
                return Err(ConfigError::UnknownRouteTarget {
                    index,
                    capability: rule.capability,
                });
            }
            let regex = Regex::new(&rule.pattern).map_err(|e| ConfigError::InvalidPattern {
                index,
                message: e.to_string(),
            })?;
            compiled.push(CompiledRule { regex, rule });
        }
        Ok(Self { rules: compiled })
    }

    /// A router that never matches
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Capability of the first rule matching the lower-cased, trimmed query
    pub fn classify(&self, query: &str) -> Option<&str> {
        let query = query.trim().to_lowercase();
        self.rules
            .iter()
            .find(|compiled| compiled.regex.is_match(&query))
            .map(|compiled| compiled.rule.capability.as_str())
    }

    pub fn rules(&self) -> impl Iterator<Item = &RoutingRule> + '_ {
        self.rules.iter().map(|compiled| &compiled.rule)
    }
}

/// Canned answers for exact small-talk utterances
#[derive(Debug, Clone, Default)]
pub struct InstantReplies {
    replies: HashMap<String, String>,
}

impl InstantReplies {
    pub fn new<I, K, V>(replies: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            replies: replies
                .into_iter()
                .map(|(k, v)| (normalize(k.as_ref()), v.into()))
                .collect(),
        }
    }

    pub fn standard() -> Self {
        Self::new(default_replies())
    }

    pub fn lookup(&self, query: &str) -> Option<&str> {
        self.replies.get(&normalize(query)).map(String::as_str)
    }
}

pub fn default_replies() -> Vec<(String, String)> {
    [
        ("hello", "Hello! How can I help you today?"),
        ("hi", "Hi there! What can I assist you with?"),
        ("how are you", "I'm doing well, thank you! How can I help you?"),
        ("what is your name", "I'm Privy, your AI assistant!"),
        (
            "who are you",
            "I'm Privy, an AI assistant designed to help you find information.",
        ),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}
