//! Configuration
//!
//! Settings are read from `~/.config/privy/config.toml` (or an explicit
//! path), then overridden by `PRIVY_*` environment variables. `.env` files are
//! honoured. Every field has a default, so an absent file is valid.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::application::{default_replies, default_rules, RunLimits};
use crate::domain::{ConfigError, RoutingRule};

const CONFIG_DIR: &str = "privy";
const CONFIG_FILE: &str = "config.toml";

/// Root settings document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub engine: EngineSettings,
    pub limits: LimitSettings,
    pub cache: CacheSettings,
    pub server: ServerSettings,
    pub tools: ToolSettings,
    pub routing: RoutingSettings,
}

/// OpenAI-compatible reasoning engine endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_iterations: u32,
    pub request_timeout_secs: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/v1".to_string(),
            api_key: "sk-no-key-required".to_string(),
            model: "Qwen3-4B-Instruct-2507-Q4_K_S".to_string(),
            temperature: 0.0,
            max_iterations: 5,
            request_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitSettings {
    pub capability_timeout_secs: u64,
    /// Whole-run deadline; `0` or absent means unbounded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_timeout_secs: Option<u64>,
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            capability_timeout_secs: 30,
            run_timeout_secs: Some(300),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Record directory; defaults to the platform cache dir
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    pub ttl_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_entries: Option<usize>,
    /// Keep the cache in memory only
    pub ephemeral: bool,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            dir: None,
            ttl_secs: 3600,
            max_entries: None,
            ephemeral: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
    pub allowed_origins: Vec<String>,
    /// Side-effecting capabilities the server may run without a prompt
    pub auto_confirm: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
            allowed_origins: vec![
                "http://localhost:5000".to_string(),
                "https://localhost:5001".to_string(),
                "http://localhost:5199".to_string(),
                "https://localhost:7155".to_string(),
            ],
            auto_confirm: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    pub searxng_url: String,
    pub search_results: usize,
    pub weather_url: String,
    pub joke_url: String,
    pub mpv_path: String,
    pub yt_dlp_path: String,
    /// Downloaded media; defaults to `<cache dir>/media`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_dir: Option<PathBuf>,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            searxng_url: "http://localhost:3000/search".to_string(),
            search_results: 5,
            weather_url: "http://wttr.in".to_string(),
            joke_url: "https://icanhazdadjoke.com/".to_string(),
            mpv_path: "mpv".to_string(),
            yt_dlp_path: "yt-dlp".to_string(),
            media_dir: None,
        }
    }
}

/// Fast-path rules and instant replies; `None` keeps the built-ins
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<RoutingRule>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replies: Option<BTreeMap<String, String>>,
}

impl RoutingSettings {
    pub fn rules(&self) -> Vec<RoutingRule> {
        self.rules.clone().unwrap_or_else(default_rules)
    }

    pub fn replies(&self) -> Vec<(String, String)> {
        match &self.replies {
            Some(replies) => replies
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            None => default_replies(),
        }
    }
}

impl Settings {
    /// `~/.config/privy/config.toml`, when a config dir exists
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load `.env`, the config file and environment overrides.
    ///
    /// An explicit `path` must exist; the default path may be absent.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Ok(env_file) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", env_file.display());
        }

        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        settings.apply_overrides(|key| std::env::var(key).ok());
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        tracing::debug!("Read config from {}", path.display());
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply `PRIVY_*` overrides from `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |target: &mut String, key: &str| {
            if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
                *target = value;
            }
        };
        set(&mut self.engine.base_url, "PRIVY_ENGINE_URL");
        set(&mut self.engine.model, "PRIVY_ENGINE_MODEL");
        set(&mut self.engine.api_key, "PRIVY_ENGINE_API_KEY");
        set(&mut self.server.bind, "PRIVY_BIND");
        set(&mut self.tools.searxng_url, "PRIVY_SEARXNG_URL");

        if let Some(dir) = lookup("PRIVY_CACHE_DIR").filter(|v| !v.trim().is_empty()) {
            self.cache.dir = Some(PathBuf::from(dir));
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.max_iterations == 0 {
            return Err(invalid("engine.max_iterations", "must be at least 1"));
        }
        if !(0.0..=2.0).contains(&self.engine.temperature) {
            return Err(invalid("engine.temperature", "must be between 0 and 2"));
        }
        if self.limits.capability_timeout_secs == 0 {
            return Err(invalid("limits.capability_timeout_secs", "must be positive"));
        }
        if self.cache.max_entries == Some(0) {
            return Err(invalid("cache.max_entries", "must be positive"));
        }
        Ok(())
    }

    pub fn run_limits(&self) -> RunLimits {
        RunLimits {
            max_iterations: self.engine.max_iterations,
            capability_timeout: Duration::from_secs(self.limits.capability_timeout_secs),
            run_timeout: self
                .limits
                .run_timeout_secs
                .filter(|&secs| secs > 0)
                .map(Duration::from_secs),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }

    /// Cache record directory, falling back to the platform cache dir
    pub fn cache_dir(&self) -> PathBuf {
        self.cache.dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join(CONFIG_DIR)
        })
    }

    pub fn media_dir(&self) -> PathBuf {
        self.tools
            .media_dir
            .clone()
            .unwrap_or_else(|| self.cache_dir().join("media"))
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        message: message.to_string(),
    }
}
