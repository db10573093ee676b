//! Startup wiring
//!
//! Builds the long-lived [`BridgeContext`] from [`Settings`]: one HTTP
//! client, the five tools, the cache store and the reasoning engine. Called
//! once per process by each front-end.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;

use privy::{
    BridgeContext, CacheRepository, CacheStore, CapabilityRegistry, ConfigError, ConfirmPolicy,
    FastRouter, InMemoryCacheRepository, InstantReplies, Settings,
};

use crate::engine::OpenAiEngine;
use crate::storage::FileCacheRepository;
use crate::tools::{DadJokeTool, SearchTool, TerminalTool, WeatherTool, YoutubeTool};

/// Shared HTTP client for the web-facing tools
pub fn http_client() -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(15))
        .user_agent(concat!("privy/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")
}

/// Register the standard tools in prompt order
pub fn build_registry(settings: &Settings, client: &Client) -> Result<CapabilityRegistry, ConfigError> {
    let tools = &settings.tools;
    CapabilityRegistry::builder()
        .register(Arc::new(SearchTool::new(
            client.clone(),
            tools.searxng_url.clone(),
            tools.search_results,
        )))?
        .register(Arc::new(YoutubeTool::new(
            tools.yt_dlp_path.clone(),
            tools.mpv_path.clone(),
            settings.media_dir(),
        )))?
        .register(Arc::new(TerminalTool::new(tools.mpv_path.clone())))?
        .register(Arc::new(WeatherTool::new(
            client.clone(),
            tools.weather_url.clone(),
        )))?
        .register(Arc::new(DadJokeTool::new(client.clone(), tools.joke_url.clone())))
        .map(|builder| builder.build())
}

pub fn build_cache(settings: &Settings) -> CacheStore {
    let repo: Arc<dyn CacheRepository> = if settings.cache.ephemeral {
        tracing::info!("💾 Cache: in-memory");
        Arc::new(InMemoryCacheRepository::default())
    } else {
        let dir = settings.cache_dir();
        tracing::info!("💾 Cache: {}", dir.display());
        Arc::new(FileCacheRepository::new(dir))
    };

    CacheStore::new(repo)
        .with_ttl(settings.cache_ttl())
        .with_max_entries(settings.cache.max_entries)
}

/// Everything a session needs, wired from `settings`
pub fn build_context(settings: &Settings, confirm: Arc<dyn ConfirmPolicy>) -> Result<BridgeContext> {
    settings.validate()?;

    let client = http_client()?;
    let registry = Arc::new(build_registry(settings, &client)?);
    let router = FastRouter::new(settings.routing.rules(), &registry)
        .context("Invalid routing rules")?;
    let replies = InstantReplies::new(settings.routing.replies());
    let engine = OpenAiEngine::from_settings(&settings.engine)?;

    Ok(BridgeContext::new(
        Arc::new(engine),
        registry,
        router,
        Arc::new(build_cache(settings)),
        confirm,
    )
    .with_replies(replies)
    .with_limits(settings.run_limits()))
}
