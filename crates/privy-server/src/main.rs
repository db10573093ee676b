use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use privy::{AllowList, SessionBoundary, Settings};

mod models;
mod routes;

/// Application state shared across all routes
#[derive(Clone)]
pub struct AppState {
    pub session: SessionBoundary,
}

/// Only the configured front-end origins may call the API from a browser
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("⚠️  Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

fn app(state: AppState, allowed_origins: &[String]) -> Router {
    let openapi = routes::swagger::ApiDoc::openapi();

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
        .merge(routes::chat::router())
        .merge(routes::diagnostics::router())
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("⚠️  Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("👋 Shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("🛡️ Privy API initializing...");

    let config_path = std::env::var_os("PRIVY_CONFIG").map(PathBuf::from);
    let settings = Settings::load(config_path.as_deref()).context("Failed to load configuration")?;

    if settings.server.auto_confirm.is_empty() {
        tracing::info!("🔒 Side-effecting tools disabled (no server.auto_confirm)");
    } else {
        tracing::info!("🔓 Pre-authorized tools: {}", settings.server.auto_confirm.join(", "));
    }
    let confirm = Arc::new(AllowList::new(settings.server.auto_confirm.iter().cloned()));

    let context = privy_adapters::build_context(&settings, confirm)?;
    tracing::info!("🧰 {} tools registered", context.registry.len());

    let state = AppState {
        session: SessionBoundary::new(Arc::new(context)),
    };

    let addr: SocketAddr = settings
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address: {}", settings.server.bind))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("📚 Swagger UI: /swagger-ui");
    tracing::info!("✅ Privy API ready on http://{}", addr);

    axum::serve(listener, app(state, &settings.server.allowed_origins))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}
