//! Diagnostics Routes

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use crate::models::{HealthResponse, SearchCheckQuery, SearchCheckResponse, ToolInfo};
use crate::AppState;

const SEARCH_TOOL: &str = "search_tool";
const DEFAULT_SEARCH: &str = "current president of the United States";

/// Service liveness
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    ),
    tag = "Health"
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Registered capabilities in prompt order
#[utoipa::path(
    get,
    path = "/tools",
    responses(
        (status = 200, description = "Registered tools", body = [ToolInfo])
    ),
    tag = "Tools"
)]
pub async fn list_tools(State(state): State<AppState>) -> Json<Vec<ToolInfo>> {
    let registry = &state.session.context().registry;
    Json(registry.all().map(ToolInfo::from).collect())
}

/// Call the search capability directly, bypassing router, engine and cache
#[utoipa::path(
    get,
    path = "/test-search",
    params(SearchCheckQuery),
    responses(
        (status = 200, description = "Search outcome with a preview", body = SearchCheckResponse)
    ),
    tag = "Tools"
)]
pub async fn search_check(
    State(state): State<AppState>,
    Query(query): Query<SearchCheckQuery>,
) -> Json<SearchCheckResponse> {
    let terms = query
        .q
        .filter(|q| !q.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_SEARCH.to_string());

    let Some(search) = state.session.context().registry.get(SEARCH_TOOL) else {
        return Json(SearchCheckResponse::failed(format!(
            "{} is not registered",
            SEARCH_TOOL
        )));
    };

    tracing::info!("🧪 Search check: {}", terms);
    Json(match search.invoke(&terms).await {
        Ok(result) => SearchCheckResponse::completed(&result),
        Err(e) => {
            tracing::warn!("⚠️  Search check failed: {}", e);
            SearchCheckResponse::failed(e)
        }
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/tools", get(list_tools))
        .route("/test-search", get(search_check))
}
