//! OpenAPI Documentation
//!
//! Centralized API documentation using utoipa.

use utoipa::OpenApi;

use crate::models::{
    ChatRequest, HealthResponse, HistoryMessage, HistoryRole, SearchCheckResponse, StreamEvent,
    StreamEventType, ToolInfo,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Chat endpoints
        super::chat::agent_chat,
        // Diagnostics endpoints
        super::diagnostics::health_check,
        super::diagnostics::list_tools,
        super::diagnostics::search_check,
    ),
    info(
        title = "Privy API",
        version = "0.1.0",
        description = "Privy assistant - fact-checking chat with tool use, streamed as server-sent events.",
        license(name = "MIT"),
    ),
    servers(
        (url = "/", description = "Current server"),
    ),
    tags(
        (name = "Chat", description = "Chat - streamed agent answers"),
        (name = "Health", description = "Health check endpoints"),
        (name = "Tools", description = "Tools - registered capabilities"),
    ),
    components(
        schemas(
            // Chat
            HistoryRole,
            HistoryMessage,
            ChatRequest,
            StreamEventType,
            StreamEvent,
            // Diagnostics
            HealthResponse,
            ToolInfo,
            SearchCheckResponse,
        )
    ),
)]
pub struct ApiDoc;
