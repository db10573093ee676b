//! Chat Routes - streamed agent answers over SSE
//!
//! Every event is sent as an SSE `message` whose data is one JSON object:
//! `{"type": "token", "content": ..}`, `{"type": "tool_start", "name": .., "input": ..}`,
//! `{"type": "tool_end", "name": .., "output": ..}` or `{"type": "error", "message": ..}`.
//! A client disconnect drops the stream, which cancels the run.

use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::post,
    Json, Router,
};
use futures::{Stream, StreamExt};

use privy::{ChatMessage, OutputEvent};

use crate::models::{ChatRequest, StreamEvent};
use crate::AppState;

const EVENT_NAME: &str = "message";

/// Stream the answer to one query
#[utoipa::path(
    post,
    path = "/agent-chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Server-sent events, one JSON object per `message` event", body = StreamEvent, content_type = "text/event-stream"),
        (status = 422, description = "Malformed request body")
    ),
    tag = "Chat"
)]
pub async fn agent_chat(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let history: Vec<ChatMessage> = payload.history.into_iter().map(Into::into).collect();
    let run = state.session.submit(payload.input, history);
    tracing::debug!("Streaming run {}", run.run_id());

    Sse::new(run.map(|event| Ok(to_sse(&event)))).keep_alive(KeepAlive::default())
}

fn to_sse(event: &OutputEvent) -> Event {
    Event::default()
        .event(EVENT_NAME)
        .json_data(event)
        .unwrap_or_else(|e| {
            tracing::warn!("⚠️  Failed to encode event: {}", e);
            Event::default()
                .event(EVENT_NAME)
                .data(r#"{"type":"error","message":"Failed to encode event"}"#)
        })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/agent-chat", post(agent_chat))
}
