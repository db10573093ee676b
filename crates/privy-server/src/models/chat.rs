//! Chat - one user query plus optional prior turns

use privy::{ChatMessage, MessageRole};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Speaker of a prior turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRole {
    System,
    User,
    Assistant,
}

/// One prior conversation turn
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HistoryMessage {
    pub role: HistoryRole,
    pub content: String,
}

impl From<HistoryMessage> for ChatMessage {
    fn from(message: HistoryMessage) -> Self {
        let role = match message.role {
            HistoryRole::System => MessageRole::System,
            HistoryRole::User => MessageRole::User,
            HistoryRole::Assistant => MessageRole::Assistant,
        };
        ChatMessage {
            role,
            content: message.content,
        }
    }
}

// ============================================
// Request/Response DTOs
// ============================================

/// Chat request
#[derive(Debug, Deserialize, ToSchema)]
pub struct ChatRequest {
    /// The user's query
    pub input: String,
    /// Earlier turns, oldest first
    #[serde(default)]
    pub history: Vec<HistoryMessage>,
}

/// Kind of a streamed chat event
#[allow(dead_code)]
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StreamEventType {
    Token,
    ToolStart,
    ToolEnd,
    Error,
}

/// Shape of each SSE `message` payload (documentation only)
#[allow(dead_code)]
#[derive(Debug, Serialize, ToSchema)]
pub struct StreamEvent {
    #[serde(rename = "type")]
    pub kind: StreamEventType,
    /// `token`
    pub content: Option<String>,
    /// `tool_start`, `tool_end`
    pub name: Option<String>,
    /// `tool_start`
    pub input: Option<String>,
    /// `tool_end`
    pub output: Option<String>,
    /// `error`
    pub message: Option<String>,
}
