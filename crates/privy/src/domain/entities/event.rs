//! Execution and Output Events
//!
//! Reasoning engines report progress as loosely-typed [`TraceRecord`] frames.
//! The bridge decodes them into the closed [`ExecutionEvent`] union and
//! projects those onto the client-visible [`OutputEvent`] stream.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Raw trace frame kinds understood by [`ExecutionEvent::decode`]
pub mod kind {
    pub const RUN_START: &str = "run_start";
    pub const TOKEN_DELTA: &str = "token_delta";
    pub const CAPABILITY_START: &str = "capability_start";
    pub const CAPABILITY_END: &str = "capability_end";
    pub const RUN_END: &str = "run_end";
}

/// One frame of a reasoning engine's execution trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceRecord {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub data: Value,
}

impl TraceRecord {
    pub fn new(kind: impl Into<String>, name: Option<String>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            name,
            data,
        }
    }

    pub fn run_start() -> Self {
        Self::new(kind::RUN_START, None, Value::Null)
    }

    pub fn token(content: impl Into<String>) -> Self {
        Self::new(kind::TOKEN_DELTA, None, json!({ "content": content.into() }))
    }

    pub fn capability_start(name: impl Into<String>, input: impl Into<Value>) -> Self {
        Self::new(
            kind::CAPABILITY_START,
            Some(name.into()),
            json!({ "input": input.into() }),
        )
    }

    pub fn capability_end(name: impl Into<String>, output: impl Into<String>) -> Self {
        Self::new(
            kind::CAPABILITY_END,
            Some(name.into()),
            json!({ "output": output.into() }),
        )
    }

    pub fn run_end(output: impl Into<String>) -> Self {
        Self::new(kind::RUN_END, None, json!({ "output": output.into() }))
    }

    pub fn run_failed(error: impl Into<String>) -> Self {
        Self::new(kind::RUN_END, None, json!({ "error": error.into() }))
    }
}

/// Decoded engine trace event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionEvent {
    RunStart,
    TokenDelta(String),
    CapabilityStart { name: String, input: String },
    CapabilityEnd { name: String, output: String },
    /// `Ok(final_output)` or `Err(message)`
    RunEnd(Result<String, String>),
}

impl ExecutionEvent {
    /// Decode a trace frame; `None` for shapes this version does not know.
    pub fn decode(record: &TraceRecord) -> Option<Self> {
        let data = &record.data;
        match record.kind.as_str() {
            kind::RUN_START => Some(Self::RunStart),
            kind::TOKEN_DELTA => data
                .get("content")
                .and_then(Value::as_str)
                .map(|content| Self::TokenDelta(content.to_string())),
            kind::CAPABILITY_START => Some(Self::CapabilityStart {
                name: record.name.clone()?,
                input: text_of(data.get("input")),
            }),
            kind::CAPABILITY_END => Some(Self::CapabilityEnd {
                name: record.name.clone()?,
                output: text_of(data.get("output")),
            }),
            kind::RUN_END => {
                if let Some(error) = data.get("error").filter(|e| !e.is_null()) {
                    return Some(Self::RunEnd(Err(text_of(Some(error)))));
                }
                Some(Self::RunEnd(Ok(text_of(data.get("output")))))
            }
            _ => None,
        }
    }
}

fn text_of(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

/// Client-visible event, serialized as `{"type": ..., ...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputEvent {
    Token { content: String },
    ToolStart { name: String, input: String },
    ToolEnd { name: String, output: String },
    Error { message: String },
}

impl OutputEvent {
    pub fn token(content: impl Into<String>) -> Self {
        Self::Token {
            content: content.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    pub fn is_token(&self) -> bool {
        matches!(self, Self::Token { .. })
    }
}
