//! OpenAI Chat Completions wire format
//!
//! Request/response types for the streaming `/chat/completions` endpoint
//! (as served by llama.cpp, vLLM, Ollama and OpenAI itself), plus the two
//! pieces of state a streaming client needs: an SSE line buffer and a tool
//! call accumulator.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use privy::{CapabilityDescriptor, ChatMessage, EngineError, MessageRole};

// ============================================
// Request Types
// ============================================

#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [WireMessage],
    #[serde(skip_serializing_if = "no_tools")]
    pub tools: &'a [WireTool],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<&'static str>,
    pub temperature: f32,
    pub stream: bool,
}

fn no_tools(tools: &&[WireTool]) -> bool {
    tools.is_empty()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<WireToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl WireMessage {
    pub fn text(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn assistant_calls(content: String, calls: Vec<WireToolCall>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: (!content.is_empty()).then_some(content),
            tool_calls: calls,
            tool_call_id: None,
        }
    }

    pub fn tool_result(call_id: &str, output: impl Into<String>) -> Self {
        Self {
            role: "tool".to_string(),
            content: Some(output.into()),
            tool_calls: Vec::new(),
            tool_call_id: Some(call_id.to_string()),
        }
    }
}

impl From<&ChatMessage> for WireMessage {
    fn from(message: &ChatMessage) -> Self {
        let role = match message.role {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        };
        Self::text(role, message.content.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub function: WireFunction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireFunction {
    pub name: String,
    /// JSON-encoded argument object, as produced by the model
    pub arguments: String,
}

impl WireFunction {
    /// Parsed arguments; unparseable text is kept as a bare string
    pub fn parsed_arguments(&self) -> Value {
        if self.arguments.trim().is_empty() {
            return Value::Null;
        }
        serde_json::from_str(&self.arguments)
            .unwrap_or_else(|_| Value::String(self.arguments.clone()))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WireTool {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub function: WireToolSpec,
}

#[derive(Debug, Clone, Serialize)]
pub struct WireToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl From<&CapabilityDescriptor> for WireTool {
    fn from(descriptor: &CapabilityDescriptor) -> Self {
        Self {
            kind: "function",
            function: WireToolSpec {
                name: descriptor.name.clone(),
                description: descriptor.description.clone(),
                parameters: descriptor.input.json_schema(),
            },
        }
    }
}

// ============================================
// Streaming Response Types
// ============================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
    /// Set when the server fails mid-stream (llama.cpp, vLLM)
    #[serde(default)]
    pub error: Option<Value>,
}

impl ChatChunk {
    /// The in-band `{"error": ...}` frame as an engine error
    pub fn stream_error(&self) -> Option<EngineError> {
        let error = self.error.as_ref().filter(|e| !e.is_null())?;
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .or_else(|| error.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());

        let status = error
            .get("code")
            .and_then(Value::as_u64)
            .and_then(|code| u16::try_from(code).ok());
        Some(match status {
            Some(status) => EngineError::Api { status, message },
            None => EngineError::Protocol(message),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: Delta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Delta {
    #[serde(default)]
    pub content: Option<String>,
    /// Some servers send `null` here rather than omitting the field
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCallDelta>>,
}

impl Delta {
    pub fn calls(&self) -> &[ToolCallDelta] {
        self.tool_calls.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolCallDelta {
    #[serde(default)]
    pub index: usize,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub function: Option<FunctionDelta>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FunctionDelta {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arguments: Option<String>,
}

/// Decode one SSE `data:` payload; `None` marks the `[DONE]` sentinel
pub fn parse_data(payload: &str) -> Result<Option<ChatChunk>, EngineError> {
    let payload = payload.trim();
    if payload == "[DONE]" {
        return Ok(None);
    }
    serde_json::from_str(payload)
        .map(Some)
        .map_err(|e| EngineError::Protocol(format!("{}: {}", e, payload)))
}

// ============================================
// Stream State
// ============================================

/// Reassembles SSE `data:` payloads from arbitrarily split byte chunks
#[derive(Debug, Default)]
pub struct SseLineBuffer {
    pending: Vec<u8>,
}

impl SseLineBuffer {
    /// Feed raw bytes, returning every complete `data:` payload
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);
        let mut payloads = Vec::new();

        while let Some(newline) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=newline).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\r', '\n']);
            if let Some(data) = line.strip_prefix("data:") {
                payloads.push(data.trim_start().to_string());
            }
        }
        payloads
    }

    /// Payload left over when the body ends without a trailing newline
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.pending);
        let rest = String::from_utf8_lossy(&rest);
        rest.trim()
            .strip_prefix("data:")
            .map(|data| data.trim_start().to_string())
    }
}

/// Collects streamed tool call fragments keyed by their index
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    calls: BTreeMap<usize, WireToolCall>,
}

impl ToolCallAccumulator {
    pub fn apply(&mut self, deltas: &[ToolCallDelta]) {
        for delta in deltas {
            let call = self.calls.entry(delta.index).or_insert_with(|| WireToolCall {
                id: String::new(),
                kind: "function".to_string(),
                function: WireFunction {
                    name: String::new(),
                    arguments: String::new(),
                },
            });
            if let Some(id) = &delta.id {
                call.id.clone_from(id);
            }
            if let Some(function) = &delta.function {
                if let Some(name) = &function.name {
                    call.function.name.push_str(name);
                }
                if let Some(arguments) = &function.arguments {
                    call.function.arguments.push_str(arguments);
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Completed calls in index order; missing ids are filled in
    pub fn finish(self) -> Vec<WireToolCall> {
        self.calls
            .into_iter()
            .filter(|(_, call)| !call.function.name.is_empty())
            .map(|(index, mut call)| {
                if call.id.is_empty() {
                    call.id = format!("call_{}", index);
                }
                call
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sse_buffer_handles_split_lines() {
        let mut buffer = SseLineBuffer::default();
        assert!(buffer.push(b"data: {\"cho").is_empty());
        let payloads = buffer.push(b"ices\":[]}\n\n: keep-alive\ndata: [DONE]\r\n");
        assert_eq!(payloads, vec!["{\"choices\":[]}", "[DONE]"]);
        assert_eq!(buffer.finish(), None);
    }

    #[test]
    fn test_sse_buffer_flushes_unterminated_tail() {
        let mut buffer = SseLineBuffer::default();
        assert!(buffer.push(b"data: [DONE]").is_empty());
        assert_eq!(buffer.finish().as_deref(), Some("[DONE]"));
    }

    #[test]
    fn test_parse_data() {
        let chunk = parse_data(r#"{"choices":[{"delta":{"content":"Hi"},"finish_reason":null}]}"#)
            .unwrap()
            .unwrap();
        assert_eq!(chunk.choices[0].delta.content.as_deref(), Some("Hi"));
        assert!(parse_data("[DONE]").unwrap().is_none());
        assert!(matches!(parse_data("{not json"), Err(EngineError::Protocol(_))));

        let null_calls = parse_data(r#"{"choices":[{"delta":{"content":null,"tool_calls":null}}]}"#)
            .unwrap()
            .unwrap();
        assert!(null_calls.choices[0].delta.calls().is_empty());
    }

    #[test]
    fn test_in_band_error_frame() {
        let chunk = parse_data(r#"{"error":{"code":500,"message":"context size exceeded"}}"#)
            .unwrap()
            .unwrap();
        assert!(chunk.choices.is_empty());
        match chunk.stream_error() {
            Some(EngineError::Api { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "context size exceeded");
            }
            other => panic!("unexpected {:?}", other),
        }

        let bare = parse_data(r#"{"error":"model crashed"}"#).unwrap().unwrap();
        assert!(matches!(bare.stream_error(), Some(EngineError::Protocol(m)) if m == "model crashed"));

        let plain = parse_data(r#"{"choices":[],"error":null}"#).unwrap().unwrap();
        assert!(plain.stream_error().is_none());
    }

    #[test]
    fn test_tool_call_fragments_are_joined() {
        let mut acc = ToolCallAccumulator::default();
        let first: ChatChunk = serde_json::from_str(
            r#"{"choices":[{"delta":{"tool_calls":[{"index":0,"id":"call_a","function":{"name":"search_tool","arguments":"{\"qu"}}]}}]}"#,
        )
        .unwrap();
        let second: ChatChunk = serde_json::from_str(
            r#"{"choices":[{"delta":{"tool_calls":[{"index":0,"function":{"arguments":"ery\":\"rust\"}"}}]}}]}"#,
        )
        .unwrap();
        acc.apply(first.choices[0].delta.calls());
        acc.apply(second.choices[0].delta.calls());

        let calls = acc.finish();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "call_a");
        assert_eq!(calls[0].function.name, "search_tool");
        assert_eq!(calls[0].function.parsed_arguments()["query"], "rust");
    }

    #[test]
    fn test_request_omits_empty_tools() {
        let messages = vec![WireMessage::text("user", "hi")];
        let request = ChatRequest {
            model: "m",
            messages: &messages,
            tools: &[],
            tool_choice: None,
            temperature: 0.0,
            stream: true,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("tools").is_none());
        assert!(json.get("tool_choice").is_none());
        assert_eq!(json["messages"][0]["content"], "hi");
    }
}
