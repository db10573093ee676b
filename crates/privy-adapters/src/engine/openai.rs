//! OpenAI-compatible Reasoning Engine
//!
//! Tool-calling agent loop over a streaming `/chat/completions` endpoint.
//! Each round streams the model's reply; text becomes `token_delta` frames,
//! tool calls are run through the [`ToolInvoker`] and fed back. When the
//! round limit is hit the engine makes one last call with tools disabled and
//! returns whatever the model answers (force policy).

use std::sync::Arc;
use std::time::Duration;

use async_stream::stream;
use chrono::Local;
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::{Client, StatusCode};

use privy::config::EngineSettings;
use privy::{
    CapabilityError, EngineError, EngineRequest, ReasoningEngine, ToolInvoker, TraceRecord,
    TraceStream,
};

use super::wire::{
    parse_data, ChatRequest, ChunkChoice, SseLineBuffer, ToolCallAccumulator, WireMessage,
    WireTool,
};

const FORCE_PROMPT: &str = "You have reached the tool call limit. Answer the user now using \
only the information gathered so far. Do not call any more tools.";

/// Connection parameters for one OpenAI-compatible server
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
}

impl From<&EngineSettings> for EngineConfig {
    fn from(settings: &EngineSettings) -> Self {
        Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            temperature: settings.temperature,
        }
    }
}

/// Streaming chat-completions engine (llama.cpp server by default)
#[derive(Clone)]
pub struct OpenAiEngine {
    client: Client,
    config: Arc<EngineConfig>,
}

impl OpenAiEngine {
    pub fn new(config: EngineConfig, request_timeout: Duration) -> Result<Self, EngineError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| EngineError::Connection(format!("Failed to build HTTP client: {}", e)))?;

        tracing::info!("🧠 Reasoning engine: {} at {}", config.model, config.base_url);
        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    pub fn from_settings(settings: &EngineSettings) -> Result<Self, EngineError> {
        Self::new(
            EngineConfig::from(settings),
            Duration::from_secs(settings.request_timeout_secs),
        )
    }

    fn initial_messages(&self, request: &EngineRequest) -> Vec<WireMessage> {
        let mut messages = Vec::with_capacity(request.history.len() + 2);
        messages.push(WireMessage::text("system", system_prompt(&current_date())));
        messages.extend(request.history.iter().map(WireMessage::from));
        messages.push(WireMessage::text("user", request.input.clone()));
        messages
    }

    /// Stream the choices of one completion request
    fn completion(
        &self,
        messages: Vec<WireMessage>,
        tools: Vec<WireTool>,
    ) -> BoxStream<'static, Result<ChunkChoice, EngineError>> {
        let engine = self.clone();

        stream! {
            let url = format!("{}/chat/completions", engine.config.base_url);
            let request = ChatRequest {
                model: &engine.config.model,
                messages: &messages,
                tools: &tools,
                tool_choice: (!tools.is_empty()).then_some("auto"),
                temperature: engine.config.temperature,
                stream: true,
            };

            let sent = engine
                .client
                .post(&url)
                .bearer_auth(&engine.config.api_key)
                .json(&request)
                .send()
                .await;
            let response = match sent {
                Ok(response) => response,
                Err(e) => {
                    yield Err(EngineError::Connection(e.to_string()));
                    return;
                }
            };

            if !response.status().is_success() {
                let status = response.status();
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Failed to read error body".to_string());
                yield Err(map_http_error(status, body));
                return;
            }

            let mut body = response.bytes_stream();
            let mut buffer = SseLineBuffer::default();
            let mut finished = false;

            loop {
                let (payloads, eof) = match body.next().await {
                    Some(Ok(bytes)) => (buffer.push(&bytes), false),
                    Some(Err(e)) => {
                        yield Err(EngineError::Connection(e.to_string()));
                        return;
                    }
                    None => (buffer.finish().into_iter().collect::<Vec<_>>(), true),
                };

                for payload in payloads {
                    let chunk = match parse_data(&payload) {
                        Ok(Some(chunk)) => chunk,
                        Ok(None) => return,
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    };
                    if let Some(e) = chunk.stream_error() {
                        yield Err(e);
                        return;
                    }
                    for choice in chunk.choices {
                        finished |= choice.finish_reason.is_some();
                        yield Ok(choice);
                    }
                }

                if eof {
                    break;
                }
            }

            // A reply cut off without [DONE] or a finish_reason is not an answer
            if !finished {
                yield Err(EngineError::Protocol(
                    "stream ended before the reply was complete".to_string(),
                ));
            }
        }
        .boxed()
    }
}

impl ReasoningEngine for OpenAiEngine {
    fn run(&self, request: EngineRequest, tools: Arc<dyn ToolInvoker>) -> TraceStream {
        let engine = self.clone();

        stream! {
            yield Ok(TraceRecord::run_start());

            let wire_tools: Vec<WireTool> = request.capabilities.iter().map(WireTool::from).collect();
            let mut messages = engine.initial_messages(&request);

            for round in 1..=request.max_iterations.max(1) {
                tracing::debug!("Engine round {}/{}", round, request.max_iterations);

                let mut content = String::new();
                let mut pending = ToolCallAccumulator::default();
                let mut choices = engine.completion(messages.clone(), wire_tools.clone());

                while let Some(choice) = choices.next().await {
                    let choice = match choice {
                        Ok(choice) => choice,
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    };
                    pending.apply(choice.delta.calls());
                    if let Some(text) = choice.delta.content.filter(|t| !t.is_empty()) {
                        content.push_str(&text);
                        yield Ok(TraceRecord::token(text));
                    }
                }

                let calls = pending.finish();
                if calls.is_empty() {
                    yield Ok(TraceRecord::run_end(content));
                    return;
                }

                messages.push(WireMessage::assistant_calls(content, calls.clone()));

                for call in calls {
                    let name = call.function.name.clone();
                    let input = match request.capabilities.iter().find(|d| d.name == name) {
                        Some(descriptor) => descriptor.input.extract(&call.function.parsed_arguments()),
                        None => call.function.arguments.clone(),
                    };

                    yield Ok(TraceRecord::capability_start(&name, input.as_str()));
                    let output = match tools.invoke(&name, &input).await {
                        Ok(output) => output,
                        Err(CapabilityError::Unknown(_)) => {
                            tracing::warn!("Model asked for unknown tool {}", name);
                            unknown_tool_reply(&name, &wire_tools)
                        }
                        Err(e) => {
                            yield Err(EngineError::Capability(e));
                            return;
                        }
                    };
                    yield Ok(TraceRecord::capability_end(&name, output.as_str()));
                    messages.push(WireMessage::tool_result(&call.id, output));
                }
            }

            tracing::info!(
                "⏹️ Iteration limit ({}) reached, forcing a final answer",
                request.max_iterations
            );
            messages.push(WireMessage::text("system", FORCE_PROMPT));

            let mut content = String::new();
            let mut choices = engine.completion(messages, Vec::new());
            while let Some(choice) = choices.next().await {
                match choice {
                    Ok(choice) => {
                        if let Some(text) = choice.delta.content.filter(|t| !t.is_empty()) {
                            content.push_str(&text);
                            yield Ok(TraceRecord::token(text));
                        }
                    }
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }
            yield Ok(TraceRecord::run_end(content));
        }
        .boxed()
    }

    fn model_id(&self) -> &str {
        &self.config.model
    }
}

fn current_date() -> String {
    Local::now().format("%A, %B %d, %Y").to_string()
}

/// Instructions sent as the first message of every run
pub fn system_prompt(date: &str) -> String {
    format!(
        "You are Privy, a fact-checking AI assistant. The current date is {date}.\n\
         Your goal is to provide verified, up-to-date information.\n\n\
         Never answer factual questions from memory. Factual questions include who a \
         person is (president, CEO, actor), what a specific event, place or thing is, \
         when something happened, and any statistics or data.\n\n\
         For every query:\n\
         1. Decide whether it is a factual question.\n\
         2. If it is, use `search_tool` to find the current answer. Do not ask for \
         permission to search.\n\
         3. For weather use `weather_tool`; for jokes use `dad_joke_tool`; to run a shell \
         command use `terminal_tool`; to play a video or song use `youtube_tool`.\n\
         4. Otherwise answer conversationally.\n\n\
         Keep answers short and cite what the tools returned."
    )
}

fn unknown_tool_reply(name: &str, tools: &[WireTool]) -> String {
    let known: Vec<&str> = tools.iter().map(|t| t.function.name.as_str()).collect();
    format!(
        "{} is not a valid tool, try one of [{}].",
        name,
        known.join(", ")
    )
}

fn map_http_error(status: StatusCode, body: String) -> EngineError {
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|json| {
            json.get("error")
                .and_then(|err| err.get("message").or(Some(err)))
                .and_then(|msg| msg.as_str())
                .map(|msg| msg.to_string())
        })
        .unwrap_or(body);

    EngineError::Api {
        status: status.as_u16(),
        message,
    }
}
