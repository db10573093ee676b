//! Reasoning Engine Port
//!
//! Abstract interface for the external LLM-driven engine that decides which
//! capability to call and composes the answer. The engine is a black box: it
//! reports what it does as a stream of loosely-typed [`TraceRecord`] frames
//! and calls capabilities back through a [`ToolInvoker`].

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::domain::{CapabilityDescriptor, CapabilityError, ChatMessage, EngineError, TraceRecord};

/// Execution trace of one engine run
pub type TraceStream = BoxStream<'static, Result<TraceRecord, EngineError>>;

/// Everything an engine needs for one run
#[derive(Debug, Clone)]
pub struct EngineRequest {
    pub input: String,
    pub history: Vec<ChatMessage>,
    pub capabilities: Vec<CapabilityDescriptor>,
    /// Deliberation rounds before the engine must stop and answer with what
    /// it has
    pub max_iterations: u32,
}

/// Callback through which the engine runs capabilities
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    async fn invoke(&self, name: &str, input: &str) -> Result<String, CapabilityError>;
}

/// Reasoning engine interface
///
/// Implementations must emit, in order: one `run_start`, any number of
/// `token_delta` / `capability_start` / `capability_end` frames, and one
/// `run_end`. Hitting `max_iterations` is not an error: the engine ends the
/// run with its best partial answer.
///
/// # Example
///
/// ```rust,ignore
/// struct LocalLlama { /* ... */ }
///
/// impl ReasoningEngine for LocalLlama {
///     fn run(&self, request: EngineRequest, tools: Arc<dyn ToolInvoker>) -> TraceStream {
///         // Stream chat completions, call tools, emit frames
///     }
///     // ...
/// }
/// ```
pub trait ReasoningEngine: Send + Sync {
    /// Start a run. Nothing happens until the stream is polled.
    fn run(&self, request: EngineRequest, tools: Arc<dyn ToolInvoker>) -> TraceStream;

    /// Model or backend identifier, for logs and diagnostics
    fn model_id(&self) -> &str;
}
