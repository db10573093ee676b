//! Execution Bridge
//!
//! Runs exactly one request: instant reply, fast-path capability call, or a
//! full reasoning-engine run whose trace is translated into the client-facing
//! [`OutputEvent`] stream.
//!
//! Every stream produced here ends either in content or in exactly one
//! `Error` event. A `ToolStart` left without its `ToolEnd` before an `Error`
//! marks an aborted run; clients drop in-flight tool state on `Error`.

use std::sync::Arc;
use std::time::Duration;

use async_stream::stream;
use futures::stream::BoxStream;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::application::cache_store::CacheStore;
use crate::application::invoker::CapabilityInvoker;
use crate::application::registry::CapabilityRegistry;
use crate::application::router::{FastRouter, InstantReplies};
use crate::domain::{ChatMessage, EngineError, ExecutionEvent, OutputEvent, TraceRecord};
use crate::ports::{ConfirmPolicy, EngineRequest, ReasoningEngine, ToolInvoker};

/// Client-facing event stream of one run
pub type OutputStream = BoxStream<'static, OutputEvent>;

/// Resource bounds applied to every run
#[derive(Debug, Clone)]
pub struct RunLimits {
    /// Engine deliberation rounds before a forced answer
    pub max_iterations: u32,
    /// Per-capability call timeout unless the descriptor sets its own
    pub capability_timeout: Duration,
    /// Whole-run deadline
    pub run_timeout: Option<Duration>,
}

impl Default for RunLimits {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            capability_timeout: Duration::from_secs(30),
            run_timeout: Some(Duration::from_secs(300)),
        }
    }
}

/// Long-lived dependencies shared by all runs.
///
/// Built once at startup and read-only afterwards; only the cache store
/// mutates, behind its own lock.
pub struct BridgeContext {
    pub engine: Arc<dyn ReasoningEngine>,
    pub registry: Arc<CapabilityRegistry>,
    pub router: FastRouter,
    pub replies: InstantReplies,
    pub cache: Arc<CacheStore>,
    pub confirm: Arc<dyn ConfirmPolicy>,
    pub limits: RunLimits,
}

impl BridgeContext {
    pub fn new(
        engine: Arc<dyn ReasoningEngine>,
        registry: Arc<CapabilityRegistry>,
        router: FastRouter,
        cache: Arc<CacheStore>,
        confirm: Arc<dyn ConfirmPolicy>,
    ) -> Self {
        Self {
            engine,
            registry,
            router,
            replies: InstantReplies::standard(),
            cache,
            confirm,
            limits: RunLimits::default(),
        }
    }

    pub fn with_replies(mut self, replies: InstantReplies) -> Self {
        self.replies = replies;
        self
    }

    pub fn with_limits(mut self, limits: RunLimits) -> Self {
        self.limits = limits;
        self
    }
}

/// What the engine loop saw on one poll
enum Step {
    Record(TraceRecord),
    Failed(EngineError),
    Closed,
    Expired,
    Cancelled,
}

/// One-shot bridge; `run` consumes it so a bridge can never serve twice
pub struct ExecutionBridge {
    context: Arc<BridgeContext>,
}

impl ExecutionBridge {
    pub fn new(context: Arc<BridgeContext>) -> Self {
        Self { context }
    }

    /// Lazily process `query`; nothing happens until the stream is polled.
    ///
    /// Once `cancel` fires the stream ends without further events and the
    /// invoker refuses new capability calls.
    pub fn run(
        self,
        query: String,
        history: Vec<ChatMessage>,
        cancel: CancellationToken,
    ) -> OutputStream {
        let context = self.context;

        let events = stream! {
            let deadline = context.limits.run_timeout;
            let expired = async move {
                match deadline {
                    Some(limit) => tokio::time::sleep(limit).await,
                    None => std::future::pending::<()>().await,
                }
            };
            tokio::pin!(expired);

            if let Some(reply) = context.replies.lookup(&query) {
                tracing::debug!("⚡ Instant reply");
                yield OutputEvent::token(reply);
                return;
            }

            let invoker = CapabilityInvoker::new(
                context.registry.clone(),
                context.cache.clone(),
                context.confirm.clone(),
                context.limits.capability_timeout,
                cancel.clone(),
            );

            let direct = context.router.classify(&query).and_then(|name| {
                let descriptor = context.registry.descriptor(name)?;
                if descriptor.effect.is_read_only() {
                    Some(name.to_string())
                } else {
                    tracing::debug!("Routed to {} but it needs deliberation", name);
                    None
                }
            });

            if let Some(name) = direct {
                tracing::info!("🚀 Fast path: {}", name);
                let outcome = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    _ = &mut expired => Some(Err(timed_out(deadline))),
                    result = invoker.invoke(&name, query.trim()) => {
                        Some(result.map_err(|e| e.to_string()))
                    }
                };
                match outcome {
                    Some(Ok(output)) => yield OutputEvent::token(output),
                    Some(Err(message)) => yield OutputEvent::error(message),
                    None => tracing::info!("Run cancelled by caller"),
                }
                return;
            }

            let request = EngineRequest {
                input: query.clone(),
                history,
                capabilities: context.registry.all().cloned().collect(),
                max_iterations: context.limits.max_iterations,
            };
            let tools: Arc<dyn ToolInvoker> = Arc::new(invoker);
            tracing::info!("⛓️ Engine run via {}", context.engine.model_id());
            let mut trace = context.engine.run(request, tools);
            let mut saw_token = false;

            loop {
                let step = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Step::Cancelled,
                    _ = &mut expired => Step::Expired,
                    next = trace.next() => match next {
                        Some(Ok(record)) => Step::Record(record),
                        Some(Err(e)) => Step::Failed(e),
                        None => Step::Closed,
                    },
                };

                let record = match step {
                    Step::Record(record) => record,
                    Step::Failed(e) => {
                        tracing::error!("❌ Engine failed: {}", e);
                        yield OutputEvent::error(e.to_string());
                        return;
                    }
                    Step::Closed => {
                        tracing::warn!("⚠️  Engine trace ended without run_end");
                        yield OutputEvent::error("Reasoning engine closed the run without a final answer");
                        return;
                    }
                    Step::Expired => {
                        tracing::warn!("⏱️ Run exceeded its deadline");
                        yield OutputEvent::error(timed_out(deadline));
                        return;
                    }
                    Step::Cancelled => {
                        tracing::info!("Run cancelled by caller");
                        return;
                    }
                };

                let Some(event) = ExecutionEvent::decode(&record) else {
                    tracing::debug!("Dropping unrecognized trace record: {}", record.kind);
                    continue;
                };

                match event {
                    ExecutionEvent::RunStart => tracing::debug!("Engine run started"),
                    ExecutionEvent::TokenDelta(content) => {
                        if !content.is_empty() {
                            saw_token = true;
                            yield OutputEvent::Token { content };
                        }
                    }
                    ExecutionEvent::CapabilityStart { name, input } => {
                        yield OutputEvent::ToolStart { name, input };
                    }
                    ExecutionEvent::CapabilityEnd { name, output } => {
                        yield OutputEvent::ToolEnd { name, output };
                    }
                    ExecutionEvent::RunEnd(Ok(output)) => {
                        if !saw_token {
                            yield OutputEvent::token(output);
                        }
                        tracing::info!("✅ Run finished");
                        return;
                    }
                    ExecutionEvent::RunEnd(Err(message)) => {
                        tracing::error!("❌ Engine reported failure: {}", message);
                        yield OutputEvent::error(message);
                        return;
                    }
                }
            }
        };

        events.boxed()
    }
}

fn timed_out(deadline: Option<Duration>) -> String {
    format!(
        "Run timed out after {}s",
        deadline.unwrap_or_default().as_secs()
    )
}
