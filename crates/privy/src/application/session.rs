//! Session Boundary
//!
//! Binds one inbound request to one bridge run. The returned stream owns the
//! run's cancellation token: dropping it (the caller went away) cancels the
//! run, which stops further capability calls and drops in-flight ones.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::application::bridge::{BridgeContext, ExecutionBridge, OutputStream};
use crate::domain::{ChatMessage, OutputEvent};

/// Entry point for front-ends
#[derive(Clone)]
pub struct SessionBoundary {
    context: Arc<BridgeContext>,
}

impl SessionBoundary {
    pub fn new(context: Arc<BridgeContext>) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &Arc<BridgeContext> {
        &self.context
    }

    /// Start a run for `query`; events are produced as the stream is polled
    pub fn submit(&self, query: impl Into<String>, history: Vec<ChatMessage>) -> SessionStream {
        let query = query.into();
        let run_id = Uuid::new_v4();
        let cancel = CancellationToken::new();
        let span = tracing::info_span!("run", id = %run_id);

        span.in_scope(|| {
            tracing::info!(
                "📨 New run ({} chars, {} history messages)",
                query.chars().count(),
                history.len()
            );
        });

        let inner = ExecutionBridge::new(self.context.clone()).run(query, history, cancel.clone());
        SessionStream {
            run_id,
            inner,
            cancel,
            span,
            finished: false,
        }
    }
}

/// Event stream of one run
pub struct SessionStream {
    run_id: Uuid,
    inner: OutputStream,
    cancel: CancellationToken,
    span: tracing::Span,
    finished: bool,
}

impl SessionStream {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Token that cancels this run, for callers that stop it without dropping
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Stream for SessionStream {
    type Item = OutputEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }
        let span = self.span.clone();
        let _entered = span.enter();
        let polled = self.inner.poll_next_unpin(cx);
        if let Poll::Ready(None) = polled {
            self.finished = true;
            tracing::debug!("Run stream complete");
        }
        polled
    }
}

impl Drop for SessionStream {
    fn drop(&mut self) {
        if !self.finished {
            let _entered = self.span.enter();
            tracing::info!("🔌 Caller disconnected, cancelling run");
        }
        self.cancel.cancel();
    }
}
