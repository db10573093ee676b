//! Capability Invoker
//!
//! The single path through which a run calls capabilities, whether the fast
//! path or the reasoning engine asks. It applies, in order: cancellation,
//! the confirmation gate, the result cache and the per-call timeout.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::application::cache_store::CacheStore;
use crate::application::registry::CapabilityRegistry;
use crate::domain::{CacheKey, CacheRecord, CapabilityError};
use crate::ports::{ConfirmPolicy, ToolInvoker};

/// Per-run invoker bound to one cancellation token
#[derive(Clone)]
pub struct CapabilityInvoker {
    registry: Arc<CapabilityRegistry>,
    cache: Arc<CacheStore>,
    confirm: Arc<dyn ConfirmPolicy>,
    default_timeout: Duration,
    cancel: CancellationToken,
}

impl CapabilityInvoker {
    pub fn new(
        registry: Arc<CapabilityRegistry>,
        cache: Arc<CacheStore>,
        confirm: Arc<dyn ConfirmPolicy>,
        default_timeout: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            registry,
            cache,
            confirm,
            default_timeout,
            cancel,
        }
    }

    async fn call(&self, name: &str, input: &str) -> Result<String, CapabilityError> {
        if self.cancel.is_cancelled() {
            return Err(CapabilityError::Cancelled(name.to_string()));
        }

        let capability = self
            .registry
            .get(name)
            .ok_or_else(|| CapabilityError::Unknown(name.to_string()))?;
        let descriptor = capability.descriptor();

        if descriptor.effect.requires_confirmation() {
            let description = format!("{} wants to run with input `{}`", name, input);
            if !self.confirm.confirm(name, &description).await {
                tracing::info!("✋ {} cancelled by caller", name);
                return Ok(format!("Cancelled by caller: {} was not run.", name));
            }
        }

        let key = descriptor
            .cacheable
            .then(|| CacheKey::new(name, input));

        if let Some(key) = &key {
            if let Some(record) = self.cache.get(key).await {
                return if record.failed {
                    Err(CapabilityError::Replayed {
                        capability: name.to_string(),
                        message: record.result,
                    })
                } else {
                    Ok(record.result)
                };
            }
        }

        let limit = descriptor.timeout.unwrap_or(self.default_timeout);
        let result = tokio::select! {
            _ = self.cancel.cancelled() => {
                return Err(CapabilityError::Cancelled(name.to_string()));
            }
            outcome = tokio::time::timeout(limit, capability.invoke(input)) => match outcome {
                Ok(result) => result,
                Err(_) => Err(CapabilityError::Timeout {
                    capability: name.to_string(),
                    after: limit,
                }),
            },
        };

        if let Some(key) = &key {
            match &result {
                Ok(output) => self.cache.put(key, CacheRecord::success(input, output)).await,
                Err(e) if e.is_cacheable() => {
                    self.cache
                        .put(key, CacheRecord::failure(input, e.to_string()))
                        .await
                }
                Err(_) => {}
            }
        }

        result
    }
}

#[async_trait]
impl ToolInvoker for CapabilityInvoker {
    async fn invoke(&self, name: &str, input: &str) -> Result<String, CapabilityError> {
        tracing::debug!("🛠️ {} <- {}", name, input);
        let result = self.call(name, input).await;
        match &result {
            Ok(output) => tracing::debug!("🛠️ {} -> {} chars", name, output.len()),
            Err(e) => tracing::warn!("🛠️ {} failed: {}", name, e),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CapabilityDescriptor, Effect, InputShape};
    use crate::ports::{AllowList, Capability, DenyAll};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        descriptor: CapabilityDescriptor,
        calls: AtomicUsize,
        delay: Duration,
        fail: bool,
    }

    impl Counting {
        fn new(descriptor: CapabilityDescriptor) -> Arc<Self> {
            Self::build(descriptor, Duration::ZERO, false)
        }

        fn build(descriptor: CapabilityDescriptor, delay: Duration, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                descriptor,
                calls: AtomicUsize::new(0),
                delay,
                fail,
            })
        }
    }

    #[async_trait]
    impl Capability for Counting {
        fn descriptor(&self) -> &CapabilityDescriptor {
            &self.descriptor
        }

        async fn invoke(&self, input: &str) -> Result<String, CapabilityError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if self.fail {
                Err(CapabilityError::failed(&self.descriptor.name, "upstream 503"))
            } else {
                Ok(format!("result for {}", input))
            }
        }
    }

    fn invoker(cap: Arc<Counting>, confirm: Arc<dyn ConfirmPolicy>) -> CapabilityInvoker {
        let registry = CapabilityRegistry::builder().register(cap).unwrap().build();
        CapabilityInvoker::new(
            Arc::new(registry),
            Arc::new(CacheStore::in_memory()),
            confirm,
            Duration::from_secs(5),
            CancellationToken::new(),
        )
    }

    fn search() -> CapabilityDescriptor {
        CapabilityDescriptor::new("search_tool", "", InputShape::required("query", "")).cacheable()
    }

    #[tokio::test]
    async fn test_cacheable_result_served_from_cache() {
        let cap = Counting::new(search());
        let invoker = invoker(cap.clone(), Arc::new(DenyAll));

        let first = invoker.invoke("search_tool", "Rust news").await.unwrap();
        let second = invoker.invoke("search_tool", "  rust   NEWS").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(cap.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_is_cached_and_replayed() {
        let cap = Counting::build(search(), Duration::ZERO, true);
        let invoker = invoker(cap.clone(), Arc::new(DenyAll));

        assert!(invoker.invoke("search_tool", "q").await.is_err());
        let replay = invoker.invoke("search_tool", "q").await.unwrap_err();
        assert!(matches!(replay, CapabilityError::Replayed { .. }));
        assert!(replay.to_string().contains("upstream 503"));
        assert_eq!(cap.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeout_is_reported_and_cached() {
        let descriptor = search().with_timeout(Duration::from_millis(20));
        let cap = Counting::build(descriptor, Duration::from_secs(5), false);
        let invoker = invoker(cap.clone(), Arc::new(DenyAll));

        let err = invoker.invoke("search_tool", "slow").await.unwrap_err();
        assert!(matches!(err, CapabilityError::Timeout { .. }));
        assert!(err.to_string().contains("timed out"));

        let replay = invoker.invoke("search_tool", "slow").await.unwrap_err();
        assert!(replay.to_string().contains("timed out"));
        assert_eq!(cap.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_side_effect_denied_without_invoking() {
        let descriptor = CapabilityDescriptor::new("terminal_tool", "", InputShape::required("command", ""))
            .with_effect(Effect::SideEffect);
        let cap = Counting::new(descriptor);
        let invoker = invoker(cap.clone(), Arc::new(DenyAll));

        let output = invoker.invoke("terminal_tool", "rm -rf /tmp/x").await.unwrap();
        assert!(output.starts_with("Cancelled by caller"));
        assert_eq!(cap.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_side_effect_allowed_by_policy() {
        let descriptor = CapabilityDescriptor::new("terminal_tool", "", InputShape::required("command", ""))
            .with_effect(Effect::SideEffect);
        let cap = Counting::new(descriptor);
        let invoker = invoker(cap.clone(), Arc::new(AllowList::new(["terminal_tool"])));

        let output = invoker.invoke("terminal_tool", "date").await.unwrap();
        assert_eq!(output, "result for date");
        assert_eq!(cap.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_run_makes_no_calls() {
        let cap = Counting::new(search());
        let invoker = invoker(cap.clone(), Arc::new(DenyAll));
        invoker.cancel.cancel();

        let err = invoker.invoke("search_tool", "q").await.unwrap_err();
        assert!(matches!(err, CapabilityError::Cancelled(_)));
        assert_eq!(cap.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_capability() {
        let invoker = invoker(Counting::new(search()), Arc::new(DenyAll));
        let err = invoker.invoke("stock_tool", "AAPL").await.unwrap_err();
        assert_eq!(err, CapabilityError::Unknown("stock_tool".to_string()));
    }
}
