//! Application Layer
//!
//! Orchestration built on the ports: result caching, the capability catalog,
//! fast-path routing, capability invocation and the per-run bridge.

pub mod bridge;
pub mod cache_store;
pub mod invoker;
pub mod registry;
pub mod router;
pub mod session;

pub use bridge::{BridgeContext, ExecutionBridge, OutputStream, RunLimits};
pub use cache_store::{CacheStore, InMemoryCacheRepository, DEFAULT_TTL};
pub use invoker::CapabilityInvoker;
pub use registry::{CapabilityRegistry, RegistryBuilder};
pub use router::{default_replies, default_rules, FastRouter, InstantReplies};
pub use session::{SessionBoundary, SessionStream};
