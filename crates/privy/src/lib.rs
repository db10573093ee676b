//! Privy Core Library
//!
//! Intake-and-dispatch pipeline for the Privy assistant: everything between a
//! raw user utterance and the external reasoning engine.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain/`): Pure types and logic
//!   - `entities/`: Capability descriptors, routing rules, cache records, events
//!   - `value_objects/`: Fingerprints, capability effects
//!   - `errors/`: Capability, engine, cache and configuration errors
//!
//! - **Ports** (`ports/`): Abstract interfaces (traits)
//!   - `repositories/`: Cache persistence
//!   - `services/`: Capabilities, reasoning engine, confirmation policy
//!
//! - **Application Layer** (`application/`): Cache store, capability registry,
//!   fast router, execution bridge and session boundary
//!
//! # Usage
//!
//! ```rust,ignore
//! use privy::application::{BridgeContext, SessionBoundary};
//!
//! let session = SessionBoundary::new(Arc::new(context));
//! let mut events = session.submit("weather london", Vec::new());
//! while let Some(event) = events.next().await {
//!     println!("{}", serde_json::to_string(&event)?);
//! }
//! ```

pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-export commonly used types
pub use application::{
    BridgeContext, CacheStore, CapabilityInvoker, CapabilityRegistry, ExecutionBridge,
    FastRouter, InMemoryCacheRepository, InstantReplies, RegistryBuilder, RunLimits,
    SessionBoundary, SessionStream,
};
pub use config::Settings;
pub use domain::{
    CacheError, CacheKey, CacheRecord, CapabilityDescriptor, CapabilityError, ChatMessage,
    ConfigError, Effect, EngineError, ExecutionEvent, Fingerprint, InputShape, MessageRole,
    OutputEvent, RoutingRule, TraceRecord,
};
pub use ports::{
    AllowList, CacheRepository, Capability, ConfirmPolicy, DenyAll, EngineRequest,
    ReasoningEngine, ToolInvoker, TraceStream,
};
