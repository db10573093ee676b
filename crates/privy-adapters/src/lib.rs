//! Privy Adapters
//!
//! Infrastructure implementations of the `privy` ports:
//!
//! - `engine/`: OpenAI-compatible streaming reasoning engine
//! - `tools/`: search, weather, joke, terminal and YouTube capabilities
//! - `storage/`: file-backed cache repository
//! - `bootstrap`: builds a ready-to-serve `BridgeContext` from `Settings`

pub mod bootstrap;
pub mod engine;
pub mod storage;
pub mod tools;

pub use bootstrap::{build_cache, build_context, build_registry, http_client};
pub use engine::OpenAiEngine;
pub use storage::FileCacheRepository;
