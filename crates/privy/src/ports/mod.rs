//! Ports (Interfaces)
//!
//! Abstract interfaces that define how the application layer
//! interacts with external systems (engine, tools, storage, the user).
//!
//! Implementations of these traits live in `privy-adapters` and the
//! front-end crates.

pub mod repositories;
pub mod services;

// Re-exports
pub use repositories::*;
pub use services::*;
