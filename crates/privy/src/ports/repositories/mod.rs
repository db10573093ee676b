//! Repository Ports
//!
//! Abstract interfaces for persistence.

mod cache_repository;

pub use cache_repository::*;
