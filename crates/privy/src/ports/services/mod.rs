//! Service Ports
//!
//! Abstract interfaces for external services.

mod capability;
mod confirm;
mod reasoning_engine;

pub use capability::*;
pub use confirm::*;
pub use reasoning_engine::*;
