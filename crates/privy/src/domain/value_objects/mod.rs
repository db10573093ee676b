//! Value Objects
//!
//! Immutable value types used across the domain.

mod effect;
mod fingerprint;

pub use effect::*;
pub use fingerprint::*;
