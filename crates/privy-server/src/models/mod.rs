//! Privy API Data Models
//!
//! - Chat: `/agent-chat` request body
//! - Diagnostics: health and tool listing

mod chat;
mod diagnostics;

pub use chat::*;
pub use diagnostics::*;
