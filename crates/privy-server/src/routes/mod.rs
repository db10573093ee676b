//! Privy API Routes
//!
//! - /agent-chat - Streaming chat (SSE)
//! - /health - Liveness
//! - /tools - Registered capabilities

pub mod chat;
pub mod diagnostics;
pub mod swagger;
