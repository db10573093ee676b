//! Domain Entities
//!
//! - CapabilityDescriptor: What a tool is called, takes and does
//! - RoutingRule: Pattern -> capability mapping for the fast path
//! - CacheRecord: Persisted capability result
//! - Events: Engine trace frames, decoded execution events, client output events
//! - ChatMessage: One turn of conversation history

mod cache_record;
mod capability;
mod event;
mod message;
mod routing_rule;

pub use cache_record::*;
pub use capability::*;
pub use event::*;
pub use message::*;
pub use routing_rule::*;
