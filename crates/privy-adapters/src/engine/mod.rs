//! Reasoning Engine Adapters

mod openai;
pub mod wire;

pub use openai::{system_prompt, EngineConfig, OpenAiEngine};
