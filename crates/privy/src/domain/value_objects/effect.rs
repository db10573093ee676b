//! Effect - what invoking a capability does to the outside world

use serde::{Deserialize, Serialize};

/// Side-effect class of a capability
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    /// Pure lookup; safe to run without deliberation or confirmation
    ReadOnly,
    /// Touches the host (processes, files, playback); gated by confirmation
    SideEffect,
}

impl Effect {
    pub fn is_read_only(self) -> bool {
        matches!(self, Effect::ReadOnly)
    }

    pub fn requires_confirmation(self) -> bool {
        matches!(self, Effect::SideEffect)
    }
}

impl std::fmt::Display for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Effect::ReadOnly => write!(f, "read_only"),
            Effect::SideEffect => write!(f, "side_effect"),
        }
    }
}

impl std::str::FromStr for Effect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "read_only" | "readonly" => Ok(Effect::ReadOnly),
            "side_effect" | "destructive" => Ok(Effect::SideEffect),
            _ => Err(format!("Unknown effect: {}", s)),
        }
    }
}
