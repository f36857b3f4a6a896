use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Canonical node identifier used throughout the crate.
pub type NodeId = String;

/// Keyword mapping flowing into and out of agents.
pub type Payload = Map<String, Value>;

/// Payload key carrying the text that guards inspect and dependents inherit.
pub const TEXT_KEY: &str = "text";

/// Payload key carrying upstream texts for fan-in nodes.
pub const PIECES_KEY: &str = "pieces";

/// Read the `text` field of a payload, treating a missing or non-string
/// value as empty.
pub fn payload_text(payload: &Payload) -> &str {
    payload
        .get(TEXT_KEY)
        .and_then(Value::as_str)
        .unwrap_or("")
}

/// Interposition point at which the guard is consulted.
///
/// Only affects labelling/policy inside the guard; the scheduler treats a
/// block the same way in both modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuardMode {
    Input,
    Output,
}

impl GuardMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GuardMode::Input => "input",
            GuardMode::Output => "output",
        }
    }
}

impl fmt::Display for GuardMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
