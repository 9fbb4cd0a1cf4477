//! The `Input` record: an externally submitted, numbered, named command
//! applied exactly once by the engine in ascending `number` order (spec §3
//! invariant 1).

use town_core::{EngineId, InputId, Timestamp};

/// Outcome of applying an [`Input`], written back exactly once (spec §3).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InputResult {
    Ok(serde_json::Value),
    Error(String),
}

impl InputResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, InputResult::Ok(_))
    }
}

/// A single externally submitted command.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Input {
    pub id: InputId,
    pub engine_id: EngineId,
    /// Strictly increasing per engine, assigned at insertion (spec §3
    /// invariant 1). Numbering starts at 1.
    pub number: u64,
    pub name: String,
    pub args: serde_json::Value,
    pub received_ts: Timestamp,
    /// `None` while pending; set exactly once when the engine processes it.
    pub return_value: Option<InputResult>,
}

impl Input {
    pub fn is_pending(&self) -> bool {
        self.return_value.is_none()
    }
}
