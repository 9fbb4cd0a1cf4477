//! `EngineClient`: the agent loop's only channel for mutating world state
//! (spec.md §4.7, §5) — it observes the world through [`crate::view::WorldView`]
//! but submits every change as an input, exactly as an end-user RPC or cron
//! job would.

use serde_json::Value;
use town_core::{InputId, WorldId};

use crate::error::AgentResult;

/// Outcome of an input once the engine has applied it, mirroring
/// `town_engine::InputResult` without requiring a dependency on the engine
/// crate — an `EngineClient` may equally be backed by a remote HTTP call.
#[derive(Clone, Debug)]
pub enum InputOutcome {
    Ok(Value),
    Error(String),
}

pub trait EngineClient: Send + Sync {
    async fn send_input(&self, world_id: WorldId, name: &str, args: Value) -> AgentResult<InputId>;
    async fn input_status(&self, input_id: InputId) -> AgentResult<Option<InputOutcome>>;
}
