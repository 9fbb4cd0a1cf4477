//! `town-engine` — the tick-based engine core for the AI town simulation
//! (component C5): an ordered input queue, a generation-fenced `run_step`,
//! and self-rescheduling.
//!
//! | Module          | Contents                                              |
//! |-----------------|--------------------------------------------------------|
//! | [`engine`]      | `Engine`, `EngineState` — the start/stop/kick FSM      |
//! | [`input`]       | `Input`, `InputResult`                                 |
//! | [`input_queue`] | `InputQueue` — dense ascending-number input drain      |
//! | [`world_rules`] | `WorldRules` — the pluggable apply/advance extension   |
//! | [`step`]        | `run_step`, `insert_input`, `StepOutcome`               |
//! | [`error`]       | `EngineError`, `EngineResult`                           |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                              |
//! |---------|------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to public state types. |

pub mod engine;
pub mod error;
pub mod input;
pub mod input_queue;
pub mod step;
pub mod world_rules;

#[cfg(test)]
mod tests;

pub use engine::{Engine, EngineState};
pub use error::{EngineError, EngineResult};
pub use input::{Input, InputResult};
pub use input_queue::InputQueue;
pub use step::{insert_input, run_step, StepOutcome};
pub use world_rules::WorldRules;
