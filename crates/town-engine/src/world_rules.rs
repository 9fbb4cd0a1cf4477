//! The pluggable extension point a world implementation provides to the
//! engine core: the engine knows nothing about players, locations, or
//! conversations, only that it can hand an `Input` to `apply_input` and
//! advance simulated time via `advance`.

use std::fmt;

use town_core::Timestamp;

use crate::input::Input;

/// World-specific rules applied by [`crate::run_step`].
///
/// `apply_input` is the "intent" producer of spec §4.6: each handler is
/// total (it either succeeds with a JSON value or returns a typed error; it
/// never panics), matching spec §7's "errors during input application ...
/// do not abort the tick". `advance` is the per-substep "apply" phase:
/// movement integration, collision handling, conversation-lifecycle
/// transitions, run once per `TICK`-sized slice of simulated time.
pub trait WorldRules {
    type Error: fmt::Display;

    /// Apply one already-admitted input, mutating world state. Must never
    /// panic; failures are surfaced as `Err` and written to the input's
    /// `return_value` by the step loop, not propagated to abort the tick.
    fn apply_input(&mut self, input: &Input) -> Result<serde_json::Value, Self::Error>;

    /// Advance world state by exactly `dt_ms` (always `<= TICK`), with `now`
    /// being the simulated time *after* this sub-step.
    fn advance(&mut self, dt_ms: u64, now: Timestamp);
}
