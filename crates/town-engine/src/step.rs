//! `run_step`: the generation-fenced tick procedure (spec §4.5).
//!
//! The caller (a real scheduler integration, or `demos/basic`'s in-process
//! harness) is responsible for persisting the returned state via `Store` and
//! for actually calling `Store::run_after(next_scheduled_ts, ...)` to
//! reschedule — `run_step` itself is a pure function over in-memory state;
//! output persistence is entirely the caller's concern.

use town_core::{EngineConfig, Generation, Timestamp};
use tracing::{debug, trace, warn};

use crate::engine::{Engine, EngineState};
use crate::input::InputResult;
use crate::input_queue::InputQueue;
use crate::world_rules::WorldRules;

/// Result of one `run_step` call.
#[derive(Debug, PartialEq)]
pub enum StepOutcome {
    /// `generation` didn't match the engine's current generation, or the
    /// engine was not running: commits nothing (spec §3 invariant 3).
    Fenced,
    /// The step ran (possibly processing zero inputs and advancing zero
    /// simulated time, if called back-to-back with no elapsed wall time).
    Ran {
        new_last_step_ts: Timestamp,
        next_scheduled_ts: Timestamp,
        inputs_processed: usize,
    },
}

/// Run one engine step: drain admissible inputs, advance simulated time in
/// `TICK`-sized sub-steps, and reschedule. Returns [`StepOutcome::Fenced`]
/// without mutating anything if `generation` is stale (spec §4.5 step 1).
pub fn run_step<W: WorldRules>(
    engine: &mut Engine,
    generation: Generation,
    queue: &mut InputQueue,
    world: &mut W,
    now: Timestamp,
    config: &EngineConfig,
) -> StepOutcome {
    if generation != engine.generation {
        trace!(engine_id = %engine.id, ?generation, current = ?engine.generation, "run_step fenced: stale generation");
        return StepOutcome::Fenced;
    }
    let EngineState::Running { .. } = engine.state else {
        trace!(engine_id = %engine.id, "run_step fenced: engine not running");
        return StepOutcome::Fenced;
    };

    let last_step_ts = engine.last_step_ts.unwrap_or(now);
    let elapsed = now.since(last_step_ts);
    let step_window = elapsed.min(config.max_step_ms);
    let window_end = last_step_ts.offset(step_window);

    // ── Drain admissible inputs, strictly in ascending `number` order ─────
    let mut inputs_processed = 0usize;
    loop {
        let next_number = engine.processed_input_number + 1;
        let Some(input) = queue.peek(next_number) else { break };
        if input.received_ts > window_end {
            break;
        }
        let result = match world.apply_input(input) {
            Ok(value) => InputResult::Ok(value),
            Err(e) => {
                warn!(engine_id = %engine.id, number = next_number, error = %e, "input application failed");
                InputResult::Error(e.to_string())
            }
        };
        queue.record_result(next_number, result);
        engine.processed_input_number = next_number;
        inputs_processed += 1;
    }

    // ── Advance simulated time in TICK-sized sub-steps ─────────────────────
    let mut t = last_step_ts;
    while t < window_end {
        let dt = config.tick_ms.min(window_end.since(t));
        t = t.offset(dt);
        world.advance(dt, t);
    }

    engine.current_time = Some(window_end);
    engine.last_step_ts = Some(window_end);
    let next_scheduled_ts = window_end.offset(config.step_interval_ms);
    engine.state = EngineState::Running { scheduled_self_ts: next_scheduled_ts };

    debug!(
        engine_id = %engine.id,
        ?generation,
        inputs_processed,
        new_last_step_ts = %window_end,
        next_scheduled_ts = %next_scheduled_ts,
        "step committed"
    );

    StepOutcome::Ran { new_last_step_ts: window_end, next_scheduled_ts, inputs_processed }
}

/// Enqueue a new input. If the engine is running and its next scheduled
/// step is farther than `config.input_delay_ms` away, kick it so the input
/// is observed promptly (spec §4.5 "this bounds input latency"). Returns the
/// new generation if a kick occurred.
pub fn insert_input(
    engine: &mut Engine,
    queue: &mut InputQueue,
    name: impl Into<String>,
    args: serde_json::Value,
    received_ts: Timestamp,
    config: &EngineConfig,
) -> (crate::input::Input, Option<Generation>) {
    let input = queue.insert(engine.id, name, args, received_ts);

    let kicked = match engine.state.scheduled_self_ts() {
        Some(scheduled) if scheduled.since(received_ts) > config.input_delay_ms => {
            engine.kick(received_ts)
        }
        _ => None,
    };

    (input, kicked)
}
