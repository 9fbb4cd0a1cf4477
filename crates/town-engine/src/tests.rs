use std::fmt;

use town_core::{EngineConfig, EngineId, Timestamp};

use crate::engine::{Engine, EngineState};
use crate::input::InputResult;
use crate::input_queue::InputQueue;
use crate::step::{insert_input, run_step, StepOutcome};
use crate::world_rules::WorldRules;

#[derive(Debug)]
struct TestWorldError;
impl fmt::Display for TestWorldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "test world error")
    }
}

#[derive(Default)]
struct RecordingWorld {
    applied: Vec<String>,
    advance_calls: usize,
}

impl WorldRules for RecordingWorld {
    type Error = TestWorldError;

    fn apply_input(&mut self, input: &crate::input::Input) -> Result<serde_json::Value, Self::Error> {
        self.applied.push(input.name.clone());
        if input.name == "fail" {
            return Err(TestWorldError);
        }
        Ok(serde_json::json!({"applied": input.name}))
    }

    fn advance(&mut self, _dt_ms: u64, _now: Timestamp) {
        self.advance_calls += 1;
    }
}

fn config() -> EngineConfig {
    EngineConfig::default()
}

/// spec.md §8 scenario 1: start at T=0, enqueue A at T=50, B at T=300 (far
/// enough past the next scheduled step that it kicks), at T=500 the tick
/// processes both in ascending-`number` order and `lastStepTs` lands on 500.
#[test]
fn scenario_1_input_ordering_under_kick() {
    let cfg = config();
    let mut engine = Engine::new(EngineId(1));
    let mut queue = InputQueue::new();
    let mut world = RecordingWorld::default();

    engine.start(Timestamp(0));
    // Pretend the engine already completed a step and its next self-schedule
    // is far in the future, so a freshly arriving input can kick it early.
    engine.state = EngineState::Running { scheduled_self_ts: Timestamp(2_000) };

    let (_a, kicked_a) = insert_input(&mut engine, &mut queue, "moveTo", serde_json::json!({}), Timestamp(50), &cfg);
    assert!(kicked_a.is_some(), "A is 1950ms before the scheduled step, past INPUT_DELAY");

    let (_b, kicked_b) =
        insert_input(&mut engine, &mut queue, "startConversation", serde_json::json!({}), Timestamp(300), &cfg);
    // A's kick already rescheduled the step to T=50, which is now overdue
    // relative to B's T=300 arrival, so no further kick is needed.
    assert!(kicked_b.is_none());

    let current_gen = engine.generation;
    let outcome = run_step(&mut engine, current_gen, &mut queue, &mut world, Timestamp(500), &cfg);
    let StepOutcome::Ran { new_last_step_ts, .. } = outcome else { panic!("expected Ran") };

    assert_eq!(world.applied, vec!["moveTo".to_string(), "startConversation".to_string()]);
    assert_eq!(new_last_step_ts, Timestamp(500));
    assert_eq!(engine.last_step_ts, Some(Timestamp(500)));

    // Both inputs resolved, in order, each exactly once.
    assert!(queue.peek(1).unwrap().return_value.is_some());
    assert!(queue.peek(2).unwrap().return_value.is_some());
}

#[test]
fn stale_generation_is_fenced_and_commits_nothing() {
    let cfg = config();
    let mut engine = Engine::new(EngineId(1));
    let mut queue = InputQueue::new();
    let mut world = RecordingWorld::default();

    let gen0 = engine.start(Timestamp(0));
    engine.kick(Timestamp(10)); // bumps to gen1

    let before = engine.last_step_ts;
    let outcome = run_step(&mut engine, gen0, &mut queue, &mut world, Timestamp(20), &cfg);
    assert_eq!(outcome, StepOutcome::Fenced);
    assert_eq!(engine.last_step_ts, before);
    assert_eq!(world.advance_calls, 0);
}

#[test]
fn stopped_engine_fences_run_step() {
    let cfg = config();
    let mut engine = Engine::new(EngineId(1));
    let mut queue = InputQueue::new();
    let mut world = RecordingWorld::default();

    let gen = engine.generation;
    let outcome = run_step(&mut engine, gen, &mut queue, &mut world, Timestamp(100), &cfg);
    assert_eq!(outcome, StepOutcome::Fenced);
}

#[test]
fn input_application_error_does_not_abort_the_tick() {
    let cfg = config();
    let mut engine = Engine::new(EngineId(1));
    let mut queue = InputQueue::new();
    let mut world = RecordingWorld::default();

    let gen = engine.start(Timestamp(0));
    insert_input(&mut engine, &mut queue, "fail", serde_json::json!({}), Timestamp(0), &cfg);
    insert_input(&mut engine, &mut queue, "moveTo", serde_json::json!({}), Timestamp(0), &cfg);

    run_step(&mut engine, gen, &mut queue, &mut world, Timestamp(10), &cfg);

    assert_eq!(world.applied, vec!["fail".to_string(), "moveTo".to_string()]);
    assert!(matches!(queue.peek(1).unwrap().return_value, Some(InputResult::Error(_))));
    assert!(matches!(queue.peek(2).unwrap().return_value, Some(InputResult::Ok(_))));
}

#[test]
fn input_received_after_the_step_window_waits_for_the_next_step() {
    let cfg = config();
    let mut engine = Engine::new(EngineId(1));
    let mut queue = InputQueue::new();
    let mut world = RecordingWorld::default();

    let gen = engine.start(Timestamp(0));
    // Received far in the future relative to this step's window.
    insert_input(&mut engine, &mut queue, "moveTo", serde_json::json!({}), Timestamp(1_000_000), &cfg);

    run_step(&mut engine, gen, &mut queue, &mut world, Timestamp(10), &cfg);
    assert!(world.applied.is_empty());
    assert_eq!(engine.processed_input_number, 0);
}

#[test]
fn advance_is_called_in_tick_sized_substeps() {
    let cfg = config();
    let mut engine = Engine::new(EngineId(1));
    let mut queue = InputQueue::new();
    let mut world = RecordingWorld::default();

    let gen = engine.start(Timestamp(0));
    // 50ms elapsed at 16ms ticks -> ceil(50/16) = 4 substeps.
    run_step(&mut engine, gen, &mut queue, &mut world, Timestamp(50), &cfg);
    assert_eq!(world.advance_calls, 4);
}

#[test]
fn empty_step_with_no_elapsed_time_does_not_advance_current_time() {
    let cfg = config();
    let mut engine = Engine::new(EngineId(1));
    let mut queue = InputQueue::new();
    let mut world = RecordingWorld::default();

    let gen = engine.start(Timestamp(100));
    let before = engine.current_time;
    let outcome = run_step(&mut engine, gen, &mut queue, &mut world, Timestamp(100), &cfg);
    assert_eq!(outcome, StepOutcome::Ran { new_last_step_ts: Timestamp(100), next_scheduled_ts: Timestamp(100).offset(cfg.step_interval_ms), inputs_processed: 0 });
    assert_eq!(engine.current_time, before);
    assert_eq!(world.advance_calls, 0);
}

#[test]
fn step_window_is_capped_at_max_step() {
    let mut cfg = config();
    cfg.max_step_ms = 1_000;
    let mut engine = Engine::new(EngineId(1));
    let mut queue = InputQueue::new();
    let mut world = RecordingWorld::default();

    let gen = engine.start(Timestamp(0));
    let outcome = run_step(&mut engine, gen, &mut queue, &mut world, Timestamp(5_000), &cfg);
    let StepOutcome::Ran { new_last_step_ts, .. } = outcome else { panic!("expected Ran") };
    assert_eq!(new_last_step_ts, Timestamp(1_000));
}

#[test]
fn stop_clears_running_state() {
    let mut engine = Engine::new(EngineId(1));
    engine.start(Timestamp(0));
    assert!(engine.state.is_running());
    engine.stop();
    assert_eq!(engine.state, EngineState::Stopped);
}

#[test]
fn kick_on_stopped_engine_is_a_noop() {
    let mut engine = Engine::new(EngineId(1));
    let gen_before = engine.generation;
    assert!(engine.kick(Timestamp(5)).is_none());
    assert_eq!(engine.generation, gen_before);
}
