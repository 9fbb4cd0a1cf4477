//! `basic` — smallest runnable wiring example for the AI town simulation
//! engine: two players join, one walks toward the other, they strike up a
//! conversation, and a client-side clock replays the engine's reported
//! server-time intervals. Counterpart of the teacher framework's
//! `examples/xsmall`, scaled down to the handful of ticks needed to exercise
//! every layer (store → engine → world → client) end to end.

use std::time::Instant;

use anyhow::Result;
use serde_json::json;
use tracing_subscriber::EnvFilter;

use town_client::{ClientClock, ServerInterval};
use town_core::{EngineConfig, EngineId, Timestamp, WorldId};
use town_engine::{insert_input, run_step, Engine, InputQueue, StepOutcome};
use town_spatial::Map;
use town_store::MemStore;
use town_world::{player_positions, AiTown};

const WORLD_WIDTH: usize = 16;
const WORLD_HEIGHT: usize = 16;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== basic — AI town simulation engine ===");

    let config = EngineConfig::default();
    let store = MemStore::new();
    let mut engine = Engine::new(EngineId(1));
    let mut queue = InputQueue::new();
    let mut town = AiTown::new(WorldId(1), Map::new(WORLD_WIDTH, WORLD_HEIGHT), config);
    let mut clock = ClientClock::new();

    let mut now = Timestamp(0);
    engine.start(now);

    // Two players join a few tiles apart.
    insert_input(
        &mut engine,
        &mut queue,
        "join",
        json!({"name": "alice", "description": "a curious wanderer", "character": "f1", "x": 0.0, "y": 0.0}),
        now,
        &town.config,
    );
    insert_input(
        &mut engine,
        &mut queue,
        "join",
        json!({"name": "bob", "description": "a friendly baker", "character": "f2", "x": 5.0, "y": 0.0}),
        now,
        &town.config,
    );

    // One step to admit the joins before anyone can be addressed by id.
    now = now.offset(config.step_interval_ms);
    run_one_step(&mut engine, &mut queue, &mut town, &store, &mut clock, now);

    let alice_id = town.players.find(|p| p.name == "alice").map(|(id, _)| id.0).expect("alice joined");
    let bob_id = town.players.find(|p| p.name == "bob").map(|(id, _)| id.0).expect("bob joined");

    insert_input(
        &mut engine,
        &mut queue,
        "moveTo",
        json!({"playerId": alice_id, "x": 5.0, "y": 0.0}),
        now,
        &town.config,
    );
    insert_input(
        &mut engine,
        &mut queue,
        "startConversation",
        json!({"playerId": alice_id, "inviteeId": bob_id}),
        now,
        &town.config,
    );
    insert_input(
        &mut engine,
        &mut queue,
        "acceptInvite",
        json!({"conversationId": 1, "playerId": bob_id}),
        now,
        &town.config,
    );

    // Drive the simulation forward until alice has had time to walk over and
    // the conversation has a chance to reach `participating`.
    let t0 = Instant::now();
    for _ in 0..8 {
        now = now.offset(config.step_interval_ms);
        run_one_step(&mut engine, &mut queue, &mut town, &store, &mut clock, now);
    }
    let elapsed = t0.elapsed();

    println!();
    println!("Simulated {} ticks in {:.3} ms", 8 * config.step_interval_ms / config.tick_ms, elapsed.as_secs_f64() * 1000.0);
    println!();
    println!("{:<10} {:<12}", "Player", "Position");
    println!("{}", "-".repeat(24));
    for (name, (x, y)) in player_positions(&town) {
        println!("{name:<10} ({x:.2}, {y:.2})");
    }

    // Replay the reported server-time intervals through the client clock,
    // as a renderer would on every animation frame.
    println!();
    println!("Client time-sync playback:");
    for frame_client_now in (0..=config.step_interval_ms * 8).step_by(250) {
        let playback = clock.advance(Timestamp(frame_client_now))?;
        println!(
            "  clientNow={:<6} -> serverTs={:<6} bufferHealth={}ms",
            frame_client_now, playback.server_ts.0, playback.buffer_health_ms
        );
    }

    Ok(())
}

/// Run one engine step and, on success, flush the world's game/historical
/// tables and feed the committed interval into the client clock — the
/// orchestration spec §4.5 leaves to the caller.
fn run_one_step(
    engine: &mut Engine,
    queue: &mut InputQueue,
    town: &mut AiTown,
    store: &MemStore,
    clock: &mut ClientClock,
    now: Timestamp,
) {
    let generation = engine.generation;
    let prev_ts = engine.current_time.unwrap_or(now);
    let config = town.config;
    match run_step(engine, generation, queue, town, now, &config) {
        StepOutcome::Ran { new_last_step_ts, inputs_processed, .. } => {
            town.flush(store).expect("flush should not fail against an in-memory store");
            clock
                .observe(ServerInterval::new(prev_ts, new_last_step_ts))
                .expect("steps commit in non-decreasing order");
            tracing::info!(%new_last_step_ts, inputs_processed, "step committed");
        }
        StepOutcome::Fenced => {
            tracing::warn!("step fenced unexpectedly in demo harness");
        }
    }
}
