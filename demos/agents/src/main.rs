//! `agents` — end-to-end wiring of the full component stack with real agent
//! loops (component C7) instead of hand-submitted inputs: two LLM-driven
//! agents join, discover each other, strike up a conversation, and exchange
//! a few turns entirely through their own wake/decide/act cycle, while a
//! background task plays the role of the engine's own self-scheduling
//! (spec §4.5) and a client clock replays the committed server intervals.
//! Counterpart of `demos/basic`, which drives the same store/engine/world/
//! client stack by hand; this one additionally exercises `town-agent`.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::Result;
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

use town_agent::{AgentLoop, ChatRequest, ChatResponse, EngineClient, InputOutcome, LlmClient, LlmResult, Role};
use town_client::{ClientClock, ServerInterval};
use town_core::{AgentId, EngineConfig, EngineId, InputId, Timestamp, WorldId};
use town_engine::{insert_input, run_step, Engine, InputQueue, InputResult, StepOutcome};
use town_spatial::Map;
use town_store::MemStore;
use town_world::{player_positions, AiTown};

const WORLD_WIDTH: usize = 16;
const WORLD_HEIGHT: usize = 16;

/// All mutable simulation state, guarded by one lock so the background
/// stepper and the agents' `EngineClient`/`WorldView` calls never race —
/// the same single-writer-per-engine discipline spec §5 describes, just
/// realized with a mutex instead of a store transaction.
struct Shared {
    engine: Engine,
    queue: InputQueue,
    town: AiTown,
    store: MemStore,
    clock: ClientClock,
    start: Instant,
}

impl Shared {
    fn now(&self) -> Timestamp {
        Timestamp(self.start.elapsed().as_millis() as u64)
    }
}

#[derive(Clone)]
struct WorldHandle(Arc<Mutex<Shared>>);

impl town_agent::WorldView for WorldHandle {
    fn snapshot(&self, agent_id: AgentId) -> Option<town_agent::AgentSnapshot> {
        let shared = self.0.lock().unwrap();
        let now = shared.now();
        town_world::build_agent_snapshot(&shared.town, now, agent_id)
    }
}

impl EngineClient for WorldHandle {
    async fn send_input(&self, _world_id: WorldId, name: &str, args: Value) -> town_agent::AgentResult<InputId> {
        let mut shared = self.0.lock().unwrap();
        let now = shared.now();
        let config = shared.town.config;
        let (input, _kicked) = insert_input(&mut shared.engine, &mut shared.queue, name, args, now, &config);
        Ok(input.id)
    }

    async fn input_status(&self, input_id: InputId) -> town_agent::AgentResult<Option<InputOutcome>> {
        let shared = self.0.lock().unwrap();
        Ok(shared.queue.status_by_id(input_id).map(|result| match result {
            InputResult::Ok(v) => InputOutcome::Ok(v.clone()),
            InputResult::Error(msg) => InputOutcome::Error(msg.clone()),
        }))
    }
}

/// A language model backend that plays back a fixed rotation of lines
/// instead of calling out to a real service — stands in for the `chat`
/// contract of spec.md §6 so this demo has no external dependency.
struct CannedLlm {
    lines: Vec<&'static str>,
}

impl LlmClient for CannedLlm {
    async fn chat(&self, request: ChatRequest) -> LlmResult<ChatResponse> {
        let turn = request.messages.iter().filter(|m| m.role == Role::Assistant).count();
        let line = self.lines.get(turn).copied().unwrap_or("");
        Ok(ChatResponse::Complete(line.to_string()))
    }

    async fn embed(&self, texts: &[String]) -> LlmResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![0.0_f32; 8]).collect())
    }

    async fn moderate(&self, _text: &str) -> LlmResult<bool> {
        Ok(false)
    }
}

/// Runs every `config.step_interval_ms` for the demo's lifetime, standing in
/// for the real deployment's `Store::run_after`-scheduled self-steps
/// (spec §4.5) against the shared in-process state.
async fn stepper(shared: Arc<Mutex<Shared>>, config: EngineConfig) {
    loop {
        tokio::time::sleep(Duration::from_millis(config.step_interval_ms)).await;
        let mut s = shared.lock().unwrap();
        let now = s.now();
        let generation = s.engine.generation;
        let prev_ts = s.engine.current_time.unwrap_or(now);
        match run_step(&mut s.engine, generation, &mut s.queue, &mut s.town, now, &config) {
            StepOutcome::Ran { new_last_step_ts, inputs_processed, .. } => {
                s.town.flush(&s.store).expect("flush should not fail against an in-memory store");
                s.clock
                    .observe(ServerInterval::new(prev_ts, new_last_step_ts))
                    .expect("steps commit in non-decreasing order");
                if inputs_processed > 0 {
                    tracing::debug!(%new_last_step_ts, inputs_processed, "step committed");
                }
            }
            StepOutcome::Fenced => {}
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== agents — AI town simulation engine, agent-driven ===");

    // Scaled-down cooldowns: spec.md's defaults are tuned for a real
    // deployment running minutes at a time; this demo wants two agents to
    // meet and converse within a few real seconds.
    let config = EngineConfig {
        step_interval_ms: 50,
        message_cooldown_ms: 100,
        awkward_conversation_timeout_ms: 150,
        invite_timeout_ms: 2_000,
        action_timeout_ms: 2_000,
        conversation_cooldown_ms: 0,
        player_conversation_cooldown_ms: 0,
        invite_accept_probability: 1.0,
        max_conversation_messages: 4,
        ..EngineConfig::default()
    };

    let mut engine = Engine::new(EngineId(1));
    engine.start(Timestamp(0));

    let shared = Arc::new(Mutex::new(Shared {
        engine,
        queue: InputQueue::new(),
        town: AiTown::new(WorldId(1), Map::new(WORLD_WIDTH, WORLD_HEIGHT), config),
        store: MemStore::new(),
        clock: ClientClock::new(),
        start: Instant::now(),
    }));

    {
        let mut s = shared.lock().unwrap();
        let now = s.now();
        insert_input(
            &mut s.engine,
            &mut s.queue,
            "join",
            json!({"name": "alice", "description": "a curious wanderer", "character": "f1", "x": 0.0, "y": 0.0}),
            now,
            &config,
        );
        insert_input(
            &mut s.engine,
            &mut s.queue,
            "join",
            json!({"name": "bob", "description": "a friendly baker", "character": "f2", "x": 2.0, "y": 0.0}),
            now,
            &config,
        );
    }

    tokio::spawn(stepper(shared.clone(), config));
    // Let the join inputs land before looking players up by name.
    tokio::time::sleep(Duration::from_millis(config.step_interval_ms * 3)).await;

    let (alice_agent_id, bob_agent_id) = {
        let s = shared.lock().unwrap();
        let (alice_player, _) = s.town.players.find(|p| p.name == "alice").expect("alice joined");
        let (bob_player, _) = s.town.players.find(|p| p.name == "bob").expect("bob joined");
        let (alice_agent, _) = s.town.agents.find(|a| a.player_id == alice_player).expect("alice has an agent");
        let (bob_agent, _) = s.town.agents.find(|a| a.player_id == bob_player).expect("bob has an agent");
        (alice_agent, bob_agent)
    };

    let world_id = WorldId(1);
    let handle = WorldHandle(shared.clone());
    let alice_llm =
        CannedLlm { lines: vec!["Hi there!", "How's your day going?", "Nice to meet you.", "I should get moving."] };
    let bob_llm =
        CannedLlm { lines: vec!["Hello!", "Pretty good, thanks for asking.", "Likewise!", "Take care."] };

    let alice_loop = AgentLoop::new(world_id, alice_agent_id, config, handle.clone(), handle.clone(), alice_llm, 1);
    let bob_loop = AgentLoop::new(world_id, bob_agent_id, config, handle.clone(), handle.clone(), bob_llm, 2);

    let alice_handle = tokio::spawn(alice_loop.run());
    let bob_handle = tokio::spawn(bob_loop.run());

    // Give the agents enough wake-ups to meet, converse, and finish.
    tokio::time::sleep(Duration::from_secs(3)).await;
    alice_handle.abort();
    bob_handle.abort();

    let s = shared.lock().unwrap();

    println!();
    println!("{:<10} {:<12}", "Player", "Position");
    println!("{}", "-".repeat(24));
    for (name, (x, y)) in player_positions(&s.town) {
        println!("{name:<10} ({x:.2}, {y:.2})");
    }

    println!();
    println!("Conversation transcript:");
    let conversations = s.town.conversations.filter(|_| true);
    for (id, conversation) in conversations {
        println!("  conversation {id} (finished: {}):", conversation.finished.is_some());
        for message in &conversation.messages {
            println!("    {}: {}", message.author, message.text);
        }
    }

    drop(s);

    println!();
    println!("Client time-sync playback:");
    let mut s = shared.lock().unwrap();
    let last_now = s.now();
    for frame_client_now in (0..=last_now.0).step_by(250) {
        if let Ok(playback) = s.clock.advance(Timestamp(frame_client_now)) {
            println!(
                "  clientNow={:<6} -> serverTs={:<6} bufferHealth={}ms",
                frame_client_now, playback.server_ts.0, playback.buffer_health_ms
            );
        }
    }

    Ok(())
}
