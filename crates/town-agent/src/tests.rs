use std::sync::atomic::{AtomicUsize, Ordering};

use futures::stream;
use town_core::{AgentId, ConversationId, EngineConfig, PlayerId, Point, Timestamp};

use crate::backoff::BackoffLlmClient;
use crate::error::{LlmError, LlmResult};
use crate::llm::{ChatRequest, ChatResponse, LlmClient};
use crate::policy::{decide, AgentCooldowns, PlannedAction};
use crate::streaming::truncate_at_stop_words;
use crate::view::{Activity, AgentSnapshot, ConversationView, PendingInvite};

fn base_snapshot() -> AgentSnapshot {
    AgentSnapshot {
        agent_id: AgentId(1),
        player_id: PlayerId(1),
        identity: "alice".to_string(),
        plan: String::new(),
        position: Point::new(0.0, 0.0),
        activity: Activity::Idle,
        pending_invite: None,
        conversation: None,
        nearby_free_players: Vec::new(),
        now: Timestamp(0),
    }
}

// ── policy::decide ──────────────────────────────────────────────────────────

#[test]
fn stale_invite_auto_rejects_even_while_otherwise_idle() {
    let config = EngineConfig::default();
    let mut snapshot = base_snapshot();
    snapshot.pending_invite = Some(PendingInvite {
        conversation_id: ConversationId(7),
        inviter: PlayerId(2),
        received_ts: Timestamp(0),
    });
    snapshot.now = Timestamp(config.invite_timeout_ms);

    let cooldowns = AgentCooldowns::default();
    let mut rng = town_core::AgentRng::new(0, snapshot.agent_id);
    let action = decide(&snapshot, &config, &cooldowns, &mut rng);
    assert_eq!(action, PlannedAction::RejectInvite { conversation_id: ConversationId(7) });
}

#[test]
fn an_active_conversation_always_takes_priority_over_idle_behavior() {
    let config = EngineConfig::default();
    let mut snapshot = base_snapshot();
    snapshot.conversation = Some(ConversationView {
        conversation_id: ConversationId(3),
        peer: PlayerId(2),
        peer_identity: "bob".to_string(),
        recent_messages: vec![],
        message_count: 1,
    });
    snapshot.pending_invite = Some(PendingInvite {
        conversation_id: ConversationId(9),
        inviter: PlayerId(5),
        received_ts: Timestamp(0),
    });

    let cooldowns = AgentCooldowns::default();
    let mut rng = town_core::AgentRng::new(0, snapshot.agent_id);
    let action = decide(&snapshot, &config, &cooldowns, &mut rng);
    assert_eq!(action, PlannedAction::TakeConversationTurn { conversation_id: ConversationId(3) });
}

#[test]
fn a_fresh_invite_is_accepted_when_probability_is_one() {
    let mut config = EngineConfig::default();
    config.invite_accept_probability = 1.0;
    let mut snapshot = base_snapshot();
    snapshot.pending_invite = Some(PendingInvite {
        conversation_id: ConversationId(4),
        inviter: PlayerId(2),
        received_ts: Timestamp(0),
    });
    snapshot.now = Timestamp(1);

    let cooldowns = AgentCooldowns::default();
    let mut rng = town_core::AgentRng::new(0, snapshot.agent_id);
    let action = decide(&snapshot, &config, &cooldowns, &mut rng);
    assert_eq!(action, PlannedAction::AcceptInvite { conversation_id: ConversationId(4) });
}

#[test]
fn starts_a_conversation_with_a_nearby_free_player_off_cooldown() {
    let mut config = EngineConfig::default();
    config.invite_accept_probability = 0.0;
    let mut snapshot = base_snapshot();
    snapshot.nearby_free_players = vec![(PlayerId(9), "carol".to_string(), Point::new(0.1, 0.0))];

    let cooldowns = AgentCooldowns::default();
    let mut rng = town_core::AgentRng::new(0, snapshot.agent_id);
    let action = decide(&snapshot, &config, &cooldowns, &mut rng);
    assert_eq!(action, PlannedAction::StartConversation { invitee: PlayerId(9) });
}

#[test]
fn a_player_still_under_player_conversation_cooldown_is_skipped() {
    let config = EngineConfig::default();
    let mut snapshot = base_snapshot();
    snapshot.nearby_free_players = vec![(PlayerId(9), "carol".to_string(), Point::new(0.1, 0.0))];
    snapshot.now = Timestamp(config.player_conversation_cooldown_ms / 2);

    let mut cooldowns = AgentCooldowns::default();
    cooldowns.per_peer.insert(PlayerId(9), Timestamp(0));
    let mut rng = town_core::AgentRng::new(0, snapshot.agent_id);
    let action = decide(&snapshot, &config, &cooldowns, &mut rng);
    // Not starting a conversation with the cooling-down peer; falls through
    // to a wander decision (possibly idle, depending on the RNG draw), but
    // never StartConversation for player 9.
    assert_ne!(action, PlannedAction::StartConversation { invitee: PlayerId(9) });
}

// ── streaming::truncate_at_stop_words ───────────────────────────────────────

fn ok_stream(chunks: Vec<&'static str>) -> crate::llm::ChatStream {
    Box::pin(stream::iter(chunks.into_iter().map(|s| Ok(s.to_string()))))
}

async fn collect(stream: crate::llm::ChatStream) -> LlmResult<String> {
    use futures::StreamExt;
    let mut stream = stream;
    let mut out = String::new();
    while let Some(chunk) = stream.next().await {
        out.push_str(&chunk?);
    }
    Ok(out)
}

#[tokio::test]
async fn a_stop_word_fully_inside_one_chunk_truncates_before_it() {
    let stream = ok_stream(vec!["hello STOP world"]);
    let truncated = truncate_at_stop_words(stream, vec!["STOP".to_string()]);
    let text = collect(truncated).await.unwrap();
    assert_eq!(text, "hello ");
}

#[tokio::test]
async fn a_stop_word_split_across_a_chunk_boundary_is_still_caught() {
    let stream = ok_stream(vec!["hello ST", "OP world"]);
    let truncated = truncate_at_stop_words(stream, vec!["STOP".to_string()]);
    let text = collect(truncated).await.unwrap();
    assert_eq!(text, "hello ");
}

#[tokio::test]
async fn no_stop_words_passes_everything_through() {
    let stream = ok_stream(vec!["hello ", "world"]);
    let truncated = truncate_at_stop_words(stream, vec![]);
    let text = collect(truncated).await.unwrap();
    assert_eq!(text, "hello world");
}

#[tokio::test]
async fn absent_stop_word_yields_the_full_response() {
    let stream = ok_stream(vec!["just ", "a ", "reply"]);
    let truncated = truncate_at_stop_words(stream, vec!["STOP".to_string()]);
    let text = collect(truncated).await.unwrap();
    assert_eq!(text, "just a reply");
}

// ── backoff::BackoffLlmClient ────────────────────────────────────────────────

struct FlakyClient {
    fail_times: usize,
    calls: AtomicUsize,
    status: u16,
}

impl LlmClient for FlakyClient {
    async fn chat(&self, _request: ChatRequest) -> LlmResult<ChatResponse> {
        let attempt = self.calls.fetch_add(1, Ordering::SeqCst);
        if attempt < self.fail_times {
            Err(LlmError::Http { status: self.status, message: "busy".to_string() })
        } else {
            Ok(ChatResponse::Complete("ok".to_string()))
        }
    }

    async fn embed(&self, _texts: &[String]) -> LlmResult<Vec<Vec<f32>>> {
        Ok(vec![])
    }

    async fn moderate(&self, _text: &str) -> LlmResult<bool> {
        Ok(false)
    }
}

#[tokio::test(start_paused = true)]
async fn retries_on_429_and_eventually_succeeds() {
    let client = BackoffLlmClient::new(FlakyClient { fail_times: 2, calls: AtomicUsize::new(0), status: 429 });

    let handle = tokio::spawn(async move {
        client.chat(ChatRequest { messages: vec![], stop: vec![], stream: false }).await
    });

    // Let the paused clock advance through both backoff sleeps.
    tokio::time::advance(std::time::Duration::from_secs(1)).await;
    tokio::time::advance(std::time::Duration::from_secs(10)).await;

    let result = handle.await.unwrap();
    assert!(matches!(result, Ok(ChatResponse::Complete(s)) if s == "ok"));
}

#[tokio::test]
async fn a_non_retryable_status_propagates_immediately() {
    let client = BackoffLlmClient::new(FlakyClient { fail_times: 5, calls: AtomicUsize::new(0), status: 400 });
    let result = client.chat(ChatRequest { messages: vec![], stop: vec![], stream: false }).await;
    assert!(matches!(result, Err(LlmError::Http { status: 400, .. })));
}
