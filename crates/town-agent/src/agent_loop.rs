//! `AgentLoop`: the async cooperative task that drives one agent's
//! wake/decide/act cycle (spec.md §4.7).

use std::time::Duration;

use serde_json::{json, Value};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use town_core::{AgentId, AgentRng, EngineConfig, InputId, WorldId};

use crate::engine_client::{EngineClient, InputOutcome};
use crate::error::{AgentError, AgentResult};
use crate::llm::{ChatMessage, ChatRequest, ChatResponse, LlmClient, Role};
use crate::policy::{decide, AgentCooldowns, PlannedAction};
use crate::view::{AgentSnapshot, WorldView};

/// How often `input_status` is polled while waiting on an in-flight input.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub struct AgentLoop<W, E, L> {
    world_id: WorldId,
    agent_id: AgentId,
    config: EngineConfig,
    view: W,
    engine: E,
    llm: L,
    rng: AgentRng,
    cooldowns: AgentCooldowns,
    last_message_ts: Option<town_core::Timestamp>,
}

impl<W, E, L> AgentLoop<W, E, L>
where
    W: WorldView,
    E: EngineClient,
    L: LlmClient,
{
    pub fn new(world_id: WorldId, agent_id: AgentId, config: EngineConfig, view: W, engine: E, llm: L, seed: u64) -> Self {
        Self {
            world_id,
            agent_id,
            config,
            view,
            engine,
            llm,
            rng: AgentRng::new(seed, agent_id),
            cooldowns: AgentCooldowns::default(),
            last_message_ts: None,
        }
    }

    /// Run until the world view stops producing a snapshot for this agent
    /// (the player left, or the world shut down).
    pub async fn run(mut self) {
        loop {
            let Some(snapshot) = self.view.snapshot(self.agent_id) else {
                info!(agent_id = %self.agent_id, "agent snapshot gone; stopping loop");
                return;
            };

            if let Err(e) = self.wake(&snapshot).await {
                warn!(agent_id = %self.agent_id, error = %e, "agent wake-up action failed");
            }

            // Step 5: sleep until the next event or AWKWARD_CONVERSATION_TIMEOUT,
            // whichever first. With no separate event bus wired up, the
            // timeout is this loop's effective poll cadence.
            sleep(Duration::from_millis(self.config.awkward_conversation_timeout_ms)).await;
        }
    }

    async fn wake(&mut self, snapshot: &AgentSnapshot) -> AgentResult<()> {
        let action = decide(snapshot, &self.config, &self.cooldowns, &mut self.rng);
        debug!(agent_id = %self.agent_id, ?action, "agent decided");

        match action {
            PlannedAction::TakeConversationTurn { conversation_id } => {
                self.take_conversation_turn(snapshot, conversation_id).await
            }
            PlannedAction::AcceptInvite { conversation_id } => {
                self.submit_and_await(
                    "acceptInvite",
                    json!({"conversationId": conversation_id.0, "playerId": snapshot.player_id.0}),
                )
                .await
                .map(|_| ())
            }
            PlannedAction::RejectInvite { conversation_id } => {
                self.submit_and_await(
                    "rejectInvite",
                    json!({"conversationId": conversation_id.0, "playerId": snapshot.player_id.0}),
                )
                .await
                .map(|_| ())
            }
            PlannedAction::StartConversation { invitee } => {
                let result = self
                    .submit_and_await(
                        "startConversation",
                        json!({"playerId": snapshot.player_id.0, "inviteeId": invitee.0}),
                    )
                    .await?;
                self.cooldowns.last_conversation_ts = Some(snapshot.now);
                self.cooldowns.per_peer.insert(invitee, snapshot.now);
                debug!(?result, "conversation started");
                Ok(())
            }
            PlannedAction::Wander { x, y } => {
                self.submit_and_await("moveTo", json!({"playerId": snapshot.player_id.0, "x": x, "y": y}))
                    .await
                    .map(|_| ())
            }
            PlannedAction::Idle => Ok(()),
        }
    }

    async fn take_conversation_turn(&mut self, snapshot: &AgentSnapshot, conversation_id: town_core::ConversationId) -> AgentResult<()> {
        let Some(conversation) = &snapshot.conversation else { return Ok(()) };

        if let Some(last) = self.last_message_ts {
            if snapshot.now.since(last) < self.config.message_cooldown_ms {
                return Ok(()); // still within MESSAGE_COOLDOWN
            }
        }

        if conversation.message_count >= self.config.max_conversation_messages {
            return self.leave_conversation(snapshot, conversation_id).await;
        }

        let mut messages = vec![ChatMessage::new(
            Role::System,
            format!(
                "You are {}. You are talking with {}. Keep replies brief.",
                snapshot.identity, conversation.peer_identity
            ),
        )];
        for (speaker, text) in conversation.recent_messages.iter().rev() {
            let role = if *speaker == snapshot.player_id { Role::Assistant } else { Role::User };
            messages.push(ChatMessage::new(role, text.clone()));
        }

        let request = ChatRequest { messages, stop: vec!["\n".to_string()], stream: false };
        let reply = match self.llm.chat(request).await? {
            ChatResponse::Complete(text) => text,
            ChatResponse::Streaming(mut stream) => {
                use futures::StreamExt;
                let mut text = String::new();
                while let Some(chunk) = stream.next().await {
                    text.push_str(&chunk?);
                }
                text
            }
        };

        if reply.trim().is_empty() {
            return self.leave_conversation(snapshot, conversation_id).await;
        }

        self.submit_and_await(
            "sendMessage",
            json!({"conversationId": conversation_id.0, "playerId": snapshot.player_id.0, "text": reply}),
        )
        .await?;
        self.last_message_ts = Some(snapshot.now);
        Ok(())
    }

    async fn leave_conversation(&mut self, snapshot: &AgentSnapshot, conversation_id: town_core::ConversationId) -> AgentResult<()> {
        self.submit_and_await(
            "leaveConversation",
            json!({"conversationId": conversation_id.0, "playerId": snapshot.player_id.0}),
        )
        .await
        .map(|_| ())
    }

    /// Submit an input and poll until it resolves or `ACTION_TIMEOUT` elapses.
    async fn submit_and_await(&self, name: &str, args: Value) -> AgentResult<Value> {
        let input_id = self.engine.send_input(self.world_id, name, args).await?;
        self.await_result(input_id).await
    }

    async fn await_result(&self, input_id: InputId) -> AgentResult<Value> {
        let deadline = tokio::time::Instant::now() + Duration::from_millis(self.config.action_timeout_ms);
        loop {
            if let Some(outcome) = self.engine.input_status(input_id).await? {
                return match outcome {
                    InputOutcome::Ok(v) => Ok(v),
                    InputOutcome::Error(msg) => Err(AgentError::EngineRejected(msg)),
                };
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(AgentError::ActionTimeout(input_id));
            }
            sleep(POLL_INTERVAL).await;
        }
    }
}
