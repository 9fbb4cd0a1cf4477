//! The pure policy decision of spec.md §4.7, split out from
//! [`crate::agent_loop::AgentLoop`]'s async I/O exactly as `town_world`
//! separates `WorldRules::apply_input` from the `advance` it drives —
//! deciding what to do is deterministic and unit-testable; doing it (LLM
//! calls, engine round-trips) is not.

use std::collections::HashMap;

use town_core::{AgentRng, ConversationId, EngineConfig, PlayerId, Timestamp};

use crate::view::AgentSnapshot;

/// Per-agent cooldown bookkeeping the caller persists across wakes.
#[derive(Clone, Debug, Default)]
pub struct AgentCooldowns {
    pub last_conversation_ts: Option<Timestamp>,
    pub per_peer: HashMap<PlayerId, Timestamp>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PlannedAction {
    /// Currently in a conversation: hand off to the LLM for a turn.
    TakeConversationTurn { conversation_id: ConversationId },
    AcceptInvite { conversation_id: ConversationId },
    RejectInvite { conversation_id: ConversationId },
    StartConversation { invitee: PlayerId },
    Wander { x: f64, y: f64 },
    /// Nothing to do this wake; sleep for the default interval.
    Idle,
}

/// Decide the next action for one wake-up, per spec.md §4.7 steps 2-4 (step
/// 1, reading the snapshot, and step 5, sleeping, are the caller's job).
pub fn decide(
    snapshot: &AgentSnapshot,
    config: &EngineConfig,
    cooldowns: &AgentCooldowns,
    rng: &mut AgentRng,
) -> PlannedAction {
    // Step 4: an unanswered invite past INVITE_TIMEOUT auto-rejects,
    // regardless of what else is going on.
    if let Some(invite) = &snapshot.pending_invite {
        if snapshot.now.since(invite.received_ts) >= config.invite_timeout_ms {
            return PlannedAction::RejectInvite { conversation_id: invite.conversation_id };
        }
    }

    // Step 2: already conversing -> take a turn.
    if let Some(conversation) = &snapshot.conversation {
        return PlannedAction::TakeConversationTurn { conversation_id: conversation.conversation_id };
    }

    // Step 3: idle.
    if let Some(invite) = &snapshot.pending_invite {
        if rng.gen_bool(config.invite_accept_probability) {
            return PlannedAction::AcceptInvite { conversation_id: invite.conversation_id };
        }
    }

    let global_cooldown_elapsed = cooldowns
        .last_conversation_ts
        .map(|ts| snapshot.now.since(ts) >= config.conversation_cooldown_ms)
        .unwrap_or(true);

    if global_cooldown_elapsed {
        if let Some(candidate) = pick_conversation_partner(snapshot, cooldowns, config) {
            return PlannedAction::StartConversation { invitee: candidate };
        }
    }

    match wander_destination(snapshot, rng) {
        Some((x, y)) => PlannedAction::Wander { x, y },
        None => PlannedAction::Idle,
    }
}

fn pick_conversation_partner(
    snapshot: &AgentSnapshot,
    cooldowns: &AgentCooldowns,
    config: &EngineConfig,
) -> Option<PlayerId> {
    snapshot
        .nearby_free_players
        .iter()
        .find(|(peer, _, _)| {
            cooldowns
                .per_peer
                .get(peer)
                .map(|ts| snapshot.now.since(*ts) >= config.player_conversation_cooldown_ms)
                .unwrap_or(true)
        })
        .map(|(peer, _, _)| *peer)
}

/// A modest random nudge around the agent's current position (spec.md §4.7
/// "pick a wander destination"); the engine's own `moveTo` handler is
/// responsible for clamping to a walkable, in-bounds tile.
fn wander_destination(snapshot: &AgentSnapshot, rng: &mut AgentRng) -> Option<(f64, f64)> {
    let dx: f64 = rng.gen_range(-3.0..=3.0);
    let dy: f64 = rng.gen_range(-3.0..=3.0);
    if dx.abs() < 0.5 && dy.abs() < 0.5 {
        return None;
    }
    Some((snapshot.position.x + dx, snapshot.position.y + dy))
}
