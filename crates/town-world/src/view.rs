//! Builds the read-only [`town_agent::AgentSnapshot`] an agent's policy
//! reasons about (spec §4.7 step 1, "read a world snapshot") from an
//! [`AiTown`] aggregate. Pure and synchronous — the async wake/decide/act
//! loop itself lives in `town-agent`; this crate only knows how to project
//! its own state into the shape that loop expects.

use town_agent::{AgentSnapshot, Activity, ConversationView, PendingInvite};
use town_core::{AgentId, Timestamp};

use crate::aitown::AiTown;
use crate::entities::MemberStatus;

/// How far (in tiles) a player looks for a free conversation partner or
/// wander-target neighbour. Not itself a spec-named constant; `moveTo`'s own
/// pathfinding validates anything actually picked.
const NEARBY_RADIUS: f64 = 6.0;

/// How many trailing messages of an in-progress conversation are handed to
/// the LLM prompt (spec §4.7 "recent messages").
const RECENT_MESSAGES: usize = 6;

/// Project `town`'s state at `now` into the snapshot `agent_id` would see on
/// its next wake-up, or `None` if the agent (or its player) no longer exists
/// — the signal `town_agent::agent_loop::AgentLoop::run` uses to stop.
pub fn build_agent_snapshot(town: &AiTown, now: Timestamp, agent_id: AgentId) -> Option<AgentSnapshot> {
    let agent = town.agents.lookup(agent_id).ok()?;
    let player = town.players.lookup(agent.player_id).ok()?;
    if !player.active {
        return None;
    }
    let location = town.locations.lookup(player.location_id).ok()?;
    let position = location.position();

    let my_memberships = town.members.filter(|m| m.player_id == agent.player_id);

    let pending_invite = my_memberships
        .iter()
        .find(|(_, m)| m.status == MemberStatus::Invited)
        .and_then(|(_, m)| {
            let (_, inviter) = town
                .members
                .filter(|other| other.conversation_id == m.conversation_id && other.player_id != agent.player_id)
                .into_iter()
                .next()?;
            Some(PendingInvite {
                conversation_id: m.conversation_id,
                inviter: inviter.player_id,
                received_ts: m.invited_ts,
            })
        });

    let conversation = my_memberships
        .iter()
        .find(|(_, m)| m.status == MemberStatus::Participating)
        .and_then(|(_, m)| {
            let conversation_id = m.conversation_id;
            let (_, peer_member) = town
                .members
                .filter(|m| {
                    m.conversation_id == conversation_id
                        && m.player_id != agent.player_id
                        && m.status == MemberStatus::Participating
                })
                .into_iter()
                .next()?;
            let peer = town.players.lookup(peer_member.player_id).ok()?;
            let peer_agent = town.agents.find(|a| a.player_id == peer.id).map(|(_, a)| a.identity.clone());
            let convo = town.conversations.lookup(conversation_id).ok()?;
            let recent_messages = convo
                .messages
                .iter()
                .rev()
                .take(RECENT_MESSAGES)
                .map(|m| (m.author, m.text.clone()))
                .collect();
            Some(ConversationView {
                conversation_id,
                peer: peer.id,
                peer_identity: peer_agent.unwrap_or_else(|| peer.description.clone()),
                recent_messages,
                message_count: convo.messages.len(),
            })
        });

    // Derived from currently observable facts rather than `agent.state`:
    // conversation-membership status and path presence are authoritative
    // (updated every tick by `advance`/`handlers`), so deriving fresh here
    // can never drift out of sync the way a separately stored flag could.
    let activity = if conversation.is_some() {
        Activity::Conversing
    } else if pending_invite.is_some()
        || my_memberships.iter().any(|(_, m)| m.status == MemberStatus::WalkingOver)
    {
        Activity::Inviting
    } else if location.path.is_some() {
        Activity::Wandering
    } else {
        Activity::Idle
    };

    let busy_players: std::collections::HashSet<_> = town
        .members
        .filter(|m| m.status != MemberStatus::Left)
        .into_iter()
        .map(|(_, m)| m.player_id)
        .collect();

    let nearby_free_players = town
        .players
        .filter(|p| p.id != agent.player_id && !busy_players.contains(&p.id))
        .into_iter()
        .filter_map(|(_, other)| {
            let other_loc = town.locations.lookup(other.location_id).ok()?;
            let other_pos = other_loc.position();
            (position.distance(other_pos) <= NEARBY_RADIUS).then_some((other.id, other.name.clone(), other_pos))
        })
        .collect();

    Some(AgentSnapshot {
        agent_id,
        player_id: agent.player_id,
        identity: agent.identity.clone(),
        plan: agent.plan.clone(),
        position,
        activity,
        pending_invite,
        conversation,
        nearby_free_players,
        now,
    })
}
