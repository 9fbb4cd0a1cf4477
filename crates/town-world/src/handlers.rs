//! Input handlers (spec §4.6): `join`, `leave`, `moveTo`, `startConversation`,
//! `acceptInvite`, `rejectInvite`, `leaveConversation`, `sendMessage`. Every
//! handler is total — it returns `Ok`/`Err`, never panics (spec §4.6, §7).

use serde::Deserialize;
use serde_json::{json, Value};
use town_core::{ConversationId, Point};
use town_engine::Input;
use town_spatial::find_path;
use tracing::{info, warn};

use crate::aitown::AiTown;
use crate::entities::{
    Agent, AgentState, Conversation, ConversationEnd, ConversationMember, ConversationMessage, Location,
    MemberStatus, Player,
};
use crate::error::{WorldError, WorldResult};

pub fn dispatch(town: &mut AiTown, input: &Input) -> WorldResult<Value> {
    match input.name.as_str() {
        "join" => join(town, input),
        "leave" => leave(town, input),
        "moveTo" => move_to(town, input),
        "startConversation" => start_conversation(town, input),
        "acceptInvite" => accept_invite(town, input),
        "rejectInvite" => reject_invite(town, input),
        "leaveConversation" => leave_conversation(town, input),
        "sendMessage" => send_message(town, input),
        other => Err(WorldError::UnknownInput(other.to_string())),
    }
}

// ── join ────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct JoinArgs {
    name: String,
    description: String,
    character: String,
    x: f64,
    y: f64,
    #[serde(default = "default_speed")]
    speed: f64,
}

fn default_speed() -> f64 {
    1.0
}

fn join(town: &mut AiTown, input: &Input) -> WorldResult<Value> {
    let args: JoinArgs = serde_json::from_value(input.args.clone())?;

    if let Some((existing, _)) = town.players.find(|p| p.name == args.name) {
        return Err(WorldError::DuplicateJoin(existing));
    }

    let location_id = town.ids.next_location();
    town.locations.insert(location_id, Location::stationary(location_id, args.x, args.y));

    let player_id = town.ids.next_player();
    town.players.insert(
        player_id,
        Player {
            id: player_id,
            world_id: town.world_id,
            name: args.name,
            description: args.description,
            character: args.character,
            location_id,
            active: true,
            speed: args.speed,
            replan_after: None,
        },
    );

    let agent_id = town.ids.next_agent();
    town.agents.insert(
        agent_id,
        Agent {
            id: agent_id,
            world_id: town.world_id,
            player_id,
            identity: String::new(),
            plan: String::new(),
            state: AgentState::Idle,
            next_action_ts: input.received_ts,
            last_conversation_ts: None,
            per_player_cooldowns: Default::default(),
        },
    );

    info!(player_id = %player_id, agent_id = %agent_id, "player joined");
    Ok(json!({ "playerId": player_id.0, "agentId": agent_id.0 }))
}

// ── leave ─────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LeaveArgs {
    player_id: u64,
}

fn leave(town: &mut AiTown, input: &Input) -> WorldResult<Value> {
    let args: LeaveArgs = serde_json::from_value(input.args.clone())?;
    let player_id = town_core::PlayerId(args.player_id);

    // Leave any conversation the player is still a member of.
    let memberships: Vec<town_core::MemberId> = town
        .members
        .filter(|m| m.player_id == player_id && m.status != MemberStatus::Left)
        .into_iter()
        .map(|(id, _)| id)
        .collect();
    for member_id in memberships {
        town.members.update(member_id, |m| {
            m.status = MemberStatus::Left;
            m.status_ts = input.received_ts;
        })?;
    }

    town.players.update(player_id, |p| p.active = false)?;
    info!(player_id = %player_id, "player left");
    Ok(json!({}))
}

// ── moveTo ────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MoveToArgs {
    player_id: u64,
    x: f64,
    y: f64,
}

fn move_to(town: &mut AiTown, input: &Input) -> WorldResult<Value> {
    let args: MoveToArgs = serde_json::from_value(input.args.clone())?;
    let player_id = town_core::PlayerId(args.player_id);

    let player = town.players.lookup(player_id)?.clone();
    let start = town.locations.lookup(player.location_id)?.position();
    let dest = Point::new(args.x, args.y);

    if town.map.is_blocked(dest) {
        return Err(WorldError::BlockedDestination);
    }

    let others = town.other_players(player_id);
    let result = find_path(
        &town.map,
        start,
        dest,
        input.received_ts,
        player.speed,
        &others,
        town.config.collision_threshold,
    )?;

    let new_destination = result.new_destination;
    town.locations.update(player.location_id, |loc| loc.path = Some(result.path.clone()))?;
    town.players.update(player_id, |p| p.replan_after = None)?;

    Ok(json!({
        "newDestination": new_destination.map(|p| json!({"x": p.x, "y": p.y})),
    }))
}

// ── startConversation ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartConversationArgs {
    player_id: u64,
    invitee_id: u64,
}

fn start_conversation(town: &mut AiTown, input: &Input) -> WorldResult<Value> {
    let args: StartConversationArgs = serde_json::from_value(input.args.clone())?;
    let initiator = town_core::PlayerId(args.player_id);
    let invitee = town_core::PlayerId(args.invitee_id);

    town.players.lookup(initiator)?;
    town.players.lookup(invitee)?;

    // A player may be a participating member of at most one unfinished
    // conversation at a time (spec §3 invariant 5).
    for player in [initiator, invitee] {
        let existing = town
            .members
            .filter(|m| m.player_id == player && m.status != MemberStatus::Left)
            .into_iter()
            .find(|(_, m)| !town.conversations.lookup(m.conversation_id).map(|c| c.is_finished()).unwrap_or(true));
        if let Some((_, m)) = existing {
            return Err(WorldError::ConversationFull(m.conversation_id));
        }
    }

    let conversation_id = town.ids.next_conversation();
    town.conversations.insert(
        conversation_id,
        Conversation {
            id: conversation_id,
            world_id: town.world_id,
            created_ts: input.received_ts,
            finished: None,
            messages: Vec::new(),
        },
    );

    let initiator_member = town.ids.next_member();
    town.members.insert(
        initiator_member,
        ConversationMember {
            id: initiator_member,
            conversation_id,
            player_id: initiator,
            status: MemberStatus::WalkingOver,
            invited_ts: input.received_ts,
            status_ts: input.received_ts,
        },
    );
    let invitee_member = town.ids.next_member();
    town.members.insert(
        invitee_member,
        ConversationMember {
            id: invitee_member,
            conversation_id,
            player_id: invitee,
            status: MemberStatus::Invited,
            invited_ts: input.received_ts,
            status_ts: input.received_ts,
        },
    );

    info!(conversation_id = %conversation_id, %initiator, %invitee, "conversation started");
    Ok(json!({ "conversationId": conversation_id.0 }))
}

// ── acceptInvite / rejectInvite ───────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InviteResponseArgs {
    conversation_id: u64,
    player_id: u64,
}

fn accept_invite(town: &mut AiTown, input: &Input) -> WorldResult<Value> {
    let args: InviteResponseArgs = serde_json::from_value(input.args.clone())?;
    let conversation_id = ConversationId(args.conversation_id);
    let player_id = town_core::PlayerId(args.player_id);

    let conversation = town.conversations.lookup(conversation_id)?;
    if conversation.is_finished() {
        return Err(WorldError::ConversationFinished(conversation_id));
    }

    let member_id = town.member_id(conversation_id, player_id)?;
    town.members.update(member_id, |m| {
        m.status = MemberStatus::WalkingOver;
        m.status_ts = input.received_ts;
    })?;
    Ok(json!({}))
}

fn reject_invite(town: &mut AiTown, input: &Input) -> WorldResult<Value> {
    let args: InviteResponseArgs = serde_json::from_value(input.args.clone())?;
    let conversation_id = ConversationId(args.conversation_id);
    let player_id = town_core::PlayerId(args.player_id);

    let member_id = town.member_id(conversation_id, player_id)?;
    town.members.update(member_id, |m| {
        m.status = MemberStatus::Left;
        m.status_ts = input.received_ts;
    })?;
    // The conversation never reached two participants; it is over.
    town.conversations.update(conversation_id, |c| {
        c.finished.get_or_insert(ConversationEnd { ended_at: input.received_ts });
    })?;
    Ok(json!({}))
}

// ── leaveConversation ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LeaveConversationArgs {
    conversation_id: u64,
    player_id: u64,
}

fn leave_conversation(town: &mut AiTown, input: &Input) -> WorldResult<Value> {
    let args: LeaveConversationArgs = serde_json::from_value(input.args.clone())?;
    let conversation_id = ConversationId(args.conversation_id);
    let player_id = town_core::PlayerId(args.player_id);

    let member_id = town.member_id(conversation_id, player_id)?;
    town.members.update(member_id, |m| {
        m.status = MemberStatus::Left;
        m.status_ts = input.received_ts;
    })?;
    Ok(json!({}))
}

// ── sendMessage ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendMessageArgs {
    conversation_id: u64,
    player_id: u64,
    text: String,
}

fn send_message(town: &mut AiTown, input: &Input) -> WorldResult<Value> {
    let args: SendMessageArgs = serde_json::from_value(input.args.clone())?;
    let conversation_id = ConversationId(args.conversation_id);
    let player_id = town_core::PlayerId(args.player_id);

    let conversation = town.conversations.lookup(conversation_id)?;
    if conversation.is_finished() {
        return Err(WorldError::ConversationFinished(conversation_id));
    }

    let member_id = town.member_id(conversation_id, player_id)?;
    let member = town.members.lookup(member_id)?;
    if member.status != MemberStatus::Participating {
        warn!(%conversation_id, %player_id, "sendMessage from a non-participating member");
        return Err(WorldError::InactiveId(format!("{player_id}")));
    }

    let max_messages = town.config.max_conversation_messages;
    town.conversations.update(conversation_id, |c| {
        c.messages.push(ConversationMessage {
            conversation_id,
            author: player_id,
            text: args.text.clone(),
            timestamp: input.received_ts,
        });
        if c.messages.len() >= max_messages {
            c.finished.get_or_insert(ConversationEnd { ended_at: input.received_ts });
        }
    })?;

    Ok(json!({}))
}
