use serde_json::json;
use town_core::{EngineConfig, InputId, Timestamp, WorldId};
use town_engine::{Input, WorldRules};
use town_spatial::Map;

use crate::aitown::AiTown;
use crate::entities::MemberStatus;
use crate::error::WorldError;

fn town() -> AiTown {
    AiTown::new(WorldId(1), Map::new(10, 10), EngineConfig::default())
}

fn input(name: &str, args: serde_json::Value, received_ts: u64) -> Input {
    Input {
        id: InputId(0),
        engine_id: town_core::EngineId(1),
        number: 0,
        name: name.to_string(),
        args,
        received_ts: Timestamp(received_ts),
        return_value: None,
    }
}

fn join(town: &mut AiTown, name: &str, x: f64, y: f64, ts: u64) -> u64 {
    let result = town
        .apply_input(&input("join", json!({"name": name, "description": "", "character": "f1", "x": x, "y": y}), ts))
        .expect("join should succeed");
    result["playerId"].as_u64().unwrap()
}

#[test]
fn join_creates_a_player_location_and_idle_agent() {
    let mut t = town();
    let player_id = join(&mut t, "alice", 1.0, 1.0, 0);

    assert_eq!(crate::aitown::player_positions(&t).len(), 1);
    let player = t.players.lookup(town_core::PlayerId(player_id)).unwrap();
    assert!(player.active);
    assert_eq!(t.agents.len(), 1);
}

#[test]
fn joining_with_a_name_already_in_use_is_rejected() {
    let mut t = town();
    join(&mut t, "alice", 0.0, 0.0, 0);
    let err = t
        .apply_input(&input("join", json!({"name": "alice", "description": "", "character": "f1", "x": 2.0, "y": 2.0}), 1))
        .unwrap_err();
    assert!(matches!(err, WorldError::DuplicateJoin(_)));
}

#[test]
fn leave_deactivates_the_player() {
    let mut t = town();
    let player_id = join(&mut t, "alice", 0.0, 0.0, 0);
    t.apply_input(&input("leave", json!({"playerId": player_id}), 1)).unwrap();
    let err = t.players.lookup(town_core::PlayerId(player_id)).unwrap_err();
    assert!(matches!(err, town_store::StoreError::InactiveId(_)));
}

#[test]
fn move_to_a_blocked_tile_is_rejected() {
    let mut t = town();
    t.map.set_blocked(5, 5, 1);
    let player_id = join(&mut t, "alice", 0.0, 0.0, 0);
    let err = t
        .apply_input(&input("moveTo", json!({"playerId": player_id, "x": 5.0, "y": 5.0}), 1))
        .unwrap_err();
    assert!(matches!(err, WorldError::BlockedDestination));
}

#[test]
fn move_to_plans_a_path_that_advance_then_walks() {
    let mut t = town();
    let player_id = join(&mut t, "alice", 0.0, 0.0, 0);
    t.apply_input(&input("moveTo", json!({"playerId": player_id, "x": 3.0, "y": 0.0}), 0)).unwrap();

    let player = t.players.lookup(town_core::PlayerId(player_id)).unwrap().clone();
    let loc_before = t.locations.lookup(player.location_id).unwrap().clone();
    assert!(loc_before.path.is_some());

    t.advance(16, Timestamp(1_000));
    let loc_after = t.locations.lookup(player.location_id).unwrap();
    assert!(loc_after.x > loc_before.x, "player should have moved toward the destination");
}

/// spec §8 scenario 6: a conversation progresses invited -> walkingOver ->
/// participating as the two players close the distance, accumulates
/// messages, and finishes once `MAX_CONVERSATION_MESSAGES` is reached.
#[test]
fn conversation_lifecycle_reaches_participating_and_finishes_on_message_cap() {
    let mut t = town();
    t.config.max_conversation_messages = 2;
    let alice = join(&mut t, "alice", 0.0, 0.0, 0);
    let bob = join(&mut t, "bob", 0.2, 0.0, 0);

    let result = t
        .apply_input(&input("startConversation", json!({"playerId": alice, "inviteeId": bob}), 0))
        .unwrap();
    let conversation_id = result["conversationId"].as_u64().unwrap();

    t.apply_input(&input(
        "acceptInvite",
        json!({"conversationId": conversation_id, "playerId": bob}),
        0,
    ))
    .unwrap();

    // Both are already within CONVERSATION_DISTANCE, so the first advance
    // promotes both members to participating.
    t.advance(16, Timestamp(16));

    let alice_member_id = t
        .member_id(town_core::ConversationId(conversation_id), town_core::PlayerId(alice))
        .unwrap();
    let alice_member = t.members.lookup(alice_member_id).unwrap();
    assert_eq!(alice_member.status, MemberStatus::Participating);

    t.apply_input(&input(
        "sendMessage",
        json!({"conversationId": conversation_id, "playerId": alice, "text": "hi"}),
        20,
    ))
    .unwrap();
    t.apply_input(&input(
        "sendMessage",
        json!({"conversationId": conversation_id, "playerId": bob, "text": "hello"}),
        30,
    ))
    .unwrap();

    let conversation = t.conversations.lookup(town_core::ConversationId(conversation_id)).unwrap();
    assert!(conversation.is_finished());
    assert_eq!(conversation.messages.len(), 2);

    let err = t
        .apply_input(&input(
            "sendMessage",
            json!({"conversationId": conversation_id, "playerId": alice, "text": "are you there"}),
            40,
        ))
        .unwrap_err();
    assert!(matches!(err, WorldError::ConversationFinished(_)));
}

#[test]
fn rejecting_an_invite_immediately_finishes_the_conversation() {
    let mut t = town();
    let alice = join(&mut t, "alice", 0.0, 0.0, 0);
    let bob = join(&mut t, "bob", 1.0, 0.0, 0);

    let result = t
        .apply_input(&input("startConversation", json!({"playerId": alice, "inviteeId": bob}), 0))
        .unwrap();
    let conversation_id = result["conversationId"].as_u64().unwrap();

    t.apply_input(&input("rejectInvite", json!({"conversationId": conversation_id, "playerId": bob}), 1)).unwrap();

    let conversation = t.conversations.lookup(town_core::ConversationId(conversation_id)).unwrap();
    assert!(conversation.is_finished());
}

#[test]
fn a_player_already_in_an_unfinished_conversation_cannot_start_another() {
    let mut t = town();
    let alice = join(&mut t, "alice", 0.0, 0.0, 0);
    let bob = join(&mut t, "bob", 1.0, 0.0, 0);
    let carol = join(&mut t, "carol", 2.0, 0.0, 0);

    t.apply_input(&input("startConversation", json!({"playerId": alice, "inviteeId": bob}), 0)).unwrap();
    let err = t
        .apply_input(&input("startConversation", json!({"playerId": alice, "inviteeId": carol}), 1))
        .unwrap_err();
    assert!(matches!(err, WorldError::ConversationFull(_)));
}

fn agent_of(t: &AiTown, player_id: u64) -> town_core::AgentId {
    t.agents.find(|a| a.player_id == town_core::PlayerId(player_id)).unwrap().0
}

#[test]
fn snapshot_of_an_idle_agent_sees_nearby_free_players_and_no_conversation() {
    let mut t = town();
    let alice = join(&mut t, "alice", 0.0, 0.0, 0);
    let bob = join(&mut t, "bob", 1.0, 0.0, 0);
    join(&mut t, "carol", 20.0, 20.0, 0); // far away, not "nearby"

    let snapshot = crate::view::build_agent_snapshot(&t, Timestamp(0), agent_of(&t, alice)).unwrap();
    assert_eq!(snapshot.activity, town_agent::Activity::Idle);
    assert!(snapshot.conversation.is_none());
    assert!(snapshot.pending_invite.is_none());
    assert_eq!(snapshot.nearby_free_players.len(), 1);
    assert_eq!(snapshot.nearby_free_players[0].0, town_core::PlayerId(bob));
}

#[test]
fn snapshot_of_an_invitee_carries_the_pending_invite() {
    let mut t = town();
    let alice = join(&mut t, "alice", 0.0, 0.0, 0);
    let bob = join(&mut t, "bob", 1.0, 0.0, 0);
    t.apply_input(&input("startConversation", json!({"playerId": alice, "inviteeId": bob}), 5)).unwrap();

    let snapshot = crate::view::build_agent_snapshot(&t, Timestamp(10), agent_of(&t, bob)).unwrap();
    assert_eq!(snapshot.activity, town_agent::Activity::Inviting);
    let invite = snapshot.pending_invite.expect("bob should see alice's invite");
    assert_eq!(invite.inviter, town_core::PlayerId(alice));
    assert_eq!(invite.received_ts, Timestamp(5));
}

#[test]
fn snapshot_of_a_participating_agent_carries_recent_messages() {
    let mut t = town();
    let alice = join(&mut t, "alice", 0.0, 0.0, 0);
    let bob = join(&mut t, "bob", 0.2, 0.0, 0);
    let result =
        t.apply_input(&input("startConversation", json!({"playerId": alice, "inviteeId": bob}), 0)).unwrap();
    let conversation_id = result["conversationId"].as_u64().unwrap();
    t.apply_input(&input("acceptInvite", json!({"conversationId": conversation_id, "playerId": bob}), 0)).unwrap();
    t.advance(16, Timestamp(16));
    t.apply_input(&input(
        "sendMessage",
        json!({"conversationId": conversation_id, "playerId": alice, "text": "hi"}),
        20,
    ))
    .unwrap();

    let snapshot = crate::view::build_agent_snapshot(&t, Timestamp(30), agent_of(&t, bob)).unwrap();
    assert_eq!(snapshot.activity, town_agent::Activity::Conversing);
    let conversation = snapshot.conversation.expect("bob is participating");
    assert_eq!(conversation.peer, town_core::PlayerId(alice));
    assert_eq!(conversation.message_count, 1);
    assert_eq!(conversation.recent_messages[0], (town_core::PlayerId(alice), "hi".to_string()));
}

#[test]
fn snapshot_is_none_once_the_player_has_left() {
    let mut t = town();
    let alice = join(&mut t, "alice", 0.0, 0.0, 0);
    let agent_id = agent_of(&t, alice);
    t.apply_input(&input("leave", json!({"playerId": alice}), 1)).unwrap();

    assert!(crate::view::build_agent_snapshot(&t, Timestamp(2), agent_id).is_none());
}
