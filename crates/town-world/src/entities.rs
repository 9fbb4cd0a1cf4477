//! The record types `AiTown` aggregates (spec §3 DATA MODEL).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use town_core::{
    AgentId, ConversationId, EngineId, LocationId, MapId, MemberId, Path, PlayerId, Timestamp, WorldId,
};
use town_store::{Active, Historical};

// ── World ───────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorldStatus {
    Running,
    StoppedByDeveloper,
    Inactive,
}

/// Exactly one default world exists across a deployment (spec §3); enforcing
/// that uniqueness is the store layer's concern (a unique secondary index),
/// not this struct's.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct World {
    pub id: WorldId,
    pub engine_id: EngineId,
    pub map_id: MapId,
    pub status: WorldStatus,
    pub is_default: bool,
    pub last_viewed: Timestamp,
}

impl Active for World {
    fn is_active(&self) -> bool {
        !matches!(self.status, WorldStatus::Inactive)
    }
}

// ── Player ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub world_id: WorldId,
    pub name: String,
    pub description: String,
    pub character: String,
    pub location_id: LocationId,
    pub active: bool,
    /// Tiles/second this player's character moves at. Not itself
    /// history-sampled (spec §3 names only the five `Location` fields as
    /// tracked); constant per character for the lifetime of the player.
    pub speed: f64,
    /// Set by [`crate::advance`]'s collision handling when a scheduled
    /// replan attempt failed; cleared once a new path is found. Gates
    /// retrying at most once per `pathfinding_backoff_ms` (spec §6).
    pub replan_after: Option<Timestamp>,
}

impl Active for Player {
    fn is_active(&self) -> bool {
        self.active
    }
}

// ── Location (historical) ──────────────────────────────────────────────────────

/// The five numeric fields named by spec §3 are history-sampled: `x`, `y`,
/// `dx`, `dy`, `velocity`. `path` and `history` are not tracked fields
/// themselves — `path` drives how `x`/`y`/`dx`/`dy`/`velocity` change tick to
/// tick, and `history` is the packed *output* of tracking them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub x: f64,
    pub y: f64,
    pub dx: f64,
    pub dy: f64,
    pub velocity: f64,
    /// The player's current walk, if any. `None` means stationary at `(x,y)`.
    pub path: Option<Path>,
    /// Packed sample blob, set on flush (spec §4.2). `None` until the first
    /// flush after creation.
    pub history: Option<Vec<u8>>,
}

impl Location {
    pub fn stationary(id: LocationId, x: f64, y: f64) -> Self {
        Self { id, x, y, dx: 0.0, dy: 0.0, velocity: 0.0, path: None, history: None }
    }

    pub fn position(&self) -> town_core::Point {
        town_core::Point::new(self.x, self.y)
    }
}

impl Active for Location {
    fn is_active(&self) -> bool {
        true
    }
}

impl Historical for Location {
    fn tracked_fields(&self) -> Vec<(&'static str, f64)> {
        vec![("x", self.x), ("y", self.y), ("dx", self.dx), ("dy", self.dy), ("velocity", self.velocity)]
    }
}

// ── Conversation ──────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct ConversationEnd {
    pub ended_at: Timestamp,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub conversation_id: ConversationId,
    pub author: PlayerId,
    pub text: String,
    pub timestamp: Timestamp,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub world_id: WorldId,
    pub created_ts: Timestamp,
    pub finished: Option<ConversationEnd>,
    pub messages: Vec<ConversationMessage>,
}

impl Active for Conversation {
    fn is_active(&self) -> bool {
        true
    }
}

impl Conversation {
    pub fn is_finished(&self) -> bool {
        self.finished.is_some()
    }
}

// ── ConversationMember ──────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberStatus {
    Invited,
    WalkingOver,
    Participating,
    Left,
}

/// A player is a participating member of at most one unfinished conversation
/// at a time (spec §3 invariant 5), but `(conversation_id, player_id)`
/// uniquely keys a row across a player's full conversation history. That
/// pair can't be folded into the single `u64` `GameTable`/`Store` key
/// without collisions, so each row carries its own `MemberId` and the pair
/// is kept as ordinary indexed fields, queried via `GameTable::find`/`filter`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConversationMember {
    pub id: MemberId,
    pub conversation_id: ConversationId,
    pub player_id: PlayerId,
    pub status: MemberStatus,
    pub invited_ts: Timestamp,
    /// When `status` last changed; used to enforce `INVITE_TIMEOUT` and
    /// `TYPING_TIMEOUT`-style staleness checks.
    pub status_ts: Timestamp,
}

impl Active for ConversationMember {
    fn is_active(&self) -> bool {
        true
    }
}

// ── Agent ─────────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentState {
    Idle,
    Wandering,
    Inviting { target: PlayerId },
    Conversing { conversation: ConversationId },
    Leaving,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub world_id: WorldId,
    pub player_id: PlayerId,
    pub identity: String,
    pub plan: String,
    pub state: AgentState,
    pub next_action_ts: Timestamp,
    pub last_conversation_ts: Option<Timestamp>,
    /// Realizes `PLAYER_CONVERSATION_COOLDOWN` (spec §4.7): last time this
    /// agent finished a conversation with a given peer.
    pub per_player_cooldowns: HashMap<PlayerId, Timestamp>,
}

impl Active for Agent {
    fn is_active(&self) -> bool {
        true
    }
}
