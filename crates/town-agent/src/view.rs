//! The read-only shape of the world an agent's policy reasons about. An
//! agent never touches game tables directly (spec.md §4.7); it only ever
//! reads a [`WorldView`] and writes through [`crate::engine_client::EngineClient`].

use town_core::{AgentId, ConversationId, PlayerId, Point, Timestamp};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Activity {
    Idle,
    Wandering,
    Inviting,
    Conversing,
    Leaving,
}

#[derive(Clone, Debug)]
pub struct PendingInvite {
    pub conversation_id: ConversationId,
    pub inviter: PlayerId,
    pub received_ts: Timestamp,
}

#[derive(Clone, Debug)]
pub struct ConversationView {
    pub conversation_id: ConversationId,
    pub peer: PlayerId,
    pub peer_identity: String,
    /// Most recent messages first, `(speaker, text)`.
    pub recent_messages: Vec<(PlayerId, String)>,
    pub message_count: usize,
}

#[derive(Clone, Debug)]
pub struct AgentSnapshot {
    pub agent_id: AgentId,
    pub player_id: PlayerId,
    pub identity: String,
    pub plan: String,
    pub position: Point,
    pub activity: Activity,
    pub pending_invite: Option<PendingInvite>,
    pub conversation: Option<ConversationView>,
    /// Other players currently idle and not in a conversation, with name and
    /// position, for picking a conversation partner or a wander target.
    pub nearby_free_players: Vec<(PlayerId, String, Point)>,
    pub now: Timestamp,
}

pub trait WorldView: Send + Sync {
    fn snapshot(&self, agent_id: AgentId) -> Option<AgentSnapshot>;
}
