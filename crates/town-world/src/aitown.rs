//! `AiTown`: the aggregate of per-tick world state (map + players + locations
//! + conversations + agents), implementing [`town_engine::WorldRules`]
//! (spec §3 GLOSSARY "AiTown", component C6).

use std::collections::HashMap;

use town_core::{
    AgentId, ConversationId, EngineConfig, LocationId, MemberId, PlayerId, Timestamp, WorldId,
};
use town_engine::{Input, WorldRules};
use town_spatial::Map;
use town_store::{GameTable, HistoricalTable};

use crate::entities::{Agent, Conversation, ConversationMember, Location, Player};
use crate::error::{WorldError, WorldResult};

/// Monotonic id allocators, scoped to one `AiTown` instance. A real
/// deployment backs these with the store's id-generation facility; this
/// in-process counter is equivalent for a single-writer-per-tick world
/// (spec §5: exactly one writer per engine at a time).
#[derive(Default)]
pub struct IdAllocator {
    next_player: u64,
    next_location: u64,
    next_conversation: u64,
    next_agent: u64,
    next_member: u64,
}

impl IdAllocator {
    pub fn next_player(&mut self) -> PlayerId {
        self.next_player += 1;
        PlayerId(self.next_player)
    }
    pub fn next_location(&mut self) -> LocationId {
        self.next_location += 1;
        LocationId(self.next_location)
    }
    pub fn next_conversation(&mut self) -> ConversationId {
        self.next_conversation += 1;
        ConversationId(self.next_conversation)
    }
    pub fn next_agent(&mut self) -> AgentId {
        self.next_agent += 1;
        AgentId(self.next_agent)
    }
    pub fn next_member(&mut self) -> MemberId {
        self.next_member += 1;
        MemberId(self.next_member)
    }
}

/// The aggregate world. Game tables are owned exclusively by the in-flight
/// tick transaction (spec §3 "Ownership") — an `AiTown` is constructed fresh
/// from a store snapshot at the start of a step and discarded (after
/// flushing) at its end.
pub struct AiTown {
    pub world_id: WorldId,
    pub map: Map,
    pub config: EngineConfig,
    pub ids: IdAllocator,

    pub players: GameTable<PlayerId, Player>,
    pub locations: HistoricalTable<LocationId, Location>,
    pub conversations: GameTable<ConversationId, Conversation>,
    pub members: GameTable<MemberId, ConversationMember>,
    pub agents: GameTable<AgentId, Agent>,
}

impl AiTown {
    pub fn new(world_id: WorldId, map: Map, config: EngineConfig) -> Self {
        Self {
            world_id,
            map,
            config,
            ids: IdAllocator::default(),
            players: GameTable::new(),
            locations: HistoricalTable::new(),
            conversations: GameTable::new(),
            members: GameTable::new(),
            agents: GameTable::new(),
        }
    }

    /// Every currently active player's id and position, for pathfinding's
    /// dynamic-obstacle check.
    pub(crate) fn other_players(
        &self,
        excluding: PlayerId,
    ) -> Vec<town_spatial::OtherPlayer> {
        self.players
            .filter(|_| true)
            .into_iter()
            .filter(|(id, _)| *id != excluding)
            .filter_map(|(id, player)| {
                let loc = self.locations.lookup(player.location_id).ok()?;
                Some(town_spatial::OtherPlayer {
                    agent: AgentId(id.0),
                    position: loc.position(),
                    path: loc.path.clone().unwrap_or_default(),
                })
            })
            .collect()
    }

    /// The `MemberId` of the row for `(conversation_id, player_id)`, queried
    /// by its indexed fields since that pair, not `MemberId`, is how callers
    /// naturally address a membership (spec §3 `ConversationMember`).
    pub(crate) fn member_id(
        &self,
        conversation_id: ConversationId,
        player_id: PlayerId,
    ) -> WorldResult<MemberId> {
        self.members
            .find(|m| m.conversation_id == conversation_id && m.player_id == player_id)
            .map(|(id, _)| id)
            .ok_or_else(|| WorldError::InvalidId(format!("member({conversation_id}, {player_id})")))
    }

    /// Flush every modified/deleted row across all five game tables to
    /// `store` in one pass (spec §4.5 step 5). `locations` additionally packs
    /// this interval's history samples into each modified record's `history`
    /// blob before its rows are written (spec §4.2). Callers are expected to
    /// run this, and the preceding [`town_engine::run_step`] call, inside one
    /// store transaction so both commit or retry together (spec §4.5,
    /// "all writes in steps 3-5 must be a single atomic transaction").
    pub fn flush(&mut self, store: &dyn town_store::Store) -> Result<(), WorldError> {
        self.players.save(store, "players")?;
        self.locations.flush(store, "locations", |loc, blob| loc.history = Some(blob))?;
        self.conversations.save(store, "conversations")?;
        self.members.save(store, "members")?;
        self.agents.save(store, "agents")?;
        Ok(())
    }
}

impl WorldRules for AiTown {
    type Error = WorldError;

    fn apply_input(&mut self, input: &Input) -> Result<serde_json::Value, Self::Error> {
        crate::handlers::dispatch(self, input)
    }

    fn advance(&mut self, dt_ms: u64, now: Timestamp) {
        crate::advance::advance(self, dt_ms, now);
    }
}

/// Snapshot helper used by tests and `demos/basic`: every active player's
/// name and position, for printing / assertions.
pub fn player_positions(town: &AiTown) -> HashMap<String, (f64, f64)> {
    town.players
        .filter(|_| true)
        .into_iter()
        .filter_map(|(_, p)| {
            let loc = town.locations.lookup(p.location_id).ok()?;
            Some((p.name.clone(), (loc.x, loc.y)))
        })
        .collect()
}
