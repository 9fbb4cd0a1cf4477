//! `town-world` — the `AiTown` aggregate and its `WorldRules` implementation:
//! input handlers and the per-tick advance phase (component C6).
//!
//! | Module       | Contents                                                 |
//! |--------------|-----------------------------------------------------------|
//! | [`entities`] | `World`, `Player`, `Location`, `Conversation`, `ConversationMember`, `Agent` |
//! | [`aitown`]   | `AiTown` — the aggregate, `WorldRules` impl               |
//! | [`handlers`] | `dispatch` — the eight named input handlers               |
//! | [`advance`]  | Movement, collision, and conversation-lifecycle ticking   |
//! | [`view`]     | `build_agent_snapshot` — projects `AiTown` into a `town_agent::AgentSnapshot` |
//! | [`error`]    | `WorldError`, `WorldResult`                                |

pub mod advance;
pub mod aitown;
pub mod entities;
pub mod error;
pub mod handlers;
pub mod view;

#[cfg(test)]
mod tests;

pub use aitown::{player_positions, AiTown, IdAllocator};
pub use entities::{
    Agent, AgentState, Conversation, ConversationEnd, ConversationMember, ConversationMessage, Location,
    MemberStatus, Player, World, WorldStatus,
};
pub use error::{WorldError, WorldResult};
pub use view::build_agent_snapshot;
