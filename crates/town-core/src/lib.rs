//! `town-core` — foundational types for the AI town simulation engine.
//!
//! This crate is a dependency of every other `town-*` crate. It intentionally
//! has no `town-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module       | Contents                                                 |
//! |--------------|-----------------------------------------------------------|
//! | [`ids`]      | `EngineId`, `WorldId`, `InputId`, `PlayerId`, `LocationId`, `ConversationId`, `AgentId`, `MapId`, `MemberId` |
//! | [`geometry`] | `Point`, distance functions, `Path`, `path_position`      |
//! | [`heap`]     | `MinHeap<T, C>` — 0-indexed binary heap                  |
//! | [`time`]     | `Timestamp`, `Generation`                                 |
//! | [`rng`]      | `AgentRng` — deterministic per-agent RNG                  |
//! | [`config`]   | `EngineConfig` — the operational constants                |
//! | [`error`]    | `CoreError`, `CoreResult`                                  |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                              |
//! |---------|------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.  |

pub mod config;
pub mod error;
pub mod geometry;
pub mod heap;
pub mod ids;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::EngineConfig;
pub use error::{CoreError, CoreResult};
pub use geometry::{orientation_degrees, Path, PathPoint, PathPosition, Point};
pub use heap::MinHeap;
pub use ids::{AgentId, ConversationId, EngineId, InputId, LocationId, MapId, MemberId, PlayerId, WorldId};
pub use rng::AgentRng;
pub use time::{Generation, Timestamp};
