//! `town-spatial` — the tile map and time-indexed A* pathfinder for the AI
//! town simulation engine (component C4).
//!
//! | Module        | Contents                                              |
//! |---------------|--------------------------------------------------------|
//! | [`map`]       | `Map` — dimensions, object-occupancy grid, regions     |
//! | [`pathfinder`]| `find_path`, `OtherPlayer`, `PathResult`                |
//! | [`error`]     | `SpatialError`, `SpatialResult`                         |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                              |
//! |---------|------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to `Map`.              |

pub mod error;
pub mod map;
pub mod pathfinder;


pub use error::{SpatialError, SpatialResult};
pub use map::Map;
pub use pathfinder::{find_path, OtherPlayer, PathResult};
