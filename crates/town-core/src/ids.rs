//! Strongly typed, zero-cost identifier wrappers.
//!
//! All IDs are `Copy + Ord + Hash` so they can be used as map keys and sorted
//! collection elements without ceremony. The inner integer is `pub` to allow
//! direct indexing where useful, but callers should prefer the `.index()`
//! helper for clarity.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid id".
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize`, e.g. for use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            /// `true` unless this is the `INVALID` sentinel.
            #[inline(always)]
            pub fn is_valid(self) -> bool {
                self != Self::INVALID
            }
        }

        impl Default for $name {
            /// Returns the `INVALID` sentinel so uninitialized ids are visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$inner> for $name {
            #[inline(always)]
            fn from(n: $inner) -> $name {
                $name(n)
            }
        }

        impl From<$name> for $inner {
            #[inline(always)]
            fn from(id: $name) -> $inner {
                id.0
            }
        }
    };
}

typed_id! {
    /// Identifies a single engine. At most one engine exists per world (§3).
    pub struct EngineId(u64);
}

typed_id! {
    /// Identifies a world (map + engine + players + ...).
    pub struct WorldId(u64);
}

typed_id! {
    /// Identifies an externally submitted input. Distinct from its `number`,
    /// which is the per-engine monotonic ordering key (§3 invariant 1).
    pub struct InputId(u64);
}

typed_id! {
    /// Identifies a player within a world.
    pub struct PlayerId(u64);
}

typed_id! {
    /// Identifies a player's historical `Location` record.
    pub struct LocationId(u64);
}

typed_id! {
    /// Identifies a conversation within a world.
    pub struct ConversationId(u64);
}

typed_id! {
    /// Identifies an agent (the LLM-driven controller bound to a player).
    pub struct AgentId(u64);
}

typed_id! {
    /// Identifies a static tile map.
    pub struct MapId(u64);
}

typed_id! {
    /// Identifies one player's membership row in one conversation. The pair
    /// `(conversation, player)` it indexes is carried as ordinary fields on
    /// the row itself, not folded into this id — a composite key can't be
    /// packed into one `u64` without collisions.
    pub struct MemberId(u64);
}
