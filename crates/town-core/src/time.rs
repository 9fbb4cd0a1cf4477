//! Wall-clock time and generation fencing.
//!
//! Unlike the teacher framework's abstract `Tick` counter (which advances by
//! exactly one per simulated step), this engine's canonical clock is
//! wall-clock milliseconds (spec.md §3: `engine.currentTime`, `receivedTs`,
//! ...), because inputs arrive asynchronously against real time and the
//! engine must bound how far behind it is allowed to fall (`MAX_STEP`).
//! `Timestamp` therefore wraps milliseconds rather than a step count, but
//! keeps the same "new-type over `u64`, no floating point drift" discipline.

use std::fmt;

// ── Timestamp ─────────────────────────────────────────────────────────────────

/// An absolute point in simulated wall-clock time, in milliseconds.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(0);

    /// Return the timestamp `n` milliseconds after `self`.
    #[inline]
    pub fn offset(self, n: u64) -> Timestamp {
        Timestamp(self.0 + n)
    }

    /// Milliseconds elapsed from `earlier` to `self`.
    ///
    /// Saturates to zero if `earlier > self` rather than panicking: engine
    /// inputs may race with clock reads under test, and a clamped "no time
    /// has passed" reading is the conservative, always-safe answer.
    #[inline]
    pub fn since(self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl std::ops::Add<u64> for Timestamp {
    type Output = Timestamp;
    #[inline]
    fn add(self, rhs: u64) -> Timestamp {
        Timestamp(self.0 + rhs)
    }
}

impl std::ops::Sub for Timestamp {
    type Output = u64;
    #[inline]
    fn sub(self, rhs: Timestamp) -> u64 {
        self.0.saturating_sub(rhs.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}ms", self.0)
    }
}

// ── Generation ────────────────────────────────────────────────────────────────

/// Monotonic fence used to discard self-scheduled engine steps issued by a
/// prior run or kick (spec.md §3 invariant 3, §4.5).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Generation(pub u64);

impl Generation {
    pub const INITIAL: Generation = Generation(0);

    /// Bump to the next generation (called on every `start`/`kick`).
    #[inline]
    pub fn next(self) -> Generation {
        Generation(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen{}", self.0)
    }
}
