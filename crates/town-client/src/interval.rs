//! Server-time intervals as received from the engine status feed.

use town_core::Timestamp;

/// A contiguous span of server time the client has received status for.
///
/// The engine status feed reports `[startTs, endTs]` pairs; consecutive
/// reports either extend the last interval (when the new span picks up
/// exactly where the last one ended) or open a gap (a new, disjoint
/// interval), per spec.md §4.8.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServerInterval {
    pub start_ts: Timestamp,
    pub end_ts: Timestamp,
}

impl ServerInterval {
    pub fn new(start_ts: Timestamp, end_ts: Timestamp) -> Self {
        Self { start_ts, end_ts }
    }

    #[inline]
    pub fn contains(&self, ts: Timestamp) -> bool {
        self.start_ts <= ts && ts <= self.end_ts
    }
}
