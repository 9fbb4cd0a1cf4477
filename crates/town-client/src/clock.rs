//! Client-side playback of historical server time (component C8, spec.md §4.8).
//!
//! The engine reports its own wall-clock progress in disjoint `[start, end]`
//! intervals roughly once per `STEP_INTERVAL`. A renderer wants a smooth,
//! monotonic `serverTs` on every animation frame, not a value that jumps by a
//! full step interval whenever a new status arrives and then stalls until the
//! next one. `ClientClock` bridges the two: it nudges its playback rate up or
//! down based on how much buffered server time remains ahead of the cursor,
//! and hard-clamps to within `MAX_LAG` of the latest known server time so a
//! starved client never appears to freeze indefinitely.

use town_core::Timestamp;

use crate::error::{ClientError, ClientResult};
use crate::interval::ServerInterval;

/// Below this buffered duration, playback slows down (`SLOW_RATE`) to let the
/// server catch up.
const LOW_BUFFER_MS: i64 = 100;

/// Above this buffered duration, playback speeds up (`FAST_RATE`) to burn
/// through the backlog instead of drifting further behind real time.
const HIGH_BUFFER_MS: i64 = 1_000;

const SLOW_RATE: f64 = 0.8;
const FAST_RATE: f64 = 1.2;
const NORMAL_RATE: f64 = 1.0;

/// Hard ceiling on how far the playback cursor may lag the latest received
/// server time, regardless of rate control.
const MAX_LAG_MS: i64 = 1_250;

/// Result of one `ClientClock::advance` call.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct HistoricalPlayback {
    /// The reconstructed server time to render this frame.
    pub server_ts: Timestamp,
    /// `lastServer - prevServer`: how much buffered server time remains
    /// ahead of the playback cursor, in milliseconds. Exposed for UI (e.g. a
    /// "catching up" indicator). May be negative if the client has somehow
    /// overrun the buffer.
    pub buffer_health_ms: i64,
}

/// Tracks the ordered list of server intervals and the client's playback
/// anchor, reconstructing a smooth `serverTs` from an unreliable server
/// cadence.
#[derive(Clone, Debug, Default)]
pub struct ClientClock {
    intervals: Vec<ServerInterval>,
    prev_client: Option<Timestamp>,
    prev_server: Option<Timestamp>,
}

impl ClientClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new server status interval. Append-extends the last interval
    /// if it picks up exactly where the last one ended; otherwise opens a new,
    /// disjoint interval. An interval that starts *before* the last one ended
    /// is an out-of-order status report and is fatal.
    pub fn observe(&mut self, interval: ServerInterval) -> ClientResult<()> {
        match self.intervals.last_mut() {
            None => {
                self.intervals.push(interval);
            }
            Some(last) if interval.start_ts == last.end_ts => {
                last.end_ts = interval.end_ts;
            }
            Some(last) if interval.start_ts > last.end_ts => {
                self.intervals.push(interval);
            }
            Some(last) => {
                return Err(ClientError::OutOfOrderStatus {
                    new_start: interval.start_ts,
                    last_end: last.end_ts,
                });
            }
        }
        Ok(())
    }

    /// The intervals currently retained (most recent enclosing interval and
    /// its immediate predecessor, at most).
    pub fn intervals(&self) -> &[ServerInterval] {
        &self.intervals
    }

    /// Reconstruct the server time to display at client wallclock `client_now`.
    ///
    /// Implements the rate-control formula of spec.md §4.8 exactly: the
    /// playback rate slows to `0.8x` when the buffered server time ahead of
    /// the cursor drops below 100 ms, speeds to `1.2x` when it exceeds
    /// 1,000 ms, and is clamped so the cursor is never more than 1,250 ms
    /// behind the latest known server time nor ahead of it (never
    /// extrapolates past received data).
    pub fn advance(&mut self, client_now: Timestamp) -> ClientResult<HistoricalPlayback> {
        let first_start = self
            .intervals
            .first()
            .ok_or(ClientError::NoIntervals)?
            .start_ts;
        let last_server = self
            .intervals
            .last()
            .expect("non-empty: checked via first()")
            .end_ts;

        let prev_client = *self.prev_client.get_or_insert(client_now);
        let prev_server = *self.prev_server.get_or_insert(first_start);

        let buffer_health_ms = last_server.0 as i64 - prev_server.0 as i64;
        let rate = if buffer_health_ms < LOW_BUFFER_MS {
            SLOW_RATE
        } else if buffer_health_ms > HIGH_BUFFER_MS {
            FAST_RATE
        } else {
            NORMAL_RATE
        };

        let elapsed_client = client_now.0 as f64 - prev_client.0 as f64;
        let raw = prev_server.0 as f64 + elapsed_client * rate;
        let floor = (last_server.0 as i64 - MAX_LAG_MS).max(0) as f64;
        let unclamped = raw.max(floor);

        let (server_ts, enclosing_idx) = self.clamp_into_intervals(unclamped, last_server);
        self.trim_before(enclosing_idx);

        self.prev_client = Some(client_now);
        self.prev_server = Some(server_ts);

        Ok(HistoricalPlayback {
            server_ts,
            buffer_health_ms,
        })
    }

    /// Clamp `ts` to land inside a known interval: if it falls in a gap
    /// between two intervals, snap forward to the next interval's start; if
    /// it runs past the last interval's end, clamp back to that end (a
    /// client must never display server time it hasn't received yet).
    /// Returns the clamped timestamp and the index of its enclosing interval.
    fn clamp_into_intervals(&self, ts: f64, last_server: Timestamp) -> (Timestamp, usize) {
        for (idx, iv) in self.intervals.iter().enumerate() {
            let start = iv.start_ts.0 as f64;
            let end = iv.end_ts.0 as f64;
            if ts < start {
                return (iv.start_ts, idx);
            }
            if ts <= end {
                return (Timestamp(ts.round() as u64), idx);
            }
        }
        let last_idx = self.intervals.len() - 1;
        (last_server, last_idx)
    }

    /// Drop every interval before the predecessor of `enclosing_idx`, keeping
    /// at most the enclosing interval and the one immediately before it.
    fn trim_before(&mut self, enclosing_idx: usize) {
        let keep_from = enclosing_idx.saturating_sub(1);
        if keep_from > 0 {
            self.intervals.drain(0..keep_from);
        }
    }
}
