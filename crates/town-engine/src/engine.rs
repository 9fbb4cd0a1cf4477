//! The engine state machine (spec §4.5, component C5):
//!
//! ```text
//! stopped ──start──► running(scheduledSelfTs=T+ε)
//! running ──stop──►  stopped        (clears scheduled)
//! running ──kick──►  running(+1 gen) (cancels prior self-schedule)
//! ```

use town_core::{EngineId, Generation, Timestamp};

/// Whether the engine is running (with its next self-scheduled step time) or
/// stopped.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EngineState {
    Stopped,
    Running { scheduled_self_ts: Timestamp },
}

impl EngineState {
    pub fn is_running(&self) -> bool {
        matches!(self, EngineState::Running { .. })
    }

    pub fn scheduled_self_ts(&self) -> Option<Timestamp> {
        match self {
            EngineState::Running { scheduled_self_ts } => Some(*scheduled_self_ts),
            EngineState::Stopped => None,
        }
    }
}

/// At most one per world (spec §3). `generation` fences stale self-scheduled
/// steps (spec §3 invariant 3); every `start`/`kick` bumps it.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Engine {
    pub id: EngineId,
    pub generation: Generation,
    pub state: EngineState,
    pub current_time: Option<Timestamp>,
    pub last_step_ts: Option<Timestamp>,
    /// The `number` of the highest input this engine has applied. `0` means
    /// none yet (input numbers start at 1).
    pub processed_input_number: u64,
}

impl Engine {
    /// A freshly created, stopped engine with no processed history.
    pub fn new(id: EngineId) -> Self {
        Self {
            id,
            generation: Generation::INITIAL,
            state: EngineState::Stopped,
            current_time: None,
            last_step_ts: None,
            processed_input_number: 0,
        }
    }

    /// `stopped -> running`, bumping the generation and scheduling an
    /// immediate first step at `now`. A no-op (still bumps generation, per
    /// spec §3 invariant 3's "every kick/resume") if already running.
    pub fn start(&mut self, now: Timestamp) -> Generation {
        self.generation = self.generation.next();
        self.last_step_ts.get_or_insert(now);
        self.current_time.get_or_insert(now);
        self.state = EngineState::Running { scheduled_self_ts: now };
        self.generation
    }

    /// `running -> stopped`, clearing any pending self-schedule. A stopped
    /// engine ignores this (already stopped).
    pub fn stop(&mut self) {
        self.state = EngineState::Stopped;
    }

    /// Bump the generation and reschedule an immediate step at `now`,
    /// cancelling whatever self-schedule was previously outstanding (spec
    /// §4.5). No-op on a stopped engine: kicking only makes sense while
    /// running, matching the FSM diagram.
    pub fn kick(&mut self, now: Timestamp) -> Option<Generation> {
        if !self.state.is_running() {
            return None;
        }
        self.generation = self.generation.next();
        self.state = EngineState::Running { scheduled_self_ts: now };
        Some(self.generation)
    }
}
