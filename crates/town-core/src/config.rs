//! Operational constants, gathered into one plain configuration struct: a
//! plain data struct with a `Default` impl, loaded once by the application
//! and threaded through to whichever crate needs it, rather than scattered
//! `const`s or a global. All durations are milliseconds unless noted.

/// Top-level engine configuration (spec.md §6).
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineConfig {
    /// How long a world may sit with no input before being considered idle.
    pub idle_world_timeout_ms: u64,
    /// Cadence of the world heartbeat cron.
    pub world_heartbeat_interval_ms: u64,
    /// Upper bound on how much simulated time a single step may advance.
    pub max_step_ms: u64,
    /// Duration of one simulation sub-step.
    pub tick_ms: u64,
    /// Target cadence between self-scheduled steps.
    pub step_interval_ms: u64,
    /// An `insertInput` call kicks the engine if the next scheduled step is
    /// farther away than this.
    pub input_delay_ms: u64,
    /// Deadline for a single pathfinding attempt.
    pub pathfinding_timeout_ms: u64,
    /// Delay before retrying a failed/blocked path replan.
    pub pathfinding_backoff_ms: u64,
    /// Tile distance at which two conversing players are "close enough".
    pub conversation_distance: f64,
    /// Tile distance within which another player's position blocks a
    /// candidate path cell at its scheduled arrival time.
    pub collision_threshold: f64,
    /// How long a conversation member may be shown as "typing" without a
    /// following message before the indicator clears.
    pub typing_timeout_ms: u64,
    /// Hard cap on a conversation's wall-clock duration.
    pub max_conversation_duration_ms: u64,
    /// Hard cap on the number of messages in a conversation.
    pub max_conversation_messages: usize,
    /// Minimum spacing between an agent's messages within one conversation.
    pub message_cooldown_ms: u64,
    /// Deadline for a single agent action (including the LLM call) before it
    /// is treated as failed.
    pub action_timeout_ms: u64,
    /// How long an unanswered invite waits before auto-rejecting.
    pub invite_timeout_ms: u64,
    /// Probability an idle, invited agent accepts the invite on a given wake.
    pub invite_accept_probability: f64,
    /// Minimum spacing between any two conversations an agent starts.
    pub conversation_cooldown_ms: u64,
    /// Minimum spacing between conversations with the *same* peer.
    pub player_conversation_cooldown_ms: u64,
    /// Longest an agent will sit in an awkward silence before acting again.
    pub awkward_conversation_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            idle_world_timeout_ms: 300_000,
            world_heartbeat_interval_ms: 60_000,
            max_step_ms: 600_000,
            tick_ms: 16,
            step_interval_ms: 1_000,
            input_delay_ms: 1_000,
            pathfinding_timeout_ms: 60_000,
            pathfinding_backoff_ms: 1_000,
            conversation_distance: 1.3,
            collision_threshold: 0.75,
            typing_timeout_ms: 15_000,
            max_conversation_duration_ms: 20 * 60_000,
            max_conversation_messages: 8,
            message_cooldown_ms: 2_000,
            action_timeout_ms: 60_000,
            invite_timeout_ms: 60_000,
            invite_accept_probability: 0.8,
            conversation_cooldown_ms: 15_000,
            player_conversation_cooldown_ms: 60_000,
            awkward_conversation_timeout_ms: 20_000,
        }
    }
}
