//! Error types for the LLM client contract and the agent loop itself.

use thiserror::Error;
use town_core::InputId;

/// An error surfaced by an [`crate::llm::LlmClient`] implementation.
#[derive(Debug, Error, Clone)]
pub enum LlmError {
    /// The upstream call failed with an HTTP-style status code. `status` is
    /// inspected by [`crate::backoff::BackoffLlmClient`] to decide whether
    /// the call is worth retrying (429 or 5xx only).
    #[error("llm backend returned {status}: {message}")]
    Http { status: u16, message: String },

    #[error("llm backend error: {0}")]
    Other(String),
}

pub type LlmResult<T> = Result<T, LlmError>;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("input {0} never resolved before the action deadline")]
    ActionTimeout(InputId),

    #[error("engine rejected input: {0}")]
    EngineRejected(String),

    #[error("engine client error: {0}")]
    EngineClient(String),
}

pub type AgentResult<T> = Result<T, AgentError>;
