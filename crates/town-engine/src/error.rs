//! `town-engine` error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("input {0} is not pending (already has a return value, or does not exist)")]
    InputNotPending(u64),

    #[error("engine is stopped; cannot accept new input")]
    EngineStopped,
}

pub type EngineResult<T> = Result<T, EngineError>;
