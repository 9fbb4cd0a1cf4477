//! `town-client` error type.

use thiserror::Error;
use town_core::Timestamp;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("out-of-order server interval: new start {new_start} precedes last end {last_end}")]
    OutOfOrderStatus {
        new_start: Timestamp,
        last_end: Timestamp,
    },

    #[error("advance() called before any server interval was observed")]
    NoIntervals,
}

pub type ClientResult<T> = Result<T, ClientError>;
