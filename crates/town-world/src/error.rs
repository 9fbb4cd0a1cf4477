//! `town-world` error type — the input-handler and advance-time error kinds
//! of spec §7.

use thiserror::Error;
use town_core::{ConversationId, PlayerId};

#[derive(Debug, Error)]
pub enum WorldError {
    #[error("no record with id {0}")]
    InvalidId(String),

    #[error("record {0} is not active")]
    InactiveId(String),

    #[error("destination is blocked")]
    BlockedDestination,

    #[error("path exhausted before reaching destination")]
    PathExhausted,

    #[error("conversation {0} already has two participating members")]
    ConversationFull(ConversationId),

    #[error("player {0} already joined this world")]
    DuplicateJoin(PlayerId),

    #[error("no route to destination")]
    NoRoute,

    #[error("conversation {0} has already finished")]
    ConversationFinished(ConversationId),

    #[error("unrecognized input {0:?}")]
    UnknownInput(String),

    #[error("malformed input arguments: {0}")]
    MalformedArgs(#[from] serde_json::Error),
}

pub type WorldResult<T> = Result<T, WorldError>;

impl From<town_store::StoreError> for WorldError {
    fn from(e: town_store::StoreError) -> Self {
        match e {
            town_store::StoreError::InvalidId(id) => WorldError::InvalidId(id),
            town_store::StoreError::InactiveId(id) => WorldError::InactiveId(id),
            other => WorldError::InvalidId(other.to_string()),
        }
    }
}

impl From<town_spatial::SpatialError> for WorldError {
    fn from(_: town_spatial::SpatialError) -> Self {
        WorldError::NoRoute
    }
}
