//! Error types for `town-store`.

use thiserror::Error;

/// Errors produced by the game-table / historical-table layer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no record with id {0}")]
    InvalidId(String),

    #[error("record {0} exists but is not active")]
    InactiveId(String),

    #[error("unsupported historical blob version {0} (expected 1)")]
    UnsupportedVersion(u16),

    #[error("malformed historical blob: {0}")]
    Malformed(String),

    #[error("underlying store I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for `town-store`.
pub type StoreResult<T> = Result<T, StoreError>;
