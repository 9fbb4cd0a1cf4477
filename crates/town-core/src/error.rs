//! Shared error type for low-level `town-core` operations.
//!
//! Higher-level crates (`town-store`, `town-spatial`, `town-engine`, ...)
//! define their own error enums and wrap `CoreError` as a variant via `#[from]`
//! rather than reusing it directly, following the teacher's per-crate error
//! convention (`DtError` as a base, `SpatialError`/`MobilityError`/`SimError`
//! each wrapping the layer below).

use thiserror::Error;

/// Errors produced by `town-core` itself.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("vector too short to have an orientation: {0}")]
    DegenerateVector(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Shorthand result type for `town-core`.
pub type CoreResult<T> = Result<T, CoreError>;
