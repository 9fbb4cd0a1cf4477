//! `town-spatial` error type.

use thiserror::Error;
use town_core::Point;

#[derive(Debug, Error)]
pub enum SpatialError {
    #[error("no route from {from:?} to {to:?}")]
    NoRoute { from: Point, to: Point },
}

pub type SpatialResult<T> = Result<T, SpatialError>;
