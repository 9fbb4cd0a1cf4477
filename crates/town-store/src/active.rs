//! The capability a record type must offer to live in a [`crate::GameTable`].

/// Whether a record counts as "live" for `lookup`/`find`/`filter` purposes.
/// An inactive record (e.g. a player who has left) is invisible to those
/// reads even though it still occupies a cache slot until deleted.
pub trait Active {
    fn is_active(&self) -> bool;
}
