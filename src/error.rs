use crate::osbtree_list::NodeKind;

/// Errors reported by the collections in this crate.
///
/// Every fallible operation validates its arguments before touching any state,
/// so an `Err` always leaves the collection exactly as it was.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    /// A position outside the valid range for the operation.
    ///
    /// Insertion accepts `0..=len`; lookup, replacement and removal accept `0..len`.
    #[error("position {position} is out of bounds for length {len}")]
    OutOfBounds {
        /// The rejected position.
        position: usize,
        /// The length of the collection at the time of the call.
        len: usize,
    },
    /// A predicate-driven insertion would have left dependencies out of
    /// strictly increasing order. The insertion was rolled back.
    #[error("inserting at index {index} breaks the strictly increasing dependency order")]
    OrderViolation {
        /// The index the predicate selected.
        index: usize,
    },
    /// A node capacity too small to split into two non-empty halves.
    #[error("{kind} capacity must be at least 2, got {capacity}")]
    InvalidCapacity {
        /// Which kind of node the capacity applies to.
        kind: NodeKind,
        /// The rejected capacity.
        capacity: usize,
    },
}

/// Shorthand for results carrying an [`Error`].
pub type Result<T> = core::result::Result<T, Error>;

#[inline]
pub(crate) const fn check_index(position: usize, len: usize) -> Result<()> {
    if position < len {
        Ok(())
    } else {
        Err(Error::OutOfBounds { position, len })
    }
}

#[inline]
pub(crate) const fn check_insert(position: usize, len: usize) -> Result<()> {
    if position <= len {
        Ok(())
    } else {
        Err(Error::OutOfBounds { position, len })
    }
}
