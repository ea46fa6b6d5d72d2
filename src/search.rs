//! Predicate-driven binary search and halving helpers.
//!
//! These are the only index-translation primitives the collections use, and
//! they work over any slice.

/// Which end of the matching run [`binary_search`] reports.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum Direction {
    /// The predicate is false below some index and true from it onwards.
    /// The search returns the lowest matching index.
    #[default]
    Ascending,
    /// The predicate is true up to some index and false above it.
    /// The search returns the highest matching index.
    Descending,
}

/// Searches `items` for the boundary of a monotonic `predicate`.
///
/// The predicate receives each probed element together with its index. With
/// [`Direction::Ascending`] the lowest index satisfying the predicate is
/// returned; with [`Direction::Descending`] the highest. `None` means the
/// predicate holds nowhere.
///
/// A predicate that is not monotonic in the requested direction produces a
/// deterministic but unspecified index. It never panics on its own.
///
/// # Examples
///
/// ```
/// use relative_osbtree::search::{Direction, binary_search};
///
/// let items = [1, 1, 1];
/// assert_eq!(binary_search(&items, Direction::Ascending, |v, _| *v == 1), Some(0));
/// assert_eq!(binary_search(&items, Direction::Descending, |v, _| *v == 1), Some(2));
/// assert_eq!(binary_search(&items, Direction::Ascending, |v, _| *v == 2), None);
/// ```
///
/// # Complexity
///
/// O(log n) predicate calls.
pub fn binary_search<T, F>(items: &[T], direction: Direction, mut predicate: F) -> Option<usize>
where
    F: FnMut(&T, usize) -> bool,
{
    let mut low = 0;
    let mut high = items.len();

    while low < high {
        let mid = low + (high - low) / 2;
        let holds = predicate(&items[mid], mid);
        match (direction, holds) {
            (Direction::Ascending, true) | (Direction::Descending, false) => high = mid,
            (Direction::Ascending, false) | (Direction::Descending, true) => low = mid + 1,
        }
    }

    match direction {
        Direction::Ascending => (low < items.len()).then_some(low),
        Direction::Descending => low.checked_sub(1),
    }
}

/// Returns the index at which a collection of `len` elements is halved.
///
/// The left half receives the extra element when `len` is odd.
#[inline]
#[must_use]
pub const fn split_point(len: usize) -> usize {
    len.div_ceil(2)
}

/// Divides `items` into two roughly equal halves, biased to the left.
///
/// # Examples
///
/// ```
/// use relative_osbtree::search::halve;
///
/// let (left, right) = halve(&[1, 2, 3, 4, 5]);
/// assert_eq!(left, &[1, 2, 3]);
/// assert_eq!(right, &[4, 5]);
/// ```
#[must_use]
pub fn halve<T>(items: &[T]) -> (&[T], &[T]) {
    items.split_at(split_point(items.len()))
}
