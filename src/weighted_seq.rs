//! A flat, ordered list of weighted records with maintained dependencies.
//!
//! [`WeightedSeq`] is the node storage of [`OSBTreeList`](crate::OSBTreeList),
//! but it is a complete collection on its own: for short sequences a single
//! `WeightedSeq` is usually faster than the tree.

use alloc::vec::Vec;
use core::fmt;
use core::mem;
use core::ops::{Index, Range};

use crate::error::{Error, Result, check_index, check_insert};
use crate::search::{Direction, binary_search, split_point};
use crate::weight::Combine;

/// A value together with the weight it contributes to everything after it.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct WeightedValue<V, W> {
    /// The stored value.
    pub value: V,
    /// The value's own contribution to the dependencies of later elements.
    pub weight: W,
}

impl<V, W> WeightedValue<V, W> {
    /// Pairs a value with its weight.
    pub const fn new(value: V, weight: W) -> Self {
        Self { value, weight }
    }
}

impl<W: Clone> WeightedValue<W, W> {
    /// Creates a weighted value whose value is its own weight.
    ///
    /// # Examples
    ///
    /// ```
    /// use relative_osbtree::WeightedValue;
    ///
    /// let length = WeightedValue::from_weight(4);
    /// assert_eq!((length.value, length.weight), (4, 4));
    /// ```
    pub fn from_weight(weight: W) -> Self {
        Self {
            value: weight.clone(),
            weight,
        }
    }
}

/// A stored element: its value, its weight and its dependency.
///
/// The dependency is the combination of the weights of every element before
/// this one. Records handed out by the collections are snapshots, so changing
/// their fields never affects the collection.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct Record<V, W> {
    /// The stored value.
    pub value: V,
    /// The element's own weight.
    pub weight: W,
    /// The combined weight of all preceding elements.
    pub dependency: W,
}

impl<V, W> Record<V, W> {
    /// Drops the dependency, returning the caller-supplied half of the record.
    pub fn into_weighted_value(self) -> WeightedValue<V, W> {
        WeightedValue::new(self.value, self.weight)
    }
}

impl<V: Clone, W> Record<&V, W> {
    /// Maps a `Record<&V, W>` to a `Record<V, W>` by cloning the value.
    #[must_use]
    pub fn cloned(self) -> Record<V, W> {
        Record {
            value: self.value.clone(),
            weight: self.weight,
            dependency: self.dependency,
        }
    }
}

// How stored dependencies move after a point mutation.
enum Shift<'a, W> {
    Combine(&'a W),
    Decombine(&'a W),
    Exchange { removed: &'a W, added: &'a W },
}

impl<W> Clone for Shift<'_, W> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<W> Copy for Shift<'_, W> {}

/// An ordered list of [`Record`]s whose dependencies are kept consistent
/// under insertion, removal and replacement.
///
/// For every index `i > 0`, `dependency(i) == combine(weight(i - 1), dependency(i - 1))`
/// and `dependency(0) == zero`. Mutations update the dependencies after the
/// mutated position with a single delta instead of recomputing the prefix.
///
/// # Examples
///
/// ```
/// use relative_osbtree::{WeightedSeq, WeightedValue};
/// use relative_osbtree::weight::Additive;
///
/// let mut lines = WeightedSeq::new(Additive::<usize>::new());
/// for length in [5, 3, 8] {
///     lines.push(WeightedValue::from_weight(length));
/// }
///
/// // The dependency of each line is its starting offset.
/// let offsets: Vec<usize> = lines.iter().map(|r| r.dependency).collect();
/// assert_eq!(offsets, [0, 5, 8]);
///
/// lines.remove(0).unwrap();
/// assert_eq!(lines.record(1).unwrap().dependency, 3);
/// ```
pub struct WeightedSeq<V, C: Combine> {
    records: Vec<Record<V, C::Weight>>,
    combine: C,
}

impl<V, C: Combine> WeightedSeq<V, C> {
    /// Creates an empty sequence using `combine` as its weight algebra.
    pub const fn new(combine: C) -> Self {
        Self {
            records: Vec::new(),
            combine,
        }
    }

    /// Creates an empty sequence with room for at least `capacity` records.
    pub fn with_capacity(combine: C, capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
            combine,
        }
    }

    /// Returns the number of records.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the sequence holds no records.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the weight algebra.
    pub fn combine(&self) -> &C {
        &self.combine
    }

    /// Returns the stored records in order.
    #[inline]
    pub fn as_slice(&self) -> &[Record<V, C::Weight>] {
        &self.records
    }

    /// Returns an iterator over the stored records in order.
    pub fn iter(&self) -> core::slice::Iter<'_, Record<V, C::Weight>> {
        self.records.iter()
    }

    /// Returns the stored record at `index`, if any.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&Record<V, C::Weight>> {
        self.records.get(index)
    }

    /// Returns the record at `index` with its dependency recomputed from its
    /// predecessor.
    ///
    /// # Complexity
    ///
    /// O(1)
    pub fn record(&self, index: usize) -> Option<Record<&V, C::Weight>> {
        let record = self.records.get(index)?;
        Some(Record {
            value: &record.value,
            weight: record.weight.clone(),
            dependency: self.dependency_at(index),
        })
    }

    /// Returns the combined weight of every record.
    pub fn total(&self) -> C::Weight {
        self.dependency_at(self.records.len())
    }

    /// Removes every record.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Appends a record at the end.
    ///
    /// # Complexity
    ///
    /// O(1) amortized.
    pub fn push(&mut self, value: WeightedValue<V, C::Weight>) {
        self.insert_at(self.records.len(), value);
    }

    /// Inserts a record at `index`, shifting later records to the right.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfBounds`] if `index > len`.
    ///
    /// # Complexity
    ///
    /// O(len - index)
    pub fn insert(&mut self, index: usize, value: WeightedValue<V, C::Weight>) -> Result<()> {
        check_insert(index, self.records.len())?;
        self.insert_at(index, value);
        Ok(())
    }

    /// Removes and returns the record at `index`, with the dependency it had.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfBounds`] if `index >= len`.
    ///
    /// # Complexity
    ///
    /// O(len - index)
    pub fn remove(&mut self, index: usize) -> Result<Record<V, C::Weight>> {
        check_index(index, self.records.len())?;
        Ok(self.remove_at(index))
    }

    /// Replaces the value and weight at `index`, returning the previous pair.
    ///
    /// The record's own dependency is unchanged; later records absorb the
    /// weight difference.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfBounds`] if `index >= len`.
    ///
    /// # Complexity
    ///
    /// O(len - index)
    pub fn replace(
        &mut self,
        index: usize,
        value: WeightedValue<V, C::Weight>,
    ) -> Result<WeightedValue<V, C::Weight>> {
        check_index(index, self.records.len())?;
        Ok(self.replace_at(index, value))
    }

    /// Replaces the records in `range` with `values`.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfBounds`] if the range is reversed or ends past `len`.
    ///
    /// # Examples
    ///
    /// ```
    /// use relative_osbtree::{WeightedSeq, WeightedValue};
    /// use relative_osbtree::weight::Additive;
    ///
    /// let mut seq: WeightedSeq<i32, Additive<i32>> =
    ///     [1, 2, 3, 4].map(WeightedValue::from_weight).into_iter().collect();
    /// seq.replace_range(1..3, [8, 9].map(WeightedValue::from_weight)).unwrap();
    ///
    /// let deps: Vec<i32> = seq.iter().map(|r| r.dependency).collect();
    /// assert_eq!(deps, [0, 1, 9, 18]);
    /// ```
    pub fn replace_range<I>(&mut self, range: Range<usize>, values: I) -> Result<()>
    where
        I: IntoIterator<Item = WeightedValue<V, C::Weight>>,
    {
        let len = self.records.len();
        check_insert(range.end, len)?;
        if range.start > range.end {
            return Err(Error::OutOfBounds {
                position: range.start,
                len,
            });
        }

        let original = self.dependency_at(range.end);
        let mut dependency = self.dependency_at(range.start);
        let combine = &self.combine;
        let replacement: Vec<_> = values
            .into_iter()
            .map(|WeightedValue { value, weight }| {
                let next = combine.combine(&weight, &dependency);
                Record {
                    value,
                    weight,
                    dependency: mem::replace(&mut dependency, next),
                }
            })
            .collect();

        let tail = range.start + replacement.len();
        self.records.splice(range, replacement).for_each(drop);
        self.shift(
            tail,
            Shift::Exchange {
                removed: &original,
                added: &dependency,
            },
        );
        Ok(())
    }

    /// Shifts every stored dependency down by `weight`.
    pub fn subtract_all(&mut self, weight: &C::Weight) {
        self.shift(0, Shift::Decombine(weight));
    }

    /// Rebases the sequence so the first dependency becomes zero.
    ///
    /// Returns the dependency the first record had, or zero when empty.
    pub fn extract_initial_dependency(&mut self) -> C::Weight {
        let Some(first) = self.records.first() else {
            return self.combine.zero();
        };
        let start = first.dependency.clone();
        self.subtract_all(&start);
        start
    }

    /// Splits the sequence in two roughly equal halves.
    ///
    /// `self` keeps the left half, including the middle record when the
    /// length is odd. The returned right half is rebased so that its first
    /// dependency is zero, and the weight it was rebased by (the total of the
    /// left half) is returned alongside it.
    ///
    /// # Examples
    ///
    /// ```
    /// use relative_osbtree::{WeightedSeq, WeightedValue};
    /// use relative_osbtree::weight::Additive;
    ///
    /// let mut seq: WeightedSeq<i32, Additive<i32>> =
    ///     [1, 2, 3, 4, 5].map(WeightedValue::from_weight).into_iter().collect();
    /// let (right, start) = seq.split();
    ///
    /// assert_eq!((seq.len(), right.len()), (3, 2));
    /// assert_eq!(start, 6);
    /// assert_eq!(right.get(0).unwrap().dependency, 0);
    /// assert_eq!(right.get(1).unwrap().dependency, 4);
    /// ```
    #[must_use = "the right half is removed from `self`"]
    pub fn split(&mut self) -> (Self, C::Weight)
    where
        C: Clone,
    {
        let right = self.records.split_off(split_point(self.records.len()));
        let mut right = Self {
            records: right,
            combine: self.combine.clone(),
        };
        let start = right.extract_initial_dependency();
        (right, start)
    }

    pub(crate) fn insert_at(&mut self, index: usize, value: WeightedValue<V, C::Weight>) {
        let dependency = self.dependency_at(index);
        let WeightedValue { value, weight } = value;
        self.records.insert(
            index,
            Record {
                value,
                weight,
                dependency,
            },
        );
        let weight = self.records[index].weight.clone();
        self.shift(index + 1, Shift::Combine(&weight));
    }

    pub(crate) fn remove_at(&mut self, index: usize) -> Record<V, C::Weight> {
        let record = self.records.remove(index);
        self.shift(index, Shift::Decombine(&record.weight));
        record
    }

    pub(crate) fn replace_at(
        &mut self,
        index: usize,
        value: WeightedValue<V, C::Weight>,
    ) -> WeightedValue<V, C::Weight> {
        let old_value = mem::replace(&mut self.records[index].value, value.value);
        let old_weight = self.set_weight_at(index, value.weight);
        WeightedValue::new(old_value, old_weight)
    }

    /// Overwrites only the weight at `index`, returning the old one.
    pub(crate) fn set_weight_at(&mut self, index: usize, weight: C::Weight) -> C::Weight {
        let old = mem::replace(&mut self.records[index].weight, weight);
        let added = self.records[index].weight.clone();
        self.shift(
            index + 1,
            Shift::Exchange {
                removed: &old,
                added: &added,
            },
        );
        old
    }

    // Combined weight of every record strictly before `index`.
    fn dependency_at(&self, index: usize) -> C::Weight {
        match index.checked_sub(1).and_then(|prev| self.records.get(prev)) {
            Some(prev) => self.combine.combine(&prev.weight, &prev.dependency),
            None => self.combine.zero(),
        }
    }

    fn shift(&mut self, from: usize, shift: Shift<'_, C::Weight>) {
        let zero = self.combine.zero();
        let unchanged = match shift {
            Shift::Combine(delta) | Shift::Decombine(delta) => *delta == zero,
            Shift::Exchange { removed, added } => removed == added,
        };
        if unchanged {
            return;
        }

        let combine = &self.combine;
        for record in &mut self.records[from..] {
            record.dependency = match shift {
                Shift::Combine(delta) => combine.combine(&record.dependency, delta),
                Shift::Decombine(delta) => combine.decombine(&record.dependency, delta),
                Shift::Exchange { removed, added } => {
                    combine.combine(&combine.decombine(&record.dependency, removed), added)
                }
            };
        }
    }
}

impl<V, C> WeightedSeq<V, C>
where
    C: Combine,
    C::Weight: PartialOrd,
{
    /// Inserts a record at the first index where `predicate` holds, or at the
    /// end when it holds nowhere, and returns that index.
    ///
    /// The predicate receives each probed record with its index and must be
    /// monotonic (false, then true). After the insertion the new dependency
    /// must be strictly greater than its predecessor's and strictly less than
    /// its successor's.
    ///
    /// # Errors
    ///
    /// [`Error::OrderViolation`] if the insertion breaks the strict ordering.
    /// The record is removed again before the error is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use relative_osbtree::{WeightedSeq, WeightedValue};
    /// use relative_osbtree::weight::Additive;
    ///
    /// let mut seq: WeightedSeq<i32, Additive<i32>> =
    ///     [1, 2, 3, 4].map(WeightedValue::from_weight).into_iter().collect();
    /// let index = seq.insert_by(WeightedValue::from_weight(5), |_, index| index >= 1).unwrap();
    ///
    /// assert_eq!(index, 1);
    /// let deps: Vec<i32> = seq.iter().map(|r| r.dependency).collect();
    /// assert_eq!(deps, [0, 1, 6, 8, 11]);
    /// ```
    pub fn insert_by<F>(&mut self, value: WeightedValue<V, C::Weight>, mut predicate: F) -> Result<usize>
    where
        F: FnMut(&Record<V, C::Weight>, usize) -> bool,
    {
        let index = binary_search(&self.records, Direction::Ascending, |record, index| predicate(record, index))
            .unwrap_or(self.records.len());
        self.insert_at(index, value);

        let inserted = &self.records[index].dependency;
        let after_previous = index
            .checked_sub(1)
            .is_none_or(|prev| self.records[prev].dependency < *inserted);
        let before_next = self.records.get(index + 1).is_none_or(|next| *inserted < next.dependency);

        if after_previous && before_next {
            Ok(index)
        } else {
            self.remove_at(index);
            Err(Error::OrderViolation { index })
        }
    }
}

impl<V, C: Combine> Index<usize> for WeightedSeq<V, C> {
    type Output = Record<V, C::Weight>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.records[index]
    }
}

impl<'a, V, C: Combine> IntoIterator for &'a WeightedSeq<V, C> {
    type Item = &'a Record<V, C::Weight>;
    type IntoIter = core::slice::Iter<'a, Record<V, C::Weight>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<V, C: Combine + Default> Default for WeightedSeq<V, C> {
    fn default() -> Self {
        Self::new(C::default())
    }
}

impl<V, C: Combine + Default> FromIterator<WeightedValue<V, C::Weight>> for WeightedSeq<V, C> {
    fn from_iter<I: IntoIterator<Item = WeightedValue<V, C::Weight>>>(iter: I) -> Self {
        let mut seq = Self::default();
        seq.extend(iter);
        seq
    }
}

impl<V, C: Combine> Extend<WeightedValue<V, C::Weight>> for WeightedSeq<V, C> {
    fn extend<I: IntoIterator<Item = WeightedValue<V, C::Weight>>>(&mut self, iter: I) {
        for value in iter {
            self.push(value);
        }
    }
}

impl<V: Clone, C: Combine + Clone> Clone for WeightedSeq<V, C> {
    fn clone(&self) -> Self {
        Self {
            records: self.records.clone(),
            combine: self.combine.clone(),
        }
    }
}

impl<V: PartialEq, C: Combine> PartialEq for WeightedSeq<V, C> {
    fn eq(&self, other: &Self) -> bool {
        self.records == other.records
    }
}

impl<V: fmt::Debug, C: Combine> fmt::Debug for WeightedSeq<V, C>
where
    C::Weight: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.records).finish()
    }
}
