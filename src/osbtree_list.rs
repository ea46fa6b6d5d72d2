//! A positional list whose elements know the combined weight of everything before them.

use core::fmt;
use core::iter::FusedIterator;
use core::ops::Index;

use crate::error::Result;
use crate::raw::{Handle, Node, RawOSBTreeList};
use crate::weight::Combine;
use crate::weighted_seq::{Record, WeightedValue};

mod capacity;

pub use capacity::{Capacity, Configuration, DEFAULT_CAPACITY, NodeKind};

/// An ordered list based on a B+tree, where every element carries a weight and
/// a *dependency*: the combination of the weights of all elements before it.
///
/// Positions behave like `Vec` indices. Insertion, removal, replacement and
/// lookup by position all take O(log n) node visits, and a mutation in the
/// middle of the list never rewrites the dependencies of the whole list, only
/// those inside the touched leaf and the aggregates on the way to it.
///
/// Typical uses are line tables (weight = line length, dependency = byte
/// offset of the line), timelines (weight = duration, dependency = start
/// time) and any other sequence that needs prefix sums under edits.
///
/// The weight algebra is a [`Combine`] implementation, fixed at construction
/// together with the node [`Capacity`].
///
/// Nodes are split when they overflow but never merged when they shrink.
///
/// # Examples
///
/// ```
/// use relative_osbtree::{OSBTreeList, WeightedValue};
/// use relative_osbtree::weight::Additive;
///
/// // Lines of a document, weighted by their length in bytes.
/// let mut lines: OSBTreeList<&str, Additive<usize>> = OSBTreeList::new();
/// lines.push(WeightedValue::new("fn main() {\n", 12));
/// lines.push(WeightedValue::new("}\n", 2));
/// lines.insert(1, WeightedValue::new("    run();\n", 11)).unwrap();
///
/// // The dependency of a line is the byte offset where it starts.
/// let offsets: Vec<usize> = lines.iter().map(|line| line.dependency).collect();
/// assert_eq!(offsets, [0, 12, 23]);
///
/// // Which line holds byte 20?
/// assert_eq!(lines.partition_point(|&end| end > 20), 1);
/// ```
pub struct OSBTreeList<V, C: Combine> {
    raw: RawOSBTreeList<V, C>,
}

/// An iterator over the records of an [`OSBTreeList`].
///
/// This `struct` is created by the [`iter`] method on [`OSBTreeList`]. Each
/// item is a [`Record`] whose dependency covers the whole list.
///
/// [`iter`]: OSBTreeList::iter
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Iter<'a, V, C: Combine> {
    tree: &'a RawOSBTreeList<V, C>,
    leaf: Option<Handle>,
    index: usize,
    // Combined weight of every leaf already passed.
    offset: C::Weight,
    remaining: usize,
}

/// A human-readable rendering of the node structure of an [`OSBTreeList`].
///
/// This `struct` is created by the [`dump`] method on [`OSBTreeList`]. Leaf
/// records are shown as `value (weight @ dependency)` with dependencies local
/// to their leaf.
///
/// [`dump`]: OSBTreeList::dump
pub struct Dump<'a, V, C: Combine> {
    tree: &'a RawOSBTreeList<V, C>,
}

impl<V, C: Combine + Clone + Default> OSBTreeList<V, C> {
    /// Makes a new, empty `OSBTreeList` with the default weight algebra and capacity.
    ///
    /// # Complexity
    ///
    /// O(1)
    ///
    /// # Examples
    ///
    /// ```
    /// use relative_osbtree::OSBTreeList;
    /// use relative_osbtree::weight::Additive;
    ///
    /// let list: OSBTreeList<char, Additive<u32>> = OSBTreeList::new();
    /// assert!(list.is_empty());
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::with_configuration(Configuration::default())
    }
}

impl<V, C: Combine + Clone> OSBTreeList<V, C> {
    /// Returns the number of elements in the list.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub const fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if the list contains no elements.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.raw.len() == 0
    }

    /// Returns the number of node levels, counting the leaves. An empty list has height 1.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.raw.height()
    }

    /// Returns the combined weight of every element.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub fn total(&self) -> C::Weight {
        self.raw.total()
    }

    /// Clears the list, removing all elements. The configuration is kept.
    ///
    /// # Complexity
    ///
    /// O(n)
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Returns a reference to the value at `position`, or `None` if out of bounds.
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn get(&self, position: usize) -> Option<&V> {
        self.raw.get(position)
    }

    /// Returns the record at `position`, or `None` if out of bounds.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use relative_osbtree::{OSBTreeList, WeightedValue};
    /// use relative_osbtree::weight::Additive;
    ///
    /// let list: OSBTreeList<i32, Additive<i32>> =
    ///     [1, 2, 3, 4].map(WeightedValue::from_weight).into_iter().collect();
    /// let record = list.record(2).unwrap();
    /// assert_eq!((*record.value, record.weight, record.dependency), (3, 3, 3));
    /// assert!(list.record(4).is_none());
    /// ```
    #[must_use]
    pub fn record(&self, position: usize) -> Option<Record<&V, C::Weight>> {
        self.raw.record(position)
    }

    /// Returns the first record, or `None` if the list is empty.
    #[must_use]
    pub fn first(&self) -> Option<Record<&V, C::Weight>> {
        self.raw.record(0)
    }

    /// Returns the last record, or `None` if the list is empty.
    #[must_use]
    pub fn last(&self) -> Option<Record<&V, C::Weight>> {
        self.raw.record(self.len().checked_sub(1)?)
    }

    /// Appends an element at the end of the list.
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[doc(alias = "append")]
    pub fn push(&mut self, value: WeightedValue<V, C::Weight>) {
        self.raw.push(value);
    }

    /// Inserts an element at `position`, shifting every later element one
    /// position to the right.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfBounds`](crate::Error::OutOfBounds) if `position > len`.
    /// The list is unchanged.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use relative_osbtree::{OSBTreeList, WeightedValue};
    /// use relative_osbtree::weight::Additive;
    ///
    /// let mut list: OSBTreeList<i32, Additive<i32>> =
    ///     [1, 2, 3, 4].map(WeightedValue::from_weight).into_iter().collect();
    /// list.insert(1, WeightedValue::from_weight(5)).unwrap();
    ///
    /// let deps: Vec<i32> = list.iter().map(|r| r.dependency).collect();
    /// assert_eq!(deps, [0, 1, 6, 8, 11]);
    /// assert!(list.insert(9, WeightedValue::from_weight(1)).is_err());
    /// ```
    pub fn insert(&mut self, position: usize, value: WeightedValue<V, C::Weight>) -> Result<()> {
        self.raw.insert(position, value)
    }

    /// Removes the element at `position` and returns it, together with the
    /// dependency it had.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfBounds`](crate::Error::OutOfBounds) if `position >= len`.
    /// The list is unchanged.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use relative_osbtree::{OSBTreeList, WeightedValue};
    /// use relative_osbtree::weight::Additive;
    ///
    /// let mut list: OSBTreeList<i32, Additive<i32>> =
    ///     [1, 2, 3, 4].map(WeightedValue::from_weight).into_iter().collect();
    /// let removed = list.remove(2).unwrap();
    /// assert_eq!((removed.value, removed.dependency), (3, 3));
    /// assert_eq!(list.record(2).unwrap().dependency, 3);
    /// ```
    pub fn remove(&mut self, position: usize) -> Result<Record<V, C::Weight>> {
        self.raw.remove(position)
    }

    /// Replaces the value and weight at `position`, returning the previous pair.
    ///
    /// The element keeps its dependency; every later element absorbs the
    /// weight difference.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfBounds`](crate::Error::OutOfBounds) if `position >= len`.
    /// The list is unchanged.
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn replace(
        &mut self,
        position: usize,
        value: WeightedValue<V, C::Weight>,
    ) -> Result<WeightedValue<V, C::Weight>> {
        self.raw.replace(position, value)
    }

    /// Finds the first element whose cumulative weight, its own weight
    /// combined with its dependency, satisfies `predicate`.
    ///
    /// The predicate must be monotonic over cumulative weights (false, then
    /// true). Returns the element's position and record, or `None` if the
    /// predicate holds for no element.
    ///
    /// # Complexity
    ///
    /// O(log n) predicate calls. Leaves emptied by [`remove`](Self::remove)
    /// are never merged away, so after many removals the final walk along the
    /// leaf chain can take time linear in the number of emptied leaves.
    ///
    /// # Examples
    ///
    /// ```
    /// use relative_osbtree::{OSBTreeList, WeightedValue};
    /// use relative_osbtree::weight::Additive;
    ///
    /// // Clips of a timeline, weighted by duration.
    /// let timeline: OSBTreeList<&str, Additive<u32>> = [("intro", 30), ("verse", 45), ("chorus", 20)]
    ///     .map(|(name, length)| WeightedValue::new(name, length))
    ///     .into_iter()
    ///     .collect();
    ///
    /// // The clip playing at t = 50.
    /// let (position, clip) = timeline.find_by_weight(|&end| end > 50).unwrap();
    /// assert_eq!((position, *clip.value, clip.dependency), (1, "verse", 30));
    /// assert!(timeline.find_by_weight(|&end| end > 95).is_none());
    /// ```
    pub fn find_by_weight<F>(&self, predicate: F) -> Option<(usize, Record<&V, C::Weight>)>
    where
        F: FnMut(&C::Weight) -> bool,
    {
        self.raw.find_by_weight(predicate)
    }

    /// Returns the position of the first element whose cumulative weight
    /// satisfies `predicate`, or `len` if there is none.
    ///
    /// See [`find_by_weight`](Self::find_by_weight).
    #[must_use]
    pub fn partition_point<F>(&self, predicate: F) -> usize
    where
        F: FnMut(&C::Weight) -> bool,
    {
        self.find_by_weight(predicate).map_or(self.len(), |(position, _)| position)
    }

    /// Gets an iterator over the records of the list, in position order.
    ///
    /// Every call starts again from position 0.
    ///
    /// # Examples
    ///
    /// ```
    /// use relative_osbtree::{OSBTreeList, WeightedValue};
    /// use relative_osbtree::weight::Additive;
    ///
    /// let list: OSBTreeList<i32, Additive<i32>> =
    ///     [1, 2, 3].map(WeightedValue::from_weight).into_iter().collect();
    /// let mut iter = list.iter();
    /// assert_eq!(iter.len(), 3);
    /// assert_eq!(iter.nth(2).map(|r| r.dependency), Some(3));
    /// ```
    pub fn iter(&self) -> Iter<'_, V, C> {
        Iter {
            tree: &self.raw,
            leaf: Some(self.raw.first_leaf()),
            index: 0,
            offset: self.raw.combine().zero(),
            remaining: self.raw.len(),
        }
    }

    /// Returns a [`Display`](fmt::Display) rendering of the node structure, for debugging.
    ///
    /// Nothing is rendered until the returned value is formatted.
    ///
    /// # Examples
    ///
    /// ```
    /// use relative_osbtree::{OSBTreeList, WeightedValue};
    /// use relative_osbtree::weight::Additive;
    ///
    /// let mut list: OSBTreeList<char, Additive<u8>> = OSBTreeList::new();
    /// list.push(WeightedValue::new('a', 1));
    /// let dump = list.dump().to_string();
    /// assert!(dump.starts_with("height 1, 1 elements"));
    /// assert!(dump.contains("'a' (1 @ 0)"));
    /// ```
    pub fn dump(&self) -> Dump<'_, V, C> {
        Dump { tree: &self.raw }
    }
}

impl<'a, V, C: Combine> Iterator for Iter<'a, V, C> {
    type Item = Record<&'a V, C::Weight>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let combine = self.tree.combine();
        loop {
            let leaf = match self.tree.node(self.leaf?) {
                Node::Leaf(leaf) => leaf,
                Node::Branch(_) => return None,
            };
            let records = leaf.records();

            if let Some(record) = records.get(self.index) {
                self.index += 1;
                self.remaining -= 1;
                return Some(Record {
                    value: &record.value,
                    weight: record.weight.clone(),
                    dependency: combine.combine(&record.dependency, &self.offset),
                });
            }

            // Leaves emptied by removals are passed over.
            self.offset = combine.combine(&records.total(), &self.offset);
            self.leaf = leaf.next();
            self.index = 0;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V, C: Combine> ExactSizeIterator for Iter<'_, V, C> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<V, C: Combine> FusedIterator for Iter<'_, V, C> {}

impl<V, C: Combine> Clone for Iter<'_, V, C> {
    fn clone(&self) -> Self {
        Iter {
            tree: self.tree,
            leaf: self.leaf,
            index: self.index,
            offset: self.offset.clone(),
            remaining: self.remaining,
        }
    }
}

impl<V, C: Combine> fmt::Debug for Iter<'_, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter").field("remaining", &self.remaining).finish()
    }
}

impl<V: fmt::Debug, C: Combine> fmt::Display for Dump<'_, V, C>
where
    C::Weight: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.tree.write_tree(f)
    }
}

impl<'a, V, C: Combine + Clone> IntoIterator for &'a OSBTreeList<V, C> {
    type Item = Record<&'a V, C::Weight>;
    type IntoIter = Iter<'a, V, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<V, C: Combine + Clone> Index<usize> for OSBTreeList<V, C> {
    type Output = V;

    fn index(&self, position: usize) -> &V {
        match self.get(position) {
            Some(value) => value,
            None => panic!("index out of bounds: the len is {} but the index is {position}", self.len()),
        }
    }
}

impl<V, C: Combine + Clone + Default> Default for OSBTreeList<V, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, C: Combine + Clone + Default> FromIterator<WeightedValue<V, C::Weight>> for OSBTreeList<V, C> {
    fn from_iter<I: IntoIterator<Item = WeightedValue<V, C::Weight>>>(iter: I) -> Self {
        let mut list = Self::new();
        list.extend(iter);
        list
    }
}

impl<V, C: Combine + Clone> Extend<WeightedValue<V, C::Weight>> for OSBTreeList<V, C> {
    fn extend<I: IntoIterator<Item = WeightedValue<V, C::Weight>>>(&mut self, iter: I) {
        for value in iter {
            self.push(value);
        }
    }
}

impl<V: Clone, C: Combine + Clone> Clone for OSBTreeList<V, C> {
    fn clone(&self) -> Self {
        OSBTreeList { raw: self.raw.clone() }
    }
}

impl<V: PartialEq, C: Combine + Clone> PartialEq for OSBTreeList<V, C> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<V: fmt::Debug, C: Combine + Clone> fmt::Debug for OSBTreeList<V, C>
where
    C::Weight: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
