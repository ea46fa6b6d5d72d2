use core::fmt;

use super::OSBTreeList;
use crate::error::{Error, Result};
use crate::raw::RawOSBTreeList;
use crate::weight::Combine;

/// The capacity used by [`Capacity::default`] for both node kinds.
pub const DEFAULT_CAPACITY: usize = 128;

/// The two kinds of tree node.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum NodeKind {
    /// A node holding elements directly.
    Leaf,
    /// A node holding child nodes and their aggregates.
    Branch,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NodeKind::Leaf => "leaf",
            NodeKind::Branch => "branch",
        })
    }
}

/// Maximum record counts for leaf and branch nodes.
///
/// A node holding more records than its capacity is split in two. Nothing is
/// merged when nodes shrink.
///
/// # Examples
///
/// ```
/// use relative_osbtree::osbtree_list::{Capacity, NodeKind};
/// use relative_osbtree::Error;
///
/// let capacity = Capacity::new(64, 32).unwrap();
/// assert_eq!((capacity.leaf(), capacity.branch()), (64, 32));
///
/// assert_eq!(
///     Capacity::new(1, 32),
///     Err(Error::InvalidCapacity { kind: NodeKind::Leaf, capacity: 1 })
/// );
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Capacity {
    leaf: usize,
    branch: usize,
}

impl Capacity {
    /// The smallest capacity that still splits into two non-empty halves.
    pub const MIN: usize = 2;

    /// Creates a capacity policy.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidCapacity`] if either capacity is below [`Capacity::MIN`].
    pub const fn new(leaf: usize, branch: usize) -> Result<Self> {
        if leaf < Self::MIN {
            return Err(Error::InvalidCapacity {
                kind: NodeKind::Leaf,
                capacity: leaf,
            });
        }
        if branch < Self::MIN {
            return Err(Error::InvalidCapacity {
                kind: NodeKind::Branch,
                capacity: branch,
            });
        }
        Ok(Self { leaf, branch })
    }

    /// Returns the leaf capacity.
    #[must_use]
    pub const fn leaf(&self) -> usize {
        self.leaf
    }

    /// Returns the branch capacity.
    #[must_use]
    pub const fn branch(&self) -> usize {
        self.branch
    }

    /// Returns the capacity for `kind`.
    #[must_use]
    pub const fn of(&self, kind: NodeKind) -> usize {
        match kind {
            NodeKind::Leaf => self.leaf,
            NodeKind::Branch => self.branch,
        }
    }

    /// Returns `true` if a node of `kind` holding `len` records must split.
    #[inline]
    pub(crate) const fn is_exceeded(&self, kind: NodeKind, len: usize) -> bool {
        len > self.of(kind)
    }
}

impl Default for Capacity {
    fn default() -> Self {
        Self {
            leaf: DEFAULT_CAPACITY,
            branch: DEFAULT_CAPACITY,
        }
    }
}

/// Everything fixed when an [`OSBTreeList`] is constructed: the weight
/// algebra and the node capacities.
///
/// # Examples
///
/// ```
/// use relative_osbtree::osbtree_list::{Capacity, Configuration};
/// use relative_osbtree::weight::Additive;
/// use relative_osbtree::OSBTreeList;
///
/// let config = Configuration::new(Additive::<u64>::new())
///     .with_capacity(Capacity::new(16, 8).unwrap());
/// let list: OSBTreeList<char, _> = OSBTreeList::with_configuration(config);
/// assert_eq!(list.capacity().branch(), 8);
/// ```
#[derive(Clone, Debug)]
pub struct Configuration<C> {
    combine: C,
    capacity: Capacity,
}

impl<C> Configuration<C> {
    /// Creates a configuration with the default [`Capacity`].
    pub fn new(combine: C) -> Self {
        Self {
            combine,
            capacity: Capacity::default(),
        }
    }

    /// Replaces the capacity policy.
    #[must_use]
    pub fn with_capacity(mut self, capacity: Capacity) -> Self {
        self.capacity = capacity;
        self
    }

    /// Returns the weight algebra.
    pub fn combine(&self) -> &C {
        &self.combine
    }

    /// Returns the capacity policy.
    pub fn capacity(&self) -> Capacity {
        self.capacity
    }

    pub(crate) fn into_parts(self) -> (C, Capacity) {
        (self.combine, self.capacity)
    }
}

impl<C: Default> Default for Configuration<C> {
    fn default() -> Self {
        Self::new(C::default())
    }
}

impl<V, C: Combine + Clone> OSBTreeList<V, C> {
    /// Creates an empty list from a full configuration.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub fn with_configuration(configuration: Configuration<C>) -> Self {
        OSBTreeList {
            raw: RawOSBTreeList::new(configuration),
        }
    }

    /// Creates an empty list with the default capacity and the given weight algebra.
    #[must_use]
    pub fn with_combine(combine: C) -> Self {
        Self::with_configuration(Configuration::new(combine))
    }

    /// Returns the capacity policy the list was built with.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub fn capacity(&self) -> Capacity {
        self.raw.capacity()
    }

    /// Returns the weight algebra.
    #[must_use]
    pub fn combine(&self) -> &C {
        self.raw.combine()
    }
}
