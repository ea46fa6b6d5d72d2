use crate::osbtree_list::NodeKind;
use crate::search::{Direction, binary_search};
use crate::weight::{Combine, Counted, NodeWeight};
use crate::weighted_seq::{Record, WeightedSeq, WeightedValue};

use super::handle::Handle;

pub(crate) enum Node<V, C: Combine> {
    Leaf(LeafNode<V, C>),
    Branch(BranchNode<C>),
}

// Leaves hold the user's records; dependencies are local to the leaf.
pub(crate) struct LeafNode<V, C: Combine> {
    next: Option<Handle>,
    records: WeightedSeq<V, C>,
}

// Branch entries are child handles weighted by their subtree aggregate. An entry's
// dependency is the aggregate of every preceding sibling.
pub(crate) struct BranchNode<C: Combine> {
    entries: WeightedSeq<Handle, Counted<C>>,
}

impl<V, C: Combine> Node<V, C> {
    pub(crate) const fn kind(&self) -> NodeKind {
        match self {
            Node::Leaf(_) => NodeKind::Leaf,
            Node::Branch(_) => NodeKind::Branch,
        }
    }

    /// Returns the number of records (leaf) or entries (branch) held directly.
    pub(crate) fn len(&self) -> usize {
        match self {
            Node::Leaf(leaf) => leaf.records.len(),
            Node::Branch(branch) => branch.entries.len(),
        }
    }

    /// Returns the element count and combined weight of the whole subtree.
    pub(crate) fn aggregate(&self) -> NodeWeight<C::Weight> {
        match self {
            Node::Leaf(leaf) => leaf.aggregate(),
            Node::Branch(branch) => branch.entries.total(),
        }
    }

    pub(crate) fn as_leaf(&self) -> &LeafNode<V, C> {
        match self {
            Node::Leaf(leaf) => leaf,
            Node::Branch(_) => panic!("expected leaf node"),
        }
    }

    pub(crate) fn as_leaf_mut(&mut self) -> &mut LeafNode<V, C> {
        match self {
            Node::Leaf(leaf) => leaf,
            Node::Branch(_) => panic!("expected leaf node"),
        }
    }

    pub(crate) fn as_branch_mut(&mut self) -> &mut BranchNode<C> {
        match self {
            Node::Branch(branch) => branch,
            Node::Leaf(_) => panic!("expected branch node"),
        }
    }
}

impl<V, C: Combine> LeafNode<V, C> {
    pub(crate) const fn new(combine: C) -> Self {
        Self {
            next: None,
            records: WeightedSeq::new(combine),
        }
    }

    pub(crate) const fn next(&self) -> Option<Handle> {
        self.next
    }

    pub(crate) fn set_next(&mut self, next: Option<Handle>) {
        self.next = next;
    }

    pub(crate) const fn records(&self) -> &WeightedSeq<V, C> {
        &self.records
    }

    pub(crate) fn records_mut(&mut self) -> &mut WeightedSeq<V, C> {
        &mut self.records
    }

    pub(crate) fn aggregate(&self) -> NodeWeight<C::Weight> {
        NodeWeight::new(self.records.len(), self.records.total())
    }

    /// Moves the upper half into a new leaf.
    ///
    /// Returns the new leaf with the aggregate of the half left behind. The new
    /// leaf inherits this leaf's forward link; the caller relinks this leaf once
    /// the sibling has a handle.
    pub(crate) fn split(&mut self) -> (Self, NodeWeight<C::Weight>)
    where
        C: Clone,
    {
        let (records, left_total) = self.records.split();
        let left = NodeWeight::new(self.records.len(), left_total);
        let right = Self {
            next: self.next,
            records,
        };
        (right, left)
    }
}

impl<C: Combine> BranchNode<C> {
    /// Creates the branch that replaces a root which just split in two.
    pub(crate) fn new_root(
        combine: C,
        left: (Handle, NodeWeight<C::Weight>),
        right: (Handle, NodeWeight<C::Weight>),
    ) -> Self {
        let mut entries = WeightedSeq::with_capacity(Counted(combine), 2);
        entries.push(WeightedValue::new(left.0, left.1));
        entries.push(WeightedValue::new(right.0, right.1));
        Self { entries }
    }

    pub(crate) const fn entries(&self) -> &WeightedSeq<Handle, Counted<C>> {
        &self.entries
    }

    #[inline]
    pub(crate) fn entry(&self, index: usize) -> &Record<Handle, NodeWeight<C::Weight>> {
        &self.entries[index]
    }

    /// Selects the child covering `position`.
    ///
    /// A child covers the positions strictly below the end of its subtree, except
    /// the last child, which also covers the end itself. Positions at a boundary
    /// therefore resolve to the start of the next non-empty child.
    pub(crate) fn child_index(&self, position: usize) -> usize {
        let last = self.entries.len() - 1;
        let found = binary_search(self.entries.as_slice(), Direction::Ascending, |entry, index| {
            let end = entry.dependency.count + entry.weight.count;
            if index == last { position <= end } else { position < end }
        });
        debug_assert!(found.is_some(), "`BranchNode::child_index()` - position {position} is past the end!");
        found.unwrap_or(last)
    }

    /// Adds `delta` to the aggregate of the child at `index`.
    pub(crate) fn grow(&mut self, index: usize, delta: &NodeWeight<C::Weight>) {
        let aggregate = self.entries.combine().combine(&self.entries[index].weight, delta);
        self.entries.set_weight_at(index, aggregate);
    }

    /// Removes `delta` from the aggregate of the child at `index`.
    pub(crate) fn shrink(&mut self, index: usize, delta: &NodeWeight<C::Weight>) {
        let aggregate = self.entries.combine().decombine(&self.entries[index].weight, delta);
        self.entries.set_weight_at(index, aggregate);
    }

    /// Swaps `removed` for `added` in the aggregate of the child at `index`.
    pub(crate) fn exchange(&mut self, index: usize, removed: &NodeWeight<C::Weight>, added: &NodeWeight<C::Weight>) {
        let counted = self.entries.combine();
        let aggregate = counted.combine(&counted.decombine(&self.entries[index].weight, removed), added);
        self.entries.set_weight_at(index, aggregate);
    }

    pub(crate) fn set_aggregate(&mut self, index: usize, aggregate: NodeWeight<C::Weight>) {
        self.entries.set_weight_at(index, aggregate);
    }

    pub(crate) fn insert_child(&mut self, index: usize, child: Handle, aggregate: NodeWeight<C::Weight>) {
        self.entries.insert_at(index, WeightedValue::new(child, aggregate));
    }

    /// Moves the upper half of the entries into a new branch.
    ///
    /// Returns the new branch with the aggregate of the half left behind.
    pub(crate) fn split(&mut self) -> (Self, NodeWeight<C::Weight>)
    where
        C: Clone,
    {
        let (entries, left) = self.entries.split();
        (Self { entries }, left)
    }
}

impl<V: Clone, C: Combine + Clone> Clone for Node<V, C> {
    fn clone(&self) -> Self {
        match self {
            Node::Leaf(leaf) => Node::Leaf(LeafNode {
                next: leaf.next,
                records: leaf.records.clone(),
            }),
            Node::Branch(branch) => Node::Branch(BranchNode {
                entries: branch.entries.clone(),
            }),
        }
    }
}
