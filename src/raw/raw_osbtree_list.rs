use core::fmt;

use smallvec::SmallVec;

use super::arena::Arena;
use super::handle::Handle;
use super::node::{BranchNode, LeafNode, Node};
use crate::error::{Result, check_index, check_insert};
use crate::osbtree_list::{Capacity, Configuration};
use crate::search::{Direction, binary_search};
use crate::weight::{Combine, NodeWeight};
use crate::weighted_seq::{Record, WeightedValue};

/// The B+tree engine backing `OSBTreeList`.
pub(crate) struct RawOSBTreeList<V, C: Combine> {
    /// Arena storing every node. Handles stay valid until `clear`.
    nodes: Arena<Node<V, C>>,
    /// The root always exists; an empty list is a single empty leaf.
    root: Handle,
    /// Leftmost leaf. Splits keep the left half in place, so it only changes on `clear`.
    first_leaf: Handle,
    /// Total number of elements.
    len: usize,
    /// Number of levels, counting the leaves.
    height: usize,
    combine: C,
    capacity: Capacity,
}

/// Path element for tracking traversal during mutations.
struct PathElement {
    /// Branch visited at this level.
    node: Handle,
    /// Index of the entry we descended into.
    child_index: usize,
}

type Path = SmallVec<[PathElement; 16]>;

impl<V, C: Combine> RawOSBTreeList<V, C> {
    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    pub(crate) const fn height(&self) -> usize {
        self.height
    }

    pub(crate) const fn capacity(&self) -> Capacity {
        self.capacity
    }

    pub(crate) const fn combine(&self) -> &C {
        &self.combine
    }

    pub(crate) const fn first_leaf(&self) -> Handle {
        self.first_leaf
    }

    pub(crate) fn node(&self, handle: Handle) -> &Node<V, C> {
        self.nodes.get(handle)
    }

    /// Returns the combined weight of every element.
    pub(crate) fn total(&self) -> C::Weight {
        self.nodes.get(self.root).aggregate().weight
    }
}

impl<V, C: Combine + Clone> RawOSBTreeList<V, C> {
    pub(crate) fn new(configuration: Configuration<C>) -> Self {
        let (combine, capacity) = configuration.into_parts();
        let mut nodes = Arena::new();
        let root = nodes.alloc(Node::Leaf(LeafNode::new(combine.clone())));
        Self {
            nodes,
            root,
            first_leaf: root,
            len: 0,
            height: 1,
            combine,
            capacity,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root = self.nodes.alloc(Node::Leaf(LeafNode::new(self.combine.clone())));
        self.first_leaf = self.root;
        self.len = 0;
        self.height = 1;
    }

    /// Walks from the root to the leaf holding `position`.
    ///
    /// Returns the leaf, the position within it and the combined weight of
    /// every element in leaves before it. Each branch visited is pushed onto `path`.
    fn descend(&self, mut position: usize, path: &mut Path) -> (Handle, usize, C::Weight) {
        let mut offset = self.combine.zero();
        let mut current = self.root;

        while let Node::Branch(branch) = self.nodes.get(current) {
            let child_index = branch.child_index(position);
            let entry = branch.entry(child_index);
            position -= entry.dependency.count;
            offset = self.combine.combine(&entry.dependency.weight, &offset);
            path.push(PathElement {
                node: current,
                child_index,
            });
            current = entry.value;
        }

        (current, position, offset)
    }

    pub(crate) fn get(&self, position: usize) -> Option<&V> {
        if position >= self.len {
            return None;
        }
        let (leaf, index, _) = self.descend(position, &mut Path::new());
        self.nodes.get(leaf).as_leaf().records().get(index).map(|record| &record.value)
    }

    /// Returns the record at `position` with its dependency over the whole list.
    pub(crate) fn record(&self, position: usize) -> Option<Record<&V, C::Weight>> {
        if position >= self.len {
            return None;
        }
        let (leaf, index, offset) = self.descend(position, &mut Path::new());
        let mut record = self.nodes.get(leaf).as_leaf().records().record(index)?;
        record.dependency = self.combine.combine(&record.dependency, &offset);
        Some(record)
    }

    pub(crate) fn insert(&mut self, position: usize, value: WeightedValue<V, C::Weight>) -> Result<()> {
        check_insert(position, self.len)?;
        self.insert_at(position, value);
        Ok(())
    }

    pub(crate) fn push(&mut self, value: WeightedValue<V, C::Weight>) {
        self.insert_at(self.len, value);
    }

    fn insert_at(&mut self, mut position: usize, value: WeightedValue<V, C::Weight>) {
        let delta = NodeWeight::new(1, value.weight.clone());
        let mut path = Path::new();
        let mut current = self.root;

        // Ancestor aggregates absorb the new element on the way down.
        while let Node::Branch(branch) = self.nodes.get_mut(current) {
            let child_index = branch.child_index(position);
            let entry = branch.entry(child_index);
            position -= entry.dependency.count;
            let child = entry.value;
            branch.grow(child_index, &delta);
            path.push(PathElement {
                node: current,
                child_index,
            });
            current = child;
        }

        self.nodes.get_mut(current).as_leaf_mut().records_mut().insert_at(position, value);
        self.len += 1;
        self.split_overflowing(current, path);
    }

    /// Splits `child` and then each ancestor in turn while they exceed capacity.
    fn split_overflowing(&mut self, mut child: Handle, mut path: Path) {
        loop {
            let node = self.nodes.get(child);
            if !self.capacity.is_exceeded(node.kind(), node.len()) {
                return;
            }

            let (sibling, left, right) = self.split_node(child);
            match path.pop() {
                Some(PathElement { node, child_index }) => {
                    let parent = self.nodes.get_mut(node).as_branch_mut();
                    parent.set_aggregate(child_index, left);
                    parent.insert_child(child_index + 1, sibling, right);
                    child = node;
                }
                None => {
                    let root = BranchNode::new_root(self.combine.clone(), (child, left), (sibling, right));
                    self.root = self.nodes.alloc(Node::Branch(root));
                    self.height += 1;
                    log::trace!("root split, height is now {}", self.height);
                    return;
                }
            }
        }
    }

    /// Moves the upper half of a node into a new sibling.
    ///
    /// Returns the sibling with the aggregates of the left and right halves.
    fn split_node(&mut self, handle: Handle) -> (Handle, NodeWeight<C::Weight>, NodeWeight<C::Weight>) {
        let (sibling, left) = match self.nodes.get_mut(handle) {
            Node::Leaf(leaf) => {
                let (right, left) = leaf.split();
                (Node::Leaf(right), left)
            }
            Node::Branch(branch) => {
                let (right, left) = branch.split();
                (Node::Branch(right), left)
            }
        };
        let right = sibling.aggregate();
        let kind = sibling.kind();
        let sibling = self.nodes.alloc(sibling);

        if let Node::Leaf(leaf) = self.nodes.get_mut(handle) {
            leaf.set_next(Some(sibling));
        }

        log::trace!(
            "split {kind} {handle} into {} + {} elements, new sibling {sibling}",
            left.count,
            right.count
        );
        (sibling, left, right)
    }

    /// Removes the element at `position`, returning it with its dependency over the whole list.
    ///
    /// Nodes left empty stay in the tree.
    pub(crate) fn remove(&mut self, position: usize) -> Result<Record<V, C::Weight>> {
        check_index(position, self.len)?;
        let mut path = Path::new();
        let (leaf, index, offset) = self.descend(position, &mut path);

        let mut record = self.nodes.get_mut(leaf).as_leaf_mut().records_mut().remove_at(index);
        let delta = NodeWeight::new(1, record.weight.clone());
        for element in &path {
            self.nodes.get_mut(element.node).as_branch_mut().shrink(element.child_index, &delta);
        }
        self.len -= 1;

        record.dependency = self.combine.combine(&record.dependency, &offset);
        Ok(record)
    }

    /// Replaces the value and weight at `position`, returning the previous pair.
    pub(crate) fn replace(
        &mut self,
        position: usize,
        value: WeightedValue<V, C::Weight>,
    ) -> Result<WeightedValue<V, C::Weight>> {
        check_index(position, self.len)?;
        let mut path = Path::new();
        let (leaf, index, _) = self.descend(position, &mut path);

        let added = NodeWeight::new(0, value.weight.clone());
        let old = self.nodes.get_mut(leaf).as_leaf_mut().records_mut().replace_at(index, value);
        if old.weight != added.weight {
            let removed = NodeWeight::new(0, old.weight.clone());
            for element in &path {
                self.nodes.get_mut(element.node).as_branch_mut().exchange(element.child_index, &removed, &added);
            }
        }
        Ok(old)
    }

    /// Finds the first element whose weight combined with its dependency satisfies `predicate`.
    ///
    /// Leaves left empty by removals are stepped over through the forward links.
    pub(crate) fn find_by_weight<F>(&self, mut predicate: F) -> Option<(usize, Record<&V, C::Weight>)>
    where
        F: FnMut(&C::Weight) -> bool,
    {
        let combine = &self.combine;
        let mut offset = combine.zero();
        let mut position = 0;
        let mut current = self.root;

        while let Node::Branch(branch) = self.nodes.get(current) {
            let child_index = binary_search(branch.entries().as_slice(), Direction::Ascending, |entry, _| {
                let end = combine.combine(&entry.weight.weight, &entry.dependency.weight);
                predicate(&combine.combine(&end, &offset))
            })?;
            let entry = branch.entry(child_index);
            position += entry.dependency.count;
            offset = combine.combine(&entry.dependency.weight, &offset);
            current = entry.value;
        }

        let mut next = Some(current);
        while let Some(handle) = next {
            let leaf = self.nodes.get(handle).as_leaf();
            let records = leaf.records();
            let found = binary_search(records.as_slice(), Direction::Ascending, |record, _| {
                let end = combine.combine(&record.weight, &record.dependency);
                predicate(&combine.combine(&end, &offset))
            });
            if let Some(index) = found {
                let mut record = records.record(index)?;
                record.dependency = combine.combine(&record.dependency, &offset);
                return Some((position + index, record));
            }
            position += records.len();
            offset = combine.combine(&records.total(), &offset);
            next = leaf.next();
        }
        None
    }
}

impl<V: fmt::Debug, C: Combine> RawOSBTreeList<V, C>
where
    C::Weight: fmt::Debug,
{
    /// Writes one line per node, children indented under their branch.
    pub(crate) fn write_tree(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "height {}, {} elements, {} nodes",
            self.height,
            self.len,
            self.nodes.len()
        )?;
        self.write_node(f, self.root, 1)
    }

    fn write_node(&self, f: &mut fmt::Formatter<'_>, handle: Handle, depth: usize) -> fmt::Result {
        let indent = depth * 2;
        match self.nodes.get(handle) {
            Node::Leaf(leaf) => {
                write!(f, "{:indent$}leaf {handle}:", "")?;
                for record in leaf.records() {
                    write!(f, " {:?} ({:?} @ {:?})", record.value, record.weight, record.dependency)?;
                }
                writeln!(f)
            }
            Node::Branch(branch) => {
                let total = branch.entries().total();
                writeln!(
                    f,
                    "{:indent$}branch {handle}: {} elements, weight {:?}",
                    "",
                    total.count,
                    total.weight
                )?;
                for entry in branch.entries() {
                    self.write_node(f, entry.value, depth + 1)?;
                }
                Ok(())
            }
        }
    }
}

impl<V: Clone, C: Combine + Clone> Clone for RawOSBTreeList<V, C> {
    fn clone(&self) -> Self {
        // Handles are arena indices, so a slot-for-slot copy keeps every link valid.
        Self {
            nodes: self.nodes.clone(),
            root: self.root,
            first_leaf: self.first_leaf,
            len: self.len,
            height: self.height,
            combine: self.combine.clone(),
            capacity: self.capacity,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::weight::Additive;
    use crate::weighted_seq::WeightedSeq;
    use alloc::string::String;
    use alloc::vec::Vec;
    use proptest::prelude::*;

    type TestList = RawOSBTreeList<i32, Additive<i32>>;

    impl<V, C> RawOSBTreeList<V, C>
    where
        C: Combine + Clone,
        C::Weight: fmt::Debug,
    {
        /// Validates all tree invariants. Panics with a descriptive message if any are violated.
        pub(crate) fn validate_invariants(&self) {
            let mut errors: Vec<String> = Vec::new();
            let mut leaves: Vec<Handle> = Vec::new();
            let mut leaf_depth: Option<usize> = None;

            // 1. Structure, capacities, dependency chains and aggregates.
            let root = self.validate_node(self.root, 0, &mut leaf_depth, &mut leaves, &mut errors);

            // 2. Height counts the leaf level.
            if leaf_depth.map(|depth| depth + 1) != Some(self.height) {
                errors.push(alloc::format!("height mismatch: stored={}, leaf depth={leaf_depth:?}", self.height));
            }

            // 3. len matches the root aggregate.
            if root.count != self.len {
                errors.push(alloc::format!("len mismatch: self.len={}, root count={}", self.len, root.count));
            }

            // 4. The forward chain visits the leaves in order.
            let mut chain: Vec<Handle> = Vec::new();
            let mut next = Some(self.first_leaf);
            while let Some(handle) = next {
                if chain.len() > leaves.len() {
                    errors.push("leaf chain is longer than the leaf count".into());
                    break;
                }
                chain.push(handle);
                next = self.nodes.get(handle).as_leaf().next();
            }
            if chain != leaves {
                errors.push(alloc::format!("leaf chain mismatch: chain={chain:?}, in-order={leaves:?}"));
            }

            assert!(errors.is_empty(), "Tree invariant violations:\n{}", errors.join("\n"));
        }

        fn validate_node(
            &self,
            handle: Handle,
            depth: usize,
            leaf_depth: &mut Option<usize>,
            leaves: &mut Vec<Handle>,
            errors: &mut Vec<String>,
        ) -> NodeWeight<C::Weight> {
            let node = self.nodes.get(handle);
            if self.capacity.is_exceeded(node.kind(), node.len()) {
                errors.push(alloc::format!("{} {handle:?} over capacity with {} records", node.kind(), node.len()));
            }

            match node {
                Node::Leaf(leaf) => {
                    match *leaf_depth {
                        None => *leaf_depth = Some(depth),
                        Some(expected) if expected != depth => {
                            errors.push(alloc::format!("leaf {handle:?} at depth {depth}, expected {expected}"));
                        }
                        Some(_) => {}
                    }
                    check_dependencies(leaf.records(), handle, errors);
                    leaves.push(handle);
                    leaf.aggregate()
                }
                Node::Branch(branch) => {
                    if branch.entries().is_empty() {
                        errors.push(alloc::format!("branch {handle:?} has no children"));
                    }
                    check_dependencies(branch.entries(), handle, errors);
                    for (index, entry) in branch.entries().iter().enumerate() {
                        let actual = self.validate_node(entry.value, depth + 1, leaf_depth, leaves, errors);
                        if actual != entry.weight {
                            errors.push(alloc::format!(
                                "aggregate mismatch at {handle:?} child {index}: stored={:?}, actual={actual:?}",
                                entry.weight
                            ));
                        }
                    }
                    branch.entries().total()
                }
            }
        }
    }

    fn check_dependencies<V, C: Combine>(seq: &WeightedSeq<V, C>, handle: Handle, errors: &mut Vec<String>)
    where
        C::Weight: fmt::Debug,
    {
        let combine = seq.combine();
        let mut expected = combine.zero();
        for (index, record) in seq.iter().enumerate() {
            if record.dependency != expected {
                errors.push(alloc::format!(
                    "dependency mismatch at {handle:?} index {index}: stored={:?}, expected={expected:?}",
                    record.dependency
                ));
            }
            expected = combine.combine(&record.weight, &record.dependency);
        }
    }

    fn list(leaf: usize, branch: usize) -> TestList {
        let capacity = Capacity::new(leaf, branch).unwrap();
        RawOSBTreeList::new(Configuration::new(Additive::new()).with_capacity(capacity))
    }

    fn values(list: &TestList) -> Vec<(i32, i32)> {
        (0..list.len())
            .map(|position| {
                let record = list.record(position).unwrap();
                (*record.value, record.dependency)
            })
            .collect()
    }

    fn expected(model: &[i32]) -> Vec<(i32, i32)> {
        let mut dependency = 0;
        model
            .iter()
            .map(|&weight| {
                let pair = (weight, dependency);
                dependency += weight;
                pair
            })
            .collect()
    }

    #[test]
    fn empty_list_is_a_single_leaf() {
        let list = list(2, 2);
        list.validate_invariants();
        assert_eq!((list.len(), list.height(), list.total()), (0, 1, 0));
        assert!(list.record(0).is_none());
        assert!(list.find_by_weight(|_| true).is_none());
    }

    #[test]
    fn appending_grows_the_root() {
        let mut list = list(2, 2);
        for weight in 1..=4 {
            list.push(WeightedValue::from_weight(weight));
            list.validate_invariants();
        }
        assert_eq!(values(&list), expected(&[1, 2, 3, 4]));
        assert!(list.height() > 1);
        assert!(matches!(list.node(list.root), Node::Branch(_)));
    }

    #[test]
    fn growth_adds_one_level_per_root_split() {
        let mut list = list(2, 2);
        let mut heights = Vec::new();
        for weight in 0..32 {
            list.push(WeightedValue::from_weight(weight));
            if heights.last() != Some(&list.height()) {
                heights.push(list.height());
            }
        }
        list.validate_invariants();
        assert_eq!(heights, (1..=heights.len()).collect::<Vec<_>>());
    }

    #[test]
    fn out_of_bounds_leaves_tree_untouched() {
        let mut list = list(2, 2);
        for weight in [1, 2, 3] {
            list.push(WeightedValue::from_weight(weight));
        }
        assert_eq!(
            list.insert(4, WeightedValue::from_weight(9)),
            Err(Error::OutOfBounds { position: 4, len: 3 })
        );
        assert_eq!(list.remove(3), Err(Error::OutOfBounds { position: 3, len: 3 }));
        assert_eq!(
            list.replace(3, WeightedValue::from_weight(9)),
            Err(Error::OutOfBounds { position: 3, len: 3 })
        );
        list.validate_invariants();
        assert_eq!(values(&list), expected(&[1, 2, 3]));
    }

    #[test]
    fn removal_keeps_empty_leaves_and_find_steps_over_them() {
        let mut list = list(2, 2);
        for weight in [1, 2, 3, 4, 5, 6] {
            list.push(WeightedValue::from_weight(weight));
        }
        // Empty the first two leaves.
        for _ in 0..4 {
            let removed = list.remove(0).unwrap();
            assert_eq!(removed.dependency, 0);
        }
        list.validate_invariants();
        assert_eq!(values(&list), expected(&[5, 6]));

        let (position, record) = list.find_by_weight(|&end| end >= 0).unwrap();
        assert_eq!((position, *record.value, record.dependency), (0, 5, 0));
        let (position, record) = list.find_by_weight(|&end| end > 5).unwrap();
        assert_eq!((position, *record.value, record.dependency), (1, 6, 5));
        assert!(list.find_by_weight(|&end| end > 11).is_none());

        // Position 0 resolves past the empty leaves.
        list.insert(0, WeightedValue::from_weight(7)).unwrap();
        list.validate_invariants();
        assert_eq!(values(&list), expected(&[7, 5, 6]));
    }

    #[test]
    fn remove_reports_global_dependency() {
        let mut list = list(2, 2);
        for weight in [1, 2, 3, 4, 5] {
            list.push(WeightedValue::from_weight(weight));
        }
        let removed = list.remove(3).unwrap();
        assert_eq!((removed.value, removed.weight, removed.dependency), (4, 4, 6));
        list.validate_invariants();
    }

    #[test]
    fn replace_updates_ancestor_weights() {
        let mut list = list(2, 2);
        for weight in [1, 2, 3, 4, 5] {
            list.push(WeightedValue::from_weight(weight));
        }
        let old = list.replace(1, WeightedValue::new(20, 20)).unwrap();
        assert_eq!(old, WeightedValue::new(2, 2));
        list.validate_invariants();
        assert_eq!(list.total(), 33);
        assert_eq!(values(&list), expected(&[1, 20, 3, 4, 5]));
    }

    #[test]
    fn clone_is_independent() {
        let mut list = list(2, 3);
        for weight in 0..10 {
            list.push(WeightedValue::from_weight(weight));
        }
        let copy = list.clone();
        list.remove(0).unwrap();
        copy.validate_invariants();
        assert_eq!(values(&copy), expected(&(0..10).collect::<Vec<_>>()));
    }

    #[test]
    fn clear_resets_to_single_leaf() {
        let mut list = list(2, 2);
        for weight in 0..10 {
            list.push(WeightedValue::from_weight(weight));
        }
        list.clear();
        list.validate_invariants();
        assert_eq!((list.len(), list.height()), (0, 1));
        list.push(WeightedValue::from_weight(3));
        assert_eq!(values(&list), expected(&[3]));
    }

    #[derive(Clone, Debug)]
    enum Op {
        Insert(usize, i32),
        Push(i32),
        Remove(usize),
        Replace(usize, i32),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => (any::<usize>(), 0i32..100).prop_map(|(which, weight)| Op::Insert(which, weight)),
            2 => (0i32..100).prop_map(Op::Push),
            2 => any::<usize>().prop_map(Op::Remove),
            2 => (any::<usize>(), 0i32..100).prop_map(|(which, weight)| Op::Replace(which, weight)),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn tree_behaves_like_vec(
            leaf in 2usize..6,
            branch in 2usize..6,
            ops in prop::collection::vec(op_strategy(), 0..300),
        ) {
            let mut tree = list(leaf, branch);
            let mut model: Vec<i32> = Vec::new();

            for op in ops {
                match op {
                    Op::Insert(which, weight) => {
                        let position = which % (model.len() + 1);
                        tree.insert(position, WeightedValue::from_weight(weight)).unwrap();
                        model.insert(position, weight);
                    }
                    Op::Push(weight) => {
                        tree.push(WeightedValue::from_weight(weight));
                        model.push(weight);
                    }
                    Op::Remove(which) => {
                        if model.is_empty() {
                            prop_assert!(tree.remove(0).is_err());
                            continue;
                        }
                        let position = which % model.len();
                        let removed = tree.remove(position).unwrap();
                        prop_assert_eq!(removed.dependency, model[..position].iter().sum::<i32>());
                        prop_assert_eq!(removed.value, model.remove(position));
                    }
                    Op::Replace(which, weight) => {
                        if model.is_empty() {
                            continue;
                        }
                        let position = which % model.len();
                        let old = tree.replace(position, WeightedValue::from_weight(weight)).unwrap();
                        prop_assert_eq!(old.weight, model[position]);
                        model[position] = weight;
                    }
                }

                tree.validate_invariants();
                prop_assert_eq!(tree.len(), model.len());
            }

            prop_assert_eq!(values(&tree), expected(&model));
            prop_assert_eq!(tree.total(), model.iter().sum::<i32>());
        }

        #[test]
        fn find_by_weight_matches_linear_scan(
            weights in prop::collection::vec(0i32..20, 0..100),
            removals in prop::collection::vec(any::<usize>(), 0..50),
            target in 0i32..1000,
        ) {
            let mut tree = list(2, 2);
            let mut model = weights.clone();
            for &weight in &weights {
                tree.push(WeightedValue::from_weight(weight));
            }
            for which in removals {
                if model.is_empty() {
                    break;
                }
                let position = which % model.len();
                tree.remove(position).unwrap();
                model.remove(position);
            }

            let mut end = 0;
            let expected = model.iter().position(|&weight| {
                end += weight;
                end > target
            });
            let found = tree.find_by_weight(|&end| end > target).map(|(position, _)| position);
            prop_assert_eq!(found, expected);
        }
    }
}
