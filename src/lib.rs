//! Weighted positional lists with maintained prefix aggregates.
//!
//! Every element stored in these collections carries a *weight*, and every
//! element knows its *dependency*: the combination of the weights of all
//! elements before it. Editing the list keeps all dependencies correct without
//! recomputing the whole prefix.
//!
//! - [`WeightedSeq`] - a flat sequence, O(n) edits, ideal for short lists and
//!   used as the node storage of the tree
//! - [`OSBTreeList`] - an order-statistic B+tree built from bounded
//!   `WeightedSeq` nodes, O(log n) positional edits and lookups
//!
//! Weights are combined by a [`Combine`](weight::Combine) strategy, either plain
//! arithmetic ([`Additive`](weight::Additive)) or a user-supplied pair of
//! functions ([`Operators`](weight::Operators)).
//!
//! # Example
//!
//! ```
//! use relative_osbtree::{OSBTreeList, WeightedValue};
//! use relative_osbtree::weight::Additive;
//!
//! // Paragraphs weighted by their line count.
//! let mut paragraphs: OSBTreeList<&str, Additive<u32>> = OSBTreeList::new();
//! paragraphs.push(WeightedValue::new("intro", 3));
//! paragraphs.push(WeightedValue::new("body", 10));
//! paragraphs.push(WeightedValue::new("outro", 2));
//!
//! // The dependency of a paragraph is its first line number.
//! assert_eq!(paragraphs.record(2).unwrap().dependency, 13);
//!
//! // Growing the body moves everything after it.
//! paragraphs.replace(1, WeightedValue::new("body", 12)).unwrap();
//! assert_eq!(paragraphs.record(2).unwrap().dependency, 15);
//! assert_eq!(paragraphs.total(), 17);
//! ```
//!
//! # Features
//!
//! - **`no_std` compatible** - Only requires `alloc`, no standard library dependency
//! - **O(log n) positional operations** - Insert, remove, replace and lookup by position
//! - **Search by cumulative weight** - [`find_by_weight`](OSBTreeList::find_by_weight)
//!   maps a weight back to a position
//! - **Cache-efficient** - B+tree structure with contiguous node storage
//!
//! # Implementation
//!
//! The tree is a B+tree (all elements in leaves, linked leaf chain). Leaves
//! store dependencies relative to the start of the leaf, and every branch entry
//! stores the element count and combined weight of its subtree, so a mutation
//! only touches one leaf and the aggregates along the path to it. Structural
//! events are reported through the [`log`] facade at `trace` level.

#![no_std]
// These forbid rules and lint groups are meant to be very restrictive.
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

mod error;
mod raw;

pub mod osbtree_list;
pub mod search;
pub mod weight;
pub mod weighted_seq;

pub use error::{Error, Result};
pub use osbtree_list::{Capacity, Configuration, NodeKind, OSBTreeList};
pub use weighted_seq::{Record, WeightedSeq, WeightedValue};
