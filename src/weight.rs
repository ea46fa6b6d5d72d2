//! Weight domains.
//!
//! Every element stored in a [`WeightedSeq`](crate::WeightedSeq) or an
//! [`OSBTreeList`](crate::OSBTreeList) carries a weight. A [`Combine`]
//! implementation supplies the identity, the combine operator and its inverse.
//!
//! # Contract
//!
//! The collections never check the algebra at runtime. An implementation must
//! guarantee, for all weights `a`, `b` and `c`:
//!
//! - `combine(zero, a) == a` (identity),
//! - `combine(combine(a, b), c) == combine(a, combine(b, c))` (associativity),
//! - `combine(a, b) == combine(b, a)` (commutativity),
//! - `decombine(combine(a, b), b) == a` (inverse).
//!
//! Breaking the contract does not cause undefined behavior, but dependencies
//! will silently be wrong.

use core::fmt;
use core::marker::PhantomData;
use core::ops::{Add, Sub};

/// A commutative weight algebra with an inverse operator.
pub trait Combine {
    /// The weight carried by each element.
    type Weight: Clone + PartialEq;

    /// The identity weight, used as the dependency of the first element.
    fn zero(&self) -> Self::Weight;

    /// Combines two weights.
    fn combine(&self, lhs: &Self::Weight, rhs: &Self::Weight) -> Self::Weight;

    /// Removes `rhs` from `lhs`, undoing [`combine`](Self::combine).
    fn decombine(&self, lhs: &Self::Weight, rhs: &Self::Weight) -> Self::Weight;
}

/// Plain `+`/`-` arithmetic with `Default` as zero.
///
/// # Examples
///
/// ```
/// use relative_osbtree::weight::{Additive, Combine};
///
/// let additive = Additive::<u32>::new();
/// assert_eq!(additive.combine(&2, &3), 5);
/// assert_eq!(additive.decombine(&5, &3), 2);
/// ```
pub struct Additive<W>(PhantomData<fn() -> W>);

impl<W> Additive<W> {
    /// Creates the additive strategy.
    #[must_use]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<W> Combine for Additive<W>
where
    W: Clone + PartialEq + Default + Add<Output = W> + Sub<Output = W>,
{
    type Weight = W;

    #[inline]
    fn zero(&self) -> W {
        W::default()
    }

    #[inline]
    fn combine(&self, lhs: &W, rhs: &W) -> W {
        lhs.clone() + rhs.clone()
    }

    #[inline]
    fn decombine(&self, lhs: &W, rhs: &W) -> W {
        lhs.clone() - rhs.clone()
    }
}

impl<W> Clone for Additive<W> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<W> Copy for Additive<W> {}

impl<W> Default for Additive<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W> fmt::Debug for Additive<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Additive")
    }
}

/// A weight algebra given as a zero plus two plain functions.
///
/// # Examples
///
/// ```
/// use relative_osbtree::weight::{Combine, Operators};
///
/// // Durations in milliseconds, saturating instead of overflowing.
/// let ops = Operators::new(0u64, |a, b| a.saturating_add(*b), |a, b| a.saturating_sub(*b));
/// assert_eq!(ops.combine(&ops.zero(), &7), 7);
/// ```
pub struct Operators<W> {
    zero: W,
    combine: fn(&W, &W) -> W,
    decombine: fn(&W, &W) -> W,
}

impl<W> Operators<W> {
    /// Creates a strategy from an identity and the operator pair.
    pub const fn new(zero: W, combine: fn(&W, &W) -> W, decombine: fn(&W, &W) -> W) -> Self {
        Self {
            zero,
            combine,
            decombine,
        }
    }
}

impl<W: Clone + PartialEq> Combine for Operators<W> {
    type Weight = W;

    #[inline]
    fn zero(&self) -> W {
        self.zero.clone()
    }

    #[inline]
    fn combine(&self, lhs: &W, rhs: &W) -> W {
        (self.combine)(lhs, rhs)
    }

    #[inline]
    fn decombine(&self, lhs: &W, rhs: &W) -> W {
        (self.decombine)(lhs, rhs)
    }
}

impl<W: Clone> Clone for Operators<W> {
    fn clone(&self) -> Self {
        Self {
            zero: self.zero.clone(),
            combine: self.combine,
            decombine: self.decombine,
        }
    }
}

impl<W: fmt::Debug> fmt::Debug for Operators<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operators").field("zero", &self.zero).finish_non_exhaustive()
    }
}

// Aggregate over a whole subtree: how many elements it holds and their combined weight.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct NodeWeight<W> {
    pub(crate) count: usize,
    pub(crate) weight: W,
}

impl<W> NodeWeight<W> {
    pub(crate) const fn new(count: usize, weight: W) -> Self {
        Self { count, weight }
    }
}

// Lifts a weight algebra to `NodeWeight`s so branch entries can reuse `WeightedSeq`.
#[derive(Clone, Debug)]
pub(crate) struct Counted<C>(pub(crate) C);

impl<C: Combine> Combine for Counted<C> {
    type Weight = NodeWeight<C::Weight>;

    #[inline]
    fn zero(&self) -> Self::Weight {
        NodeWeight::new(0, self.0.zero())
    }

    #[inline]
    fn combine(&self, lhs: &Self::Weight, rhs: &Self::Weight) -> Self::Weight {
        NodeWeight::new(lhs.count + rhs.count, self.0.combine(&lhs.weight, &rhs.weight))
    }

    #[inline]
    fn decombine(&self, lhs: &Self::Weight, rhs: &Self::Weight) -> Self::Weight {
        debug_assert!(lhs.count >= rhs.count, "`Counted::decombine()` - count underflow!");
        NodeWeight::new(lhs.count - rhs.count, self.0.decombine(&lhs.weight, &rhs.weight))
    }
}
