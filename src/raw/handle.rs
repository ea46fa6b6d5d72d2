use core::fmt;
use core::num::NonZero;

#[cfg(test)]
type RawHandle = u16;
#[cfg(not(test))]
type RawHandle = u32;

/// Slot of a node in the arena.
///
/// Stored as `slot + 1`, so a leaf's `Option<Handle>` forward link costs nothing extra.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub(crate) struct Handle(NonZero<RawHandle>);

impl Handle {
    /// Number of arena slots a handle can address.
    pub(crate) const SLOTS: usize = RawHandle::MAX as usize;

    /// Handle for `slot`, or `None` once `slot` is past the addressable range.
    #[inline]
    pub(crate) fn new(slot: usize) -> Option<Self> {
        let raw = RawHandle::try_from(slot.checked_add(1)?).ok()?;
        NonZero::new(raw).map(Self)
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index())
    }
}
