use super::handle::Handle;

/// Number of entries in a subtree.
///
/// Bounded by the number of addressable slots, so it shares `Handle`'s width.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(transparent)]
pub(crate) struct Size(Handle);

impl Size {
    pub(crate) const MAX: usize = Handle::MAX;
    pub(crate) const ZERO: Self = Self::from_usize(0);
    pub(crate) const ONE: Self = Self::from_usize(1);

    #[inline]
    pub(crate) const fn from_usize(size: usize) -> Self {
        assert!(size <= Self::MAX, "`Size::from_usize()` - `size` > `Size::MAX`!");
        Self(Handle::from_index(size))
    }

    #[inline]
    pub(crate) const fn to_usize(self) -> usize {
        self.0.to_index()
    }

    /// Balance weight of a subtree of this size: one more than its entry count,
    /// so an empty subtree still weighs 1.
    #[inline]
    pub(crate) const fn weight(self) -> usize {
        self.to_usize() + 1
    }

    /// Size of a node whose children have sizes `left` and `right`.
    #[inline]
    pub(crate) const fn joining(left: Size, right: Size) -> Self {
        Self::from_usize(left.to_usize() + right.to_usize() + 1)
    }
}
