use core::num::NonZero;

#[cfg(test)]
type RawHandle = u16;
#[cfg(not(test))]
type RawHandle = u32;

#[cfg(test)]
type RawGeneration = u8;
#[cfg(not(test))]
type RawGeneration = u32;

/// Index of a node slot in the arena.
///
/// Stored off-by-one in a `NonZero` so `Option<Handle>` (a child or parent link) costs nothing extra.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub(crate) struct Handle(NonZero<RawHandle>);

impl Handle {
    pub(crate) const MAX: usize = (RawHandle::MAX - 1) as usize;

    #[inline]
    pub(crate) const fn from_index(index: usize) -> Self {
        assert!(index <= Self::MAX, "`Handle::from_index()` - `index` > `Handle::MAX`!");
        // `index + 1` is never zero and fits after the bound check.
        #[allow(clippy::cast_possible_truncation)]
        Self(NonZero::new((index + 1) as RawHandle).unwrap())
    }

    #[inline]
    pub(crate) const fn to_index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

/// Number of times an arena slot has been vacated.
///
/// A handle paired with the generation it was issued under stops resolving once its slot is reused.
/// Generations never wrap: a slot whose generation is exhausted is retired instead of reused.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub(crate) struct Generation(RawGeneration);

impl Generation {
    /// The following generation, or `None` once the counter is exhausted.
    #[inline]
    #[must_use]
    pub(crate) const fn next(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(next) => Some(Self(next)),
            None => None,
        }
    }
}
