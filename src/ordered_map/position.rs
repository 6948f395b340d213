use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;

use crate::raw::RawCursor;

/// A position inside an [`OrderedMap`](crate::OrderedMap): on an entry, or past the end.
///
/// Positions are small `Copy` handles. They do not borrow the map, so they can be kept
/// across mutations and handed back to positional operations such as
/// [`erase_at`](crate::OrderedMap::erase_at). A position stays valid until the entry it
/// designates is erased or the map is cleared; inserting or erasing *other* entries never
/// invalidates it.
///
/// Using a position that is no longer valid, that came from another map, or that was never
/// set is reported as an [`Error`](crate::Error) instead of touching the map.
///
/// # Examples
///
/// ```
/// use wabi_map::OrderedMap;
///
/// let mut map = OrderedMap::from([(1, "a"), (2, "b"), (3, "c")]);
/// let two = map.find(&2);
///
/// map.insert(0, "z");
/// map.erase(&3);
/// assert_eq!(map.entry_at(two), Ok((&2, &"b")));
///
/// let after = map.erase_at(two).unwrap();
/// assert_eq!(after, map.end());
/// ```
pub struct Position<K, V> {
    raw: RawCursor,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K, V> Position<K, V> {
    #[inline]
    pub(crate) const fn from_raw(raw: RawCursor) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub(crate) const fn raw(self) -> RawCursor {
        self.raw
    }

    /// Returns true if this position was default-constructed.
    ///
    /// ```
    /// use wabi_map::ordered_map::Position;
    ///
    /// let unset: Position<i32, i32> = Position::default();
    /// assert!(unset.is_unset());
    /// ```
    #[must_use]
    pub const fn is_unset(&self) -> bool {
        self.raw.tree().is_none()
    }
}

impl<K, V> Clone for Position<K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for Position<K, V> {}

impl<K, V> PartialEq for Position<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<K, V> Eq for Position<K, V> {}

impl<K, V> Hash for Position<K, V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<K, V> Default for Position<K, V> {
    /// An unset position; it compares equal only to other unset positions.
    fn default() -> Self {
        Self::from_raw(RawCursor::UNSET)
    }
}

impl<K, V> fmt::Debug for Position<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.raw.tree(), self.raw.node()) {
            (None, _) => f.write_str("Position(unset)"),
            (Some(_), None) => f.write_str("Position(end)"),
            (Some(_), Some(node)) => f.debug_tuple("Position").field(&node.handle.to_index()).finish(),
        }
    }
}
