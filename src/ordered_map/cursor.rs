use core::fmt;

use super::{OrderedMap, Position};
use crate::error::Error;

/// A read-only cursor over an [`OrderedMap`], stepping in both directions.
///
/// A cursor is a [`Position`] borrowed together with its map. It can be dereferenced and
/// moved, and it converts back into a plain position with [`Cursor::position`] whenever the
/// map needs to be mutated.
///
/// This `struct` is created by the [`cursor`](OrderedMap::cursor) method on [`OrderedMap`].
///
/// # Examples
///
/// ```
/// use wabi_map::OrderedMap;
///
/// let map = OrderedMap::from([(1, "a"), (2, "b"), (3, "c")]);
/// let mut cursor = map.cursor(map.find(&2));
///
/// assert_eq!(cursor.key_value(), Some((&2, &"b")));
/// cursor.move_next().unwrap();
/// assert_eq!(cursor.key(), Some(&3));
/// cursor.move_next().unwrap();
/// assert!(cursor.is_end());
/// cursor.move_prev().unwrap();
/// assert_eq!(cursor.value(), Some(&"c"));
/// ```
pub struct Cursor<'a, K, V> {
    map: &'a OrderedMap<K, V>,
    position: Position<K, V>,
}

impl<'a, K, V> Cursor<'a, K, V> {
    pub(crate) const fn new(map: &'a OrderedMap<K, V>, position: Position<K, V>) -> Self {
        Self { map, position }
    }

    /// The position this cursor is at.
    #[must_use]
    pub const fn position(&self) -> Position<K, V> {
        self.position
    }

    /// Returns true if the cursor is past the last entry.
    #[must_use]
    pub fn is_end(&self) -> bool {
        self.position == self.map.end()
    }

    /// The entry under the cursor, or `None` past the end or at an invalid position.
    #[must_use]
    pub fn key_value(&self) -> Option<(&'a K, &'a V)> {
        self.map.entry_at(self.position).ok()
    }

    /// The key under the cursor.
    #[must_use]
    pub fn key(&self) -> Option<&'a K> {
        self.key_value().map(|(k, _)| k)
    }

    /// The value under the cursor.
    #[must_use]
    pub fn value(&self) -> Option<&'a V> {
        self.key_value().map(|(_, v)| v)
    }

    /// Moves to the next entry in key order, or past the end after the last one.
    ///
    /// # Errors
    ///
    /// [`Error::PastTheEnd`] if the cursor is already past the end, or the error describing
    /// why its position is not valid in the map. The cursor does not move on error.
    pub fn move_next(&mut self) -> Result<(), Error> {
        self.position = self.map.next_position(self.position)?;
        Ok(())
    }

    /// Moves to the previous entry in key order. From past the end, moves to the last entry.
    ///
    /// # Errors
    ///
    /// [`Error::BeforeBegin`] at the first entry (or past the end of an empty map), or the
    /// error describing why its position is not valid in the map. The cursor does not move
    /// on error.
    pub fn move_prev(&mut self) -> Result<(), Error> {
        self.position = self.map.prev_position(self.position)?;
        Ok(())
    }
}

impl<K, V> Clone for Cursor<'_, K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for Cursor<'_, K, V> {}

impl<K, V> PartialEq for Cursor<'_, K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.position == other.position
    }
}

impl<K, V> Eq for Cursor<'_, K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Cursor<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor").field("position", &self.position).field("entry", &self.key_value()).finish()
    }
}
