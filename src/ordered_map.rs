use core::borrow::Borrow;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::iter::FusedIterator;
use core::mem;
use core::ops::Index;

use tracing::{debug, trace};

use crate::error::Error;
use crate::raw::{Handle, RawTree};

mod capacity;
mod cursor;
mod position;

pub use cursor::Cursor;
pub use position::Position;

/// An ordered map with unique keys and stable positions, based on a weight-balanced tree.
///
/// Given a key type with a [total order], an ordered map stores its entries in key order:
/// keys must implement [`Ord`]. Inserting a key that is already present never replaces the
/// stored value; the map reports the existing entry instead.
///
/// Besides the usual key-based API the map hands out [`Position`]s, small `Copy` handles to
/// an entry (or to the end of the map). Positions do not borrow the map and remain valid
/// until their own entry is erased, so they can be used to walk and erase entries while the
/// map is being changed:
///
/// ```
/// use wabi_map::OrderedMap;
///
/// let mut map: OrderedMap<u32, &str> = (1..=6).map(|i| (i, "x")).collect();
///
/// // Erase every even key while walking the map.
/// let mut position = map.begin();
/// while position != map.end() {
///     let (key, _) = map.entry_at(position).unwrap();
///     position = if key % 2 == 0 {
///         map.erase_at(position).unwrap()
///     } else {
///         map.next_position(position).unwrap()
///     };
/// }
/// assert_eq!(map.keys().copied().collect::<Vec<_>>(), [1, 3, 5]);
/// ```
///
/// Lookups come in two flavours. The strict accessors [`at`](OrderedMap::at),
/// [`at_mut`](OrderedMap::at_mut) and indexing (`map[&key]`) treat a missing key as an error,
/// while [`get_or_insert_default`](OrderedMap::get_or_insert_default) inserts a default value
/// for a missing key and always yields a writable slot:
///
/// ```
/// use wabi_map::{Error, OrderedMap};
///
/// let mut counts: OrderedMap<&str, u32> = OrderedMap::new();
/// assert_eq!(counts.at(&"apple"), Err(Error::KeyNotFound));
/// assert!(counts.is_empty());
///
/// *counts.get_or_insert_default("apple") += 1;
/// *counts.get_or_insert_default("apple") += 1;
/// assert_eq!(counts.at(&"apple"), Ok(&2));
/// assert_eq!(counts[&"apple"], 2);
/// ```
///
/// It is a logic error for a key to be modified in such a way that the key's ordering relative
/// to any other key, as determined by the [`Ord`] trait, changes while it is in the map. The
/// behavior resulting from such a logic error is not specified, but will be encapsulated to the
/// `OrderedMap` that observed it and not result in undefined behavior.
///
/// [total order]: https://en.wikipedia.org/wiki/Total_order
pub struct OrderedMap<K, V> {
    raw: RawTree<K, V>,
}

/// An iterator over the entries of an `OrderedMap`, in key order.
///
/// This `struct` is created by the [`iter`] method on [`OrderedMap`].
///
/// # Examples
///
/// ```
/// use wabi_map::OrderedMap;
///
/// let map = OrderedMap::from([(2, "b"), (1, "a")]);
/// let mut iter = map.iter();
/// assert_eq!(iter.next(), Some((&1, &"a")));
/// assert_eq!(iter.next_back(), Some((&2, &"b")));
/// assert_eq!(iter.next(), None);
/// ```
///
/// [`iter`]: OrderedMap::iter
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Iter<'a, K, V> {
    tree: Option<&'a RawTree<K, V>>,
    front: Option<Handle>,
    back: Option<Handle>,
    remaining: usize,
}

/// An owning iterator over the entries of an `OrderedMap`, in key order.
///
/// This `struct` is created by the [`into_iter`] method on [`OrderedMap`]
/// (provided by the [`IntoIterator`] trait).
///
/// [`into_iter`]: IntoIterator::into_iter
pub struct IntoIter<K, V> {
    inner: alloc::vec::IntoIter<(K, V)>,
}

/// An iterator over the keys of an `OrderedMap`.
///
/// This `struct` is created by the [`keys`](OrderedMap::keys) method on [`OrderedMap`].
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

/// An iterator over the values of an `OrderedMap`.
///
/// This `struct` is created by the [`values`](OrderedMap::values) method on [`OrderedMap`].
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<K, V> OrderedMap<K, V> {
    /// Makes a new, empty `OrderedMap`.
    ///
    /// Does not allocate anything on its own.
    ///
    /// # Examples
    ///
    /// ```
    /// use wabi_map::OrderedMap;
    ///
    /// let mut map = OrderedMap::new();
    /// map.insert(1, "a");
    /// ```
    #[must_use]
    pub fn new() -> OrderedMap<K, V> {
        OrderedMap { raw: RawTree::new() }
    }

    /// Returns the number of entries in the map.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub const fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if the map contains no entries.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Clears the map, removing all entries. Every outstanding [`Position`] becomes stale, a
    /// previously taken [`end`](OrderedMap::end) included. Allocated capacity is kept for reuse.
    ///
    /// # Examples
    ///
    /// ```
    /// use wabi_map::{Error, OrderedMap};
    ///
    /// let mut map = OrderedMap::from([(1, "a")]);
    /// let one = map.begin();
    /// map.clear();
    /// assert!(map.is_empty());
    /// assert_eq!(map.entry_at(one), Err(Error::StalePosition));
    /// ```
    ///
    /// # Complexity
    ///
    /// O(n), where n counts the entries and the slots vacated since the previous clear.
    pub fn clear(&mut self) {
        trace!(len = self.len(), "clearing map");
        self.raw.clear();
    }

    /// Returns the position of the first entry, or [`end`](OrderedMap::end) if the map is empty.
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn begin(&self) -> Position<K, V> {
        Position::from_raw(self.raw.cursor_at(self.raw.first()))
    }

    /// Returns the past-the-end position. It follows the last entry and designates none.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub fn end(&self) -> Position<K, V> {
        Position::from_raw(self.raw.cursor_at(None))
    }

    /// Returns a read-only [`Cursor`] at `position`.
    pub fn cursor(&self, position: Position<K, V>) -> Cursor<'_, K, V> {
        Cursor::new(self, position)
    }

    // Resolves a position to a live node; `Ok(None)` is past-the-end.
    fn resolve(&self, position: Position<K, V>) -> Result<Option<Handle>, Error> {
        self.raw.resolve(position.raw())
    }

    // Resolves a position that must designate an entry.
    fn resolve_entry(&self, position: Position<K, V>) -> Result<Handle, Error> {
        self.resolve(position)?.ok_or(Error::PastTheEnd)
    }

    /// Returns the entry at `position`.
    ///
    /// # Errors
    ///
    /// - [`Error::PastTheEnd`] for [`end`](OrderedMap::end).
    /// - [`Error::StalePosition`], [`Error::ForeignPosition`] or [`Error::UnsetPosition`] if
    ///   `position` does not designate an entry of this map.
    ///
    /// # Examples
    ///
    /// ```
    /// use wabi_map::{Error, OrderedMap};
    ///
    /// let map = OrderedMap::from([(1, "a")]);
    /// assert_eq!(map.entry_at(map.begin()), Ok((&1, &"a")));
    /// assert_eq!(map.entry_at(map.end()), Err(Error::PastTheEnd));
    /// ```
    pub fn entry_at(&self, position: Position<K, V>) -> Result<(&K, &V), Error> {
        let node = self.raw.node(self.resolve_entry(position)?);
        Ok((node.key(), node.value()))
    }

    /// Returns a mutable reference to the value at `position`. The key stays read-only.
    ///
    /// # Errors
    ///
    /// As for [`entry_at`](OrderedMap::entry_at).
    pub fn value_at_mut(&mut self, position: Position<K, V>) -> Result<&mut V, Error> {
        let handle = self.resolve_entry(position)?;
        Ok(self.raw.value_mut(handle))
    }

    /// Returns the position following `position` in key order; after the last entry that is
    /// [`end`](OrderedMap::end).
    ///
    /// # Errors
    ///
    /// [`Error::PastTheEnd`] when `position` is already past the end, or the error describing
    /// why `position` is not valid in this map.
    ///
    /// # Complexity
    ///
    /// O(log n) worst case, amortized O(1) over a full walk.
    pub fn next_position(&self, position: Position<K, V>) -> Result<Position<K, V>, Error> {
        let handle = self.resolve_entry(position)?;
        Ok(Position::from_raw(self.raw.cursor_at(self.raw.successor(handle))))
    }

    /// Returns the position preceding `position` in key order. The position before
    /// [`end`](OrderedMap::end) is the last entry.
    ///
    /// # Errors
    ///
    /// [`Error::BeforeBegin`] when nothing precedes `position`, or the error describing why
    /// `position` is not valid in this map.
    ///
    /// # Examples
    ///
    /// ```
    /// use wabi_map::{Error, OrderedMap};
    ///
    /// let map = OrderedMap::from([(1, "a"), (2, "b")]);
    /// let last = map.prev_position(map.end()).unwrap();
    /// assert_eq!(map.entry_at(last), Ok((&2, &"b")));
    /// assert_eq!(map.prev_position(map.begin()), Err(Error::BeforeBegin));
    /// ```
    pub fn prev_position(&self, position: Position<K, V>) -> Result<Position<K, V>, Error> {
        let previous = match self.resolve(position)? {
            Some(handle) => self.raw.predecessor(handle),
            None => self.raw.last(),
        };
        previous.map(|handle| Position::from_raw(self.raw.cursor_at(Some(handle)))).ok_or(Error::BeforeBegin)
    }

    /// Removes the entry at `position` and returns the position of the entry that followed it.
    ///
    /// Positions of all other entries remain valid.
    ///
    /// # Errors
    ///
    /// [`Error::PastTheEnd`] for [`end`](OrderedMap::end), or the error describing why
    /// `position` is not valid in this map. Nothing is removed on error.
    ///
    /// # Examples
    ///
    /// ```
    /// use wabi_map::{Error, OrderedMap};
    ///
    /// let mut map = OrderedMap::from([(1, "a"), (2, "b"), (3, "c")]);
    /// let one = map.begin();
    /// let three = map.find(&3);
    ///
    /// let two = map.erase_at(one).unwrap();
    /// assert_eq!(map.entry_at(two), Ok((&2, &"b")));
    /// assert_eq!(map.erase_at(one), Err(Error::StalePosition));
    /// assert_eq!(map.erase_at(map.end()), Err(Error::PastTheEnd));
    /// assert_eq!(map.entry_at(three), Ok((&3, &"c")));
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn erase_at(&mut self, position: Position<K, V>) -> Result<Position<K, V>, Error> {
        let handle = self.resolve_entry(position).inspect_err(|error| {
            debug!(?error, ?position, "rejected position in erase_at");
        })?;
        let (next, _entry) = self.raw.erase(handle);
        Ok(Position::from_raw(self.raw.cursor_at(next)))
    }

    /// Removes the entries from `first` up to, but not including, `last`, and returns `last`.
    ///
    /// Each step continues from the position returned by the previous erase, so the span is
    /// exactly the entries visited walking forward from `first` until `last`.
    ///
    /// # Errors
    ///
    /// Either position not being valid in this map is reported before anything is removed.
    /// If `last` does not follow `first`, the walk runs off the end of the map and reports
    /// [`Error::PastTheEnd`]; the entries from `first` to the end have been removed by then.
    ///
    /// # Examples
    ///
    /// ```
    /// use wabi_map::OrderedMap;
    ///
    /// let mut map: OrderedMap<i32, i32> = (0..10).map(|i| (i, i * i)).collect();
    /// let last = map.erase_range(map.find(&3), map.find(&7)).unwrap();
    ///
    /// assert_eq!(map.entry_at(last), Ok((&7, &49)));
    /// assert_eq!(map.keys().copied().collect::<Vec<_>>(), [0, 1, 2, 7, 8, 9]);
    ///
    /// let end = map.erase_range(map.begin(), map.end()).unwrap();
    /// assert_eq!(end, map.end());
    /// assert!(map.is_empty());
    /// ```
    ///
    /// # Complexity
    ///
    /// O(m log n) for m removed entries.
    pub fn erase_range(&mut self, first: Position<K, V>, last: Position<K, V>) -> Result<Position<K, V>, Error> {
        self.resolve(first)?;
        self.resolve(last)?;

        let mut current = first;
        let mut erased = 0usize;
        while current != last {
            current = self.erase_at(current).inspect_err(|_| {
                debug!(erased, "range erase ran past the end");
            })?;
            erased += 1;
        }

        trace!(erased, "erased range");
        Ok(last)
    }

    /// Gets an iterator over the entries of the map, in key order.
    ///
    /// # Examples
    ///
    /// ```
    /// use wabi_map::OrderedMap;
    ///
    /// let map = OrderedMap::from([(3, "c"), (2, "b"), (1, "a")]);
    /// for (key, value) in map.iter() {
    ///     println!("{key}: {value}");
    /// }
    ///
    /// let (first_key, first_value) = map.iter().next().unwrap();
    /// assert_eq!((*first_key, *first_value), (1, "a"));
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            tree: Some(&self.raw),
            front: self.raw.first(),
            back: self.raw.last(),
            remaining: self.raw.len(),
        }
    }

    /// Gets an iterator over the keys of the map, in sorted order.
    ///
    /// # Examples
    ///
    /// ```
    /// use wabi_map::OrderedMap;
    ///
    /// let map = OrderedMap::from([(2, "b"), (1, "a")]);
    /// let keys: Vec<_> = map.keys().cloned().collect();
    /// assert_eq!(keys, [1, 2]);
    /// ```
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Gets an iterator over the values of the map, in order by key.
    ///
    /// # Examples
    ///
    /// ```
    /// use wabi_map::OrderedMap;
    ///
    /// let map = OrderedMap::from([(1, "hello"), (2, "goodbye")]);
    /// let values: Vec<&str> = map.values().cloned().collect();
    /// assert_eq!(values, ["hello", "goodbye"]);
    /// ```
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Returns the entry with the smallest key, or `None` if the map is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use wabi_map::OrderedMap;
    ///
    /// let mut map = OrderedMap::new();
    /// assert_eq!(map.first_key_value(), None);
    /// map.insert(1, "b");
    /// map.insert(2, "a");
    /// assert_eq!(map.first_key_value(), Some((&1, &"b")));
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        let node = self.raw.node(self.raw.first()?);
        Some((node.key(), node.value()))
    }

    /// Returns the entry with the largest key, or `None` if the map is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use wabi_map::OrderedMap;
    ///
    /// let map = OrderedMap::from([(1, "b"), (2, "a")]);
    /// assert_eq!(map.last_key_value(), Some((&2, &"a")));
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        let node = self.raw.node(self.raw.last()?);
        Some((node.key(), node.value()))
    }

    /// Moves every entry out into a new map, leaving this one empty.
    ///
    /// Positions obtained from `self` before the call designate the same entries in the
    /// returned map.
    ///
    /// # Examples
    ///
    /// ```
    /// use wabi_map::OrderedMap;
    ///
    /// let mut a = OrderedMap::from([(1, "a"), (2, "b")]);
    /// let two = a.find(&2);
    /// let b = a.take();
    ///
    /// assert!(a.is_empty());
    /// assert_eq!(b.len(), 2);
    /// assert_eq!(b.entry_at(two), Ok((&2, &"b")));
    /// ```
    #[must_use = "use `clear` to drop the entries"]
    pub fn take(&mut self) -> Self {
        mem::take(self)
    }

    /// Exchanges the contents of two maps without copying any entry. See [`swap`].
    pub fn swap_with(&mut self, other: &mut Self) {
        trace!(left = self.len(), right = other.len(), "swapping maps");
        mem::swap(&mut self.raw, &mut other.raw);
    }
}

impl<K: Ord, V> OrderedMap<K, V> {
    /// Returns the position of the entry for `key`, or [`end`](OrderedMap::end) if there is none.
    ///
    /// The key may be any borrowed form of the map's key type, but the ordering on the borrowed
    /// form *must* match the ordering on the key type.
    ///
    /// # Examples
    ///
    /// ```
    /// use wabi_map::OrderedMap;
    ///
    /// let map = OrderedMap::from([(1, "a")]);
    /// assert_eq!(map.entry_at(map.find(&1)), Ok((&1, &"a")));
    /// assert_eq!(map.find(&2), map.end());
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn find<Q>(&self, key: &Q) -> Position<K, V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        Position::from_raw(self.raw.cursor_at(self.raw.search(key)))
    }

    /// Returns a reference to the value corresponding to the key, or `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use wabi_map::OrderedMap;
    ///
    /// let map = OrderedMap::from([(1, "a")]);
    /// assert_eq!(map.get(&1), Some(&"a"));
    /// assert_eq!(map.get(&2), None);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.search(key).map(|handle| self.raw.node(handle).value())
    }

    /// Returns a mutable reference to the value corresponding to the key, or `None`.
    ///
    /// Unlike [`at_mut`](OrderedMap::at_mut), absence is not an error here.
    ///
    /// # Examples
    ///
    /// ```
    /// use wabi_map::OrderedMap;
    ///
    /// let mut map = OrderedMap::from([(1, "a")]);
    /// if let Some(x) = map.get_mut(&1) {
    ///     *x = "b";
    /// }
    /// assert_eq!(map[&1], "b");
    /// assert_eq!(map.get_mut(&2), None);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let handle = self.raw.search(key)?;
        Some(self.raw.value_mut(handle))
    }

    /// Returns the stored key and its value for the supplied key.
    ///
    /// Useful when the stored key carries more than the part compared by [`Ord`].
    ///
    /// # Examples
    ///
    /// ```
    /// use wabi_map::OrderedMap;
    ///
    /// let map = OrderedMap::from([(String::from("apple"), 3)]);
    /// assert_eq!(map.get_key_value("apple"), Some((&String::from("apple"), &3)));
    /// assert_eq!(map.get_key_value("pear"), None);
    /// ```
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let node = self.raw.node(self.raw.search(key)?);
        Some((node.key(), node.value()))
    }

    /// Returns `true` if the map contains a value for the specified key.
    ///
    /// # Examples
    ///
    /// ```
    /// use wabi_map::OrderedMap;
    ///
    /// let map = OrderedMap::from([(1, "a")]);
    /// assert!(map.contains_key(&1));
    /// assert!(!map.contains_key(&2));
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.search(key).is_some()
    }

    /// Strict read access: returns the value for `key`, never inserting.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] if the map holds no entry for `key`.
    ///
    /// # Examples
    ///
    /// ```
    /// use wabi_map::{Error, OrderedMap};
    ///
    /// let map = OrderedMap::from([(1, "a")]);
    /// assert_eq!(map.at(&1), Ok(&"a"));
    /// assert_eq!(map.at(&2), Err(Error::KeyNotFound));
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn at<Q>(&self, key: &Q) -> Result<&V, Error>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.get(key).ok_or_else(|| {
            trace!("strict lookup missed");
            Error::KeyNotFound
        })
    }

    /// Strict write access: returns a mutable reference to the value for `key`, never inserting.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] if the map holds no entry for `key`; the map is unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use wabi_map::{Error, OrderedMap};
    ///
    /// let mut map = OrderedMap::from([(1, 10)]);
    /// *map.at_mut(&1).unwrap() += 5;
    /// assert_eq!(map.at(&1), Ok(&15));
    /// assert_eq!(map.at_mut(&2), Err(Error::KeyNotFound));
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn at_mut<Q>(&mut self, key: &Q) -> Result<&mut V, Error>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let Some(handle) = self.raw.search(key) else {
            trace!("strict lookup missed");
            return Err(Error::KeyNotFound);
        };
        Ok(self.raw.value_mut(handle))
    }

    /// Returns a mutable reference to the value for `key`, first inserting `V::default()` if the
    /// key is absent.
    ///
    /// No default value is built when the key is already present.
    ///
    /// # Examples
    ///
    /// ```
    /// use wabi_map::OrderedMap;
    ///
    /// let mut map: OrderedMap<&str, Vec<u32>> = OrderedMap::new();
    /// map.get_or_insert_default("primes").push(2);
    /// map.get_or_insert_default("primes").push(3);
    ///
    /// assert_eq!(map.len(), 1);
    /// assert_eq!(map[&"primes"], [2, 3]);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        let handle = match self.raw.search(&key) {
            Some(handle) => handle,
            None => self.raw.insert_unique(key, V::default()).0,
        };
        self.raw.value_mut(handle)
    }

    /// Inserts a key-value pair unless the key is already present.
    ///
    /// Returns the position of the entry holding `key` and whether it was newly inserted. When
    /// the key is already present the stored value is kept and the offered pair is dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use wabi_map::OrderedMap;
    ///
    /// let mut map = OrderedMap::new();
    /// let (first, inserted) = map.insert(37, "a");
    /// assert!(inserted);
    ///
    /// let (again, inserted) = map.insert(37, "b");
    /// assert!(!inserted);
    /// assert_eq!(first, again);
    /// assert_eq!(map[&37], "a");
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn insert(&mut self, key: K, value: V) -> (Position<K, V>, bool) {
        let (handle, inserted) = self.raw.insert_unique(key, value);
        (Position::from_raw(self.raw.cursor_at(Some(handle))), inserted)
    }

    /// Inserts a `(key, value)` entry; see [`insert`](OrderedMap::insert).
    pub fn insert_entry(&mut self, (key, value): (K, V)) -> (Position<K, V>, bool) {
        self.insert(key, value)
    }

    /// Inserts every entry of `entries` in turn. Keys already present (including keys repeated
    /// within `entries`) keep their first value.
    ///
    /// # Examples
    ///
    /// ```
    /// use wabi_map::OrderedMap;
    ///
    /// let mut map = OrderedMap::from([(1, "a")]);
    /// map.insert_all([(2, "b"), (1, "x"), (2, "y")]);
    /// assert_eq!(map.iter().collect::<Vec<_>>(), [(&1, &"a"), (&2, &"b")]);
    /// ```
    pub fn insert_all<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in entries {
            self.raw.insert_unique(key, value);
        }
    }

    /// Replaces the contents of the map with `entries` (first occurrence of a key wins).
    ///
    /// # Examples
    ///
    /// ```
    /// use wabi_map::OrderedMap;
    ///
    /// let mut map = OrderedMap::from([(1, "a"), (9, "z")]);
    /// map.assign([(3, "c"), (2, "b"), (3, "x")]);
    /// assert_eq!(map.iter().collect::<Vec<_>>(), [(&2, &"b"), (&3, &"c")]);
    /// ```
    pub fn assign<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        self.clear();
        self.insert_all(entries);
        trace!(len = self.len(), "assigned map");
    }

    /// Removes the entry for `key`, returning how many entries were removed (0 or 1).
    ///
    /// # Examples
    ///
    /// ```
    /// use wabi_map::OrderedMap;
    ///
    /// let mut map = OrderedMap::from([(1, "a")]);
    /// assert_eq!(map.erase(&1), 1);
    /// assert_eq!(map.erase(&1), 0);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn erase<Q>(&mut self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        match self.raw.search(key) {
            Some(handle) => {
                self.raw.erase(handle);
                1
            }
            None => 0,
        }
    }

    /// Removes the entry for `key` and returns its value, if there was one.
    ///
    /// Same as [`erase`](OrderedMap::erase), but hands the value back.
    ///
    /// # Examples
    ///
    /// ```
    /// use wabi_map::OrderedMap;
    ///
    /// let mut map = OrderedMap::from([(1, "a")]);
    /// assert_eq!(map.remove(&1), Some("a"));
    /// assert_eq!(map.remove(&1), None);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.remove_entry(key).map(|(_, value)| value)
    }

    /// Removes the entry for `key` and returns the stored key and value, if there was one.
    ///
    /// # Examples
    ///
    /// ```
    /// use wabi_map::OrderedMap;
    ///
    /// let mut map = OrderedMap::from([(1, "a")]);
    /// assert_eq!(map.remove_entry(&1), Some((1, "a")));
    /// assert_eq!(map.remove_entry(&1), None);
    /// ```
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let handle = self.raw.search(key)?;
        Some(self.raw.erase(handle).1)
    }
}

/// Exchanges the contents of two maps in O(1), without copying or moving any entry.
///
/// Positions travel with the entries: a position obtained from `a` designates the same entry
/// in `b` afterwards.
///
/// # Examples
///
/// ```
/// use wabi_map::{OrderedMap, swap};
///
/// let mut a = OrderedMap::from([(1, "a")]);
/// let mut b = OrderedMap::from([(2, "b"), (3, "c")]);
/// let one = a.begin();
///
/// swap(&mut a, &mut b);
/// assert_eq!(a.len(), 2);
/// assert_eq!(b.entry_at(one), Ok((&1, &"a")));
/// ```
pub fn swap<K, V>(a: &mut OrderedMap<K, V>, b: &mut OrderedMap<K, V>) {
    a.swap_with(b);
}

impl<K: Clone, V: Clone> Clone for OrderedMap<K, V> {
    /// Deep-copies the map. Positions of the original are foreign to the copy.
    fn clone(&self) -> Self {
        OrderedMap { raw: self.raw.clone() }
    }

    fn clone_from(&mut self, source: &Self) {
        self.raw.clone_from(&source.raw);
    }
}

impl<K: Hash, V: Hash> Hash for OrderedMap<K, V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for (k, v) in self {
            k.hash(state);
            v.hash(state);
        }
    }
}

impl<K: PartialEq, V: PartialEq> PartialEq for OrderedMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<K: Eq, V: Eq> Eq for OrderedMap<K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for OrderedMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V> Default for OrderedMap<K, V> {
    fn default() -> Self {
        OrderedMap::new()
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for OrderedMap<K, V> {
    /// Builds a map by inserting every entry in turn; the first occurrence of a key wins.
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = OrderedMap::new();
        map.insert_all(iter);
        map
    }
}

impl<K: Ord, V> Extend<(K, V)> for OrderedMap<K, V> {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        self.insert_all(iter);
    }
}

impl<'a, K: Ord + Copy, V: Copy> Extend<(&'a K, &'a V)> for OrderedMap<K, V> {
    fn extend<T: IntoIterator<Item = (&'a K, &'a V)>>(&mut self, iter: T) {
        self.insert_all(iter.into_iter().map(|(&k, &v)| (k, v)));
    }
}

impl<K: Ord, V, const N: usize> From<[(K, V); N]> for OrderedMap<K, V> {
    fn from(arr: [(K, V); N]) -> Self {
        arr.into_iter().collect()
    }
}

impl<'a, K, V> IntoIterator for &'a OrderedMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<K, V> IntoIterator for OrderedMap<K, V> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    /// Gets an owning iterator over the entries of the map, sorted by key.
    fn into_iter(mut self) -> IntoIter<K, V> {
        IntoIter {
            inner: self.raw.drain_to_vec().into_iter(),
        }
    }
}

impl<K, Q, V> Index<&Q> for OrderedMap<K, V>
where
    K: Borrow<Q> + Ord,
    Q: ?Sized + Ord,
{
    type Output = V;

    /// Strict read access by key, as [`at`](OrderedMap::at).
    ///
    /// # Panics
    ///
    /// Panics with [`Error::KeyNotFound`] if the key is not present in the map.
    fn index(&self, key: &Q) -> &V {
        match self.at(key) {
            Ok(value) => value,
            Err(error) => panic!("`OrderedMap::index()` - {error}!"),
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let tree = self.tree?;
        let handle = self.front?;
        let node = tree.node(handle);

        self.remaining -= 1;
        self.front = tree.successor(handle);
        Some((node.key(), node.value()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let tree = self.tree?;
        let handle = self.back?;
        let node = tree.node(handle);

        self.remaining -= 1;
        self.back = tree.predecessor(handle);
        Some((node.key(), node.value()))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Iter {
            tree: self.tree,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}

impl<K, V> Default for Iter<'_, K, V> {
    /// Creates an empty `ordered_map::Iter`.
    ///
    /// ```
    /// # use wabi_map::ordered_map;
    /// let iter: ordered_map::Iter<'_, u8, u8> = Default::default();
    /// assert_eq!(iter.len(), 0);
    /// ```
    fn default() -> Self {
        Iter {
            tree: None,
            front: None,
            back: None,
            remaining: 0,
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Iter<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IntoIter<K, V> {
    fn next_back(&mut self) -> Option<(K, V)> {
        self.inner.next_back()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {
    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl<K, V> FusedIterator for IntoIter<K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for IntoIter<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.inner.as_slice()).finish()
    }
}

impl<K, V> Default for IntoIter<K, V> {
    fn default() -> Self {
        IntoIter {
            inner: alloc::vec::Vec::new().into_iter(),
        }
    }
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Keys<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(k, _)| k)
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {
    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl<K, V> FusedIterator for Keys<'_, K, V> {}

impl<K, V> Clone for Keys<'_, K, V> {
    fn clone(&self) -> Self {
        Keys {
            inner: self.inner.clone(),
        }
    }
}

impl<K, V> Default for Keys<'_, K, V> {
    fn default() -> Self {
        Keys {
            inner: Iter::default(),
        }
    }
}

impl<K: fmt::Debug, V> fmt::Debug for Keys<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Values<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {
    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl<K, V> FusedIterator for Values<'_, K, V> {}

impl<K, V> Clone for Values<'_, K, V> {
    fn clone(&self) -> Self {
        Values {
            inner: self.inner.clone(),
        }
    }
}

impl<K, V> Default for Values<'_, K, V> {
    fn default() -> Self {
        Values {
            inner: Iter::default(),
        }
    }
}

impl<K, V: fmt::Debug> fmt::Debug for Values<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;
    use static_assertions::assert_impl_all;

    assert_impl_all!(OrderedMap<i32, i32>: Send, Sync, Clone, Default);

    #[test]
    fn duplicate_key_scenario() {
        let mut map = OrderedMap::new();
        map.insert(1, "a");
        map.insert(2, "b");
        let (_, inserted) = map.insert(2, "z");

        assert!(!inserted);
        assert_eq!(map.len(), 2);
        assert_eq!(map.entry_at(map.find(&2)), Ok((&2, &"b")));
        assert_eq!(map.erase(&1), 1);
        assert_eq!(map.len(), 1);
        assert_eq!(map.iter().collect::<Vec<_>>(), vec![(&2, &"b")]);
        map.raw.check_invariants();
    }

    #[test]
    fn get_or_insert_default_vivifies_once() {
        let mut map: OrderedMap<u8, u32> = OrderedMap::new();
        assert_eq!(*map.get_or_insert_default(4), 0);
        *map.get_or_insert_default(4) = 9;
        assert_eq!(map.len(), 1);
        assert_ne!(map.find(&4), map.end());
        assert_eq!(map.at(&4), Ok(&9));
    }

    #[test]
    fn prev_position_on_empty_map() {
        let map: OrderedMap<u8, u8> = OrderedMap::new();
        assert_eq!(map.begin(), map.end());
        assert_eq!(map.prev_position(map.end()), Err(Error::BeforeBegin));
        assert_eq!(map.next_position(map.end()), Err(Error::PastTheEnd));
    }

    #[test]
    fn erase_range_validates_before_erasing() {
        let mut map: OrderedMap<i32, ()> = (0..5).map(|i| (i, ())).collect();
        let other: OrderedMap<i32, ()> = (0..5).map(|i| (i, ())).collect();

        assert_eq!(map.erase_range(map.begin(), other.end()), Err(Error::ForeignPosition));
        assert_eq!(map.erase_range(Position::default(), map.end()), Err(Error::UnsetPosition));
        assert_eq!(map.len(), 5);
    }

    #[test]
    fn erase_range_backwards_runs_off_the_end() {
        let mut map: OrderedMap<i32, ()> = (0..5).map(|i| (i, ())).collect();
        let result = map.erase_range(map.find(&3), map.find(&1));

        assert_eq!(result, Err(Error::PastTheEnd));
        assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![0, 1, 2]);
        map.raw.check_invariants();
    }

    #[test]
    fn iter_reports_exact_len() {
        let map: OrderedMap<i32, i32> = (0..10).map(|i| (i, i)).collect();
        let mut iter = map.iter();
        assert_eq!(iter.len(), 10);
        iter.next();
        iter.next_back();
        assert_eq!(iter.len(), 8);
        assert_eq!(iter.clone().count(), 8);
        assert_eq!(iter.next(), Some((&1, &1)));
        assert_eq!(iter.next_back(), Some((&8, &8)));
    }

    #[test]
    fn iter_front_and_back_meet() {
        let map = OrderedMap::from([(1, ()), (2, ()), (3, ())]);
        let mut iter = map.keys();
        assert_eq!(iter.next(), Some(&1));
        assert_eq!(iter.next_back(), Some(&3));
        assert_eq!(iter.next(), Some(&2));
        assert_eq!(iter.next_back(), None);
        assert_eq!(iter.next(), None);
    }
}
