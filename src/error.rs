/// Errors reported by [`OrderedMap`](crate::OrderedMap).
///
/// Only the strict accessors fail on a missing key. Every other variant describes a
/// [`Position`](crate::ordered_map::Position) that cannot be used for the requested
/// operation; in each case the map is left untouched.
///
/// Plain absence is never an error: `find` returns `end()`, `erase` returns `0`,
/// and a duplicate `insert` reports `false`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, thiserror::Error)]
pub enum Error {
    /// A strict accessor was asked for a key the map does not contain.
    #[error("key not found")]
    KeyNotFound,

    /// The position was default-constructed and never pointed into a map.
    #[error("position is unset")]
    UnsetPosition,

    /// The position is `end()`: it cannot be dereferenced, erased or advanced.
    #[error("position is past the end")]
    PastTheEnd,

    /// The position is `begin()` and cannot be moved backwards.
    #[error("position is before the beginning")]
    BeforeBegin,

    /// The entry the position referred to has been erased.
    #[error("position refers to an erased entry")]
    StalePosition,

    /// The position was obtained from a different map.
    #[error("position belongs to another map")]
    ForeignPosition,
}
