//! An ordered map with stable positions for Rust.
//!
//! This crate provides [`OrderedMap`], a sorted key-value container with unique keys. Next to
//! the familiar `BTreeMap`-style API it offers [`Position`]s: copyable handles to entries that
//! survive unrelated insertions and erasures and can be used to step through the map or erase
//! entries while it changes.
//!
//! # Example
//!
//! ```
//! use wabi_map::{Error, OrderedMap};
//!
//! let mut stock = OrderedMap::new();
//! stock.insert("pears", 4);
//! stock.insert("apples", 10);
//!
//! // Inserting an existing key keeps the stored value.
//! let (apples, inserted) = stock.insert("apples", 0);
//! assert!(!inserted);
//! assert_eq!(stock.entry_at(apples), Ok((&"apples", &10)));
//!
//! // Strict access never inserts.
//! assert_eq!(stock.at(&"plums"), Err(Error::KeyNotFound));
//!
//! // Auto-vivifying access inserts a default value.
//! *stock.get_or_insert_default("plums") += 7;
//! assert_eq!(stock.keys().copied().collect::<Vec<_>>(), ["apples", "pears", "plums"]);
//!
//! // Positions outlive unrelated changes.
//! stock.erase(&"pears");
//! let plums = stock.erase_at(apples).unwrap();
//! assert_eq!(stock.entry_at(plums), Ok((&"plums", &7)));
//! ```
//!
//! # Features
//!
//! - **`no_std` compatible** - Only requires `alloc`, no standard library dependency
//! - **Checked positions** - Stale, foreign and unset positions are reported as [`Error`]s
//! - **O(log n) updates** - Lookups, insertions and erasures on a weight-balanced tree
//! - **O(1) swap** - [`swap`] exchanges two maps without touching their entries
//!
//! # Implementation
//!
//! Entries are kept in a weight-balanced binary search tree whose nodes live in a slot arena.
//! A node is allocated once per entry and never reused for another entry while any position
//! could still refer to it: vacated slots carry a generation counter, and every map carries
//! an identity, so a position always knows whether it still designates a live entry of the
//! map it is used with.

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

pub mod ordered_map;

pub use error::Error;
pub use ordered_map::{OrderedMap, Position, swap};
