//! Extendible hashing directory of SwissTable-style hash tables.
//!
//! # exhash::HashMap
//! A hash map that grows one table at a time: a table doubles until it holds 1024 slots, then splits
//! into two tables selected by one more bit of the hash prefix.
//!
//! # exhash::hash_map::Cursor
//! An iterator that does not borrow the map between steps and tolerates insertions, removals,
//! growth, splits, and clearing in between.

pub use equivalent::Equivalent;

pub mod hash_map;
pub use hash_map::HashMap;

mod hash_table;

#[cfg(feature = "serde")]
mod serde;
