//! # General description
//!
//! Two implementations of `KvStore`:
//! * `RocksStore`, a RocksDB database on disk, used by the node
//! * `MemoryStore`, an ordered map in RAM, used by tests and dry runs
//!
//! Keys are stored as their utf-8 bytes. RocksDB orders keys bytewise, so
//! listing a prefix is a forward scan starting at the prefix that stops at
//! the first key not starting with it.

mod memory_store;
mod rocks_store;

pub use crate::memory_store::*;
pub use crate::rocks_store::*;
