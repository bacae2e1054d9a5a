//! # General description
//!
//! The holdings worker keeps every holding touched by the node in memory and
//! writes it back to storage asynchronously:
//! * `HoldingsCache` shadows the store: reads go through it, `save` only
//!   marks the entry modified and returns a `CacheItem`
//! * `CacheChannel` carries `CacheItem`s to a single writer thread started
//!   by `start_holdings_writer`, which flushes each modified entry
//! * `KeyLock` serializes callers that fetch, mutate and save a holding
//!   themselves instead of going through `HoldingsCache::apply`

mod cache;
mod channel;
mod key_lock;
mod worker;

pub use cache::HoldingsCache;
pub use channel::{CacheChannel, CACHE_CHANNEL_NAME};
pub use key_lock::{KeyLock, KeyLockGuard};
pub use worker::{start_holdings_writer, HoldingsWriterManager};

#[cfg(test)]
mod tests;
