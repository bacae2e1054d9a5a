//! # General description
//!
//! Persistence of governance votes and the steps of their lifecycle that
//! need storage: `VoteStore` keeps the votes of the node in a small cache in
//! front of JSON records, and `seed_ballots` builds the initial ballots of a
//! vote from the holdings cache.

mod ballots;
mod store;

pub use ballots::seed_ballots;
pub use store::VoteStore;
