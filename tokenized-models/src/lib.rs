//! Data shared by the holdings ledger and the vote engine: addresses, asset
//! and contract metadata, ballots, and the layout of storage keys.

/// Raw on-chain addresses
pub mod address;
/// Asset metadata consumed by voting computations
pub mod asset;
/// Ballot cast by one address on one vote
pub mod ballot;
/// Settings loading
pub mod config;
/// Contract metadata and voting systems
pub mod contract;
/// Models error
pub mod error;
/// Storage key layout
pub mod storage_paths;
