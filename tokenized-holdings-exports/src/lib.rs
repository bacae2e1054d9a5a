//! # General description
//!
//! A `Holding` is the balance of one address for one asset of one contract.
//! Outstanding (unsettled) balance changes are kept as `HoldingStatus`
//! records keyed by the id of the transaction that caused them:
//! * the pending balance already includes every outstanding status
//! * the finalized balance only moves when a status is finalized, or when a
//!   settlement without a tracked status overwrites both balances
//!
//! This crate holds the pure ledger operations on a `Holding`, its binary
//! codec, and the types shared with the cache worker.

mod ballots;
mod cache_item;
mod codec;
mod config;
mod error;
mod holding;
mod ledger;

pub use ballots::{append_ballots, voting_balance};
pub use cache_item::CacheItem;
pub use codec::{
    decode_holding, encode_holding, HoldingDeserializer, HoldingSerializer,
    HoldingStatusDeserializer, HoldingStatusSerializer, HOLDING_VERSION,
};
pub use config::HoldingsConfig;
pub use error::HoldingsError;
pub use holding::{Holding, HoldingStatus, HoldingStatusCode};
