use crate::address::Address;
use serde::{Deserialize, Serialize};
use tokenized_time::ProtocolTimestamp;

/// Token-weighted vote of one address
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    pub address: Address,
    /// Option characters in ranked order, empty until the holder votes
    #[serde(default)]
    pub vote: String,
    pub quantity: u64,
    #[serde(default)]
    pub timestamp: ProtocolTimestamp,
}

impl Ballot {
    /// Ballot carrying voting power only
    pub fn new(address: Address, quantity: u64) -> Self {
        Ballot {
            address,
            vote: String::new(),
            quantity,
            timestamp: ProtocolTimestamp::ZERO,
        }
    }

    /// A ballot counts toward the tally once it holds at least one choice
    pub fn is_cast(&self) -> bool {
        !self.vote.is_empty()
    }
}
