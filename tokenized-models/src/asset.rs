use serde::{Deserialize, Serialize};
use tokenized_hash::Hash20;
use tokenized_time::ProtocolTimestamp;

/// Value of `asset_modification_governance` for assets governed by the whole contract
pub const CONTRACT_WIDE_GOVERNANCE: u32 = 1;

/// Metadata of an asset issued by a contract
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub code: Hash20,
    pub asset_type: String,
    pub voting_rights: bool,
    pub vote_multiplier: u32,
    pub authorized_token_qty: u64,
    pub asset_modification_governance: u32,
    pub freeze_period: ProtocolTimestamp,
}

impl Asset {
    /// True when changes to this asset are voted on by all of the contract's holders
    pub fn has_contract_wide_governance(&self) -> bool {
        self.asset_modification_governance == CONTRACT_WIDE_GOVERNANCE
    }
}
