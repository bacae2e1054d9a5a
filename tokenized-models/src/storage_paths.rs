//! Every record lives under `contracts/<contractHash>/...`, hashes in lowercase hex.

use tokenized_hash::{Hash20, Hash32};

pub const CONTRACTS_KEY: &str = "contracts";
pub const HOLDINGS_SUB_KEY: &str = "holdings";
pub const VOTES_SUB_KEY: &str = "votes";

/// `contracts/<contractHash>/holdings/<assetCode>/<addressHash>`
pub fn holding_key(contract_hash: &Hash20, asset_code: &Hash20, address_hash: &Hash20) -> String {
    format!(
        "{}{}",
        holdings_prefix(contract_hash, asset_code),
        address_hash
    )
}

/// Prefix of all holdings of one asset, with its trailing separator
pub fn holdings_prefix(contract_hash: &Hash20, asset_code: &Hash20) -> String {
    format!(
        "{}/{}/{}/{}/",
        CONTRACTS_KEY, contract_hash, HOLDINGS_SUB_KEY, asset_code
    )
}

/// `contracts/<contractHash>/votes/<voteTxId>`
pub fn vote_key(contract_hash: &Hash20, vote_tx_id: &Hash32) -> String {
    format!("{}{}", votes_prefix(contract_hash), vote_tx_id)
}

/// Prefix of all votes of one contract, with its trailing separator
pub fn votes_prefix(contract_hash: &Hash20) -> String {
    format!("{}/{}/{}/", CONTRACTS_KEY, contract_hash, VOTES_SUB_KEY)
}
