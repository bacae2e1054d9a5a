use crate::address::Address;
use serde::{Deserialize, Serialize};
use tokenized_hash::Hash20;

/// Rules under which a contract's proposals are decided
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingSystem {
    pub name: String,
    /// 'R' relative, 'A' absolute or 'P' plurality
    pub vote_type: char,
    /// 0 standard, 1 weighted by rank
    pub tally_logic: u32,
    pub threshold_percentage: u32,
    pub vote_multiplier_permitted: bool,
}

/// Metadata of a smart contract
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub address: Address,
    pub asset_codes: Vec<Hash20>,
    /// Asset held by the contract's administrators, if any
    #[serde(default)]
    pub admin_member_asset: Option<Hash20>,
    #[serde(default)]
    pub voting_systems: Vec<VotingSystem>,
}

impl Contract {
    /// Key of the contract in every index and storage path
    pub fn contract_hash(&self) -> Hash20 {
        self.address.hash()
    }

    pub fn voting_system(&self, index: u32) -> Option<&VotingSystem> {
        self.voting_systems.get(index as usize)
    }

    /// Asset codes whose holders take part in holder votes, the admin member asset excluded
    pub fn holder_asset_codes(&self) -> impl Iterator<Item = &Hash20> + '_ {
        self.asset_codes
            .iter()
            .filter(move |code| self.admin_member_asset.as_ref() != Some(*code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_holder_assets_skip_admin_asset() {
        let admin = Hash20::compute_from(b"admin");
        let shares = Hash20::compute_from(b"shares");
        let contract = Contract {
            address: Address::from_public_key(b"contract"),
            asset_codes: vec![admin, shares],
            admin_member_asset: Some(admin),
            voting_systems: Vec::new(),
        };
        assert_eq!(contract.holder_asset_codes().collect::<Vec<_>>(), vec![&shares]);
        assert_eq!(contract.contract_hash(), contract.address.hash());
    }
}
