use std::collections::BTreeMap;
use tokenized_hash::Hash20;
use tokenized_holdings_worker::HoldingsCache;
use tokenized_models::asset::Asset;
use tokenized_models::ballot::Ballot;
use tokenized_models::contract::Contract;
use tokenized_vote_exports::{Proposal, ProposalType, VoteError};

fn find_asset<'a>(assets: &'a [Asset], asset_code: &Hash20) -> Result<&'a Asset, VoteError> {
    assets
        .iter()
        .find(|asset| asset.code == *asset_code)
        .ok_or(VoteError::AssetNotFound(*asset_code))
}

/// One uncast ballot per eligible holder of `proposal`, weighted by voting balance.
///
/// Administrative matters are voted by the administrative member asset only.
/// A vote on one asset that is not contract wide is voted by that asset,
/// anything else by every holder asset of the contract.
pub fn seed_ballots(
    cache: &HoldingsCache,
    contract: &Contract,
    assets: &[Asset],
    proposal: &Proposal,
    contract_wide_vote: bool,
    apply_multiplier: bool,
) -> Result<BTreeMap<Hash20, Ballot>, VoteError> {
    let mut ballots = BTreeMap::new();

    if proposal.kind() == Some(ProposalType::AdministrativeMatter) {
        let admin_code = contract
            .admin_member_asset
            .as_ref()
            .ok_or(VoteError::MissingAdminMemberAsset)?;
        let asset = find_asset(assets, admin_code)?;
        cache.append_ballots(&contract.address, asset, &mut ballots, apply_multiplier)?;
        return Ok(ballots);
    }

    match &proposal.asset_code {
        Some(asset_code) if !contract_wide_vote => {
            let asset = find_asset(assets, asset_code)?;
            cache.append_ballots(&contract.address, asset, &mut ballots, apply_multiplier)?;
        }
        _ => {
            for asset_code in contract.holder_asset_codes() {
                let asset = find_asset(assets, asset_code)?;
                cache.append_ballots(&contract.address, asset, &mut ballots, apply_multiplier)?;
            }
        }
    }
    Ok(ballots)
}
