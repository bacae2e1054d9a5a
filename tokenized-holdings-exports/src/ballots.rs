use crate::{Holding, HoldingsError};
use std::collections::BTreeMap;
use tokenized_hash::Hash20;
use tokenized_models::asset::Asset;
use tokenized_models::ballot::Ballot;

/// Voting power of a holding: its finalized balance, optionally multiplied,
/// or zero for assets without voting rights
pub fn voting_balance(asset: &Asset, holding: &Holding, apply_multiplier: bool) -> u64 {
    if !asset.voting_rights {
        return 0;
    }
    if apply_multiplier {
        return holding
            .finalized_balance
            .saturating_mul(u64::from(asset.vote_multiplier));
    }
    holding.finalized_balance
}

/// Adds the voting power of every holding of `asset` to `ballots`, keyed by address hash
pub fn append_ballots<'a>(
    asset: &Asset,
    holdings: impl IntoIterator<Item = &'a Holding>,
    ballots: &mut BTreeMap<Hash20, Ballot>,
    apply_multiplier: bool,
) -> Result<(), HoldingsError> {
    if !asset.voting_rights {
        return Ok(());
    }

    for holding in holdings {
        let mut quantity = holding.finalized_balance;
        if apply_multiplier {
            quantity = quantity
                .checked_mul(u64::from(asset.vote_multiplier))
                .ok_or(HoldingsError::BalanceOverflow)?;
        }
        match ballots.get_mut(&holding.address.hash()) {
            Some(ballot) => {
                ballot.quantity = ballot
                    .quantity
                    .checked_add(quantity)
                    .ok_or(HoldingsError::BalanceOverflow)?;
            }
            None => {
                ballots.insert(
                    holding.address.hash(),
                    Ballot::new(holding.address, quantity),
                );
            }
        }
    }
    Ok(())
}
