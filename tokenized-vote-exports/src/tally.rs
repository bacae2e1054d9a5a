use crate::{Proposal, Vote, VoteError};
use tokenized_hash::Hash20;
use tokenized_logging::tokenized_trace;
use tokenized_models::asset::Asset;
use tokenized_models::contract::{Contract, VotingSystem};
use tokenized_time::ProtocolTimestamp;
use tracing::debug;

/// Every ranked choice scores the full ballot quantity
pub const TALLY_STANDARD: u32 = 0;
/// The choice of rank `i` scores `quantity * (vote_max - i) / vote_max`
pub const TALLY_WEIGHTED: u32 = 1;

fn check_vote_type(vote_type: char) -> Result<(), VoteError> {
    match vote_type {
        'R' | 'A' | 'P' => Ok(()),
        other => Err(VoteError::UnsupportedVoteType(other)),
    }
}

/// Checks the rules of a voting system before it is accepted in a contract
pub fn validate_voting_system(system: &VotingSystem) -> Result<(), VoteError> {
    check_vote_type(system.vote_type)?;
    if system.threshold_percentage == 0 || system.threshold_percentage >= 100 {
        return Err(VoteError::ThresholdOutOfRange(system.threshold_percentage));
    }
    if system.tally_logic != TALLY_STANDARD && system.tally_logic != TALLY_WEIGHTED {
        return Err(VoteError::InvalidTallyLogic(system.tally_logic));
    }
    Ok(())
}

/// Checks a proposal before a vote is opened on it
pub fn validate_proposal(proposal: &Proposal, now: ProtocolTimestamp) -> Result<(), VoteError> {
    if proposal.vote_options.is_empty() {
        return Err(VoteError::NoVoteOptions);
    }
    if proposal.vote_max == 0 {
        return Err(VoteError::ZeroVoteMax);
    }
    if proposal.vote_cut_off_timestamp < now {
        return Err(VoteError::CutOffInPast);
    }
    Ok(())
}

/// Computes the tally of every option and the winners, best first.
///
/// Uncast ballots are ignored. An option wins a round if it has the highest
/// strictly positive tally among options not yet selected and passes the
/// threshold of the voting system; ties go to the earliest option.
/// Plurality has no threshold, so every option with votes is selected.
/// Tallies are truncated to integers once every score is added.
pub fn calculate_results(
    vote: &Vote,
    proposal: &Proposal,
    system: &VotingSystem,
) -> Result<(Vec<u64>, String), VoteError> {
    check_vote_type(system.vote_type)?;
    if system.tally_logic != TALLY_STANDARD && system.tally_logic != TALLY_WEIGHTED {
        return Err(VoteError::UnsupportedTallyLogic(system.tally_logic));
    }
    if system.tally_logic == TALLY_WEIGHTED && proposal.vote_max == 0 {
        return Err(VoteError::ZeroVoteMax);
    }

    let options: Vec<char> = proposal.vote_options.chars().collect();
    let mut tallies = vec![0f64; options.len()];
    let mut voted_quantity: u64 = 0;
    for ballot in vote.ballots.values().filter(|ballot| ballot.is_cast()) {
        let quantity = ballot.quantity as f64;
        for (rank, choice) in ballot.vote.chars().enumerate() {
            let score = if system.tally_logic == TALLY_WEIGHTED {
                // choices ranked past vote_max carry no weight
                if rank >= proposal.vote_max as usize {
                    break;
                }
                let vote_max = f64::from(proposal.vote_max);
                quantity * ((vote_max - rank as f64) / vote_max)
            } else {
                quantity
            };
            if let Some(index) = options.iter().position(|option| *option == choice) {
                tallies[index] += score;
            }
        }
        voted_quantity = voted_quantity.saturating_add(ballot.quantity);
    }

    let threshold = f64::from(system.threshold_percentage) / 100.0;
    let mut winners = String::new();
    let mut selected = vec![false; options.len()];
    loop {
        let mut best: Option<usize> = None;
        let mut best_tally = 0f64;
        for (index, tally) in tallies.iter().enumerate() {
            if selected[index] || *tally <= best_tally {
                continue;
            }
            let passes = match system.vote_type {
                'R' => tally / voted_quantity as f64 >= threshold,
                'A' => tally / vote.token_qty as f64 >= threshold,
                _ => true,
            };
            if passes {
                best = Some(index);
                best_tally = *tally;
            }
        }
        let Some(index) = best else {
            break;
        };
        winners.push(options[index]);
        selected[index] = true;
    }

    let tallies: Vec<u64> = tallies.into_iter().map(|tally| tally as u64).collect();
    for (option, tally) in options.iter().zip(&tallies) {
        debug!("vote {} result {} : {}", vote.vote_tx_id, option, tally);
    }
    tokenized_trace!("vote.results", {
        "vote_tx_id": vote.vote_tx_id.to_string(),
        "tallies": tallies,
        "winners": winners,
    });
    Ok((tallies, winners))
}

/// Voting quantity of the whole contract: the authorized quantity of every
/// asset with voting rights, optionally multiplied
pub fn token_qty(
    contract: &Contract,
    assets: &[Asset],
    apply_multiplier: bool,
) -> Result<u64, VoteError> {
    let mut total: u64 = 0;
    for asset_code in &contract.asset_codes {
        let asset = find_asset(assets, asset_code)?;
        if !asset.voting_rights {
            continue;
        }
        let quantity = if apply_multiplier {
            asset
                .authorized_token_qty
                .checked_mul(u64::from(asset.vote_multiplier))
                .ok_or(VoteError::QuantityOverflow)?
        } else {
            asset.authorized_token_qty
        };
        total = total
            .checked_add(quantity)
            .ok_or(VoteError::QuantityOverflow)?;
    }
    Ok(total)
}

/// Eligible quantity of a proposal and whether its vote is contract wide.
///
/// A proposal naming no asset, or an asset governed by the whole contract,
/// is voted by every asset. Otherwise only the named asset votes.
pub fn proposal_token_qty(
    contract: &Contract,
    assets: &[Asset],
    asset_code: Option<&Hash20>,
    system: &VotingSystem,
) -> Result<(u64, bool), VoteError> {
    let Some(asset_code) = asset_code else {
        return Ok((
            token_qty(contract, assets, system.vote_multiplier_permitted)?,
            true,
        ));
    };
    let asset = find_asset(assets, asset_code)?;
    if asset.has_contract_wide_governance() {
        return Ok((
            token_qty(contract, assets, system.vote_multiplier_permitted)?,
            true,
        ));
    }
    let quantity = if system.vote_multiplier_permitted {
        asset
            .authorized_token_qty
            .checked_mul(u64::from(asset.vote_multiplier))
            .ok_or(VoteError::QuantityOverflow)?
    } else {
        asset.authorized_token_qty
    };
    Ok((quantity, false))
}

fn find_asset<'a>(assets: &'a [Asset], asset_code: &Hash20) -> Result<&'a Asset, VoteError> {
    assets
        .iter()
        .find(|asset| asset.code == *asset_code)
        .ok_or(VoteError::AssetNotFound(*asset_code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NewVote;
    use assert_matches::assert_matches;
    use std::collections::BTreeMap;
    use tokenized_models::address::Address;
    use tokenized_models::ballot::Ballot;
    use tokenized_models::asset::CONTRACT_WIDE_GOVERNANCE;

    fn system(vote_type: char, tally_logic: u32, threshold_percentage: u32) -> VotingSystem {
        VotingSystem {
            name: "test".to_string(),
            vote_type,
            tally_logic,
            threshold_percentage,
            vote_multiplier_permitted: false,
        }
    }

    fn proposal(options: &str, vote_max: u32) -> Proposal {
        Proposal {
            vote_options: options.to_string(),
            vote_max,
            vote_cut_off_timestamp: ProtocolTimestamp::from_secs(1_000),
            ..Default::default()
        }
    }

    fn vote_with(token_qty: u64, cast: &[(&str, u64)]) -> Vote {
        let mut ballots = BTreeMap::new();
        for (index, (choice, quantity)) in cast.iter().enumerate() {
            let address = Address::from_public_key(format!("voter{}", index).as_bytes());
            let mut ballot = Ballot::new(address, *quantity);
            ballot.vote = choice.to_string();
            ballots.insert(address.hash(), ballot);
        }
        Vote::new(
            NewVote {
                token_qty,
                ballots,
                ..Default::default()
            },
            ProtocolTimestamp::from_secs(1),
        )
    }

    #[test]
    fn test_plurality_selects_every_nonzero_option() {
        let vote = vote_with(100, &[("A", 60), ("B", 40)]);
        let (tallies, winners) =
            calculate_results(&vote, &proposal("AB", 1), &system('P', TALLY_STANDARD, 50))
                .unwrap();
        assert_eq!(tallies, vec![60, 40]);
        assert_eq!(winners, "AB");
    }

    #[test]
    fn test_relative_threshold() {
        let vote = vote_with(100, &[("A", 60), ("B", 40), ("", 1_000)]);
        let (tallies, winners) =
            calculate_results(&vote, &proposal("AB", 1), &system('R', TALLY_STANDARD, 50))
                .unwrap();
        assert_eq!(tallies, vec![60, 40]);
        // 40 / 100 voted does not pass
        assert_eq!(winners, "A");
    }

    #[test]
    fn test_absolute_threshold_failure() {
        let vote = vote_with(200, &[("A", 60), ("B", 40)]);
        let (tallies, winners) =
            calculate_results(&vote, &proposal("AB", 1), &system('A', TALLY_STANDARD, 50))
                .unwrap();
        assert_eq!(tallies, vec![60, 40]);
        assert_eq!(winners, "");
    }

    #[test]
    fn test_weighted_ranks() {
        // rank 0 scores full, rank 1 half with vote_max 2
        let vote = vote_with(100, &[("AB", 10), ("BA", 5)]);
        let (tallies, winners) =
            calculate_results(&vote, &proposal("ABC", 2), &system('P', TALLY_WEIGHTED, 50))
                .unwrap();
        assert_eq!(tallies, vec![12, 10, 0]);
        // zero tallies never win
        assert_eq!(winners, "AB");
    }

    #[test]
    fn test_weighted_ignores_ranks_past_vote_max() {
        // D ranked fourth with vote_max 2 must not take weight from the D ballot
        let vote = vote_with(100, &[("ABCD", 10), ("D", 4)]);
        let (tallies, winners) =
            calculate_results(&vote, &proposal("ABCD", 2), &system('P', TALLY_WEIGHTED, 50))
                .unwrap();
        assert_eq!(tallies, vec![10, 5, 0, 4]);
        assert_eq!(winners, "ABD");
    }

    #[test]
    fn test_ties_go_to_earliest_option() {
        let vote = vote_with(100, &[("B", 30), ("A", 30)]);
        let (_, winners) =
            calculate_results(&vote, &proposal("AB", 1), &system('P', TALLY_STANDARD, 50))
                .unwrap();
        assert_eq!(winners, "AB");
    }

    #[test]
    fn test_unknown_choices_are_ignored() {
        let vote = vote_with(100, &[("Z", 30), ("A", 10)]);
        let (tallies, winners) =
            calculate_results(&vote, &proposal("AB", 1), &system('R', TALLY_STANDARD, 20))
                .unwrap();
        assert_eq!(tallies, vec![10, 0]);
        // the unknown choice still counts as voted quantity
        assert_eq!(winners, "A");
    }

    #[test]
    fn test_unsupported_tally_logic() {
        let vote = vote_with(100, &[("A", 60)]);
        assert_matches!(
            calculate_results(&vote, &proposal("AB", 1), &system('P', 7, 50)),
            Err(VoteError::UnsupportedTallyLogic(7))
        );
    }

    #[test]
    fn test_validate_voting_system() {
        assert!(validate_voting_system(&system('R', 0, 50)).is_ok());
        assert_matches!(
            validate_voting_system(&system('X', 0, 50)),
            Err(VoteError::UnsupportedVoteType('X'))
        );
        assert_matches!(
            validate_voting_system(&system('A', 0, 0)),
            Err(VoteError::ThresholdOutOfRange(0))
        );
        assert_matches!(
            validate_voting_system(&system('A', 0, 100)),
            Err(VoteError::ThresholdOutOfRange(100))
        );
        assert_matches!(
            validate_voting_system(&system('P', 2, 99)),
            Err(VoteError::InvalidTallyLogic(2))
        );
        assert_eq!(
            VoteError::ThresholdOutOfRange(100).to_string(),
            "Threshold Percentage out of range : 100"
        );
    }

    #[test]
    fn test_validate_proposal() {
        let now = ProtocolTimestamp::from_secs(500);
        assert!(validate_proposal(&proposal("AB", 1), now).is_ok());
        assert_matches!(
            validate_proposal(&proposal("", 1), now),
            Err(VoteError::NoVoteOptions)
        );
        assert_matches!(
            validate_proposal(&proposal("AB", 0), now),
            Err(VoteError::ZeroVoteMax)
        );
        assert_matches!(
            validate_proposal(&proposal("AB", 1), ProtocolTimestamp::from_secs(2_000)),
            Err(VoteError::CutOffInPast)
        );
    }

    fn governed_contract() -> (Contract, Vec<Asset>) {
        let shares = Asset {
            code: Hash20::compute_from(b"shares"),
            voting_rights: true,
            vote_multiplier: 2,
            authorized_token_qty: 1_000,
            ..Default::default()
        };
        let bonds = Asset {
            code: Hash20::compute_from(b"bonds"),
            voting_rights: false,
            authorized_token_qty: 5_000,
            ..Default::default()
        };
        let governed = Asset {
            code: Hash20::compute_from(b"governed"),
            voting_rights: true,
            vote_multiplier: 1,
            authorized_token_qty: 100,
            asset_modification_governance: CONTRACT_WIDE_GOVERNANCE,
            ..Default::default()
        };
        let contract = Contract {
            address: Address::from_public_key(b"contract"),
            asset_codes: vec![shares.code, bonds.code, governed.code],
            admin_member_asset: None,
            voting_systems: Vec::new(),
        };
        (contract, vec![shares, bonds, governed])
    }

    #[test]
    fn test_token_qty() {
        let (contract, assets) = governed_contract();
        assert_eq!(token_qty(&contract, &assets, false).unwrap(), 1_100);
        assert_eq!(token_qty(&contract, &assets, true).unwrap(), 2_100);
        assert_matches!(
            token_qty(&contract, &assets[..1], false),
            Err(VoteError::AssetNotFound(_))
        );
    }

    #[test]
    fn test_proposal_token_qty() {
        let (contract, assets) = governed_contract();
        let mut voting_system = system('R', 0, 50);
        assert_eq!(
            proposal_token_qty(&contract, &assets, None, &voting_system).unwrap(),
            (1_100, true)
        );
        assert_eq!(
            proposal_token_qty(&contract, &assets, Some(&assets[0].code), &voting_system)
                .unwrap(),
            (1_000, false)
        );
        assert_eq!(
            proposal_token_qty(&contract, &assets, Some(&assets[2].code), &voting_system)
                .unwrap(),
            (1_100, true)
        );
        voting_system.vote_multiplier_permitted = true;
        assert_eq!(
            proposal_token_qty(&contract, &assets, Some(&assets[0].code), &voting_system)
                .unwrap(),
            (2_000, false)
        );
    }
}
