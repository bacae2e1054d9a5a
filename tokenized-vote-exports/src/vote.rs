use crate::{Amendment, VoteConfig, VoteError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use tokenized_hash::{Hash20, Hash32};
use tokenized_models::ballot::Ballot;
use tokenized_time::ProtocolTimestamp;

/// Persisted form of a ballot index, ordered by address hash
pub fn ballot_list(ballots: &BTreeMap<Hash20, Ballot>) -> Vec<Ballot> {
    ballots.values().cloned().collect()
}

/// Ballot index rebuilt from its persisted form. A later ballot of the same
/// address replaces an earlier one.
pub fn ballot_index(list: Vec<Ballot>) -> BTreeMap<Hash20, Ballot> {
    list.into_iter()
        .map(|ballot| (ballot.address.hash(), ballot))
        .collect()
}

fn serialize_ballots<S: Serializer>(
    ballots: &BTreeMap<Hash20, Ballot>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    ballot_list(ballots).serialize(serializer)
}

fn deserialize_ballots<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<Hash20, Ballot>, D::Error> {
    Ok(ballot_index(Vec::<Ballot>::deserialize(deserializer)?))
}

/// State of one governance vote
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub proposal_type: u32,
    pub vote_system: u32,
    pub contract_wide_vote: bool,
    #[serde(default)]
    pub asset_type: String,
    #[serde(default)]
    pub asset_code: Option<Hash20>,
    #[serde(default)]
    pub proposed_amendments: Vec<Amendment>,

    /// storage key of the vote
    pub vote_tx_id: Hash32,
    pub proposal_tx_id: Hash32,
    /// eligible quantity when the vote opened, denominator of absolute thresholds
    pub token_qty: u64,
    pub expires: ProtocolTimestamp,
    pub timestamp: ProtocolTimestamp,
    pub created_at: ProtocolTimestamp,
    pub updated_at: ProtocolTimestamp,

    #[serde(default)]
    pub option_tally: Vec<u64>,
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub applied_tx_id: Option<Hash32>,
    /// zero while the vote is open
    #[serde(default)]
    pub completed_at: ProtocolTimestamp,

    /// keyed by the hash of the voter address, stored as a plain list
    #[serde(
        default,
        serialize_with = "serialize_ballots",
        deserialize_with = "deserialize_ballots"
    )]
    pub ballots: BTreeMap<Hash20, Ballot>,
}

/// Fields of a vote known when it is created
#[derive(Clone, Debug, Default)]
pub struct NewVote {
    pub proposal_type: u32,
    pub vote_system: u32,
    pub contract_wide_vote: bool,
    pub asset_type: String,
    pub asset_code: Option<Hash20>,
    pub proposed_amendments: Vec<Amendment>,
    pub vote_tx_id: Hash32,
    pub proposal_tx_id: Hash32,
    pub token_qty: u64,
    pub expires: ProtocolTimestamp,
    pub timestamp: ProtocolTimestamp,
    pub ballots: BTreeMap<Hash20, Ballot>,
}

/// Changes to an open vote, `None` fields are left alone
#[derive(Clone, Debug, Default)]
pub struct UpdateVote {
    pub completed_at: Option<ProtocolTimestamp>,
    pub result: Option<String>,
    pub option_tally: Option<Vec<u64>>,
    pub applied_tx_id: Option<Hash32>,
    pub new_ballot: Option<Ballot>,
}

impl Vote {
    pub fn new(new_vote: NewVote, now: ProtocolTimestamp) -> Self {
        Vote {
            proposal_type: new_vote.proposal_type,
            vote_system: new_vote.vote_system,
            contract_wide_vote: new_vote.contract_wide_vote,
            asset_type: new_vote.asset_type,
            asset_code: new_vote.asset_code,
            proposed_amendments: new_vote.proposed_amendments,
            vote_tx_id: new_vote.vote_tx_id,
            proposal_tx_id: new_vote.proposal_tx_id,
            token_qty: new_vote.token_qty,
            expires: new_vote.expires,
            timestamp: new_vote.timestamp,
            created_at: now,
            updated_at: now,
            option_tally: Vec::new(),
            result: String::new(),
            applied_tx_id: None,
            completed_at: ProtocolTimestamp::ZERO,
            ballots: new_vote.ballots,
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.completed_at.is_zero()
    }

    /// Applies `update` to an open vote. A completed vote is never changed.
    pub fn apply_update(
        &mut self,
        update: UpdateVote,
        config: &VoteConfig,
        now: ProtocolTimestamp,
    ) -> Result<(), VoteError> {
        if self.is_complete() {
            return Err(VoteError::AlreadyComplete);
        }
        if let Some(ballot) = &update.new_ballot {
            if !self.ballots.contains_key(&ballot.address.hash())
                && self.ballots.len() >= config.max_ballots
            {
                return Err(VoteError::TooManyBallots(config.max_ballots));
            }
        }

        if let Some(completed_at) = update.completed_at {
            self.completed_at = completed_at;
        }
        if let Some(result) = update.result {
            self.result = result;
        }
        if let Some(option_tally) = update.option_tally {
            self.option_tally = option_tally;
        }
        if let Some(applied_tx_id) = update.applied_tx_id {
            self.applied_tx_id = Some(applied_tx_id);
        }
        if let Some(ballot) = update.new_ballot {
            self.ballots.insert(ballot.address.hash(), ballot);
        }
        self.updated_at = now;
        Ok(())
    }
}
