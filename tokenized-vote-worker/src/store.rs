use parking_lot::Mutex;
use std::sync::Arc;
use tokenized_db_exports::{KvStore, StoreError};
use tokenized_hash::Hash32;
use tokenized_models::address::Address;
use tokenized_models::ballot::Ballot;
use tokenized_models::storage_paths::{vote_key, votes_prefix};
use tokenized_time::ProtocolTimestamp;
use tokenized_vote_exports::{NewVote, UpdateVote, Vote, VoteConfig, VoteError};
use tracing::debug;

/// Votes of the node, cached in front of their JSON records.
///
/// Votes are few and short lived, the cache is a plain list searched by
/// vote transaction id.
pub struct VoteStore {
    store: Arc<dyn KvStore>,
    config: VoteConfig,
    votes: Mutex<Vec<Vote>>,
}

impl VoteStore {
    pub fn new(store: Arc<dyn KvStore>, config: VoteConfig) -> Self {
        VoteStore {
            store,
            config,
            votes: Mutex::new(Vec::new()),
        }
    }

    /// Writes `vote` and replaces its cached copy
    pub fn save(&self, contract: &Address, vote: &Vote) -> Result<(), VoteError> {
        let mut votes = self.votes.lock();
        self.save_locked(&mut votes, contract, vote)
    }

    fn save_locked(
        &self,
        votes: &mut Vec<Vote>,
        contract: &Address,
        vote: &Vote,
    ) -> Result<(), VoteError> {
        let data = serde_json::to_vec(vote)?;
        self.store
            .put(&vote_key(&contract.hash(), &vote.vote_tx_id), &data)?;
        match votes
            .iter_mut()
            .find(|cached| cached.vote_tx_id == vote.vote_tx_id)
        {
            Some(cached) => *cached = vote.clone(),
            None => votes.push(vote.clone()),
        }
        Ok(())
    }

    /// Copy of a vote, read from the store on a cache miss
    pub fn fetch(&self, contract: &Address, vote_tx_id: &Hash32) -> Result<Vote, VoteError> {
        let mut votes = self.votes.lock();
        self.fetch_locked(&mut votes, contract, vote_tx_id)
    }

    fn fetch_locked(
        &self,
        votes: &mut Vec<Vote>,
        contract: &Address,
        vote_tx_id: &Hash32,
    ) -> Result<Vote, VoteError> {
        if let Some(vote) = votes.iter().find(|vote| vote.vote_tx_id == *vote_tx_id) {
            return Ok(vote.clone());
        }
        let data = match self.store.fetch(&vote_key(&contract.hash(), vote_tx_id)) {
            Ok(data) => data,
            Err(StoreError::NotFound(_)) => return Err(VoteError::NotFound),
            Err(err) => return Err(err.into()),
        };
        let vote: Vote = serde_json::from_slice(&data)?;
        debug!("vote {} loaded from store", vote_tx_id);
        votes.push(vote.clone());
        Ok(vote)
    }

    /// Runs `f` on a copy of the vote and saves it, holding the cache lock
    /// throughout so concurrent changes to one vote are serialized
    fn modify<F>(&self, contract: &Address, vote_tx_id: &Hash32, f: F) -> Result<Vote, VoteError>
    where
        F: FnOnce(&mut Vote) -> Result<(), VoteError>,
    {
        let mut votes = self.votes.lock();
        let mut vote = self.fetch_locked(&mut votes, contract, vote_tx_id)?;
        f(&mut vote)?;
        self.save_locked(&mut votes, contract, &vote)?;
        Ok(vote)
    }

    /// Opens a vote
    pub fn create(
        &self,
        contract: &Address,
        new_vote: NewVote,
        now: ProtocolTimestamp,
    ) -> Result<Vote, VoteError> {
        if new_vote.ballots.len() > self.config.max_ballots {
            return Err(VoteError::TooManyBallots(self.config.max_ballots));
        }
        let vote = Vote::new(new_vote, now);
        self.save(contract, &vote)?;
        debug!(
            "vote {} created with {} ballots",
            vote.vote_tx_id,
            vote.ballots.len()
        );
        Ok(vote)
    }

    /// Applies `update` to an open vote and returns the new state
    pub fn update(
        &self,
        contract: &Address,
        vote_tx_id: &Hash32,
        update: UpdateVote,
        now: ProtocolTimestamp,
    ) -> Result<Vote, VoteError> {
        self.modify(contract, vote_tx_id, |vote| {
            vote.apply_update(update, &self.config, now)
        })
    }

    /// Records the transaction that applied the outcome of a vote.
    /// Completed votes are accepted.
    pub fn mark_applied(
        &self,
        contract: &Address,
        vote_tx_id: &Hash32,
        applied_tx_id: &Hash32,
        now: ProtocolTimestamp,
    ) -> Result<(), VoteError> {
        self.modify(contract, vote_tx_id, |vote| {
            vote.applied_tx_id = Some(*applied_tx_id);
            vote.updated_at = now;
            Ok(())
        })?;
        Ok(())
    }

    /// Stores `ballot` in the vote and in the caller's copy of it
    pub fn add_ballot(
        &self,
        contract: &Address,
        vote: &mut Vote,
        ballot: Ballot,
        now: ProtocolTimestamp,
    ) -> Result<(), VoteError> {
        let updated = self.update(
            contract,
            &vote.vote_tx_id,
            UpdateVote {
                new_ballot: Some(ballot.clone()),
                ..Default::default()
            },
            now,
        )?;
        vote.ballots.insert(ballot.address.hash(), ballot);
        vote.updated_at = updated.updated_at;
        Ok(())
    }

    /// Every stored vote of a contract
    pub fn list(&self, contract: &Address) -> Result<Vec<Vote>, VoteError> {
        self.store
            .search(&votes_prefix(&contract.hash()))?
            .iter()
            .map(|data| serde_json::from_slice(data).map_err(VoteError::from))
            .collect()
    }

    /// Forgets every cached vote
    pub fn reset(&self) {
        self.votes.lock().clear();
    }
}
