//! # General description
//!
//! Governance votes of a contract. A `Vote` is created when a proposal is
//! accepted, collects one `Ballot` per holder while it is open, and is
//! completed with the per-option tallies and the winning options computed by
//! `calculate_results`.
//!
//! This crate holds the vote records and the pure tally and validation rules.
//! Persistence lives in the vote worker.

mod config;
mod error;
mod proposal;
mod tally;
mod vote;

pub use config::VoteConfig;
pub use error::VoteError;
pub use proposal::{Amendment, Proposal, ProposalType};
pub use tally::{
    calculate_results, proposal_token_qty, token_qty, validate_proposal, validate_voting_system,
    TALLY_STANDARD, TALLY_WEIGHTED,
};
pub use vote::{ballot_index, ballot_list, NewVote, UpdateVote, Vote};
