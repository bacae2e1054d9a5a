use displaydoc::Display;
use thiserror::Error;
use tokenized_db_exports::StoreError;
use tokenized_hash::Hash20;
use tokenized_holdings_exports::HoldingsError;

#[non_exhaustive]
#[derive(Display, Error, Debug, Clone, PartialEq, Eq)]
pub enum VoteError {
    /// Vote not found
    NotFound,
    /// Vote already complete
    AlreadyComplete,
    /// Unsupported tally logic : {0}
    UnsupportedTallyLogic(u32),
    /// Unsupported vote type : {0}
    UnsupportedVoteType(char),
    /// Threshold Percentage out of range : {0}
    ThresholdOutOfRange(u32),
    /// Tally Logic invalid : {0}
    InvalidTallyLogic(u32),
    /// Proposal has no vote options
    NoVoteOptions,
    /// Proposal vote max is zero
    ZeroVoteMax,
    /// Proposal cut off is in the past
    CutOffInPast,
    /// Voting system not found : {0}
    VotingSystemNotFound(u32),
    /// Asset not found : {0}
    AssetNotFound(Hash20),
    /// Contract has no administrative member asset
    MissingAdminMemberAsset,
    /// Too many ballots: limit is {0}
    TooManyBallots(usize),
    /// token quantity overflow
    QuantityOverflow,
    /// json error: {0}
    JsonError(String),
    /// store error: {0}
    StoreError(#[from] StoreError),
    /// holdings error: {0}
    HoldingsError(#[from] HoldingsError),
}

impl From<serde_json::Error> for VoteError {
    fn from(err: serde_json::Error) -> Self {
        VoteError::JsonError(err.to_string())
    }
}
