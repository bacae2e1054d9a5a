use displaydoc::Display;
use thiserror::Error;
use tokenized_db_exports::StoreError;
use tokenized_hash::Hash32;
use tokenized_models::error::ModelsError;
use tokenized_serialization::SerializeError;

#[non_exhaustive]
#[derive(Display, Error, Debug, Clone, PartialEq, Eq)]
pub enum HoldingsError {
    /// Holding not found
    NotFound,
    /// Not in cache
    NotInCache,
    /// Holdings insufficient: {available} available, {requested} requested
    InsufficientHoldings { available: u64, requested: u64 },
    /// Holdings are frozen
    HoldingsFrozen,
    /// Holdings are locked
    HoldingsLocked,
    /// Holdings duplicate entry: {0}
    DuplicateEntry(Hash32),
    /// balance overflow
    BalanceOverflow,
    /// Status not found: {0}
    StatusNotFound(Hash32),
    /// Unknown holding status code : {0}
    UnknownStatusCode(char),
    /// Missing settlement: {0}
    MissingSettlement(Hash32),
    /// Wrong settlement type: {0}
    WrongSettlementType(char),
    /// Wrong settlement amount: expected {expected}, got {got}
    WrongSettlementAmount { expected: u64, got: u64 },
    /// Missing freeze : {0}
    MissingFreeze(Hash32),
    /// Wrong freeze type: {0}
    WrongFreezeType(char),
    /// Wrong freeze amount: expected {expected}, got {got}
    WrongFreezeAmount { expected: u64, got: u64 },
    /// Unknown version : {0}
    UnknownVersion(u8),
    /// Failed to deserialize holding: {0}
    DeserializeError(String),
    /// serialization error: {0}
    SerializeError(#[from] SerializeError),
    /// store error: {0}
    StoreError(#[from] StoreError),
    /// models error: {0}
    ModelsError(#[from] ModelsError),
    /// Channel closed
    ChannelClosed,
    /// channel error: {0}
    ChannelError(String),
    /// holdings writer thread panicked
    WriterPanicked,
    /// holdings writer aborted, nothing is written anymore
    WriterAborted,
}

impl HoldingsError {
    /// Errors that reject the triggering transaction: the same call will fail again
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            HoldingsError::InsufficientHoldings { .. }
                | HoldingsError::HoldingsFrozen
                | HoldingsError::HoldingsLocked
                | HoldingsError::DuplicateEntry(_)
                | HoldingsError::BalanceOverflow
                | HoldingsError::StatusNotFound(_)
                | HoldingsError::MissingSettlement(_)
                | HoldingsError::WrongSettlementType(_)
                | HoldingsError::WrongSettlementAmount { .. }
                | HoldingsError::MissingFreeze(_)
                | HoldingsError::WrongFreezeType(_)
                | HoldingsError::WrongFreezeAmount { .. }
        )
    }
}
