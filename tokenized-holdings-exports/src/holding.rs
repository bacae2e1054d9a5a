use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokenized_hash::Hash32;
use tokenized_models::address::Address;
use tokenized_time::ProtocolTimestamp;

/// Kind of an outstanding balance change, stored as its ASCII code
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    IntoPrimitive,
    TryFromPrimitive,
    Serialize,
    Deserialize,
)]
#[repr(u8)]
pub enum HoldingStatusCode {
    /// tokens held by an enforcement order
    Freeze = b'F',
    /// pending send
    Debit = b'S',
    /// pending receive
    Deposit = b'R',
    /// pending send of a transfer spanning several contracts
    MultiContractDebit = b'-',
    /// pending receive of a transfer spanning several contracts
    MultiContractDeposit = b'+',
}

impl HoldingStatusCode {
    pub fn is_debit(&self) -> bool {
        matches!(
            self,
            HoldingStatusCode::Debit | HoldingStatusCode::MultiContractDebit
        )
    }

    pub fn is_deposit(&self) -> bool {
        matches!(
            self,
            HoldingStatusCode::Deposit | HoldingStatusCode::MultiContractDeposit
        )
    }

    /// Multi-contract statuses lock the holding until they settle
    pub fn is_multi_contract(&self) -> bool {
        matches!(
            self,
            HoldingStatusCode::MultiContractDebit | HoldingStatusCode::MultiContractDeposit
        )
    }

    pub fn as_char(&self) -> char {
        char::from(u8::from(*self))
    }
}

/// Outstanding balance change caused by one transaction
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldingStatus {
    pub code: HoldingStatusCode,
    /// zero means the status never expires
    pub expires: ProtocolTimestamp,
    pub amount: u64,
    pub tx_id: Hash32,
    /// pending balance right after the status was applied
    pub settle_quantity: u64,
    /// reserved, never set
    pub posted: bool,
}

impl HoldingStatus {
    /// Only freezes carry an expiry. Expired iff `expires != 0 && now > expires`.
    pub fn is_expired(&self, now: ProtocolTimestamp) -> bool {
        !self.expires.is_zero() && now > self.expires
    }
}

/// Balance of one address for one asset of one contract
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    pub address: Address,
    /// balance once every outstanding status settles
    pub pending_balance: u64,
    /// balance as of the last settlement
    pub finalized_balance: u64,
    pub holding_statuses: BTreeMap<Hash32, HoldingStatus>,
    pub created_at: ProtocolTimestamp,
    pub updated_at: ProtocolTimestamp,
}

impl Holding {
    /// Empty holding of `address`, created at `now`
    pub fn new(address: Address, now: ProtocolTimestamp) -> Self {
        Holding {
            address,
            pending_balance: 0,
            finalized_balance: 0,
            holding_statuses: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }
}
