use serde::{Deserialize, Serialize};
use tokenized_hash::Hash20;
use tokenized_time::ProtocolTimestamp;

/// Who initiated a proposal, which decides who votes on it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProposalType {
    /// raised by the contract administration, voted by holders
    Administration,
    /// raised by a holder, voted by holders
    Holder,
    /// voted by the holders of the administrative member asset only
    AdministrativeMatter,
}

impl ProposalType {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(ProposalType::Administration),
            1 => Some(ProposalType::Holder),
            2 => Some(ProposalType::AdministrativeMatter),
            _ => None,
        }
    }
}

/// Change to a contract or asset field proposed for a vote
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amendment {
    /// indexes leading to the amended field
    pub field_index_path: Vec<u32>,
    pub operation: u32,
    #[serde(default)]
    pub data: Vec<u8>,
}

/// Governance proposal as published on chain
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub proposal_type: u32,
    #[serde(default)]
    pub asset_type: String,
    /// asset voted on, contract-wide proposals have none
    #[serde(default)]
    pub asset_code: Option<Hash20>,
    /// index of the voting system in the contract
    pub vote_system: u32,
    /// one character per option
    pub vote_options: String,
    /// maximum number of options a ballot may rank
    pub vote_max: u32,
    pub vote_cut_off_timestamp: ProtocolTimestamp,
    #[serde(default)]
    pub proposed_amendments: Vec<Amendment>,
}

impl Proposal {
    pub fn kind(&self) -> Option<ProposalType> {
        ProposalType::from_u32(self.proposal_type)
    }
}
