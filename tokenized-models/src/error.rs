use displaydoc::Display;
use thiserror::Error;

pub type ModelsResult<T, E = ModelsError> = core::result::Result<T, E>;

#[non_exhaustive]
#[derive(Display, Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelsError {
    /// address parsing error: {0}
    AddressParseError(String),
    /// unknown address type: {0:#04x}
    UnknownAddressType(u8),
    /// hash error: {0}
    HashError(#[from] tokenized_hash::HashError),
    /// Time error {0}
    TimeError(#[from] tokenized_time::TimeError),
    /// Deserialization error: {0}
    DeserializeError(String),
}
