//! Protocol time: nanoseconds since the UNIX epoch.
//!
//! Every `created_at`, `updated_at`, `expires` and `timestamp` field of the
//! ledger is a `ProtocolTimestamp`. The value 0 is meaningful for some fields
//! (a freeze with `expires == 0` never expires).

mod error;
pub use error::TimeError;
use nom::error::{context, ContextError, ParseError};
use nom::IResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Bound;
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tokenized_serialization::{
    Deserializer, SerializeError, Serializer, U64LeDeserializer, U64LeSerializer,
};

/// Unsigned nanosecond timestamp
#[derive(
    Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct ProtocolTimestamp(u64);

impl ProtocolTimestamp {
    /// The "never" / "unset" timestamp
    pub const ZERO: ProtocolTimestamp = ProtocolTimestamp(0);

    /// From nanoseconds since the epoch
    pub const fn from_nanos(value: u64) -> Self {
        ProtocolTimestamp(value)
    }

    /// From seconds since the epoch, saturating
    pub const fn from_secs(value: u64) -> Self {
        ProtocolTimestamp(value.saturating_mul(1_000_000_000))
    }

    /// Nanoseconds since the epoch
    pub const fn to_nanos(&self) -> u64 {
        self.0
    }

    /// Current wall clock time
    pub fn now() -> Result<Self, TimeError> {
        let now: u64 = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| TimeError::TimeOverflowError)?
            .as_nanos()
            .try_into()
            .map_err(|_| TimeError::TimeOverflowError)?;
        Ok(ProtocolTimestamp(now))
    }

    /// True for the zero timestamp
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub fn saturating_add(self, d: Duration) -> Self {
        let nanos: u64 = d.as_nanos().try_into().unwrap_or(u64::MAX);
        ProtocolTimestamp(self.0.saturating_add(nanos))
    }

    #[must_use]
    pub fn saturating_sub(self, t: ProtocolTimestamp) -> Self {
        ProtocolTimestamp(self.0.saturating_sub(t.0))
    }

    pub fn checked_add(self, d: Duration) -> Result<Self, TimeError> {
        let nanos: u64 = d
            .as_nanos()
            .try_into()
            .map_err(|_| TimeError::TimeOverflowError)?;
        self.0
            .checked_add(nanos)
            .ok_or_else(|| TimeError::CheckedOperationError("addition error".to_string()))
            .map(ProtocolTimestamp)
    }

    /// RFC 3339 rendering, second precision
    pub fn format_instant(&self) -> Result<String, TimeError> {
        let secs: i64 = (self.0 / 1_000_000_000)
            .try_into()
            .map_err(|_| TimeError::ConversionError)?;
        let datetime =
            OffsetDateTime::from_unix_timestamp(secs).map_err(|_| TimeError::ConversionError)?;
        datetime
            .format(&Rfc3339)
            .map_err(|_| TimeError::ConversionError)
    }
}

impl fmt::Display for ProtocolTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProtocolTimestamp {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ProtocolTimestamp(
            u64::from_str(s).map_err(|_| TimeError::ConversionError)?,
        ))
    }
}

impl From<ProtocolTimestamp> for Duration {
    fn from(value: ProtocolTimestamp) -> Self {
        Duration::from_nanos(value.0)
    }
}

/// Serializer for `ProtocolTimestamp`, 8 bytes little-endian
#[derive(Default, Clone)]
pub struct ProtocolTimestampSerializer {
    u64_serializer: U64LeSerializer,
}

impl ProtocolTimestampSerializer {
    /// Creates a `ProtocolTimestampSerializer`
    pub const fn new() -> Self {
        Self {
            u64_serializer: U64LeSerializer::new(),
        }
    }
}

impl Serializer<ProtocolTimestamp> for ProtocolTimestampSerializer {
    fn serialize(
        &self,
        value: &ProtocolTimestamp,
        buffer: &mut Vec<u8>,
    ) -> Result<(), SerializeError> {
        self.u64_serializer.serialize(&value.0, buffer)
    }
}

/// Deserializer for `ProtocolTimestamp`
#[derive(Clone)]
pub struct ProtocolTimestampDeserializer {
    u64_deserializer: U64LeDeserializer,
}

impl ProtocolTimestampDeserializer {
    /// Creates a `ProtocolTimestampDeserializer` accepting any value
    pub const fn new() -> Self {
        Self {
            u64_deserializer: U64LeDeserializer::new(Bound::Included(0), Bound::Included(u64::MAX)),
        }
    }
}

impl Default for ProtocolTimestampDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<ProtocolTimestamp> for ProtocolTimestampDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], ProtocolTimestamp, E> {
        context("Failed ProtocolTimestamp deserialization", |input| {
            self.u64_deserializer
                .deserialize(input)
                .map(|(rest, res)| (rest, ProtocolTimestamp(res)))
        })(buffer)
    }
}
