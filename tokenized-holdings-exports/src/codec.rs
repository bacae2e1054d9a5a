//! Binary layout of a stored holding, all integers little-endian:
//!
//! | field              | size              |
//! |--------------------|-------------------|
//! | version            | 1 (always 0)      |
//! | address            | 21                |
//! | pending balance    | 8                 |
//! | finalized balance  | 8                 |
//! | created at         | 8                 |
//! | updated at         | 8                 |
//! | status count       | 4                 |
//! | statuses           | 58 each           |
//!
//! A status is: code (1), expires (8), amount (8), txid (32), settle
//! quantity (8), posted (1).

use crate::{Holding, HoldingStatus, HoldingStatusCode, HoldingsError};
use nom::error::{context, ContextError, ErrorKind, ParseError};
use nom::multi::length_count;
use nom::sequence::tuple;
use nom::{IResult, Parser};
use std::ops::Bound::Included;
use tokenized_hash::{Hash32Deserializer, Hash32Serializer};
use tokenized_models::address::{AddressDeserializer, AddressSerializer};
use tokenized_serialization::{
    BoolDeserializer, BoolSerializer, DeserializeError, Deserializer, SerializeError, Serializer,
    U32LeDeserializer, U32LeSerializer, U64LeDeserializer, U64LeSerializer, U8Deserializer,
    U8Serializer,
};
use tokenized_time::{ProtocolTimestampDeserializer, ProtocolTimestampSerializer};

/// Only version of the holding layout
pub const HOLDING_VERSION: u8 = 0;

/// Serializer for `HoldingStatus`
#[derive(Default, Clone)]
pub struct HoldingStatusSerializer {
    u8_serializer: U8Serializer,
    u64_serializer: U64LeSerializer,
    time_serializer: ProtocolTimestampSerializer,
    hash_serializer: Hash32Serializer,
    bool_serializer: BoolSerializer,
}

impl HoldingStatusSerializer {
    pub const fn new() -> Self {
        Self {
            u8_serializer: U8Serializer::new(),
            u64_serializer: U64LeSerializer::new(),
            time_serializer: ProtocolTimestampSerializer::new(),
            hash_serializer: Hash32Serializer::new(),
            bool_serializer: BoolSerializer::new(),
        }
    }
}

impl Serializer<HoldingStatus> for HoldingStatusSerializer {
    fn serialize(&self, value: &HoldingStatus, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.u8_serializer.serialize(&value.code.into(), buffer)?;
        self.time_serializer.serialize(&value.expires, buffer)?;
        self.u64_serializer.serialize(&value.amount, buffer)?;
        self.hash_serializer.serialize(&value.tx_id, buffer)?;
        self.u64_serializer
            .serialize(&value.settle_quantity, buffer)?;
        self.bool_serializer.serialize(&value.posted, buffer)?;
        Ok(())
    }
}

/// Deserializer for `HoldingStatus`
#[derive(Clone)]
pub struct HoldingStatusDeserializer {
    u8_deserializer: U8Deserializer,
    u64_deserializer: U64LeDeserializer,
    time_deserializer: ProtocolTimestampDeserializer,
    hash_deserializer: Hash32Deserializer,
    bool_deserializer: BoolDeserializer,
}

impl HoldingStatusDeserializer {
    pub const fn new() -> Self {
        Self {
            u8_deserializer: U8Deserializer::new(Included(u8::MIN), Included(u8::MAX)),
            u64_deserializer: U64LeDeserializer::new(Included(u64::MIN), Included(u64::MAX)),
            time_deserializer: ProtocolTimestampDeserializer::new(),
            hash_deserializer: Hash32Deserializer::new(),
            bool_deserializer: BoolDeserializer::new(),
        }
    }
}

impl Default for HoldingStatusDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<HoldingStatus> for HoldingStatusDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], HoldingStatus, E> {
        context(
            "Failed HoldingStatus deserialization",
            tuple((
                context("Failed code deserialization", |input: &'a [u8]| {
                    let (rest, code) = self.u8_deserializer.deserialize(input)?;
                    let code = HoldingStatusCode::try_from(code).map_err(|_| {
                        nom::Err::Error(ParseError::from_error_kind(input, ErrorKind::Verify))
                    })?;
                    Ok((rest, code))
                }),
                context("Failed expires deserialization", |input| {
                    self.time_deserializer.deserialize(input)
                }),
                context("Failed amount deserialization", |input| {
                    self.u64_deserializer.deserialize(input)
                }),
                context("Failed tx_id deserialization", |input| {
                    self.hash_deserializer.deserialize(input)
                }),
                context("Failed settle_quantity deserialization", |input| {
                    self.u64_deserializer.deserialize(input)
                }),
                context("Failed posted deserialization", |input| {
                    self.bool_deserializer.deserialize(input)
                }),
            )),
        )
        .map(
            |(code, expires, amount, tx_id, settle_quantity, posted)| HoldingStatus {
                code,
                expires,
                amount,
                tx_id,
                settle_quantity,
                posted,
            },
        )
        .parse(buffer)
    }
}

/// Serializer for `Holding`
#[derive(Default, Clone)]
pub struct HoldingSerializer {
    u8_serializer: U8Serializer,
    address_serializer: AddressSerializer,
    u64_serializer: U64LeSerializer,
    time_serializer: ProtocolTimestampSerializer,
    u32_serializer: U32LeSerializer,
    status_serializer: HoldingStatusSerializer,
}

impl HoldingSerializer {
    pub const fn new() -> Self {
        Self {
            u8_serializer: U8Serializer::new(),
            address_serializer: AddressSerializer::new(),
            u64_serializer: U64LeSerializer::new(),
            time_serializer: ProtocolTimestampSerializer::new(),
            u32_serializer: U32LeSerializer::new(),
            status_serializer: HoldingStatusSerializer::new(),
        }
    }
}

impl Serializer<Holding> for HoldingSerializer {
    fn serialize(&self, value: &Holding, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.u8_serializer.serialize(&HOLDING_VERSION, buffer)?;
        self.address_serializer.serialize(&value.address, buffer)?;
        self.u64_serializer
            .serialize(&value.pending_balance, buffer)?;
        self.u64_serializer
            .serialize(&value.finalized_balance, buffer)?;
        self.time_serializer.serialize(&value.created_at, buffer)?;
        self.time_serializer.serialize(&value.updated_at, buffer)?;
        let count: u32 = value.holding_statuses.len().try_into().map_err(|_| {
            SerializeError::NumberTooBig(format!(
                "{} holding statuses",
                value.holding_statuses.len()
            ))
        })?;
        self.u32_serializer.serialize(&count, buffer)?;
        for status in value.holding_statuses.values() {
            self.status_serializer.serialize(status, buffer)?;
        }
        Ok(())
    }
}

/// Deserializer for `Holding`
#[derive(Clone)]
pub struct HoldingDeserializer {
    version_deserializer: U8Deserializer,
    address_deserializer: AddressDeserializer,
    u64_deserializer: U64LeDeserializer,
    time_deserializer: ProtocolTimestampDeserializer,
    length_deserializer: U32LeDeserializer,
    status_deserializer: HoldingStatusDeserializer,
}

impl HoldingDeserializer {
    /// Creates a `HoldingDeserializer` accepting up to `max_holding_statuses` statuses
    pub const fn new(max_holding_statuses: u32) -> Self {
        Self {
            version_deserializer: U8Deserializer::new(
                Included(HOLDING_VERSION),
                Included(HOLDING_VERSION),
            ),
            address_deserializer: AddressDeserializer::new(),
            u64_deserializer: U64LeDeserializer::new(Included(u64::MIN), Included(u64::MAX)),
            time_deserializer: ProtocolTimestampDeserializer::new(),
            length_deserializer: U32LeDeserializer::new(
                Included(u32::MIN),
                Included(max_holding_statuses),
            ),
            status_deserializer: HoldingStatusDeserializer::new(),
        }
    }
}

impl Deserializer<Holding> for HoldingDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Holding, E> {
        context(
            "Failed Holding deserialization",
            tuple((
                context("Failed version deserialization", |input| {
                    self.version_deserializer.deserialize(input)
                }),
                context("Failed address deserialization", |input| {
                    self.address_deserializer.deserialize(input)
                }),
                context("Failed pending_balance deserialization", |input| {
                    self.u64_deserializer.deserialize(input)
                }),
                context("Failed finalized_balance deserialization", |input| {
                    self.u64_deserializer.deserialize(input)
                }),
                context("Failed created_at deserialization", |input| {
                    self.time_deserializer.deserialize(input)
                }),
                context("Failed updated_at deserialization", |input| {
                    self.time_deserializer.deserialize(input)
                }),
                context(
                    "Failed holding_statuses deserialization",
                    length_count(
                        context("Failed length deserialization", |input| {
                            self.length_deserializer.deserialize(input)
                        }),
                        |input| self.status_deserializer.deserialize(input),
                    ),
                ),
            )),
        )
        .map(
            |(
                _version,
                address,
                pending_balance,
                finalized_balance,
                created_at,
                updated_at,
                statuses,
            )| Holding {
                address,
                pending_balance,
                finalized_balance,
                holding_statuses: statuses
                    .into_iter()
                    .map(|status: HoldingStatus| (status.tx_id, status))
                    .collect(),
                created_at,
                updated_at,
            },
        )
        .parse(buffer)
    }
}

/// Serializes a holding into a fresh buffer
pub fn encode_holding(holding: &Holding) -> Result<Vec<u8>, HoldingsError> {
    let mut buffer = Vec::new();
    HoldingSerializer::new().serialize(holding, &mut buffer)?;
    Ok(buffer)
}

/// Decodes a stored holding. Unknown versions and trailing bytes are hard failures.
pub fn decode_holding(
    deserializer: &HoldingDeserializer,
    bytes: &[u8],
) -> Result<Holding, HoldingsError> {
    if let Some(version) = bytes.first() {
        if *version != HOLDING_VERSION {
            return Err(HoldingsError::UnknownVersion(*version));
        }
    }
    let (rest, holding) = deserializer
        .deserialize::<DeserializeError>(bytes)
        .map_err(|err| HoldingsError::DeserializeError(err.to_string()))?;
    if !rest.is_empty() {
        return Err(HoldingsError::DeserializeError(format!(
            "{} trailing bytes",
            rest.len()
        )));
    }
    Ok(holding)
}
