//! Binary (de)serialization primitives shared by every persisted structure.
//!
//! Serializers append to a caller-provided buffer. Deserializers are `nom`
//! parsers generic over the error type so that callers can either collect
//! rich contexts (`DeserializeError`) or use the cheap default nom error.
//!
//! All integers are fixed-width little-endian.

use displaydoc::Display;
use nom::error::{context, ContextError, ErrorKind, ParseError};
use nom::IResult;
use std::fmt;
use std::ops::{Bound, RangeBounds};
use thiserror::Error;

#[non_exhaustive]
#[derive(Display, Error, Debug, Clone, PartialEq, Eq)]
pub enum SerializeError {
    /// Number {0} is too big to be serialized
    NumberTooBig(String),
    /// General error {0}
    GeneralError(String),
}

/// Deserialization error collecting every nom error kind and context
/// encountered while unwinding a failed parse.
#[derive(Debug, PartialEq, Eq)]
pub struct DeserializeError<'a> {
    errors: Vec<(&'a [u8], ErrorKind)>,
    contexts: Vec<(&'a [u8], &'static str)>,
}

impl<'a> DeserializeError<'a> {
    /// Contexts attached to the error, innermost first
    pub fn contexts(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.contexts.iter().map(|(_, ctx)| *ctx)
    }
}

impl<'a> ParseError<&'a [u8]> for DeserializeError<'a> {
    fn from_error_kind(input: &'a [u8], kind: ErrorKind) -> Self {
        Self {
            errors: vec![(input, kind)],
            contexts: Vec::new(),
        }
    }

    fn append(input: &'a [u8], kind: ErrorKind, mut other: Self) -> Self {
        other.errors.push((input, kind));
        other
    }
}

impl<'a> ContextError<&'a [u8]> for DeserializeError<'a> {
    fn add_context(input: &'a [u8], ctx: &'static str, mut other: Self) -> Self {
        other.contexts.push((input, ctx));
        other
    }
}

impl<'a> fmt::Display for DeserializeError<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (_, ctx) in self.contexts.iter().rev() {
            if !first {
                write!(f, " / ")?;
            }
            write!(f, "{}", ctx)?;
            first = false;
        }
        if let Some((input, kind)) = self.errors.first() {
            if !first {
                write!(f, ": ")?;
            }
            write!(f, "{:?} ({} bytes left)", kind, input.len())?;
        }
        Ok(())
    }
}

/// Parses a `T` out of the front of a byte buffer
pub trait Deserializer<T> {
    /// Returns the remaining input and the parsed value
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], T, E>;
}

/// Appends the binary form of a `T` to a buffer
pub trait Serializer<T> {
    fn serialize(&self, value: &T, buffer: &mut Vec<u8>) -> Result<(), SerializeError>;
}

/// Serializer for a single byte
#[derive(Default, Clone)]
pub struct U8Serializer;

impl U8Serializer {
    /// Creates a `U8Serializer`
    pub const fn new() -> Self {
        Self
    }
}

impl Serializer<u8> for U8Serializer {
    fn serialize(&self, value: &u8, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        buffer.push(*value);
        Ok(())
    }
}

/// Deserializer for a single byte within bounds
#[derive(Clone)]
pub struct U8Deserializer {
    range: (Bound<u8>, Bound<u8>),
}

impl U8Deserializer {
    /// Creates a `U8Deserializer` accepting values in `(min, max)`
    pub const fn new(min: Bound<u8>, max: Bound<u8>) -> Self {
        Self { range: (min, max) }
    }
}

impl Deserializer<u8> for U8Deserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], u8, E> {
        context("Failed u8 deserialization", |input: &'a [u8]| {
            let (rest, value) = nom::number::complete::le_u8(input)?;
            if !self.range.contains(&value) {
                return Err(nom::Err::Error(ParseError::from_error_kind(
                    input,
                    ErrorKind::Verify,
                )));
            }
            Ok((rest, value))
        })(buffer)
    }
}

/// Serializer for little-endian `u32`
#[derive(Default, Clone)]
pub struct U32LeSerializer;

impl U32LeSerializer {
    /// Creates a `U32LeSerializer`
    pub const fn new() -> Self {
        Self
    }
}

impl Serializer<u32> for U32LeSerializer {
    fn serialize(&self, value: &u32, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        buffer.extend_from_slice(&value.to_le_bytes());
        Ok(())
    }
}

/// Deserializer for little-endian `u32` within bounds
#[derive(Clone)]
pub struct U32LeDeserializer {
    range: (Bound<u32>, Bound<u32>),
}

impl U32LeDeserializer {
    /// Creates a `U32LeDeserializer` accepting values in `(min, max)`
    pub const fn new(min: Bound<u32>, max: Bound<u32>) -> Self {
        Self { range: (min, max) }
    }
}

impl Deserializer<u32> for U32LeDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], u32, E> {
        context("Failed u32 deserialization", |input: &'a [u8]| {
            let (rest, value) = nom::number::complete::le_u32(input)?;
            if !self.range.contains(&value) {
                return Err(nom::Err::Error(ParseError::from_error_kind(
                    input,
                    ErrorKind::Verify,
                )));
            }
            Ok((rest, value))
        })(buffer)
    }
}

/// Serializer for little-endian `u64`
#[derive(Default, Clone)]
pub struct U64LeSerializer;

impl U64LeSerializer {
    /// Creates a `U64LeSerializer`
    pub const fn new() -> Self {
        Self
    }
}

impl Serializer<u64> for U64LeSerializer {
    fn serialize(&self, value: &u64, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        buffer.extend_from_slice(&value.to_le_bytes());
        Ok(())
    }
}

/// Deserializer for little-endian `u64` within bounds
#[derive(Clone)]
pub struct U64LeDeserializer {
    range: (Bound<u64>, Bound<u64>),
}

impl U64LeDeserializer {
    /// Creates a `U64LeDeserializer` accepting values in `(min, max)`
    pub const fn new(min: Bound<u64>, max: Bound<u64>) -> Self {
        Self { range: (min, max) }
    }
}

impl Deserializer<u64> for U64LeDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], u64, E> {
        context("Failed u64 deserialization", |input: &'a [u8]| {
            let (rest, value) = nom::number::complete::le_u64(input)?;
            if !self.range.contains(&value) {
                return Err(nom::Err::Error(ParseError::from_error_kind(
                    input,
                    ErrorKind::Verify,
                )));
            }
            Ok((rest, value))
        })(buffer)
    }
}

/// Serializer for a bool stored as one byte
#[derive(Default, Clone)]
pub struct BoolSerializer;

impl BoolSerializer {
    /// Creates a `BoolSerializer`
    pub const fn new() -> Self {
        Self
    }
}

impl Serializer<bool> for BoolSerializer {
    fn serialize(&self, value: &bool, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        buffer.push(u8::from(*value));
        Ok(())
    }
}

/// Deserializer for a bool stored as one byte, 0 or 1
#[derive(Default, Clone)]
pub struct BoolDeserializer;

impl BoolDeserializer {
    /// Creates a `BoolDeserializer`
    pub const fn new() -> Self {
        Self
    }
}

impl Deserializer<bool> for BoolDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], bool, E> {
        context("Failed bool deserialization", |input: &'a [u8]| {
            let (rest, value) = nom::number::complete::le_u8(input)?;
            match value {
                0 => Ok((rest, false)),
                1 => Ok((rest, true)),
                _ => Err(nom::Err::Error(ParseError::from_error_kind(
                    input,
                    ErrorKind::Verify,
                ))),
            }
        })(buffer)
    }
}
