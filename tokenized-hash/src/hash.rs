use crate::error::HashError;
use crate::settings::{HASH20_SIZE_BYTES, HASH32_SIZE_BYTES};
use nom::bytes::complete::take;
use nom::error::{context, ContextError, ParseError};
use nom::IResult;
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};
use std::str::FromStr;
use tokenized_serialization::{Deserializer, SerializeError, Serializer};

/// SHA-256 of the input
pub fn sha256(data: &[u8]) -> [u8; HASH32_SIZE_BYTES] {
    Sha256::digest(data).into()
}

/// SHA-256 applied twice, the hash behind transaction ids
pub fn sha256d(data: &[u8]) -> [u8; HASH32_SIZE_BYTES] {
    sha256(&sha256(data))
}

/// RIPEMD-160 of SHA-256, the hash behind public key hashes
pub fn hash160(data: &[u8]) -> [u8; HASH20_SIZE_BYTES] {
    Ripemd160::digest(sha256(data)).into()
}

macro_rules! fixed_hash {
    ($name:ident, $size:expr, $ser:ident, $deser:ident, $ctx:literal) => {
        #[derive(Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Hash, Default)]
        pub struct $name([u8; $size]);

        impl $name {
            /// Wraps raw bytes
            pub const fn from_bytes(data: [u8; $size]) -> Self {
                $name(data)
            }

            /// Copies from a slice, failing when its length is not exact
            pub fn from_slice(data: &[u8]) -> Result<Self, HashError> {
                let bytes: [u8; $size] = data.try_into().map_err(|_| HashError::WrongSize {
                    expected: $size,
                    got: data.len(),
                })?;
                Ok($name(bytes))
            }

            pub const fn to_bytes(&self) -> [u8; $size] {
                self.0
            }

            pub fn as_bytes(&self) -> &[u8; $size] {
                &self.0
            }

            pub fn is_zero(&self) -> bool {
                self.0.iter().all(|b| *b == 0)
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "{}", self)
            }
        }

        impl ::serde::Serialize for $name {
            /// Hex string for human readable formats, raw bytes otherwise
            fn serialize<S: ::serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
                if s.is_human_readable() {
                    s.collect_str(self)
                } else {
                    s.serialize_bytes(&self.0)
                }
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D: ::serde::Deserializer<'de>>(d: D) -> Result<$name, D::Error> {
                if d.is_human_readable() {
                    let s = <String as ::serde::Deserialize>::deserialize(d)?;
                    $name::from_str(&s).map_err(::serde::de::Error::custom)
                } else {
                    let bytes = <Vec<u8> as ::serde::Deserialize>::deserialize(d)?;
                    $name::from_slice(&bytes).map_err(::serde::de::Error::custom)
                }
            }
        }

        /// Serializer writing the raw fixed-width bytes
        #[derive(Default, Clone)]
        pub struct $ser;

        impl $ser {
            pub const fn new() -> Self {
                Self
            }
        }

        impl Serializer<$name> for $ser {
            fn serialize(&self, value: &$name, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
                buffer.extend_from_slice(&value.0);
                Ok(())
            }
        }

        /// Deserializer reading the raw fixed-width bytes
        #[derive(Default, Clone)]
        pub struct $deser;

        impl $deser {
            pub const fn new() -> Self {
                Self
            }
        }

        impl Deserializer<$name> for $deser {
            fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
                &self,
                buffer: &'a [u8],
            ) -> IResult<&'a [u8], $name, E> {
                context($ctx, |input: &'a [u8]| {
                    let (rest, bytes) = take($size)(input)?;
                    let mut data = [0u8; $size];
                    data.copy_from_slice(bytes);
                    Ok((rest, $name(data)))
                })(buffer)
            }
        }
    };
}

fixed_hash!(
    Hash20,
    HASH20_SIZE_BYTES,
    Hash20Serializer,
    Hash20Deserializer,
    "Failed Hash20 deserialization"
);
fixed_hash!(
    Hash32,
    HASH32_SIZE_BYTES,
    Hash32Serializer,
    Hash32Deserializer,
    "Failed Hash32 deserialization"
);

impl Hash20 {
    /// hash160 of data
    pub fn compute_from(data: &[u8]) -> Self {
        Hash20(hash160(data))
    }
}

impl std::fmt::Display for Hash20 {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for Hash20 {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|err| HashError::ParsingError(err.to_string()))?;
        Hash20::from_slice(&bytes)
    }
}

impl Hash32 {
    /// Double SHA-256 of data
    pub fn compute_from(data: &[u8]) -> Self {
        Hash32(sha256d(data))
    }
}

/// Hash32 values are displayed byte-reversed, as transaction ids are on chain.
impl std::fmt::Display for Hash32 {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut reversed = self.0;
        reversed.reverse();
        write!(f, "{}", hex::encode(reversed))
    }
}

impl FromStr for Hash32 {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes =
            hex::decode(s).map_err(|err| HashError::ParsingError(err.to_string()))?;
        bytes.reverse();
        Hash32::from_slice(&bytes)
    }
}
