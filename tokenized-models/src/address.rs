use crate::error::ModelsError;
use nom::error::{context, ContextError, ErrorKind, ParseError};
use nom::IResult;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::str::FromStr;
use tokenized_hash::{Hash20, Hash20Deserializer, Hash20Serializer, HASH20_SIZE_BYTES};
use tokenized_serialization::{Deserializer, SerializeError, Serializer};

/// Size of a serialized address: type byte followed by the hash
pub const ADDRESS_SIZE_BYTES: usize = 1 + HASH20_SIZE_BYTES;

/// Script template an address pays to
#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, IntoPrimitive, TryFromPrimitive,
)]
#[repr(u8)]
pub enum AddressType {
    /// pay to public key hash
    P2pkh = 0x20,
    /// pay to script hash
    P2sh = 0x21,
}

/// Raw on-chain address identifying a holder or a contract
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Address {
    address_type: AddressType,
    hash: Hash20,
}

impl Address {
    /// Builds an address from its parts
    pub const fn new(address_type: AddressType, hash: Hash20) -> Self {
        Address { address_type, hash }
    }

    /// P2PKH address of a serialized public key
    pub fn from_public_key(public_key: &[u8]) -> Self {
        Address::new(AddressType::P2pkh, Hash20::compute_from(public_key))
    }

    pub fn address_type(&self) -> AddressType {
        self.address_type
    }

    /// The 20-byte payload, used as the address key in every index
    pub fn hash(&self) -> Hash20 {
        self.hash
    }

    pub fn to_bytes(&self) -> [u8; ADDRESS_SIZE_BYTES] {
        let mut bytes = [0u8; ADDRESS_SIZE_BYTES];
        bytes[0] = self.address_type.into();
        bytes[1..].copy_from_slice(self.hash.as_bytes());
        bytes
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, ModelsError> {
        if data.len() != ADDRESS_SIZE_BYTES {
            return Err(ModelsError::AddressParseError(format!(
                "expected {} bytes, got {}",
                ADDRESS_SIZE_BYTES,
                data.len()
            )));
        }
        let address_type =
            AddressType::try_from(data[0]).map_err(|_| ModelsError::UnknownAddressType(data[0]))?;
        Ok(Address::new(address_type, Hash20::from_slice(&data[1..])?))
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.to_bytes()))
    }
}

impl std::fmt::Debug for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

impl FromStr for Address {
    type Err = ModelsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| ModelsError::AddressParseError(e.to_string()))?;
        Address::from_bytes(&bytes)
    }
}

impl ::serde::Serialize for Address {
    fn serialize<S: ::serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        if s.is_human_readable() {
            s.collect_str(self)
        } else {
            s.serialize_bytes(&self.to_bytes())
        }
    }
}

impl<'de> ::serde::Deserialize<'de> for Address {
    fn deserialize<D: ::serde::Deserializer<'de>>(d: D) -> Result<Address, D::Error> {
        if d.is_human_readable() {
            let s = <String as ::serde::Deserialize>::deserialize(d)?;
            Address::from_str(&s).map_err(::serde::de::Error::custom)
        } else {
            let bytes = <Vec<u8> as ::serde::Deserialize>::deserialize(d)?;
            Address::from_bytes(&bytes).map_err(::serde::de::Error::custom)
        }
    }
}

/// Serializer for `Address`
#[derive(Default, Clone)]
pub struct AddressSerializer {
    hash_serializer: Hash20Serializer,
}

impl AddressSerializer {
    pub const fn new() -> Self {
        Self {
            hash_serializer: Hash20Serializer::new(),
        }
    }
}

impl Serializer<Address> for AddressSerializer {
    fn serialize(&self, value: &Address, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        buffer.push(value.address_type.into());
        self.hash_serializer.serialize(&value.hash, buffer)
    }
}

/// Deserializer for `Address`
#[derive(Default, Clone)]
pub struct AddressDeserializer {
    hash_deserializer: Hash20Deserializer,
}

impl AddressDeserializer {
    pub const fn new() -> Self {
        Self {
            hash_deserializer: Hash20Deserializer::new(),
        }
    }
}

impl Deserializer<Address> for AddressDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Address, E> {
        context("Failed Address deserialization", |input: &'a [u8]| {
            let (rest, type_byte) = nom::number::complete::le_u8(input)?;
            let address_type = AddressType::try_from(type_byte).map_err(|_| {
                nom::Err::Error(ParseError::from_error_kind(input, ErrorKind::Verify))
            })?;
            let (rest, hash) = self.hash_deserializer.deserialize(rest)?;
            Ok((rest, Address::new(address_type, hash)))
        })(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tokenized_serialization::DeserializeError;

    #[test]
    fn test_address_str_format() {
        let address = Address::from_public_key(b"some public key");
        let res = Address::from_str(&address.to_string()).unwrap();
        assert_eq!(address, res);
        assert!(address.to_string().starts_with("20"));
    }

    #[test]
    fn test_address_codec_is_fixed_width() {
        let address = Address::new(AddressType::P2sh, Hash20::compute_from(b"script"));
        let mut buffer = Vec::new();
        AddressSerializer::new()
            .serialize(&address, &mut buffer)
            .unwrap();
        assert_eq!(buffer.len(), ADDRESS_SIZE_BYTES);
        assert_eq!(buffer.as_slice(), &address.to_bytes()[..]);
        let (rest, decoded) = AddressDeserializer::new()
            .deserialize::<DeserializeError>(&buffer)
            .unwrap();
        assert!(rest.is_empty());
        assert_eq!(decoded, address);
    }

    #[test]
    fn test_unknown_address_type() {
        let mut bytes = Address::from_public_key(b"key").to_bytes();
        bytes[0] = 0x99;
        assert_matches!(
            Address::from_bytes(&bytes),
            Err(ModelsError::UnknownAddressType(0x99))
        );
        assert!(AddressDeserializer::new()
            .deserialize::<DeserializeError>(&bytes)
            .is_err());
    }
}
