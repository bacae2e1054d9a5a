//! Fixed-size hashes used as identifiers across the ledger: 20-byte public
//! key hashes, contract hashes and asset codes, 32-byte transaction ids.

pub use error::HashError;
pub use hash::{
    hash160, sha256, sha256d, Hash20, Hash20Deserializer, Hash20Serializer, Hash32,
    Hash32Deserializer, Hash32Serializer,
};
pub use settings::{HASH20_SIZE_BYTES, HASH32_SIZE_BYTES};

mod error;
mod hash;
mod settings;
