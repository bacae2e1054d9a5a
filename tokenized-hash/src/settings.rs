/// Size of a public key hash or asset code
pub const HASH20_SIZE_BYTES: usize = 20;

/// Size of a transaction id or contract hash
pub const HASH32_SIZE_BYTES: usize = 32;
