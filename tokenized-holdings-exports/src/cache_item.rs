use tokenized_hash::Hash20;

/// Identity of a cache entry waiting to be flushed to storage
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CacheItem {
    pub contract_hash: Hash20,
    pub asset_code: Hash20,
    pub address_hash: Hash20,
}

impl CacheItem {
    pub fn new(contract_hash: Hash20, asset_code: Hash20, address_hash: Hash20) -> Self {
        CacheItem {
            contract_hash,
            asset_code,
            address_hash,
        }
    }

    /// Storage key of the holding
    pub fn storage_key(&self) -> String {
        tokenized_models::storage_paths::holding_key(
            &self.contract_hash,
            &self.asset_code,
            &self.address_hash,
        )
    }
}
