use parking_lot::{Mutex, RwLock};
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokenized_db_exports::{KvStore, StoreError};
use tokenized_hash::Hash20;
use tokenized_holdings_exports::{
    decode_holding, encode_holding, voting_balance, CacheItem, Holding, HoldingDeserializer,
    HoldingsConfig, HoldingsError,
};
use tokenized_models::address::Address;
use tokenized_models::asset::Asset;
use tokenized_models::ballot::Ballot;
use tokenized_models::contract::Contract;
use tokenized_models::storage_paths::holdings_prefix;
use tokenized_time::ProtocolTimestamp;
use tracing::debug;

#[derive(Debug)]
struct CacheEntry {
    holding: Holding,
    /// set by `save`, cleared once the holding is written to the store
    modified: bool,
}

type EntryRef = Arc<Mutex<CacheEntry>>;
type AddressMap = HashMap<Hash20, EntryRef>;
type AssetMap = HashMap<Hash20, AddressMap>;

/// Write-back cache of holdings in front of a `KvStore`.
///
/// The structure lock only guards the nested maps. Each entry has its own
/// mutex, so operations on different holdings never wait on each other once
/// their entries exist.
pub struct HoldingsCache {
    store: Arc<dyn KvStore>,
    deserializer: HoldingDeserializer,
    entries: RwLock<HashMap<Hash20, AssetMap>>,
}

impl HoldingsCache {
    pub fn new(store: Arc<dyn KvStore>, config: &HoldingsConfig) -> Self {
        HoldingsCache {
            store,
            deserializer: HoldingDeserializer::new(config.max_holding_statuses),
            entries: RwLock::new(HashMap::new()),
        }
    }

    fn lookup(&self, item: &CacheItem) -> Option<EntryRef> {
        self.entries
            .read()
            .get(&item.contract_hash)?
            .get(&item.asset_code)?
            .get(&item.address_hash)
            .cloned()
    }

    /// Entries of one asset, with their storage keys
    fn asset_entries(&self, contract_hash: &Hash20, asset_code: &Hash20) -> Vec<(String, EntryRef)> {
        let entries = self.entries.read();
        let Some(addresses) = entries
            .get(contract_hash)
            .and_then(|assets| assets.get(asset_code))
        else {
            return Vec::new();
        };
        addresses
            .iter()
            .map(|(address_hash, entry)| {
                (
                    CacheItem::new(*contract_hash, *asset_code, *address_hash).storage_key(),
                    entry.clone(),
                )
            })
            .collect()
    }

    /// Loads a holding from the store into the cache, unmodified.
    /// Returns `None` if the store does not have it.
    fn load(&self, item: &CacheItem) -> Result<Option<EntryRef>, HoldingsError> {
        let holding = match self.fetch_stored(&item.storage_key())? {
            Some(holding) => holding,
            None => return Ok(None),
        };
        debug!("holdings cache: loaded {} from store", item.storage_key());
        let mut entries = self.entries.write();
        let entry = entries
            .entry(item.contract_hash)
            .or_default()
            .entry(item.asset_code)
            .or_default()
            .entry(item.address_hash)
            // an entry inserted meanwhile is newer than the stored holding
            .or_insert_with(|| {
                Arc::new(Mutex::new(CacheEntry {
                    holding,
                    modified: false,
                }))
            })
            .clone();
        Ok(Some(entry))
    }

    fn fetch_stored(&self, key: &str) -> Result<Option<Holding>, HoldingsError> {
        match self.store.fetch(key) {
            Ok(bytes) => Ok(Some(decode_holding(&self.deserializer, &bytes)?)),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Puts `holding` in the cache and marks it for writing.
    /// The returned item must be sent to the flush channel.
    pub fn save(&self, contract: &Address, asset_code: &Hash20, holding: Holding) -> CacheItem {
        let item = CacheItem::new(contract.hash(), *asset_code, holding.address.hash());
        if let Some(entry) = self.lookup(&item) {
            let mut guard = entry.lock();
            guard.holding = holding;
            guard.modified = true;
            return item;
        }

        let mut entries = self.entries.write();
        let addresses = entries
            .entry(item.contract_hash)
            .or_default()
            .entry(item.asset_code)
            .or_default();
        match addresses.entry(item.address_hash) {
            Entry::Occupied(occupied) => {
                let mut guard = occupied.get().lock();
                guard.holding = holding;
                guard.modified = true;
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Arc::new(Mutex::new(CacheEntry {
                    holding,
                    modified: true,
                })));
            }
        }
        item
    }

    /// Copy of the holding, loaded from the store on a cache miss
    pub fn fetch(
        &self,
        contract: &Address,
        asset_code: &Hash20,
        address: &Address,
    ) -> Result<Holding, HoldingsError> {
        let item = CacheItem::new(contract.hash(), *asset_code, address.hash());
        let entry = match self.lookup(&item) {
            Some(entry) => entry,
            None => self.load(&item)?.ok_or(HoldingsError::NotFound)?,
        };
        let holding = entry.lock().holding.clone();
        Ok(holding)
    }

    /// Like `fetch`, but an unknown holding is a new empty one created at `now`
    pub fn get_holding(
        &self,
        contract: &Address,
        asset_code: &Hash20,
        address: &Address,
        now: ProtocolTimestamp,
    ) -> Result<Holding, HoldingsError> {
        match self.fetch(contract, asset_code, address) {
            Ok(holding) => Ok(holding),
            Err(HoldingsError::NotFound) => Ok(Holding::new(*address, now)),
            Err(err) => Err(err),
        }
    }

    /// Runs `f` on a copy of the holding while holding its entry lock.
    /// The copy replaces the cached holding only if `f` succeeds.
    pub fn apply<T, F>(
        &self,
        contract: &Address,
        asset_code: &Hash20,
        address: &Address,
        now: ProtocolTimestamp,
        f: F,
    ) -> Result<(T, CacheItem), HoldingsError>
    where
        F: FnOnce(&mut Holding) -> Result<T, HoldingsError>,
    {
        let item = CacheItem::new(contract.hash(), *asset_code, address.hash());
        let entry = match self.lookup(&item) {
            Some(entry) => entry,
            None => match self.load(&item)? {
                Some(entry) => entry,
                None => {
                    let mut entries = self.entries.write();
                    let addresses = entries
                        .entry(item.contract_hash)
                        .or_default()
                        .entry(item.asset_code)
                        .or_default();
                    let existing = match addresses.entry(item.address_hash) {
                        Entry::Occupied(occupied) => occupied.get().clone(),
                        Entry::Vacant(vacant) => {
                            let mut holding = Holding::new(*address, now);
                            let output = f(&mut holding)?;
                            vacant.insert(Arc::new(Mutex::new(CacheEntry {
                                holding,
                                modified: true,
                            })));
                            return Ok((output, item));
                        }
                    };
                    existing
                }
            },
        };

        let mut guard = entry.lock();
        let mut holding = guard.holding.clone();
        let output = f(&mut holding)?;
        guard.holding = holding;
        guard.modified = true;
        Ok((output, item))
    }

    /// Every holding of an asset, cached ones taking precedence over stored ones
    pub fn fetch_all(
        &self,
        contract: &Address,
        asset_code: &Hash20,
    ) -> Result<Vec<Holding>, HoldingsError> {
        let contract_hash = contract.hash();
        let cached = self.asset_entries(&contract_hash, asset_code);
        let cached_keys: HashSet<&str> = cached.iter().map(|(key, _)| key.as_str()).collect();

        let mut holdings = Vec::new();
        for key in self.store.list(&holdings_prefix(&contract_hash, asset_code))? {
            if cached_keys.contains(key.as_str()) {
                continue;
            }
            // listed keys can vanish only if something else writes the store
            if let Some(holding) = self.fetch_stored(&key)? {
                holdings.push(holding);
            }
        }
        holdings.extend(cached.iter().map(|(_, entry)| entry.lock().holding.clone()));
        Ok(holdings)
    }

    /// Storage keys of every holding of an asset, cached or stored
    pub fn list(&self, contract: &Address, asset_code: &Hash20) -> Result<Vec<String>, HoldingsError> {
        let contract_hash = contract.hash();
        let mut keys: Vec<String> = self
            .asset_entries(&contract_hash, asset_code)
            .into_iter()
            .map(|(key, _)| key)
            .collect();
        let cached: HashSet<String> = keys.iter().cloned().collect();
        keys.extend(
            self.store
                .list(&holdings_prefix(&contract_hash, asset_code))?
                .into_iter()
                .filter(|key| !cached.contains(key)),
        );
        keys.sort();
        Ok(keys)
    }

    /// Adds the voting power of every holder of `asset` to `ballots`
    pub fn append_ballots(
        &self,
        contract: &Address,
        asset: &Asset,
        ballots: &mut BTreeMap<Hash20, Ballot>,
        apply_multiplier: bool,
    ) -> Result<(), HoldingsError> {
        if !asset.voting_rights {
            return Ok(());
        }
        let holdings = self.fetch_all(contract, &asset.code)?;
        tokenized_holdings_exports::append_ballots(asset, &holdings, ballots, apply_multiplier)
    }

    /// Voting power of `address` summed over the holder assets of `contract`.
    /// Assets without metadata in `assets` and missing holdings count as zero.
    pub fn contract_voting_balance(
        &self,
        contract: &Contract,
        assets: &[Asset],
        address: &Address,
        apply_multiplier: bool,
    ) -> Result<u64, HoldingsError> {
        let mut balance: u64 = 0;
        for asset_code in contract.holder_asset_codes() {
            let Some(asset) = assets.iter().find(|asset| asset.code == *asset_code) else {
                continue;
            };
            let holding = match self.fetch(&contract.address, asset_code, address) {
                Ok(holding) => holding,
                Err(HoldingsError::NotFound) => continue,
                Err(err) => return Err(err),
            };
            balance = balance
                .checked_add(voting_balance(asset, &holding, apply_multiplier))
                .ok_or(HoldingsError::BalanceOverflow)?;
        }
        Ok(balance)
    }

    /// Writes every modified holding to the store
    pub fn write_cache(&self) -> Result<(), HoldingsError> {
        let all: Vec<(CacheItem, EntryRef)> = {
            let entries = self.entries.read();
            entries
                .iter()
                .flat_map(|(contract_hash, assets)| {
                    assets.iter().flat_map(move |(asset_code, addresses)| {
                        addresses.iter().map(move |(address_hash, entry)| {
                            (
                                CacheItem::new(*contract_hash, *asset_code, *address_hash),
                                entry.clone(),
                            )
                        })
                    })
                })
                .collect()
        };
        let mut written = 0usize;
        for (item, entry) in all {
            if self.write_entry(&item, &entry)? {
                written += 1;
            }
        }
        debug!("holdings cache: wrote {} modified holdings", written);
        Ok(())
    }

    /// Writes one holding if it is modified. Fails with `NotInCache` if the
    /// cache no longer has it.
    pub fn write_cache_update(&self, item: &CacheItem) -> Result<(), HoldingsError> {
        let entry = self.lookup(item).ok_or(HoldingsError::NotInCache)?;
        self.write_entry(item, &entry)?;
        Ok(())
    }

    fn write_entry(&self, item: &CacheItem, entry: &EntryRef) -> Result<bool, HoldingsError> {
        let mut guard = entry.lock();
        if !guard.modified {
            return Ok(false);
        }
        let bytes = encode_holding(&guard.holding)?;
        self.store.put(&item.storage_key(), &bytes)?;
        guard.modified = false;
        debug!("holdings cache: wrote {}", item.storage_key());
        Ok(true)
    }

    /// Drops every cached holding, written or not
    pub fn reset(&self) {
        self.entries.write().clear();
    }

    /// Number of cached holdings
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .values()
            .flat_map(|assets| assets.values())
            .map(|addresses| addresses.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tokenized_db_worker::MemoryStore;
    use tokenized_hash::Hash32;

    fn config() -> HoldingsConfig {
        HoldingsConfig {
            channel_size: 16,
            max_holding_statuses: 1000,
        }
    }

    fn address(seed: &[u8]) -> Address {
        Address::from_public_key(seed)
    }

    fn holding_with(owner: Address, balance: u64) -> Holding {
        let mut holding = Holding::new(owner, ProtocolTimestamp::from_secs(1));
        holding.pending_balance = balance;
        holding.finalized_balance = balance;
        holding
    }

    #[test]
    fn test_save_then_fetch_is_a_copy() {
        let store = Arc::new(MemoryStore::new());
        let cache = HoldingsCache::new(store.clone(), &config());
        let contract = address(b"contract");
        let asset_code = Hash20::compute_from(b"asset");
        let owner = address(b"owner");

        cache.save(&contract, &asset_code, holding_with(owner, 10));
        let mut copy = cache.fetch(&contract, &asset_code, &owner).unwrap();
        copy.pending_balance = 0;
        assert_eq!(
            cache
                .fetch(&contract, &asset_code, &owner)
                .unwrap()
                .pending_balance,
            10
        );
        // nothing is written before a flush
        assert!(store.is_empty());
    }

    #[test]
    fn test_fetch_missing_and_get_holding() {
        let cache = HoldingsCache::new(Arc::new(MemoryStore::new()), &config());
        let contract = address(b"contract");
        let asset_code = Hash20::compute_from(b"asset");
        let owner = address(b"owner");

        assert_matches!(
            cache.fetch(&contract, &asset_code, &owner),
            Err(HoldingsError::NotFound)
        );
        let now = ProtocolTimestamp::from_secs(42);
        let holding = cache.get_holding(&contract, &asset_code, &owner, now).unwrap();
        assert_eq!(holding, Holding::new(owner, now));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_write_cache_update_and_read_through() {
        let store = Arc::new(MemoryStore::new());
        let cache = HoldingsCache::new(store.clone(), &config());
        let contract = address(b"contract");
        let asset_code = Hash20::compute_from(b"asset");
        let owner = address(b"owner");

        let item = cache.save(&contract, &asset_code, holding_with(owner, 25));
        cache.write_cache_update(&item).unwrap();
        assert_eq!(store.len(), 1);

        cache.reset();
        assert!(cache.is_empty());
        assert_matches!(
            cache.write_cache_update(&item),
            Err(HoldingsError::NotInCache)
        );
        let holding = cache.fetch(&contract, &asset_code, &owner).unwrap();
        assert_eq!(holding.finalized_balance, 25);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_apply_keeps_holding_on_error() {
        let cache = HoldingsCache::new(Arc::new(MemoryStore::new()), &config());
        let contract = address(b"contract");
        let asset_code = Hash20::compute_from(b"asset");
        let owner = address(b"owner");
        let now = ProtocolTimestamp::from_secs(5);

        // nothing is cached when the first apply fails
        let res = cache.apply(&contract, &asset_code, &owner, now, |holding| {
            holding.add_debit(&Hash32::compute_from(b"tx0"), 1, true, now)
        });
        assert_matches!(res, Err(HoldingsError::InsufficientHoldings { .. }));
        assert!(cache.is_empty());

        let (settle_quantity, _) = cache
            .apply(&contract, &asset_code, &owner, now, |holding| {
                let txid = Hash32::compute_from(b"tx1");
                holding.add_deposit(&txid, 50, true, now)?;
                holding.check_deposit(&txid, 50)
            })
            .unwrap();
        assert_eq!(settle_quantity, 50);

        let res = cache.apply(&contract, &asset_code, &owner, now, |holding| {
            holding.add_deposit(&Hash32::compute_from(b"tx2"), 5, true, now)?;
            holding.add_debit(&Hash32::compute_from(b"tx3"), 500, true, now)
        });
        assert_matches!(res, Err(HoldingsError::InsufficientHoldings { .. }));
        let holding = cache.fetch(&contract, &asset_code, &owner).unwrap();
        assert_eq!(holding.pending_balance, 50);
        assert_eq!(holding.holding_statuses.len(), 1);
    }

    #[test]
    fn test_fetch_all_and_list_merge_cache_and_store() {
        let store = Arc::new(MemoryStore::new());
        let cache = HoldingsCache::new(store.clone(), &config());
        let contract = address(b"contract");
        let asset_code = Hash20::compute_from(b"asset");
        let stored = address(b"stored");
        let both = address(b"both");

        let item = cache.save(&contract, &asset_code, holding_with(stored, 1));
        cache.write_cache_update(&item).unwrap();
        let item = cache.save(&contract, &asset_code, holding_with(both, 2));
        cache.write_cache_update(&item).unwrap();
        cache.reset();
        cache.save(&contract, &asset_code, holding_with(both, 3));
        cache.save(&contract, &asset_code, holding_with(address(b"cached"), 4));

        let mut balances: Vec<u64> = cache
            .fetch_all(&contract, &asset_code)
            .unwrap()
            .iter()
            .map(|holding| holding.pending_balance)
            .collect();
        balances.sort();
        assert_eq!(balances, vec![1, 3, 4]);
        assert_eq!(cache.list(&contract, &asset_code).unwrap().len(), 3);
        assert!(cache
            .list(&contract, &Hash20::compute_from(b"other"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_write_cache_flushes_only_modified() {
        let store = Arc::new(MemoryStore::new());
        let cache = HoldingsCache::new(store.clone(), &config());
        let contract = address(b"contract");
        let asset_code = Hash20::compute_from(b"asset");

        for seed in [b"a", b"b", b"c"] {
            cache.save(&contract, &asset_code, holding_with(address(seed), 9));
        }
        cache.write_cache().unwrap();
        assert_eq!(store.len(), 3);
        cache.write_cache().unwrap();
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_contract_voting_balance() {
        let cache = HoldingsCache::new(Arc::new(MemoryStore::new()), &config());
        let owner = address(b"owner");
        let admin_code = Hash20::compute_from(b"admin");
        let share_code = Hash20::compute_from(b"share");
        let bond_code = Hash20::compute_from(b"bond");
        let contract = Contract {
            address: address(b"contract"),
            asset_codes: vec![admin_code, share_code, bond_code],
            admin_member_asset: Some(admin_code),
            voting_systems: Vec::new(),
        };
        let assets = vec![
            Asset {
                code: admin_code,
                voting_rights: true,
                vote_multiplier: 1,
                ..Default::default()
            },
            Asset {
                code: share_code,
                voting_rights: true,
                vote_multiplier: 3,
                ..Default::default()
            },
            Asset {
                code: bond_code,
                voting_rights: false,
                ..Default::default()
            },
        ];
        cache.save(&contract.address, &admin_code, holding_with(owner, 1));
        cache.save(&contract.address, &share_code, holding_with(owner, 10));
        cache.save(&contract.address, &bond_code, holding_with(owner, 100));

        assert_eq!(
            cache
                .contract_voting_balance(&contract, &assets, &owner, false)
                .unwrap(),
            10
        );
        assert_eq!(
            cache
                .contract_voting_balance(&contract, &assets, &owner, true)
                .unwrap(),
            30
        );
        assert_eq!(
            cache
                .contract_voting_balance(&contract, &assets, &address(b"nobody"), true)
                .unwrap(),
            0
        );
    }
}
