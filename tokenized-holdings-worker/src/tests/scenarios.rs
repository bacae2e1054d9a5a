//! # Holdings worker scenarios
//!
//! Function: [`test_cache_wins_before_flush`]
//! A holding saved in the cache shadows the stored one until the writer
//! flushes it.
//!
//! Function: [`test_concurrent_debits_with_key_lock`] and
//! [`test_concurrent_debits_with_apply`]
//! Threads debiting the same holding never lose an update when they
//! serialize per key.
//!
//! Function: [`test_concurrent_debits_without_lock`]
//! Without serialization updates can be lost, never invented.

use super::tools::{txid, TestUniverse};
use crate::{start_holdings_writer, KeyLock};
use more_asserts::assert_ge;
use serial_test::serial;
use std::sync::Arc;
use std::thread;
use tokenized_db_exports::KvStore;
use tokenized_holdings_exports::{decode_holding, CacheItem, HoldingDeserializer};
use tokenized_models::address::Address;
use tokenized_time::ProtocolTimestamp;

const THREADS: usize = 8;
const DEBITS_PER_THREAD: usize = 25;
const INITIAL_BALANCE: u64 = 10_000;
const DEBIT: u64 = 3;

#[test]
#[serial]
fn test_cache_wins_before_flush() {
    let universe = TestUniverse::new();
    let owner = Address::from_public_key(b"owner");
    let mut writer = start_holdings_writer(universe.cache.clone(), universe.channel.clone());
    universe.seed(owner, 100);
    writer.stop().unwrap();

    // a newer holding sits in the cache, not yet flushed
    let mut holding = universe
        .cache
        .fetch(&universe.contract, &universe.asset_code, &owner)
        .unwrap();
    let now = ProtocolTimestamp::from_secs(2);
    holding.add_debit(&txid(0, 0), 40, true, now).unwrap();
    let item = universe
        .cache
        .save(&universe.contract, &universe.asset_code, holding);

    let stored = decode_holding(
        &HoldingDeserializer::new(10_000),
        &universe.store.fetch(&item.storage_key()).unwrap(),
    )
    .unwrap();
    assert_eq!(stored.pending_balance, 100);
    let cached = universe
        .cache
        .fetch(&universe.contract, &universe.asset_code, &owner)
        .unwrap();
    assert_eq!(cached.pending_balance, 60);
    let listed = universe
        .cache
        .fetch_all(&universe.contract, &universe.asset_code)
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].pending_balance, 60);

    universe.cache.write_cache().unwrap();
    let stored = decode_holding(
        &HoldingDeserializer::new(10_000),
        &universe.store.fetch(&item.storage_key()).unwrap(),
    )
    .unwrap();
    assert_eq!(stored.pending_balance, 60);
}

#[test]
#[serial]
fn test_concurrent_debits_with_key_lock() {
    let universe = Arc::new(TestUniverse::new());
    let owner = Address::from_public_key(b"owner");
    let mut writer = start_holdings_writer(universe.cache.clone(), universe.channel.clone());
    universe.seed(owner, INITIAL_BALANCE);
    let key_lock = Arc::new(KeyLock::<CacheItem>::new());
    let key = CacheItem::new(
        universe.contract.hash(),
        universe.asset_code,
        owner.hash(),
    );

    let handles: Vec<_> = (0..THREADS)
        .map(|thread_index| {
            let universe = universe.clone();
            let key_lock = key_lock.clone();
            thread::spawn(move || {
                let now = ProtocolTimestamp::from_secs(2);
                for index in 0..DEBITS_PER_THREAD {
                    let _guard = key_lock.lock(&key);
                    let mut holding = universe
                        .cache
                        .fetch(&universe.contract, &universe.asset_code, &owner)
                        .unwrap();
                    holding
                        .add_debit(&txid(thread_index, index), DEBIT, true, now)
                        .unwrap();
                    let item =
                        universe
                            .cache
                            .save(&universe.contract, &universe.asset_code, holding);
                    universe.channel.add(item).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    writer.stop().unwrap();

    let expected = INITIAL_BALANCE - (THREADS * DEBITS_PER_THREAD) as u64 * DEBIT;
    let holding = universe
        .cache
        .fetch(&universe.contract, &universe.asset_code, &owner)
        .unwrap();
    assert_eq!(holding.pending_balance, expected);
    assert_eq!(holding.holding_statuses.len(), THREADS * DEBITS_PER_THREAD);

    // the writer flushed the last state
    universe.cache.reset();
    let holding = universe
        .cache
        .fetch(&universe.contract, &universe.asset_code, &owner)
        .unwrap();
    assert_eq!(holding.pending_balance, expected);
}

#[test]
#[serial]
fn test_concurrent_debits_with_apply() {
    let universe = Arc::new(TestUniverse::new());
    let owner = Address::from_public_key(b"owner");
    universe.seed(owner, INITIAL_BALANCE);
    universe.channel.close().unwrap();

    let handles: Vec<_> = (0..THREADS)
        .map(|thread_index| {
            let universe = universe.clone();
            thread::spawn(move || {
                let now = ProtocolTimestamp::from_secs(2);
                for index in 0..DEBITS_PER_THREAD {
                    universe
                        .cache
                        .apply(
                            &universe.contract,
                            &universe.asset_code,
                            &owner,
                            now,
                            |holding| {
                                holding.add_debit(&txid(thread_index, index), DEBIT, true, now)
                            },
                        )
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let holding = universe
        .cache
        .fetch(&universe.contract, &universe.asset_code, &owner)
        .unwrap();
    assert_eq!(
        holding.pending_balance,
        INITIAL_BALANCE - (THREADS * DEBITS_PER_THREAD) as u64 * DEBIT
    );
    assert_eq!(holding.finalized_balance, INITIAL_BALANCE);
}

#[test]
#[serial]
fn test_concurrent_debits_without_lock() {
    let universe = Arc::new(TestUniverse::new());
    let owner = Address::from_public_key(b"owner");
    universe.seed(owner, INITIAL_BALANCE);
    universe.channel.close().unwrap();

    let handles: Vec<_> = (0..THREADS)
        .map(|thread_index| {
            let universe = universe.clone();
            thread::spawn(move || {
                let now = ProtocolTimestamp::from_secs(2);
                for index in 0..DEBITS_PER_THREAD {
                    let mut holding = universe
                        .cache
                        .fetch(&universe.contract, &universe.asset_code, &owner)
                        .unwrap();
                    holding
                        .add_debit(&txid(thread_index, index), DEBIT, true, now)
                        .unwrap();
                    universe
                        .cache
                        .save(&universe.contract, &universe.asset_code, holding);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let holding = universe
        .cache
        .fetch(&universe.contract, &universe.asset_code, &owner)
        .unwrap();
    assert_ge!(
        holding.pending_balance,
        INITIAL_BALANCE - (THREADS * DEBITS_PER_THREAD) as u64 * DEBIT
    );
    assert_eq!(
        INITIAL_BALANCE - holding.pending_balance,
        holding.holding_statuses.len() as u64 * DEBIT
    );
}
