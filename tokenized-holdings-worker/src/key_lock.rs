use parking_lot::{ArcMutexGuard, Mutex, RawMutex};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

/// Guard of one key, the key is unlocked when it is dropped
pub type KeyLockGuard = ArcMutexGuard<RawMutex, ()>;

/// One mutex per key, created on first use
#[derive(Debug)]
pub struct KeyLock<K> {
    locks: Mutex<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K: Eq + Hash + Clone> Default for KeyLock<K> {
    fn default() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone> KeyLock<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks until `key` is free
    pub fn lock(&self, key: &K) -> KeyLockGuard {
        let key_mutex = self
            .locks
            .lock()
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        key_mutex.lock_arc()
    }

    /// Drops the mutexes nobody holds or waits on
    pub fn prune(&self) {
        self.locks
            .lock()
            .retain(|_, key_mutex| Arc::strong_count(key_mutex) > 1);
    }

    /// Number of keys currently tracked
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.lock().is_empty()
    }
}
