use crate::StoreError;
use std::fmt::Debug;

/// Key-value storage of the ledger records.
///
/// Keys are `/`-separated paths. Every method takes `&self` so a single store
/// can be shared between the request path and the flush worker.
pub trait KvStore: Send + Sync + Debug {
    /// Inserts or replaces the value stored under `key`
    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Returns the value stored under `key`, `StoreError::NotFound` if there is none
    fn fetch(&self, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Returns every key starting with `prefix`, in ascending order
    fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError>;

    /// Returns the values of every key starting with `prefix`, in key order
    fn search(&self, prefix: &str) -> Result<Vec<Vec<u8>>, StoreError> {
        self.list(prefix)?
            .iter()
            .map(|key| self.fetch(key))
            .collect()
    }
}
