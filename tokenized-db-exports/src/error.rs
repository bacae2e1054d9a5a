use displaydoc::Display;
use thiserror::Error;

#[non_exhaustive]
#[derive(Display, Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// key not found: {0}
    NotFound(String),
    /// rocksdb error: {0}
    RocksDBError(String),
    /// stored key is not valid utf-8: {0}
    InvalidKey(String),
}
