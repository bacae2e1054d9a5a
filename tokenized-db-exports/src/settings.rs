use std::path::PathBuf;

/// Config structure for a `RocksStore`
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// The path to the database, used in the wrapped RocksDB instance
    pub path: PathBuf,
    /// RocksDB open files limit
    pub max_open_files: i32,
}
