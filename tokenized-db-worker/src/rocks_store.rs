use rocksdb::{Direction, IteratorMode, Options, DB};
use tokenized_db_exports::{DbConfig, KvStore, StoreError};
use tracing::debug;

/// RocksDB backed store
pub struct RocksStore {
    db: DB,
    config: DbConfig,
}

impl std::fmt::Debug for RocksStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RocksStore")
            .field("config", &self.config)
            .finish()
    }
}

impl RocksStore {
    /// Opens the database at `config.path`, creating it if missing
    pub fn new(config: DbConfig) -> Result<Self, StoreError> {
        let db_opts = Self::default_db_opts(&config);
        let db = DB::open(&db_opts, &config.path)
            .map_err(|e| StoreError::RocksDBError(format!("{:?}", e)))?;
        debug!("opened store at {}", config.path.display());
        Ok(Self { db, config })
    }

    pub fn default_db_opts(config: &DbConfig) -> Options {
        let mut db_opts = Options::default();
        db_opts.set_max_open_files(config.max_open_files);
        db_opts.create_if_missing(true);
        db_opts
    }
}

impl KvStore for RocksStore {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.db
            .put(key.as_bytes(), value)
            .map_err(|e| StoreError::RocksDBError(format!("{:?}", e)))
    }

    fn fetch(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        self.db
            .get(key.as_bytes())
            .map_err(|e| StoreError::RocksDBError(format!("{:?}", e)))?
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::new();
        let iterator = self
            .db
            .iterator(IteratorMode::From(prefix.as_bytes(), Direction::Forward));
        for item in iterator {
            let (key, _) = item.map_err(|e| StoreError::RocksDBError(format!("{:?}", e)))?;
            if !key.starts_with(prefix.as_bytes()) {
                break;
            }
            let key = String::from_utf8(key.to_vec())
                .map_err(|e| StoreError::InvalidKey(e.to_string()))?;
            keys.push(key);
        }
        Ok(keys)
    }
}
