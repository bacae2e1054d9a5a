// Errors
pub const OPEN_ERROR: &str = "critical: rocksdb open operation failed";

// Defaults
pub const DEFAULT_MAX_OPEN_FILES: i32 = 820;
