/// Constants used throughout the assetcache codebase
use std::time::Duration;

// Application name, used for XDG sub-directories
pub const APP_NAME: &str = "assetcache";

// Environment variable names
pub const ASSETCACHE_CACHE_ENABLED_VAR: &str = "ASSETCACHE_CACHE_ENABLED";
pub const ASSETCACHE_CACHE_DIR_VAR: &str = "ASSETCACHE_CACHE_DIR";
pub const ASSETCACHE_RETENTION_SECS_VAR: &str = "ASSETCACHE_RETENTION_SECS";
pub const ASSETCACHE_STORE_VAR: &str = "ASSETCACHE_STORE";
pub const ASSETCACHE_FETCH_TIMEOUT_SECS_VAR: &str = "ASSETCACHE_FETCH_TIMEOUT_SECS";

// File names
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const STATE_FILE_NAME: &str = "state.json";

/// Entries older than this are treated as absent
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// How long a "cache ready" mark in the warm state stays valid
pub const DEFAULT_READY_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(300);

pub const DEFAULT_USER_AGENT: &str = concat!("assetcache/", env!("CARGO_PKG_VERSION"));
