//! Cache configuration with precedence handling
//!
//! Effective configuration is built from, lowest to highest precedence:
//! built-in defaults, the JSON config file
//! (`$XDG_CONFIG_HOME/assetcache/config.json`, `cache` object), `ASSETCACHE_*`
//! environment variables and finally command line arguments.

use crate::errors::{CacheError, RecoveryHint, Result, SerializationOp};
use assetcache_core::{
    ASSETCACHE_CACHE_DIR_VAR, ASSETCACHE_CACHE_ENABLED_VAR, ASSETCACHE_FETCH_TIMEOUT_SECS_VAR,
    ASSETCACHE_RETENTION_SECS_VAR, ASSETCACHE_STORE_VAR, DEFAULT_FETCH_TIMEOUT,
    DEFAULT_READY_WINDOW, DEFAULT_RETENTION, DEFAULT_USER_AGENT,
};
use assetcache_utils::XdgPaths;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Which store backs the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Disk,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disk" => Ok(StoreBackend::Disk),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(CacheError::Configuration {
                message: format!("Unknown store backend '{other}' (expected disk or memory)"),
                recovery_hint: RecoveryHint::UpdateConfiguration,
            }),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Disk => f.write_str("disk"),
            StoreBackend::Memory => f.write_str("memory"),
        }
    }
}

/// Source of configuration for debugging and precedence tracking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    Default,
    ConfigFile(PathBuf),
    EnvironmentVariable(String),
    CommandLine,
}

/// Effective cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// When false the cache never stores anything and every fetch hits the network
    pub enabled: bool,
    /// Root of the disk store
    pub base_dir: PathBuf,
    /// Age at which an entry stops being served
    pub retention: Duration,
    pub store: StoreBackend,
    /// Default timeout for real fetches
    pub fetch_timeout: Duration,
    pub user_agent: String,
    /// How long a "cache ready" mark in the warm state stays valid
    pub ready_window: Duration,
    pub state_file: PathBuf,
    /// Highest-precedence source that contributed a value
    pub source: ConfigSource,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_dir: XdgPaths::cache_dir(),
            retention: DEFAULT_RETENTION,
            store: StoreBackend::Disk,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            ready_window: DEFAULT_READY_WINDOW,
            state_file: XdgPaths::state_file(),
            source: ConfigSource::Default,
        }
    }
}

impl CacheConfig {
    pub fn retention_millis(&self) -> u64 {
        self.retention.as_millis() as u64
    }
}

/// Partial configuration as read from one source; `None` leaves the lower
/// precedence value in place
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheConfigOverrides {
    pub enabled: Option<bool>,
    pub base_dir: Option<PathBuf>,
    pub retention_secs: Option<u64>,
    pub store: Option<StoreBackend>,
    pub fetch_timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
    pub ready_window_secs: Option<u64>,
    pub state_file: Option<PathBuf>,
}

impl CacheConfigOverrides {
    fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    fn validate(&self) -> Result<()> {
        if self.retention_secs == Some(0) {
            return Err(CacheError::Configuration {
                message: "Retention window must be greater than zero".to_string(),
                recovery_hint: RecoveryHint::UpdateConfiguration,
            });
        }
        if self.fetch_timeout_secs == Some(0) {
            return Err(CacheError::Configuration {
                message: "Fetch timeout must be greater than zero".to_string(),
                recovery_hint: RecoveryHint::UpdateConfiguration,
            });
        }
        Ok(())
    }

    fn apply(self, config: &mut CacheConfig) {
        if let Some(enabled) = self.enabled {
            config.enabled = enabled;
        }
        if let Some(base_dir) = self.base_dir {
            config.base_dir = base_dir;
        }
        if let Some(secs) = self.retention_secs {
            config.retention = Duration::from_secs(secs);
        }
        if let Some(store) = self.store {
            config.store = store;
        }
        if let Some(secs) = self.fetch_timeout_secs {
            config.fetch_timeout = Duration::from_secs(secs);
        }
        if let Some(user_agent) = self.user_agent {
            config.user_agent = user_agent;
        }
        if let Some(secs) = self.ready_window_secs {
            config.ready_window = Duration::from_secs(secs);
        }
        if let Some(state_file) = self.state_file {
            config.state_file = state_file;
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    cache: Option<CacheConfigOverrides>,
}

/// Configuration loader that handles precedence
pub struct CacheConfigLoader;

impl CacheConfigLoader {
    /// Defaults, then the config file, then environment variables
    pub fn load() -> Result<CacheConfig> {
        Self::load_from(&XdgPaths::config_file())
    }

    /// Same as [`CacheConfigLoader::load`] with an explicit config file path
    pub fn load_from(config_path: &Path) -> Result<CacheConfig> {
        let mut config = CacheConfig::default();

        if let Some(file_overrides) = Self::load_from_config_file(config_path)? {
            file_overrides.apply(&mut config);
            config.source = ConfigSource::ConfigFile(config_path.to_path_buf());
        }

        if let Some(env_overrides) = Self::load_from_env()? {
            env_overrides.apply(&mut config);
            config.source = ConfigSource::EnvironmentVariable("ASSETCACHE_*".to_string());
        }

        Ok(config)
    }

    /// Apply command line arguments (highest precedence)
    pub fn apply_cli_args(
        mut config: CacheConfig,
        overrides: CacheConfigOverrides,
    ) -> Result<CacheConfig> {
        overrides.validate()?;
        if !overrides.is_empty() {
            overrides.apply(&mut config);
            config.source = ConfigSource::CommandLine;
        }
        Ok(config)
    }

    fn load_from_config_file(config_path: &Path) -> Result<Option<CacheConfigOverrides>> {
        if !config_path.exists() {
            return Ok(None);
        }

        let content = match std::fs::read_to_string(config_path) {
            Ok(c) => c,
            Err(e) => {
                return Err(CacheError::Io {
                    path: config_path.to_path_buf(),
                    operation: "read config file",
                    source: e,
                    recovery_hint: RecoveryHint::CheckPermissions {
                        path: config_path.to_path_buf(),
                    },
                });
            }
        };

        let file: ConfigFile = match serde_json::from_str(&content) {
            Ok(f) => f,
            Err(e) => {
                return Err(CacheError::Serialization {
                    key: config_path.display().to_string(),
                    operation: SerializationOp::Decode,
                    source: Box::new(e),
                    recovery_hint: RecoveryHint::Manual {
                        instructions: "Check config file syntax".to_string(),
                    },
                });
            }
        };

        match file.cache {
            Some(overrides) => {
                overrides.validate()?;
                Ok(Some(overrides))
            }
            None => Ok(None),
        }
    }

    fn load_from_env() -> Result<Option<CacheConfigOverrides>> {
        let mut overrides = CacheConfigOverrides::default();

        if let Ok(enabled) = std::env::var(ASSETCACHE_CACHE_ENABLED_VAR) {
            overrides.enabled = Some(matches!(
                enabled.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            ));
        }

        if let Ok(dir) = std::env::var(ASSETCACHE_CACHE_DIR_VAR) {
            if !dir.is_empty() {
                overrides.base_dir = Some(PathBuf::from(dir));
            }
        }

        if let Ok(secs) = std::env::var(ASSETCACHE_RETENTION_SECS_VAR) {
            overrides.retention_secs = Some(Self::parse_secs(ASSETCACHE_RETENTION_SECS_VAR, &secs)?);
        }

        if let Ok(store) = std::env::var(ASSETCACHE_STORE_VAR) {
            overrides.store = Some(store.parse()?);
        }

        if let Ok(secs) = std::env::var(ASSETCACHE_FETCH_TIMEOUT_SECS_VAR) {
            overrides.fetch_timeout_secs =
                Some(Self::parse_secs(ASSETCACHE_FETCH_TIMEOUT_SECS_VAR, &secs)?);
        }

        overrides.validate()?;
        if overrides.is_empty() {
            Ok(None)
        } else {
            Ok(Some(overrides))
        }
    }

    fn parse_secs(variable: &str, value: &str) -> Result<u64> {
        match value.trim().parse::<u64>() {
            Ok(secs) => Ok(secs),
            Err(_) => Err(CacheError::Configuration {
                message: format!("{variable} must be a whole number of seconds, got '{value}'"),
                recovery_hint: RecoveryHint::UpdateConfiguration,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    const ALL_VARS: [&str; 5] = [
        ASSETCACHE_CACHE_ENABLED_VAR,
        ASSETCACHE_CACHE_DIR_VAR,
        ASSETCACHE_RETENTION_SECS_VAR,
        ASSETCACHE_STORE_VAR,
        ASSETCACHE_FETCH_TIMEOUT_SECS_VAR,
    ];

    fn clear_env() {
        for var in ALL_VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults_without_file_or_env() {
        clear_env();
        let temp_dir = TempDir::new().unwrap();
        let config = CacheConfigLoader::load_from(&temp_dir.path().join("config.json")).unwrap();

        assert!(config.enabled);
        assert_eq!(config.retention, Duration::from_secs(7 * 24 * 60 * 60));
        assert_eq!(config.store, StoreBackend::Disk);
        assert_eq!(config.source, ConfigSource::Default);
    }

    #[test]
    #[serial]
    fn test_file_then_env_precedence() {
        clear_env();
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        std::fs::write(
            &config_path,
            r#"{"cache": {"retention_secs": 86400, "store": "memory", "base_dir": "/srv/assets"}}"#,
        )
        .unwrap();

        let from_file = CacheConfigLoader::load_from(&config_path).unwrap();
        assert_eq!(from_file.retention, Duration::from_secs(86400));
        assert_eq!(from_file.store, StoreBackend::Memory);
        assert_eq!(from_file.base_dir, PathBuf::from("/srv/assets"));
        assert_eq!(from_file.source, ConfigSource::ConfigFile(config_path.clone()));

        std::env::set_var(ASSETCACHE_RETENTION_SECS_VAR, "60");
        std::env::set_var(ASSETCACHE_CACHE_ENABLED_VAR, "false");
        let with_env = CacheConfigLoader::load_from(&config_path).unwrap();
        clear_env();

        assert_eq!(with_env.retention, Duration::from_secs(60));
        assert!(!with_env.enabled);
        // Untouched by the environment
        assert_eq!(with_env.store, StoreBackend::Memory);
        assert!(matches!(with_env.source, ConfigSource::EnvironmentVariable(_)));
    }

    #[test]
    #[serial]
    fn test_invalid_env_values_are_rejected() {
        clear_env();
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        std::env::set_var(ASSETCACHE_RETENTION_SECS_VAR, "a week");
        let err = CacheConfigLoader::load_from(&config_path).unwrap_err();
        assert!(matches!(err, CacheError::Configuration { .. }));

        std::env::set_var(ASSETCACHE_RETENTION_SECS_VAR, "0");
        assert!(CacheConfigLoader::load_from(&config_path).is_err());

        std::env::remove_var(ASSETCACHE_RETENTION_SECS_VAR);
        std::env::set_var(ASSETCACHE_STORE_VAR, "redis");
        assert!(CacheConfigLoader::load_from(&config_path).is_err());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_malformed_config_file() {
        clear_env();
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        std::fs::write(&config_path, "{ not json").unwrap();

        let err = CacheConfigLoader::load_from(&config_path).unwrap_err();
        assert!(matches!(err, CacheError::Serialization { .. }));
    }

    #[test]
    fn test_cli_args_win() {
        let config = CacheConfigLoader::apply_cli_args(
            CacheConfig::default(),
            CacheConfigOverrides {
                retention_secs: Some(5),
                store: Some(StoreBackend::Memory),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(config.retention_millis(), 5_000);
        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.source, ConfigSource::CommandLine);

        let untouched =
            CacheConfigLoader::apply_cli_args(CacheConfig::default(), Default::default()).unwrap();
        assert_eq!(untouched.source, ConfigSource::Default);
    }
}
