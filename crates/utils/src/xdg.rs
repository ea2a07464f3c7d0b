use assetcache_core::{APP_NAME, CONFIG_FILE_NAME, STATE_FILE_NAME};
use std::env;
use std::path::PathBuf;

/// XDG Base Directory paths for assetcache
pub struct XdgPaths;

impl XdgPaths {
    /// Get XDG_CONFIG_HOME/assetcache or fallback
    pub fn config_dir() -> PathBuf {
        env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .map(|home| home.join(".config"))
                    .unwrap_or_else(|| PathBuf::from(".config"))
            })
            .join(APP_NAME)
    }

    /// Get XDG_STATE_HOME/assetcache or fallback
    pub fn state_dir() -> PathBuf {
        env::var("XDG_STATE_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .map(|home| home.join(".local/state"))
                    .unwrap_or_else(|| PathBuf::from(".local/state"))
            })
            .join(APP_NAME)
    }

    /// Get XDG_CACHE_HOME/assetcache or fallback
    pub fn cache_dir() -> PathBuf {
        env::var("XDG_CACHE_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .map(|home| home.join(".cache"))
                    .unwrap_or_else(|| PathBuf::from(".cache"))
            })
            .join(APP_NAME)
    }

    /// Path of the JSON configuration file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join(CONFIG_FILE_NAME)
    }

    /// Path of the persisted warm-state file
    pub fn state_file() -> PathBuf {
        Self::state_dir().join(STATE_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn restore(name: &str, value: Option<String>) {
        match value {
            Some(val) => env::set_var(name, val),
            None => env::remove_var(name),
        }
    }

    #[test]
    #[serial]
    fn test_xdg_paths_with_env() {
        let config_orig = env::var("XDG_CONFIG_HOME").ok();
        let state_orig = env::var("XDG_STATE_HOME").ok();
        let cache_orig = env::var("XDG_CACHE_HOME").ok();

        env::set_var("XDG_CONFIG_HOME", "/tmp/config");
        env::set_var("XDG_STATE_HOME", "/tmp/state");
        env::set_var("XDG_CACHE_HOME", "/tmp/cache");

        assert_eq!(XdgPaths::config_dir(), PathBuf::from("/tmp/config/assetcache"));
        assert_eq!(XdgPaths::state_dir(), PathBuf::from("/tmp/state/assetcache"));
        assert_eq!(XdgPaths::cache_dir(), PathBuf::from("/tmp/cache/assetcache"));
        assert_eq!(
            XdgPaths::config_file(),
            PathBuf::from("/tmp/config/assetcache/config.json")
        );
        assert_eq!(
            XdgPaths::state_file(),
            PathBuf::from("/tmp/state/assetcache/state.json")
        );

        restore("XDG_CONFIG_HOME", config_orig);
        restore("XDG_STATE_HOME", state_orig);
        restore("XDG_CACHE_HOME", cache_orig);
    }
}
