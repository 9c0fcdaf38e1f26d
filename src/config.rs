//! Configuration Module
//!
//! Handles loading cache configuration from environment variables.

use std::env;
use std::path::PathBuf;

use crate::storage::resolve_directory;

/// Subdirectory of the platform cache directory used by default.
pub const DEFAULT_SUBDIR: &str = "tracked_cache";

/// Default capacity of the LRU store backing a new cache.
pub const DEFAULT_MAX_ENTRIES: usize = 1000;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the default store can hold
    pub max_entries: usize,
    /// Directory where persisted caches are written
    pub cache_dir: PathBuf,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_ENTRIES` - Maximum cache entries (default: 1000)
    /// - `CACHE_DIR` - Directory for `.cache` files (default: platform cache dir)
    pub fn from_env() -> Self {
        Self {
            max_entries: env::var("CACHE_MAX_ENTRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_ENTRIES),
            cache_dir: env::var_os("CACHE_DIR")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(default_cache_dir),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            cache_dir: default_cache_dir(),
        }
    }
}

fn default_cache_dir() -> PathBuf {
    resolve_directory().join(DEFAULT_SUBDIR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.max_entries, 1000);
        assert!(config.cache_dir.ends_with(DEFAULT_SUBDIR));
    }

    #[test]
    fn test_config_from_env_defaults() {
        env::remove_var("CACHE_MAX_ENTRIES");

        let config = Config::from_env();
        assert_eq!(config.max_entries, 1000);
    }
}
