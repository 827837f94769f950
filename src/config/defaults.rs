//! Default configuration values

use std::path::PathBuf;

/// Maximum number of fetch retry attempts
pub const MAX_FETCH_RETRIES: u32 = 3;

/// Base delay for fetch retry backoff (in milliseconds)
pub const RETRY_BASE_DELAY_MS: u64 = 1000;

/// Default number of parallel fetches
pub const DEFAULT_PARALLEL_FETCHES: usize = 4;

/// Default descriptor pool directory (relative to the working directory)
pub const DEFAULT_POOL_DIR: &str = "descriptors";

/// Default number of concurrent builds
pub fn default_jobs() -> usize {
    num_cpus::get()
}

/// Default install prefix (`~/.cellar/pkg`)
pub fn default_prefix() -> PathBuf {
    cellar_home().join("pkg")
}

/// Default download cache directory (`~/.cellar/cache`)
pub fn default_cache_dir() -> PathBuf {
    cellar_home().join("cache")
}

fn cellar_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".cellar")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_jobs_is_positive() {
        assert!(default_jobs() >= 1);
    }

    #[test]
    fn test_default_dirs_share_cellar_home() {
        let prefix = default_prefix();
        let cache = default_cache_dir();
        assert_eq!(prefix.parent(), cache.parent());
        assert!(prefix.ends_with("pkg"));
        assert!(cache.ends_with("cache"));
    }
}
