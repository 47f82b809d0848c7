//! Process-wide settings shared by every repository.

use crate::error::Result;
use crate::types::{CacheTtl, RepositoryConfig};
use directories::ProjectDirs;
use std::path::PathBuf;
use std::time::Duration;

/// Default `cache-files-ttl`: six months.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(15_552_000);

/// Default `cache-files-maxsize`: 300 MiB.
pub const DEFAULT_CACHE_MAXSIZE: u64 = 300 * 1024 * 1024;

/// Default deadline for a single listing call.
pub const DEFAULT_LISTING_TIMEOUT: Duration = Duration::from_secs(300);

/// Global settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalSettings {
    /// Directory holding one cache directory per repository.
    pub cache_repo_dir: PathBuf,
    /// Lifetime of cache entries.
    pub cache_files_ttl: Duration,
    /// Upper bound on a repository cache's size.
    pub cache_files_maxsize: u64,
    /// Deadline for each `svn` invocation.
    pub listing_timeout: Duration,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            cache_repo_dir: default_cache_dir().join("repo"),
            cache_files_ttl: DEFAULT_CACHE_TTL,
            cache_files_maxsize: DEFAULT_CACHE_MAXSIZE,
            listing_timeout: DEFAULT_LISTING_TIMEOUT,
        }
    }
}

impl GlobalSettings {
    /// Defaults adjusted by `COMPOSER_CACHE_DIR`, `COMPOSER_CACHE_FILES_TTL`
    /// and `WPSVN_LISTING_TIMEOUT`.
    #[must_use]
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        if let Some(dir) = std::env::var_os("COMPOSER_CACHE_DIR").filter(|d| !d.is_empty()) {
            settings.cache_repo_dir = PathBuf::from(dir).join("repo");
        }
        if let Some(ttl) = std::env::var("COMPOSER_CACHE_FILES_TTL")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            settings.cache_files_ttl = Duration::from_secs(ttl);
        }
        if let Some(timeout) = std::env::var("WPSVN_LISTING_TIMEOUT")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            settings.listing_timeout = Duration::from_secs(timeout);
        }
        settings
    }

    /// Use a different cache root.
    #[must_use]
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_repo_dir = dir.into();
        self
    }

    /// Effective TTL for a repository.
    #[must_use]
    pub const fn resolve_ttl(&self, ttl: CacheTtl) -> Duration {
        ttl.resolve(self.cache_files_ttl)
    }

    /// Cache directory for one repository.
    ///
    /// # Errors
    /// Returns error if the repository has no valid URL.
    pub fn repository_cache_dir(&self, config: &RepositoryConfig) -> Result<PathBuf> {
        Ok(self.cache_repo_dir.join(config.cache_dir_name()?))
    }
}

fn default_cache_dir() -> PathBuf {
    ProjectDirs::from("", "", "composer").map_or_else(
        || std::env::temp_dir().join("composer"),
        |dirs| dirs.cache_dir().to_path_buf(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = GlobalSettings::default();
        assert_eq!(settings.cache_files_ttl, Duration::from_secs(15_552_000));
        assert_eq!(settings.cache_files_maxsize, 300 * 1024 * 1024);
        assert!(settings.cache_repo_dir.ends_with("repo"));
    }

    #[test]
    fn ttl_resolution() {
        let settings = GlobalSettings::default();
        assert_eq!(settings.resolve_ttl(CacheTtl::Inherit), DEFAULT_CACHE_TTL);
        assert_eq!(settings.resolve_ttl(CacheTtl::Seconds(0)), Duration::ZERO);
    }

    #[test]
    fn repository_dir_from_url() {
        let settings = GlobalSettings::default().with_cache_dir("/tmp/cache");
        let config = RepositoryConfig {
            urls: vec!["https://plugins.svn.wordpress.org/".into()],
            ..RepositoryConfig::default()
        };
        assert_eq!(
            settings.repository_cache_dir(&config).unwrap(),
            PathBuf::from("/tmp/cache/https---plugins.svn.wordpress.org")
        );
    }
}
