//! Key/value cache store for repository listings.
//!
//! Each repository gets its own directory; entries are plain files named by
//! a sanitized key (e.g. `providers.json`). Writes go through a temp file so
//! readers never observe a half-written entry.

#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)]

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use wpsvn_core::{Error, Result};

/// Cache statistics.
#[derive(Debug, Default, Clone)]
pub struct CacheStats {
    /// Reads that found an entry.
    pub hits: u64,
    /// Reads that found nothing.
    pub misses: u64,
    /// Entries written.
    pub writes: u64,
}

/// Outcome of a garbage collection pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GcReport {
    /// Entries removed because they outlived the TTL.
    pub expired: usize,
    /// Entries removed to get under the size limit.
    pub evicted: usize,
}

/// File-backed key/value store.
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
    stats: Arc<RwLock<CacheStats>>,
}

impl CacheStore {
    /// Open (and create) a store rooted at `root`.
    ///
    /// # Errors
    /// Returns error if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| Error::io(&root, e))?;
        Ok(Self {
            root,
            stats: Arc::new(RwLock::new(CacheStats::default())),
        })
    }

    /// Directory holding the entries.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read an entry. Missing or unreadable entries are `None`.
    #[must_use]
    pub fn read(&self, key: &str) -> Option<String> {
        let path = self.entry_path(key);
        match std::fs::read_to_string(&path) {
            Ok(contents) => {
                self.stats.write().hits += 1;
                debug!(key = %key, bytes = contents.len(), "cache hit");
                Some(contents)
            }
            Err(e) => {
                self.stats.write().misses += 1;
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %path.display(), error = %e, "unreadable cache entry");
                }
                None
            }
        }
    }

    /// Write an entry, replacing any previous contents.
    ///
    /// # Errors
    /// Returns error if the entry cannot be written.
    pub fn write(&self, key: &str, contents: &str) -> Result<()> {
        let path = self.entry_path(key);
        let mut tmp =
            tempfile::NamedTempFile::new_in(&self.root).map_err(|e| Error::io(&self.root, e))?;
        tmp.write_all(contents.as_bytes())
            .map_err(|e| Error::io(tmp.path(), e))?;
        tmp.persist(&path).map_err(|e| Error::io(&path, e.error))?;

        self.stats.write().writes += 1;
        debug!(key = %key, bytes = contents.len(), "cache write");
        Ok(())
    }

    /// Counters since the store was opened.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.stats.read().clone()
    }

    /// Drop entries older than `ttl`, then the oldest entries until the
    /// store is no larger than `max_size` bytes.
    ///
    /// # Errors
    /// Returns error if the directory cannot be scanned or an entry cannot
    /// be removed.
    pub fn gc(&self, ttl: Duration, max_size: u64) -> Result<GcReport> {
        let cutoff = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| Utc::now().checked_sub_signed(ttl));
        let mut report = GcReport::default();
        let mut live: Vec<(PathBuf, DateTime<Utc>, u64)> = Vec::new();

        let dir = std::fs::read_dir(&self.root).map_err(|e| Error::io(&self.root, e))?;
        for entry in dir.flatten() {
            let Ok(meta) = entry.metadata() else {
                continue;
            };
            if !meta.is_file() {
                continue;
            }
            let modified: DateTime<Utc> = meta
                .modified()
                .map(DateTime::from)
                .unwrap_or_else(|_| Utc::now());
            let path = entry.path();
            if cutoff.is_some_and(|cutoff| modified <= cutoff) {
                std::fs::remove_file(&path).map_err(|e| Error::io(&path, e))?;
                report.expired += 1;
            } else {
                live.push((path, modified, meta.len()));
            }
        }

        let mut total: u64 = live.iter().map(|(_, _, size)| size).sum();
        if total > max_size {
            live.sort_by_key(|(_, modified, _)| *modified);
            for (path, _, size) in live {
                if total <= max_size {
                    break;
                }
                std::fs::remove_file(&path).map_err(|e| Error::io(&path, e))?;
                total = total.saturating_sub(size);
                report.evicted += 1;
            }
        }

        if report.expired + report.evicted > 0 {
            info!(
                root = %self.root.display(),
                expired = report.expired,
                evicted = report.evicted,
                "cache garbage collected"
            );
        }
        Ok(report)
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.root.join(sanitize_key(key))
    }
}

/// Map a key to a safe file name: anything outside `[a-z0-9._]`
/// (case-insensitive) becomes `-`.
#[must_use]
pub fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_write_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::open(dir.path().join("repo")).unwrap();

        assert!(store.read("providers.json").is_none());
        store.write("providers.json", r#"{"foo":"https://x.test/foo"}"#).unwrap();
        assert_eq!(
            store.read("providers.json").as_deref(),
            Some(r#"{"foo":"https://x.test/foo"}"#)
        );

        let stats = store.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.writes, 1);
    }

    #[test]
    fn keys_are_sanitized() {
        assert_eq!(sanitize_key("providers.json"), "providers.json");
        assert_eq!(sanitize_key("../etc/passwd"), "..-etc-passwd");

        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::open(dir.path()).unwrap();
        store.write("a/b", "x").unwrap();
        assert!(dir.path().join("a-b").exists());
    }

    #[test]
    fn gc_evicts_to_size() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::open(dir.path()).unwrap();
        store.write("one", "0123456789").unwrap();
        store.write("two", "0123456789").unwrap();

        let report = store.gc(Duration::from_secs(3600), 10).unwrap();
        assert_eq!(report.expired, 0);
        assert_eq!(report.evicted, 1);
    }

    #[test]
    fn gc_zero_ttl_expires_everything() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::open(dir.path()).unwrap();
        store.write("providers.json", "{}").unwrap();

        let report = store.gc(Duration::ZERO, u64::MAX).unwrap();
        assert_eq!(report.expired, 1);
        assert!(store.read("providers.json").is_none());
    }
}
