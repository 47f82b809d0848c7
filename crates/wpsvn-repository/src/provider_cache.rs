//! Persisted provider maps.
//!
//! The provider map (bare name to provider URL) is stored as one JSON entry
//! in the repository's cache directory. Writes are suppressed when the
//! content hash matches what was read, so the entry's age keeps measuring
//! how long the listing has been unchanged.

use crate::error::Result;
use crate::hooks::{CacheDecision, HookContext, RepositoryHooks};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;
use wpsvn_cache::CacheStore;
use wpsvn_core::ContentHash;

/// Bare provider name to provider URL (no trailing slash).
pub type ProviderMap = BTreeMap<String, String>;

/// Result of reading the cache entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CachedProviders {
    /// Decoded map, if the entry existed and was valid JSON.
    pub map: Option<ProviderMap>,
    /// Hash of the raw entry, if it existed.
    pub hash: Option<ContentHash>,
}

/// Provider map cache of one repository.
#[derive(Debug, Clone)]
pub struct ProviderCache {
    store: CacheStore,
    key: String,
    ttl: Duration,
}

impl ProviderCache {
    /// Create a provider cache over `store`.
    #[must_use]
    pub fn new(store: CacheStore, key: impl Into<String>, ttl: Duration) -> Self {
        Self {
            store,
            key: key.into(),
            ttl,
        }
    }

    /// Underlying store.
    #[must_use]
    pub const fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Cache entry name.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Effective TTL; zero disables writes.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Read the cached map. Malformed entries decode to `None` so the
    /// listing is rebuilt, and nothing is read under a zero TTL.
    #[must_use]
    pub fn load(&self) -> CachedProviders {
        if self.ttl.is_zero() {
            return CachedProviders::default();
        }
        let Some(raw) = self.store.read(&self.key) else {
            return CachedProviders::default();
        };
        let hash = Some(ContentHash::from_str_content(&raw));
        let map = match wpsvn_core::json::from_json::<ProviderMap>(&raw) {
            Ok(map) => Some(map),
            Err(e) => {
                debug!(key = %self.key, error = %e, "ignoring malformed provider cache");
                None
            }
        };
        CachedProviders { map, hash }
    }

    /// Read the cached map and let the hooks decide whether to use it.
    pub async fn load_validated(
        &self,
        hooks: &dyn RepositoryHooks,
        ctx: HookContext<'_>,
    ) -> (CacheDecision, Option<ContentHash>) {
        let cached = self.load();
        let decision = hooks.revalidate_cache(cached.map, &self.store, ctx).await;
        (decision, cached.hash)
    }

    /// Persist `map` unless the TTL is zero or the content is unchanged.
    /// Returns whether the entry was written.
    ///
    /// # Errors
    /// Returns error if the entry cannot be encoded or written.
    pub fn save(&self, map: &ProviderMap, previous: Option<ContentHash>) -> Result<bool> {
        if self.ttl.is_zero() {
            return Ok(false);
        }
        let contents = wpsvn_core::json::to_json(map)?;
        if previous == Some(ContentHash::from_str_content(&contents)) {
            debug!(key = %self.key, "provider cache unchanged");
            return Ok(false);
        }
        self.store.write(&self.key, &contents)?;
        debug!(key = %self.key, providers = map.len(), "provider cache saved");
        Ok(true)
    }
}
