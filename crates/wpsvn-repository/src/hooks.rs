//! Per-repository extension points.
//!
//! Name and version filters are plain configuration ([`wpsvn_config::Hook`]).
//! The hooks here need I/O (metadata APIs, the cache store) and are
//! implemented in code: the WordPress.org presets provide them, custom
//! repositories use [`NoHooks`].

use crate::error::Result;
use crate::provider_cache::ProviderMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use wpsvn_cache::CacheStore;
use wpsvn_core::PackageRecord;

/// What a hook can see of the repository it serves.
#[derive(Debug, Clone, Copy)]
pub struct HookContext<'a> {
    /// Repository name.
    pub repository: &'a str,
    /// Vendor used when presenting provider names.
    pub default_vendor: &'a str,
    /// Base URLs, without trailing slashes.
    pub urls: &'a [String],
}

/// Where a package being filtered came from.
#[derive(Debug, Clone, Copy)]
pub struct PackageOrigin<'a> {
    /// Bare provider name.
    pub provider: &'a str,
    /// Provider URL, without trailing slash.
    pub provider_url: &'a str,
}

impl PackageOrigin<'_> {
    /// Path of the checkout relative to the provider, e.g. `tags/1.0` or
    /// `trunk`. Empty for the provider root.
    #[must_use]
    pub fn checkout_path(&self, record: &PackageRecord) -> String {
        let anchor = record
            .source
            .url
            .strip_prefix(self.provider_url)
            .unwrap_or_default()
            .trim_matches('/');
        let reference = record.source.reference.trim_matches('/');
        match (anchor.is_empty(), reference.is_empty()) {
            (true, _) => reference.to_string(),
            (false, true) => anchor.to_string(),
            (false, false) => format!("{anchor}/{reference}"),
        }
    }
}

/// One search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Vendor-qualified name.
    pub name: String,
    /// Short description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Homepage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl SearchResult {
    /// A hit with only a name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            url: None,
        }
    }
}

/// Answer of a search hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The hook handled the query.
    Results(Vec<SearchResult>),
    /// Fall back to matching provider names.
    Declined,
}

/// Answer of a cache revalidation hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheDecision {
    /// Use this provider map (possibly extended) as the complete set.
    Use(ProviderMap),
    /// Discard the cache and list the providers live.
    Relist,
}

/// Extension points of an SVN repository. Every method has a pass-through
/// default.
pub trait RepositoryHooks: Send + Sync + fmt::Debug {
    /// Enrich a synthesized package (dist, description, authors...).
    ///
    /// # Errors
    /// An error is logged by the caller and the package is still emitted.
    fn filter_package<'a>(
        &'a self,
        _package: &'a mut PackageRecord,
        _origin: PackageOrigin<'a>,
        _ctx: HookContext<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async { Ok(()) })
    }

    /// Handle a search query.
    fn search<'a>(
        &'a self,
        _query: &'a str,
        _ctx: HookContext<'a>,
    ) -> Pin<Box<dyn Future<Output = SearchOutcome> + Send + 'a>> {
        Box::pin(async { SearchOutcome::Declined })
    }

    /// Decide whether the cached provider map (if any) can be used.
    fn revalidate_cache<'a>(
        &'a self,
        cached: Option<ProviderMap>,
        _store: &'a CacheStore,
        _ctx: HookContext<'a>,
    ) -> Pin<Box<dyn Future<Output = CacheDecision> + Send + 'a>> {
        Box::pin(async move { cached.map_or(CacheDecision::Relist, CacheDecision::Use) })
    }
}

/// Hooks that change nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl RepositoryHooks for NoHooks {}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(url: &str, reference: &str) -> PackageRecord {
        let name = wpsvn_core::PackageName::new("acme", "foo");
        PackageRecord::new(&name, "1.0", "wordpress-plugin", url, reference)
    }

    #[test]
    fn checkout_path_joins_anchor_and_reference() {
        let origin = PackageOrigin {
            provider: "foo",
            provider_url: "https://x.test/plugins/foo",
        };
        assert_eq!(
            origin.checkout_path(&record("https://x.test/plugins/foo/", "tags/1.0")),
            "tags/1.0"
        );
        assert_eq!(
            origin.checkout_path(&record("https://x.test/plugins/foo/trunk/", "/")),
            "trunk"
        );
        assert_eq!(origin.checkout_path(&record("https://x.test/plugins/foo/", "")), "");
    }

    #[tokio::test]
    async fn defaults_pass_through() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::open(dir.path()).unwrap();
        let ctx = HookContext {
            repository: "test",
            default_vendor: "acme",
            urls: &[],
        };

        assert_eq!(NoHooks.search("foo", ctx).await, SearchOutcome::Declined);
        assert_eq!(
            NoHooks.revalidate_cache(None, &store, ctx).await,
            CacheDecision::Relist
        );
        let map = ProviderMap::from([("foo".to_string(), "https://x.test/foo".to_string())]);
        assert_eq!(
            NoHooks.revalidate_cache(Some(map.clone()), &store, ctx).await,
            CacheDecision::Use(map)
        );
    }
}
