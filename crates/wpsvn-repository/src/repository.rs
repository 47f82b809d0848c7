//! SVN-backed virtual repository.
//!
//! Providers are discovered lazily on the first query, from the provider
//! cache or by listing every base URL and provider path. Versions of a
//! provider are listed on the first query for that provider and kept for
//! the life of the repository.

use crate::error::{RepositoryError, Result};
use crate::hooks::{
    CacheDecision, HookContext, NoHooks, RepositoryHooks, SearchOutcome, SearchResult,
};
use crate::provider_cache::{ProviderCache, ProviderMap};
use crate::synthesizer::{PackageSynthesizer, VersionEntry};
use dashmap::DashMap;
use futures::future::try_join_all;
use indexmap::IndexMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use wpsvn_cache::CacheStore;
use wpsvn_config::{GlobalSettings, PathSpec, RepositoryConfig, VendorMap, VendorOverrides};
use wpsvn_core::{PackageName, PackageRecord, StabilityPolicy, VersionNormalizer, parse_stability};
use wpsvn_vcs::{ListingClient, SvnClient};

/// Answer to "which packages satisfy this name".
#[derive(Debug, Clone, PartialEq)]
pub enum WhatProvides {
    /// The vendor is not served by this repository.
    ForeignVendor,
    /// The vendor is ours but no such provider exists.
    UnknownPackage,
    /// One record per surviving version.
    Packages(Vec<PackageRecord>),
}

impl WhatProvides {
    /// Records, empty for the negative answers.
    #[must_use]
    pub fn into_packages(self) -> Vec<PackageRecord> {
        match self {
            Self::Packages(packages) => packages,
            Self::ForeignVendor | Self::UnknownPackage => Vec::new(),
        }
    }
}

/// Provider loading state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryState {
    /// Nothing asked yet.
    Uninitialized,
    /// First provider load in flight.
    ProvidersLoading,
    /// Provider map available.
    ProvidersLoaded,
}

/// One place to look for versions of a provider.
struct Candidate {
    raw: String,
    source_url: String,
    reference: String,
}

/// Marks a provider load in flight; lowered on completion or cancellation.
struct LoadingFlag<'a>(&'a AtomicBool);

impl<'a> LoadingFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for LoadingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A virtual Composer repository over a Subversion tree.
#[derive(Debug)]
pub struct SvnRepository {
    config: RepositoryConfig,
    urls: Vec<String>,
    vendors: Arc<VendorMap>,
    client: Arc<dyn ListingClient>,
    cache: ProviderCache,
    hooks: Arc<dyn RepositoryHooks>,
    synthesizer: PackageSynthesizer,
    normalizer: VersionNormalizer,
    stability: StabilityPolicy,
    providers: OnceCell<ProviderMap>,
    loading: AtomicBool,
    packages: DashMap<String, Arc<Vec<PackageRecord>>>,
}

impl SvnRepository {
    /// Activate a repository.
    ///
    /// Validates the base URLs, resolves vendors, opens the cache directory
    /// and garbage-collects it.
    ///
    /// # Errors
    /// Returns error if no URL is valid, no vendor remains, or the cache
    /// directory cannot be created.
    pub fn new(
        config: RepositoryConfig,
        overrides: &VendorOverrides,
        settings: &GlobalSettings,
        client: Arc<dyn ListingClient>,
    ) -> Result<Self> {
        let urls = config.valid_urls()?;
        let vendors = Arc::new(VendorMap::resolve(
            &config.package_types,
            overrides,
            &config.name,
        )?);

        let ttl = settings.resolve_ttl(config.cache_ttl);
        let store = CacheStore::open(settings.repository_cache_dir(&config)?)?;
        // a zero TTL expires whatever an earlier run left behind
        match store.gc(ttl, settings.cache_files_maxsize) {
            Ok(report) => debug!(
                repository = %config.name,
                expired = report.expired,
                evicted = report.evicted,
                "cache collected"
            ),
            Err(e) => warn!(repository = %config.name, error = %e, "cache gc failed"),
        }
        let cache = ProviderCache::new(store, config.cache_file.clone(), ttl);

        let hooks: Arc<dyn RepositoryHooks> = Arc::new(NoHooks);
        let synthesizer = PackageSynthesizer::new(
            Arc::clone(&vendors),
            config.package_defaults.clone(),
            config.package_overrides.clone(),
            Arc::clone(&hooks),
        );

        info!(
            repository = %config.name,
            urls = ?urls,
            vendors = vendors.len(),
            cache = %cache.store().root().display(),
            "repository activated"
        );

        Ok(Self {
            normalizer: VersionNormalizer::new(config.version_fallback.clone()),
            config,
            urls,
            vendors,
            client,
            cache,
            hooks,
            synthesizer,
            stability: StabilityPolicy::any(),
            providers: OnceCell::new(),
            loading: AtomicBool::new(false),
            packages: DashMap::new(),
        })
    }

    /// Activate a repository listed with the `svn` binary.
    ///
    /// # Errors
    /// See [`SvnRepository::new`].
    pub fn with_svn(
        config: RepositoryConfig,
        overrides: &VendorOverrides,
        settings: &GlobalSettings,
    ) -> Result<Self> {
        let client = SvnClient::new()
            .with_trust_cert(config.trust_cert)
            .with_timeout(settings.listing_timeout);
        Self::new(config, overrides, settings, Arc::new(client))
    }

    /// Install repository hooks.
    #[must_use]
    pub fn with_hooks(mut self, hooks: Arc<dyn RepositoryHooks>) -> Self {
        self.synthesizer = PackageSynthesizer::new(
            Arc::clone(&self.vendors),
            self.config.package_defaults.clone(),
            self.config.package_overrides.clone(),
            Arc::clone(&hooks),
        );
        self.hooks = hooks;
        self
    }

    /// Drop versions the consumer will not accept before they are built.
    #[must_use]
    pub fn with_stability(mut self, policy: StabilityPolicy) -> Self {
        self.stability = policy;
        self
    }

    /// Repository name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Effective configuration.
    #[must_use]
    pub const fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Validated base URLs.
    #[must_use]
    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    /// Resolved vendors.
    #[must_use]
    pub fn vendors(&self) -> &VendorMap {
        &self.vendors
    }

    /// Vendor used when presenting provider names.
    #[must_use]
    pub fn default_vendor(&self) -> &str {
        self.vendors.default_vendor()
    }

    /// Provider cache.
    #[must_use]
    pub const fn cache(&self) -> &ProviderCache {
        &self.cache
    }

    /// Provider loading state.
    #[must_use]
    pub fn state(&self) -> RepositoryState {
        if self.providers.initialized() {
            RepositoryState::ProvidersLoaded
        } else if self.loading.load(Ordering::Acquire) {
            RepositoryState::ProvidersLoading
        } else {
            RepositoryState::Uninitialized
        }
    }

    fn context(&self) -> HookContext<'_> {
        HookContext {
            repository: &self.config.name,
            default_vendor: self.vendors.default_vendor(),
            urls: &self.urls,
        }
    }

    /// Load the provider map once; concurrent callers wait for the same load.
    ///
    /// # Errors
    /// Returns [`RepositoryError::ProviderListing`] if any provider root
    /// cannot be listed. A failed load is retried by the next caller.
    pub async fn ensure_providers(&self) -> Result<&ProviderMap> {
        self.providers
            .get_or_try_init(|| async {
                let _loading = LoadingFlag::raise(&self.loading);
                self.load_providers().await
            })
            .await
    }

    async fn load_providers(&self) -> Result<ProviderMap> {
        let (decision, hash) = self
            .cache
            .load_validated(self.hooks.as_ref(), self.context())
            .await;

        let map = match decision {
            CacheDecision::Use(map) => {
                debug!(repository = %self.config.name, providers = map.len(), "providers from cache");
                map
            }
            CacheDecision::Relist => self.list_providers().await?,
        };

        match self.cache.save(&map, hash) {
            Ok(true) => debug!(repository = %self.config.name, "provider cache updated"),
            Ok(false) => {}
            Err(e) => warn!(repository = %self.config.name, error = %e, "could not save provider cache"),
        }

        info!(repository = %self.config.name, providers = map.len(), "providers loaded");
        Ok(map)
    }

    /// List every base URL and provider path. Later entries win.
    async fn list_providers(&self) -> Result<ProviderMap> {
        let targets: Vec<(&PathSpec, String)> = self
            .urls
            .iter()
            .flat_map(|base| {
                self.config
                    .provider_paths
                    .iter()
                    .map(move |path| (path, path.join(base)))
            })
            .collect();

        let listings = try_join_all(targets.iter().map(|(path, url)| async move {
            if !path.is_listing() {
                return Ok(vec![(path.basename().to_string(), url.clone())]);
            }
            info!(url = %url, "listing providers");
            let names = self.client.list(url).await.map_err(|source| {
                RepositoryError::ProviderListing {
                    url: url.clone(),
                    source,
                }
            })?;
            Ok::<Vec<(String, String)>, RepositoryError>(
                names
                    .into_iter()
                    .map(|name| {
                        let provider_url = format!("{url}/{name}");
                        (name, provider_url)
                    })
                    .collect(),
            )
        }))
        .await?;

        let mut map = ProviderMap::new();
        for ((path, _), entries) in targets.iter().zip(listings) {
            for (name, provider_url) in entries {
                match self
                    .config
                    .name_filter
                    .apply(&name, &[path.as_str(), provider_url.as_str()])
                {
                    Some(name) => {
                        map.insert(name, provider_url);
                    }
                    None => debug!(provider = %name, "provider filtered out"),
                }
            }
        }
        Ok(map)
    }

    /// Vendor-qualified names of every provider, under the default vendor.
    ///
    /// # Errors
    /// Returns error if providers cannot be loaded.
    pub async fn provider_names(&self) -> Result<Vec<String>> {
        let vendor = self.default_vendor();
        Ok(self
            .ensure_providers()
            .await?
            .keys()
            .map(|name| format!("{vendor}/{name}"))
            .collect())
    }

    /// Packages satisfying a vendor-qualified name.
    ///
    /// # Errors
    /// Returns error if providers cannot be loaded or the provider's
    /// versions cannot be listed.
    pub async fn what_provides(&self, name: &str) -> Result<WhatProvides> {
        let Some(package) = PackageName::parse(name) else {
            return Ok(WhatProvides::ForeignVendor);
        };
        if !self.vendors.contains(package.vendor()) {
            return Ok(WhatProvides::ForeignVendor);
        }
        if let Some(cached) = self.packages.get(name) {
            return Ok(WhatProvides::Packages(cached.to_vec()));
        }

        let providers = self.ensure_providers().await?;
        let Some(provider_url) = providers.get(package.name()) else {
            debug!(package = %name, repository = %self.config.name, "no such provider");
            return Ok(WhatProvides::UnknownPackage);
        };

        let records = Arc::new(self.discover_versions(&package, provider_url).await?);
        let records = Arc::clone(
            self.packages
                .entry(name.to_string())
                .or_insert(records)
                .value(),
        );
        Ok(WhatProvides::Packages(records.to_vec()))
    }

    async fn discover_versions(
        &self,
        package: &PackageName,
        provider_url: &str,
    ) -> Result<Vec<PackageRecord>> {
        let paths = &self.config.package_paths;
        let listings = try_join_all(
            paths
                .iter()
                .map(|path| self.version_candidates(package, path, provider_url)),
        )
        .await?;

        let mut versions: IndexMap<String, VersionEntry> = IndexMap::new();
        for (path, candidates) in paths.iter().zip(listings) {
            let url = path.join(provider_url);
            for candidate in candidates {
                let fixed = self.normalizer.fix(&candidate.raw);
                let Some(version) = self.config.version_filter.apply(
                    &fixed,
                    &[package.name(), path.as_str(), url.as_str()],
                ) else {
                    debug!(package = %package, raw = %candidate.raw, "version filtered out");
                    continue;
                };
                if !self
                    .stability
                    .accepts(package.name(), parse_stability(&version))
                {
                    debug!(package = %package, version = %version, "version below minimum stability");
                    continue;
                }
                versions.insert(
                    version.clone(),
                    VersionEntry {
                        version,
                        source_url: candidate.source_url,
                        reference: candidate.reference,
                    },
                );
            }
        }

        let ctx = self.context();
        let mut records = Vec::with_capacity(versions.len());
        for entry in versions.into_values() {
            match self
                .synthesizer
                .synthesize(package, &entry, provider_url, ctx)
                .await
            {
                Ok(record) => records.push(record),
                Err(e) => warn!(
                    package = %package,
                    version = %entry.version,
                    error = %e,
                    "skipping version"
                ),
            }
        }
        info!(package = %package, versions = records.len(), "versions discovered");
        Ok(records)
    }

    /// Raw versions under one package path.
    ///
    /// Listed entries check out from the provider root with the entry path as
    /// reference; an explicit path is its own checkout root.
    async fn version_candidates(
        &self,
        package: &PackageName,
        path: &PathSpec,
        provider_url: &str,
    ) -> Result<Vec<Candidate>> {
        let rel = path.relative();
        if !path.is_listing() {
            let source_url = if rel.is_empty() {
                format!("{provider_url}/")
            } else {
                format!("{provider_url}/{rel}/")
            };
            return Ok(vec![Candidate {
                raw: path.basename().to_string(),
                source_url,
                reference: String::new(),
            }]);
        }

        let url = path.join(provider_url);
        debug!(package = %package, url = %url, "listing versions");
        let entries = self.client.list(&url).await.map_err(|source| {
            RepositoryError::PackageListing {
                name: package.to_string(),
                url: url.clone(),
                source,
            }
        })?;
        Ok(entries
            .into_iter()
            .map(|entry| Candidate {
                reference: if rel.is_empty() {
                    entry.clone()
                } else {
                    format!("{rel}/{entry}")
                },
                raw: entry,
                source_url: format!("{provider_url}/"),
            })
            .collect())
    }

    /// Search the repository.
    ///
    /// A query naming one of our vendors lists every provider under it.
    /// Otherwise the search hook answers, falling back to a case-insensitive
    /// match on provider names.
    ///
    /// # Errors
    /// Returns error if providers cannot be loaded.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        if self.vendors.contains(query) {
            let providers = self.ensure_providers().await?;
            return Ok(providers
                .iter()
                .map(|(name, url)| SearchResult {
                    name: format!("{query}/{name}"),
                    description: None,
                    url: Some(url.clone()),
                })
                .collect());
        }

        if let SearchOutcome::Results(results) = self.hooks.search(query, self.context()).await {
            return Ok(results);
        }

        let needle = query.to_lowercase();
        let vendor = self.default_vendor();
        Ok(self
            .ensure_providers()
            .await?
            .iter()
            .filter(|(name, _)| name.to_lowercase().contains(&needle))
            .map(|(name, url)| SearchResult {
                name: format!("{vendor}/{name}"),
                description: None,
                url: Some(url.clone()),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::atomic::AtomicUsize;
    use wpsvn_config::{CacheTtl, Hook};
    use wpsvn_core::Stability;
    use wpsvn_vcs::{VcsError, parse_svn_list};

    #[derive(Debug, Default)]
    struct FakeSvn {
        listings: HashMap<String, String>,
        calls: AtomicUsize,
    }

    impl FakeSvn {
        fn with(mut self, url: &str, response: &str) -> Self {
            self.listings.insert(url.to_string(), response.to_string());
            self
        }
    }

    impl ListingClient for FakeSvn {
        fn list<'a>(
            &'a self,
            url: &'a str,
        ) -> Pin<Box<dyn Future<Output = wpsvn_vcs::Result<Vec<String>>> + Send + 'a>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                self.listings
                    .get(url)
                    .map(|raw| parse_svn_list(raw))
                    .ok_or_else(|| VcsError::NotFound {
                        url: url.to_string(),
                    })
            })
        }

        fn cat<'a>(
            &'a self,
            url: &'a str,
        ) -> Pin<Box<dyn Future<Output = wpsvn_vcs::Result<String>> + Send + 'a>> {
            Box::pin(async move {
                Err(VcsError::NotFound {
                    url: url.to_string(),
                })
            })
        }
    }

    /// Listings that never answer.
    #[derive(Debug)]
    struct HangingSvn;

    impl ListingClient for HangingSvn {
        fn list<'a>(
            &'a self,
            _url: &'a str,
        ) -> Pin<Box<dyn Future<Output = wpsvn_vcs::Result<Vec<String>>> + Send + 'a>> {
            Box::pin(std::future::pending())
        }

        fn cat<'a>(
            &'a self,
            _url: &'a str,
        ) -> Pin<Box<dyn Future<Output = wpsvn_vcs::Result<String>> + Send + 'a>> {
            Box::pin(std::future::pending())
        }
    }

    fn config() -> RepositoryConfig {
        RepositoryConfig {
            name: "acme".into(),
            urls: vec!["https://x.test/plugins/".into(), "not a url".into()],
            package_paths: vec!["/tags/".into(), "/trunk".into()],
            package_types: IndexMap::from([(
                "wordpress-plugin".to_string(),
                vec!["acme-plugin".to_string()],
            )]),
            cache_ttl: CacheTtl::Seconds(3600),
            ..RepositoryConfig::default()
        }
    }

    fn svn() -> FakeSvn {
        FakeSvn::default()
            .with("https://x.test/plugins", "foo/\nbar/\n")
            .with("https://x.test/plugins/foo/tags", "1.0/\n2.0/\nnot-a-version!/\n")
    }

    fn repository(dir: &tempfile::TempDir, client: Arc<FakeSvn>) -> SvnRepository {
        let settings = GlobalSettings::default().with_cache_dir(dir.path());
        SvnRepository::new(config(), &VendorOverrides::default(), &settings, client).unwrap()
    }

    #[test]
    fn invalid_urls_fail_activation() {
        let dir = tempfile::tempdir().unwrap();
        let settings = GlobalSettings::default().with_cache_dir(dir.path());
        let config = RepositoryConfig {
            urls: vec!["plugins.svn.wordpress.org".into()],
            ..config()
        };
        let err = SvnRepository::new(
            config,
            &VendorOverrides::default(),
            &settings,
            Arc::new(FakeSvn::default()),
        )
        .unwrap_err();
        assert!(matches!(err, RepositoryError::Config(_)));
    }

    #[tokio::test]
    async fn providers_load_once() {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(svn());
        let repo = repository(&dir, Arc::clone(&client));

        assert_eq!(repo.state(), RepositoryState::Uninitialized);
        repo.ensure_providers().await.unwrap();
        repo.ensure_providers().await.unwrap();
        assert_eq!(repo.state(), RepositoryState::ProvidersLoaded);
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);

        assert_eq!(
            repo.provider_names().await.unwrap(),
            vec!["acme-plugin/bar", "acme-plugin/foo"]
        );
    }

    #[tokio::test]
    async fn negative_answers_are_distinct() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repository(&dir, Arc::new(svn()));

        assert_eq!(
            repo.what_provides("other/foo").await.unwrap(),
            WhatProvides::ForeignVendor
        );
        assert_eq!(
            repo.what_provides("acme-plugin/missing").await.unwrap(),
            WhatProvides::UnknownPackage
        );
        assert_eq!(
            repo.what_provides("not-qualified").await.unwrap(),
            WhatProvides::ForeignVendor
        );
    }

    #[tokio::test]
    async fn versions_are_fetched_once() {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(svn());
        let repo = repository(&dir, Arc::clone(&client));

        let first = repo.what_provides("acme-plugin/foo").await.unwrap().into_packages();
        let second = repo.what_provides("acme-plugin/foo").await.unwrap().into_packages();
        assert_eq!(first, second);
        // root listing + tags listing
        assert_eq!(client.calls.load(Ordering::SeqCst), 2);

        let versions: Vec<&str> = first.iter().map(|p| p.version.as_str()).collect();
        assert_eq!(versions, vec!["1.0", "2.0", "dev-default", "dev-trunk"]);
    }

    #[tokio::test]
    async fn version_listing_failure_fails_the_query_only() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repository(&dir, Arc::new(svn()));

        let err = repo.what_provides("acme-plugin/bar").await.unwrap_err();
        assert!(matches!(err, RepositoryError::PackageListing { .. }));
        assert!(
            err.to_string()
                .contains("Could not retrieve package listing for acme-plugin/bar")
        );
        assert!(matches!(
            repo.what_provides("acme-plugin/foo").await.unwrap(),
            WhatProvides::Packages(_)
        ));
    }

    #[tokio::test]
    async fn provider_listing_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repository(&dir, Arc::new(FakeSvn::default()));

        let err = repo.what_provides("acme-plugin/foo").await.unwrap_err();
        assert!(matches!(err, RepositoryError::ProviderListing { .. }));
        assert_eq!(repo.state(), RepositoryState::Uninitialized);
    }

    #[tokio::test]
    async fn cancelled_load_resets_state() {
        let dir = tempfile::tempdir().unwrap();
        let settings = GlobalSettings::default().with_cache_dir(dir.path());
        let repo = SvnRepository::new(
            config(),
            &VendorOverrides::default(),
            &settings,
            Arc::new(HangingSvn),
        )
        .unwrap();

        let elapsed = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            repo.ensure_providers(),
        )
        .await;
        assert!(elapsed.is_err());
        assert_eq!(repo.state(), RepositoryState::Uninitialized);
    }

    #[tokio::test]
    async fn unstable_versions_never_reach_synthesis() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repository(&dir, Arc::new(svn()))
            .with_stability(StabilityPolicy::minimum(Stability::Stable));

        let versions: Vec<String> = repo
            .what_provides("acme-plugin/foo")
            .await
            .unwrap()
            .into_packages()
            .into_iter()
            .map(|p| p.version)
            .collect();
        assert_eq!(versions, vec!["1.0", "2.0"]);
    }

    #[tokio::test]
    async fn version_filter_can_drop_everything() {
        let dir = tempfile::tempdir().unwrap();
        let settings = GlobalSettings::default().with_cache_dir(dir.path());
        let config = RepositoryConfig {
            version_filter: Hook::bound("exclude", &["$arg[0]", "1.0", "2.0", "dev-default", "trunk"])
                .unwrap(),
            ..config()
        };
        let repo =
            SvnRepository::new(config, &VendorOverrides::default(), &settings, Arc::new(svn()))
                .unwrap();
        assert_eq!(
            repo.what_provides("acme-plugin/foo").await.unwrap(),
            WhatProvides::Packages(Vec::new())
        );
    }

    #[tokio::test]
    async fn search_paths() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repository(&dir, Arc::new(svn()));

        let all = repo.search("acme-plugin").await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].url.as_deref(), Some("https://x.test/plugins/bar"));

        let hits = repo.search("FO").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "acme-plugin/foo");

        assert!(repo.search("zzz").await.unwrap().is_empty());
    }
}
