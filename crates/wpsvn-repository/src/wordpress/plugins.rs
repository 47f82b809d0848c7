//! WordPress.org plugin directory.

use super::api::{WordPressApi, encode};
use super::{dist_suffix, revalidate_with_newest, search_hit};
use crate::error::Result;
use crate::hooks::{
    CacheDecision, HookContext, PackageOrigin, RepositoryHooks, SearchOutcome,
};
use crate::provider_cache::ProviderMap;
use std::future::Future;
use std::pin::Pin;
use tracing::{debug, warn};
use wpsvn_cache::CacheStore;
use wpsvn_core::{Author, DistRef, PackageRecord};

/// Size of the "newest plugins" feed used to extend the provider cache.
pub const NEWEST_PLUGINS: usize = 100;

/// Plugin archives.
const DOWNLOADS: &str = "https://downloads.wordpress.org/plugin";

/// Hooks of the `plugins` repository.
#[derive(Debug, Clone)]
pub struct PluginHooks {
    api: WordPressApi,
}

impl PluginHooks {
    /// Hooks backed by `api`.
    #[must_use]
    pub const fn new(api: WordPressApi) -> Self {
        Self { api }
    }
}

impl RepositoryHooks for PluginHooks {
    /// Adds the download archive and directory metadata. Closed plugins are
    /// marked abandoned; when the API cannot be reached the package is left
    /// as it is.
    fn filter_package<'a>(
        &'a self,
        package: &'a mut PackageRecord,
        origin: PackageOrigin<'a>,
        _ctx: HookContext<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let slug = origin.provider;
            let Some(info) = self.api.plugin_info(slug).await? else {
                debug!(plugin = %slug, "plugin closed");
                package.abandoned = true;
                return Ok(());
            };

            let version = dist_suffix(&origin.checkout_path(package), &["tags", "trunk"]);
            package.dist = Some(DistRef::zip(format!(
                "{DOWNLOADS}/{}.zip",
                encode(&format!("{slug}{version}"))
            )));

            if let Some(description) = &info.short_description {
                package.description = Some(description.clone());
            }
            if !info.contributors.0.is_empty() {
                package.authors = info
                    .contributors
                    .0
                    .iter()
                    .map(|(name, homepage)| Author {
                        name: name.clone(),
                        homepage: Some(homepage.clone()),
                    })
                    .collect();
            }
            if !info.tags.0.is_empty() {
                package.keywords = info.tags.0.values().cloned().collect();
            }

            let slug = encode(slug);
            package.set_support("forum", format!("https://wordpress.org/support/plugin/{slug}/"));
            package.set_support("source", format!("http://plugins.trac.wordpress.org/browser/{slug}/"));
            package.set_support("docs", format!("https://wordpress.org/plugins/{slug}/"));
            package.homepage = Some(format!("https://wordpress.org/plugins/{slug}/"));
            Ok(())
        })
    }

    fn search<'a>(
        &'a self,
        query: &'a str,
        ctx: HookContext<'a>,
    ) -> Pin<Box<dyn Future<Output = SearchOutcome> + Send + 'a>> {
        Box::pin(async move {
            match self.api.search_plugins(query).await {
                Ok(plugins) if !plugins.is_empty() => SearchOutcome::Results(
                    plugins
                        .iter()
                        .map(|p| {
                            search_hit(ctx, &p.slug, p.short_description.as_deref(), p.homepage.clone())
                        })
                        .collect(),
                ),
                Ok(_) => SearchOutcome::Declined,
                Err(e) => {
                    warn!(query = %query, error = %e, "plugin search failed");
                    SearchOutcome::Declined
                }
            }
        })
    }

    fn revalidate_cache<'a>(
        &'a self,
        cached: Option<ProviderMap>,
        store: &'a CacheStore,
        ctx: HookContext<'a>,
    ) -> Pin<Box<dyn Future<Output = CacheDecision> + Send + 'a>> {
        Box::pin(async move {
            let newest = self.api.newest_plugins(NEWEST_PLUGINS).await;
            revalidate_with_newest(cached, store, ctx, newest, NEWEST_PLUGINS)
        })
    }
}
