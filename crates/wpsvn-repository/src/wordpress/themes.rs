//! WordPress.org theme directory.

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

/// Size of the "newest themes" feed used to extend the provider cache.
pub const NEWEST_THEMES: usize = 50;

const DOWNLOADS: &str = "https://downloads.wordpress.org/theme";

/// Hooks of the `themes` repository.
#[derive(Debug, Clone)]
pub struct ThemeHooks {
    api: WordPressApi,
}

impl ThemeHooks {
    /// Hooks backed by `api`.
    #[must_use]
    pub const fn new(api: WordPressApi) -> Self {
        Self { api }
    }
}

impl RepositoryHooks for ThemeHooks {
    fn filter_package<'a>(
        &'a self,
        package: &'a mut PackageRecord,
        origin: PackageOrigin<'a>,
        _ctx: HookContext<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let slug = origin.provider;
            let Some(info) = self.api.theme_info(slug).await? else {
                debug!(theme = %slug, "theme not in directory");
                package.abandoned = true;
                return Ok(());
            };

            // theme versions live directly under the provider
            let version = dist_suffix(&origin.checkout_path(package), &[]);
            package.dist = Some(DistRef::zip(format!(
                "{DOWNLOADS}/{}.zip",
                encode(&format!("{slug}{version}"))
            )));

            if let Some(description) = &info.sections.description {
                package.description = Some(description.clone());
            }
            if let Some(author) = info.author.as_ref().filter(|a| !a.is_empty()) {
                package.authors = vec![Author {
                    name: author.clone(),
                    homepage: None,
                }];
            }
            if !info.tags.0.is_empty() {
                package.keywords = info.tags.0.values().cloned().collect();
            }

            let slug = encode(slug);
            package.set_support("forum", format!("https://wordpress.org/support/theme/{slug}/"));
            package.set_support("source", format!("https://themes.trac.wordpress.org/browser/{slug}/"));
            package.set_support("docs", format!("https://wordpress.org/themes/{slug}/"));
            package.homepage = Some(format!("https://wordpress.org/themes/{slug}/"));
            Ok(())
        })
    }

    fn search<'a>(
        &'a self,
        query: &'a str,
        ctx: HookContext<'a>,
    ) -> Pin<Box<dyn Future<Output = SearchOutcome> + Send + 'a>> {
        Box::pin(async move {
            match self.api.search_themes(query).await {
                Ok(themes) if !themes.is_empty() => SearchOutcome::Results(
                    themes
                        .iter()
                        .map(|t| search_hit(ctx, &t.slug, t.description.as_deref(), t.homepage.clone()))
                        .collect(),
                ),
                Ok(_) => SearchOutcome::Declined,
                Err(e) => {
                    warn!(query = %query, error = %e, "theme search failed");
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
            let newest = self.api.newest_themes(NEWEST_THEMES).await;
            revalidate_with_newest(cached, store, ctx, newest, NEWEST_THEMES)
        })
    }
}
