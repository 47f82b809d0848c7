//! Hooks for the WordPress.org repositories.
//!
//! - plugins and themes enrich packages from the WordPress.org API, search
//!   through it, and extend the cached provider list from its "newest" feed
//! - core and develop translate the svn layout into release archives

pub mod api;
pub mod wp_core;
pub mod plugins;
pub mod themes;

pub use api::{ApiEndpoints, WordPressApi};
pub use wp_core::CoreHooks;
pub use plugins::PluginHooks;
pub use themes::ThemeHooks;

use crate::hooks::{CacheDecision, HookContext, RepositoryHooks, SearchResult};
use crate::provider_cache::ProviderMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, info, warn};
use wpsvn_cache::CacheStore;
use wpsvn_config::BuiltinKind;

/// Cache entry remembering the last "newest" feed.
pub const NEWEST_FILE: &str = "newest.json";

/// Longest description shown in search results.
const SEARCH_DESCRIPTION_LEN: usize = 100;

static HTML_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]*>").expect("invalid html tag regex"));

/// Hooks of a builtin repository, if it has any.
#[must_use]
pub fn hooks_for(kind: BuiltinKind, api: &WordPressApi) -> Option<Arc<dyn RepositoryHooks>> {
    match kind {
        BuiltinKind::Plugins => Some(Arc::new(PluginHooks::new(api.clone()))),
        BuiltinKind::Themes => Some(Arc::new(ThemeHooks::new(api.clone()))),
        BuiltinKind::Core => Some(Arc::new(CoreHooks::core())),
        BuiltinKind::Develop => Some(Arc::new(CoreHooks::develop())),
        BuiltinKind::WpcomThemes | BuiltinKind::VipPlugins => None,
    }
}

/// `.{version}` for a download URL: the checkout path without the given
/// words, slashes and spaces. Empty for the development head.
pub(crate) fn dist_suffix(checkout: &str, strip: &[&str]) -> String {
    let mut version = checkout.replace(['/', ' '], "");
    for word in strip {
        version = version.replace(word, "");
    }
    if version.is_empty() {
        version
    } else {
        format!(".{version}")
    }
}

/// Search hit for a WordPress.org slug.
pub(crate) fn search_hit(
    ctx: HookContext<'_>,
    slug: &str,
    description: Option<&str>,
    homepage: Option<String>,
) -> SearchResult {
    SearchResult {
        name: format!("{}/{slug}", ctx.default_vendor),
        description: description
            .map(|d| {
                HTML_TAG
                    .replace_all(d, "")
                    .trim()
                    .chars()
                    .take(SEARCH_DESCRIPTION_LEN)
                    .collect::<String>()
            })
            .filter(|d| !d.is_empty()),
        url: homepage,
    }
}

/// Extend a cached provider map from a "newest" feed.
///
/// Without a cached map the tree is listed. A cached map without a
/// remembered feed is used as-is; with one, the slugs added since are merged
/// in unless there are `limit` or more of them, which may hide further
/// additions and forces a relist. The feed is remembered either way.
pub(crate) fn revalidate_with_newest(
    cached: Option<ProviderMap>,
    store: &CacheStore,
    ctx: HookContext<'_>,
    newest: crate::error::Result<Vec<String>>,
    limit: usize,
) -> CacheDecision {
    let newest = match newest {
        Ok(newest) => newest,
        Err(e) => {
            warn!(repository = %ctx.repository, error = %e, "newest feed unavailable, relisting");
            return CacheDecision::Relist;
        }
    };

    let decision = match (cached, store.read(NEWEST_FILE), ctx.urls.first()) {
        (None, _, _) => CacheDecision::Relist,
        (Some(map), None, _) => CacheDecision::Use(map),
        (Some(mut map), Some(raw), Some(base)) => {
            match wpsvn_core::json::from_json::<Vec<String>>(&raw) {
                Ok(previous) => {
                    let added: Vec<&String> =
                        newest.iter().filter(|s| !previous.contains(s)).collect();
                    if added.len() < limit {
                        for slug in &added {
                            map.insert((*slug).clone(), format!("{base}/{slug}"));
                        }
                        debug!(repository = %ctx.repository, added = added.len(), "provider cache extended");
                        CacheDecision::Use(map)
                    } else {
                        info!(repository = %ctx.repository, "too many new providers, relisting");
                        CacheDecision::Relist
                    }
                }
                Err(e) => {
                    debug!(repository = %ctx.repository, error = %e, "unreadable newest feed, relisting");
                    CacheDecision::Relist
                }
            }
        }
        (Some(_), Some(_), None) => CacheDecision::Relist,
    };

    match wpsvn_core::json::to_json(&newest) {
        Ok(contents) => {
            if let Err(e) = store.write(NEWEST_FILE, &contents) {
                warn!(repository = %ctx.repository, error = %e, "could not save newest feed");
            }
        }
        Err(e) => warn!(repository = %ctx.repository, error = %e, "could not encode newest feed"),
    }
    decision
}
