//! Repository manager.
//!
//! Activates the repositories a manifest asks for and answers queries
//! across all of them. Activation failures abort; a failure while
//! answering one query only removes that repository from the answer.

use crate::error::{RepositoryError, Result};
use crate::hooks::SearchResult;
use crate::registry::{Activation, RepositoryRegistry};
use crate::repository::{SvnRepository, WhatProvides};
use futures::future::join_all;
use tracing::{info, instrument, warn};
use wpsvn_config::PluginSettings;
use wpsvn_core::PackageRecord;

/// Manager statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManagerStats {
    /// Active repositories.
    pub repositories: usize,
    /// Repositories whose providers are loaded.
    pub loaded: usize,
}

/// All active repositories of a project.
#[derive(Debug, Default)]
pub struct RepositoryManager {
    repositories: Vec<SvnRepository>,
}

impl RepositoryManager {
    /// Manager over already-built repositories.
    #[must_use]
    pub const fn new(repositories: Vec<SvnRepository>) -> Self {
        Self { repositories }
    }

    /// Activate every repository the settings enable, in order.
    ///
    /// # Errors
    /// Returns the first activation error.
    pub fn activate(
        settings: &PluginSettings,
        registry: &RepositoryRegistry,
        activation: &Activation<'_>,
    ) -> Result<Self> {
        let mut repositories = Vec::new();
        for repository in settings.active_repositories() {
            let repo = registry.build(&repository, activation)?;
            info!(repository = %repo.name(), "repository enabled");
            repositories.push(repo);
        }
        Ok(Self { repositories })
    }

    /// Active repositories.
    #[must_use]
    pub fn repositories(&self) -> &[SvnRepository] {
        &self.repositories
    }

    /// Repository by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SvnRepository> {
        self.repositories.iter().find(|r| r.name() == name)
    }

    /// Statistics.
    #[must_use]
    pub fn stats(&self) -> ManagerStats {
        ManagerStats {
            repositories: self.repositories.len(),
            loaded: self
                .repositories
                .iter()
                .filter(|r| r.state() == crate::RepositoryState::ProvidersLoaded)
                .count(),
        }
    }

    /// Packages for a vendor-qualified name from every repository.
    ///
    /// # Errors
    /// Returns error only if a repository cannot list its providers.
    #[instrument(skip(self))]
    pub async fn what_provides(&self, name: &str) -> Result<Vec<PackageRecord>> {
        let answers = join_all(self.repositories.iter().map(|r| r.what_provides(name))).await;
        let mut packages = Vec::new();
        for (repo, answer) in self.repositories.iter().zip(answers) {
            match answer {
                Ok(WhatProvides::Packages(found)) => packages.extend(found),
                Ok(WhatProvides::ForeignVendor | WhatProvides::UnknownPackage) => {}
                Err(e) => degrade(repo, e)?,
            }
        }
        Ok(packages)
    }

    /// Search every repository.
    ///
    /// # Errors
    /// Returns error only if a repository cannot list its providers.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let answers = join_all(self.repositories.iter().map(|r| r.search(query))).await;
        let mut results = Vec::new();
        for (repo, answer) in self.repositories.iter().zip(answers) {
            match answer {
                Ok(found) => results.extend(found),
                Err(e) => degrade(repo, e)?,
            }
        }
        Ok(results)
    }

    /// Every provider of every repository, under its default vendor.
    ///
    /// # Errors
    /// Returns error if a repository cannot list its providers.
    pub async fn providers(&self) -> Result<Vec<String>> {
        let answers = join_all(self.repositories.iter().map(|r| r.provider_names())).await;
        let mut names = Vec::new();
        for answer in answers {
            names.extend(answer?);
        }
        Ok(names)
    }
}

/// Activation failures propagate; anything else drops the repository from
/// this one answer.
fn degrade(repo: &SvnRepository, error: RepositoryError) -> Result<()> {
    if error.is_activation() {
        return Err(error);
    }
    warn!(repository = %repo.name(), error = %error, "no packages from repository");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wordpress::WordPressApi;
    use std::collections::HashMap;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Arc;
    use wpsvn_config::GlobalSettings;
    use wpsvn_vcs::{ListingClient, VcsError, parse_svn_list};

    #[derive(Debug, Default)]
    struct FakeSvn(HashMap<String, String>);

    impl ListingClient for FakeSvn {
        fn list<'a>(
            &'a self,
            url: &'a str,
        ) -> Pin<Box<dyn Future<Output = wpsvn_vcs::Result<Vec<String>>> + Send + 'a>> {
            Box::pin(async move {
                self.0
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

    const MANIFEST: &str = r#"{
        "extra": {
            "composer-wp": {
                "repositories": [
                    {"plugins": false, "core": false},
                    {"name": "first", "url": "https://one.test/", "types": {"wordpress-plugin": "one"}},
                    {"name": "second", "url": "https://two.test/", "types": {"wordpress-plugin": "two"}}
                ]
            }
        }
    }"#;

    fn manager(dir: &tempfile::TempDir, listings: &[(&str, &str)]) -> RepositoryManager {
        let settings = PluginSettings::from_manifest(MANIFEST).unwrap();
        let global = GlobalSettings::default().with_cache_dir(dir.path());
        let client = FakeSvn(
            listings
                .iter()
                .map(|(u, l)| ((*u).to_string(), (*l).to_string()))
                .collect(),
        );
        let activation =
            Activation::new(&global, &settings.vendors).with_client(Arc::new(client));
        let registry = RepositoryRegistry::new(WordPressApi::new().unwrap());
        RepositoryManager::activate(&settings, &registry, &activation).unwrap()
    }

    #[tokio::test]
    async fn queries_span_repositories() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(
            &dir,
            &[
                ("https://one.test", "foo/"),
                ("https://one.test/foo", "trunk/"),
                ("https://two.test", "foo/ bar/"),
            ],
        );
        assert_eq!(
            manager.repositories().iter().map(SvnRepository::name).collect::<Vec<_>>(),
            vec!["first", "second"]
        );

        let providers = manager.providers().await.unwrap();
        assert_eq!(providers, vec!["one/foo", "two/bar", "two/foo"]);
        assert_eq!(manager.stats().loaded, 2);

        let hits = manager.search("foo").await.unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn version_failures_degrade_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(
            &dir,
            &[("https://one.test", "foo/"), ("https://two.test", "foo/")],
        );
        // neither repository can list foo's versions
        assert!(manager.what_provides("one/foo").await.unwrap().is_empty());
        assert!(manager.what_provides("nobody/foo").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn provider_failures_abort() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(&dir, &[("https://one.test", "foo/")]);
        let err = manager.search("foo").await.unwrap_err();
        assert!(matches!(err, RepositoryError::ProviderListing { .. }));
        assert!(err.to_string().contains("https://two.test"));
    }
}
