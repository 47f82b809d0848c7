//! Repository type registry.
//!
//! Custom repositories name their type with `"type"`; the registry maps
//! that tag to a factory. Builtins are built from their preset, overlaid
//! with the manifest's keys, and get their WordPress.org hooks.

use crate::error::{RepositoryError, Result};
use crate::repository::SvnRepository;
use crate::wordpress::{self, WordPressApi};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use wpsvn_config::{
    ActiveRepository, GlobalSettings, RepositoryConfig, SVN_REPOSITORY_TYPE, VendorOverrides,
};
use wpsvn_vcs::ListingClient;

/// Shared inputs for building repositories.
#[derive(Clone)]
pub struct Activation<'a> {
    /// Cache location and lifetimes.
    pub settings: &'a GlobalSettings,
    /// User vendor aliases and disabled vendors.
    pub vendors: &'a VendorOverrides,
    /// Listing client to use instead of `svn`.
    pub client: Option<Arc<dyn ListingClient>>,
}

impl fmt::Debug for Activation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Activation")
            .field("settings", self.settings)
            .field("vendors", self.vendors)
            .field("custom_client", &self.client.is_some())
            .finish()
    }
}

impl<'a> Activation<'a> {
    /// Build with the `svn` binary.
    #[must_use]
    pub const fn new(settings: &'a GlobalSettings, vendors: &'a VendorOverrides) -> Self {
        Self {
            settings,
            vendors,
            client: None,
        }
    }

    /// Build with another listing client.
    #[must_use]
    pub fn with_client(mut self, client: Arc<dyn ListingClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Activate an SVN repository.
    ///
    /// # Errors
    /// See [`SvnRepository::new`].
    pub fn svn(&self, config: RepositoryConfig) -> Result<SvnRepository> {
        match &self.client {
            Some(client) => SvnRepository::new(config, self.vendors, self.settings, Arc::clone(client)),
            None => SvnRepository::with_svn(config, self.vendors, self.settings),
        }
    }
}

/// Builds a repository from its effective configuration.
pub type RepositoryFactory =
    Arc<dyn Fn(RepositoryConfig, &Activation<'_>) -> Result<SvnRepository> + Send + Sync>;

/// Type tag to factory.
#[derive(Clone)]
pub struct RepositoryRegistry {
    factories: IndexMap<String, RepositoryFactory>,
    api: WordPressApi,
}

impl fmt::Debug for RepositoryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepositoryRegistry")
            .field("types", &self.factories.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl RepositoryRegistry {
    /// Registry with the `wp-svn` type.
    #[must_use]
    pub fn new(api: WordPressApi) -> Self {
        let mut registry = Self {
            factories: IndexMap::new(),
            api,
        };
        registry.register(
            SVN_REPOSITORY_TYPE,
            Arc::new(|config: RepositoryConfig, activation: &Activation<'_>| {
                activation.svn(config)
            }),
        );
        registry
    }

    /// Register (or replace) a factory.
    pub fn register(&mut self, tag: impl Into<String>, factory: RepositoryFactory) {
        let tag = tag.into();
        debug!(repo_type = %tag, "repository type registered");
        self.factories.insert(tag, factory);
    }

    /// Registered type tags.
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// WordPress.org API used by builtin hooks.
    #[must_use]
    pub const fn api(&self) -> &WordPressApi {
        &self.api
    }

    /// Build one active repository.
    ///
    /// # Errors
    /// Returns [`RepositoryError::UnknownType`] for unregistered tags, or
    /// whatever activation fails with.
    pub fn build(
        &self,
        repository: &ActiveRepository,
        activation: &Activation<'_>,
    ) -> Result<SvnRepository> {
        match repository {
            ActiveRepository::Builtin(kind, overrides) => {
                let mut config = kind.config();
                if let Some(definition) = overrides {
                    config.apply(definition);
                }
                let repo = activation.svn(config)?;
                Ok(match wordpress::hooks_for(*kind, &self.api) {
                    Some(hooks) => repo.with_hooks(hooks),
                    None => repo,
                })
            }
            ActiveRepository::Custom(definition) => {
                let tag = definition.repository_type();
                let factory =
                    self.factories
                        .get(tag)
                        .ok_or_else(|| RepositoryError::UnknownType {
                            repo_type: tag.to_string(),
                        })?;
                let mut config = RepositoryConfig::from_definition(definition);
                if definition.name.is_none() {
                    config.name = repository.name();
                }
                factory(config, activation)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::NoHooks;
    use wpsvn_config::{BuiltinKind, OneOrMany, RepositoryDefinition};

    fn api() -> WordPressApi {
        WordPressApi::new().unwrap()
    }

    #[derive(Debug)]
    struct NoListing;

    impl ListingClient for NoListing {
        fn list<'a>(
            &'a self,
            url: &'a str,
        ) -> std::pin::Pin<
            Box<dyn std::future::Future<Output = wpsvn_vcs::Result<Vec<String>>> + Send + 'a>,
        > {
            Box::pin(async move {
                Err(wpsvn_vcs::VcsError::NotFound {
                    url: url.to_string(),
                })
            })
        }

        fn cat<'a>(
            &'a self,
            url: &'a str,
        ) -> std::pin::Pin<
            Box<dyn std::future::Future<Output = wpsvn_vcs::Result<String>> + Send + 'a>,
        > {
            Box::pin(async move {
                Err(wpsvn_vcs::VcsError::NotFound {
                    url: url.to_string(),
                })
            })
        }
    }

    fn custom(repo_type: Option<&str>) -> RepositoryDefinition {
        RepositoryDefinition {
            repo_type: repo_type.map(str::to_string),
            url: Some(OneOrMany::One("https://svn.example.org/plugins/".into())),
            package_types: Some(IndexMap::from([(
                "wordpress-plugin".to_string(),
                OneOrMany::One("acme".into()),
            )])),
            ..RepositoryDefinition::default()
        }
    }

    #[test]
    fn unknown_types_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let settings = GlobalSettings::default().with_cache_dir(dir.path());
        let vendors = VendorOverrides::default();
        let activation = Activation::new(&settings, &vendors);

        let err = RepositoryRegistry::new(api())
            .build(&ActiveRepository::Custom(custom(Some("git"))), &activation)
            .unwrap_err();
        assert!(matches!(err, RepositoryError::UnknownType { repo_type } if repo_type == "git"));
    }

    #[test]
    fn custom_repositories_are_named_after_their_url() {
        let dir = tempfile::tempdir().unwrap();
        let settings = GlobalSettings::default().with_cache_dir(dir.path());
        let vendors = VendorOverrides::default();
        let activation = Activation::new(&settings, &vendors).with_client(Arc::new(NoListing));

        let repo = RepositoryRegistry::new(api())
            .build(&ActiveRepository::Custom(custom(None)), &activation)
            .unwrap();
        assert_eq!(repo.name(), "https://svn.example.org/plugins/");
        assert_eq!(repo.default_vendor(), "acme");
    }

    #[test]
    fn registered_factories_are_used() {
        let dir = tempfile::tempdir().unwrap();
        let settings = GlobalSettings::default().with_cache_dir(dir.path());
        let vendors = VendorOverrides::default();
        let activation = Activation::new(&settings, &vendors).with_client(Arc::new(NoListing));

        let mut registry = RepositoryRegistry::new(api());
        registry.register(
            "svn-mirror",
            Arc::new(|mut config: RepositoryConfig, activation: &Activation<'_>| {
                config.name = "mirror".into();
                Ok(activation.svn(config)?.with_hooks(Arc::new(NoHooks)))
            }),
        );
        assert_eq!(registry.types().collect::<Vec<_>>(), vec!["wp-svn", "svn-mirror"]);

        let repo = registry
            .build(&ActiveRepository::Custom(custom(Some("svn-mirror"))), &activation)
            .unwrap();
        assert_eq!(repo.name(), "mirror");
    }

    #[test]
    fn builtin_overrides_apply() {
        let dir = tempfile::tempdir().unwrap();
        let settings = GlobalSettings::default().with_cache_dir(dir.path());
        let vendors = VendorOverrides::default().disable("wordpress-muplugin");
        let activation = Activation::new(&settings, &vendors).with_client(Arc::new(NoListing));

        let overrides = RepositoryDefinition {
            url: Some(OneOrMany::One("https://mirror.test/plugins/".into())),
            ..RepositoryDefinition::default()
        };
        let repo = RepositoryRegistry::new(api())
            .build(
                &ActiveRepository::Builtin(BuiltinKind::Plugins, Some(overrides)),
                &activation,
            )
            .unwrap();
        assert_eq!(repo.urls(), ["https://mirror.test/plugins"]);
        assert!(!repo.vendors().contains("wordpress-muplugin"));
        assert!(repo.vendors().contains("wordpress-plugin"));
    }
}
