//! Virtual Composer repositories backed by Subversion listings.
//!
//! Each SVN repository exposes its top-level directories as packages and
//! their tag directories as versions, without checking anything out:
//!
//! - **Providers**: listed once per process, persisted to a JSON cache and
//!   revalidated after the configured lifetime.
//! - **Vendors**: every package is reachable under the repository's virtual
//!   vendors (`wordpress-plugin/akismet`, `wpackagist-plugin/akismet`, ...).
//! - **Packages**: version directories are normalized, filtered and turned
//!   into Composer package records with an SVN source.
//! - **WordPress.org**: the builtin plugin, theme and core repositories add
//!   download archives and directory metadata.
//!
//! ## Example
//!
//! ```no_run
//! use wpsvn_config::{GlobalSettings, PluginSettings};
//! use wpsvn_repository::{Activation, RepositoryManager, RepositoryRegistry, WordPressApi};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = PluginSettings::from_manifest(r#"{"extra": {"composer-wp": {}}}"#)?;
//! let global = GlobalSettings::from_env();
//! let registry = RepositoryRegistry::new(WordPressApi::new()?);
//! let activation = Activation::new(&global, &settings.vendors);
//! let manager = RepositoryManager::activate(&settings, &registry, &activation)?;
//!
//! for package in manager.what_provides("wordpress-plugin/akismet").await? {
//!     println!("{} {}", package.name, package.version);
//! }
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod hooks;
pub mod manager;
pub mod provider_cache;
pub mod registry;
pub mod repository;
pub mod synthesizer;
pub mod wordpress;

pub use error::{RepositoryError, Result};
pub use hooks::{
    CacheDecision, HookContext, NoHooks, PackageOrigin, RepositoryHooks, SearchOutcome,
    SearchResult,
};
pub use manager::{ManagerStats, RepositoryManager};
pub use provider_cache::{CachedProviders, ProviderCache, ProviderMap};
pub use registry::{Activation, RepositoryFactory, RepositoryRegistry};
pub use repository::{RepositoryState, SvnRepository, WhatProvides};
pub use synthesizer::{PackageSynthesizer, VersionEntry};
pub use wordpress::{ApiEndpoints, CoreHooks, PluginHooks, ThemeHooks, WordPressApi};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
