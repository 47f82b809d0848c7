//! Configuration for wpsvn repositories.
//!
//! - [`RepositoryConfig`]: resolved settings of one SVN-backed repository
//! - [`RepositoryDefinition`]: the composer.json form used for custom
//!   repositories and builtin overrides
//! - [`Hook`]: name and version filters
//! - [`VendorMap`]: per-repository virtual vendor resolution
//! - [`BuiltinKind`]: WordPress.org presets
//! - [`PluginSettings`]: the `extra.composer-wp` manifest section
//! - [`GlobalSettings`]: cache location and lifetimes

#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod builtin;
pub mod error;
pub mod hooks;
pub mod manifest;
pub mod settings;
pub mod types;
pub mod vendors;

pub use builtin::{BuiltinKind, DEFAULT_ENABLED};
pub use error::{ConfigError, Result};
pub use hooks::{Hook, HookArg, NamedFilter};
pub use manifest::{ActiveRepository, BuiltinSetting, EXTRA_FIELD, PluginSettings};
pub use settings::GlobalSettings;
pub use types::{
    CacheTtl, DEFAULT_CACHE_FILE, OneOrMany, PathSpec, RepositoryConfig, RepositoryDefinition,
    SVN_REPOSITORY_TYPE,
};
pub use vendors::{VendorMap, VendorOverrides};
