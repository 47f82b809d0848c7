//! Repository configuration types.

use crate::error::{ConfigError, Result};
use crate::hooks::Hook;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::time::Duration;
use url::Url;

/// Repository type tag handled by the SVN engine.
pub const SVN_REPOSITORY_TYPE: &str = "wp-svn";

/// Default cache entry for the provider map.
pub const DEFAULT_CACHE_FILE: &str = "providers.json";

/// A provider or package path, relative to a base URL.
///
/// A trailing `/` means "list this directory"; anything else names a single
/// entry whose basename is used as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathSpec(String);

impl PathSpec {
    /// Create a path spec.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Path as configured.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this path is listed for entries.
    #[must_use]
    pub fn is_listing(&self) -> bool {
        self.0.ends_with('/')
    }

    /// Path without surrounding slashes.
    #[must_use]
    pub fn relative(&self) -> &str {
        self.0.trim_matches('/')
    }

    /// Last path segment (empty for the root).
    #[must_use]
    pub fn basename(&self) -> &str {
        let trimmed = self.0.trim_end_matches('/');
        trimmed.rsplit('/').next().unwrap_or_default()
    }

    /// Join onto a base URL without doubling or trailing slashes.
    #[must_use]
    pub fn join(&self, base: &str) -> String {
        format!("{}/{}", base, self.0.trim_start_matches('/'))
            .trim_end_matches('/')
            .to_string()
    }
}

impl From<&str> for PathSpec {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// How long the provider map may be served from cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheTtl {
    /// Fixed lifetime; zero disables writing.
    Seconds(u64),
    /// Use the global `cache-files-ttl`.
    #[default]
    Inherit,
}

impl CacheTtl {
    /// Resolve against the global default.
    #[must_use]
    pub const fn resolve(self, global: Duration) -> Duration {
        match self {
            Self::Seconds(secs) => Duration::from_secs(secs),
            Self::Inherit => global,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum CacheTtlRepr {
    Seconds(u64),
    Keyword(String),
}

impl Serialize for CacheTtl {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Seconds(secs) => CacheTtlRepr::Seconds(*secs),
            Self::Inherit => CacheTtlRepr::Keyword("config".to_string()),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CacheTtl {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match CacheTtlRepr::deserialize(deserializer)? {
            CacheTtlRepr::Seconds(secs) => Ok(Self::Seconds(secs)),
            CacheTtlRepr::Keyword(k) if k == "config" => Ok(Self::Inherit),
            CacheTtlRepr::Keyword(k) => Err(serde::de::Error::custom(format!(
                "cache-ttl must be a number of seconds or \"config\", got \"{k}\""
            ))),
        }
    }
}

/// One string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    /// A single value.
    One(String),
    /// Several values.
    Many(Vec<String>),
}

impl OneOrMany {
    /// Flatten into a list.
    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(s) => vec![s],
            Self::Many(v) => v,
        }
    }
}

/// Fully resolved configuration for one SVN-backed repository.
#[derive(Debug, Clone, PartialEq)]
pub struct RepositoryConfig {
    /// Display name, used in errors and logs.
    pub name: String,
    /// Base URLs.
    pub urls: Vec<String>,
    /// Where providers are found, relative to each base URL.
    pub provider_paths: Vec<PathSpec>,
    /// Where versions are found, relative to each provider.
    pub package_paths: Vec<PathSpec>,
    /// Package type to default vendors.
    pub package_types: IndexMap<String, Vec<String>>,
    /// Called with `(name, rel_path, abs_url)` for each discovered provider.
    pub name_filter: Hook,
    /// Called with `(version, package_name, path, provider_url)`.
    pub version_filter: Hook,
    /// Fields filled in when the synthesized record lacks them.
    pub package_defaults: IndexMap<String, sonic_rs::Value>,
    /// Fields forced onto every synthesized record.
    pub package_overrides: IndexMap<String, sonic_rs::Value>,
    /// Provider map cache lifetime.
    pub cache_ttl: CacheTtl,
    /// Cache entry holding the provider map.
    pub cache_file: String,
    /// Trust unknown server certificates on https URLs.
    pub trust_cert: bool,
    /// Version used when a tag name cannot be repaired.
    pub version_fallback: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            name: SVN_REPOSITORY_TYPE.to_string(),
            urls: Vec::new(),
            provider_paths: vec![PathSpec::new("/")],
            package_paths: vec![PathSpec::new("/")],
            package_types: IndexMap::new(),
            name_filter: Hook::Noop,
            version_filter: Hook::dev_trunk(),
            package_defaults: IndexMap::new(),
            package_overrides: IndexMap::new(),
            cache_ttl: CacheTtl::Seconds(0),
            cache_file: DEFAULT_CACHE_FILE.to_string(),
            trust_cert: false,
            version_fallback: wpsvn_core::DEFAULT_FALLBACK.to_string(),
        }
    }
}

impl RepositoryConfig {
    /// Build a config from a user definition on top of the defaults.
    #[must_use]
    pub fn from_definition(definition: &RepositoryDefinition) -> Self {
        let mut config = Self::default();
        config.apply(definition);
        config
    }

    /// Overlay every key the definition sets.
    pub fn apply(&mut self, definition: &RepositoryDefinition) {
        let def = definition.clone();
        if let Some(name) = def.name {
            self.name = name;
        }
        if let Some(url) = def.url {
            self.urls = url.into_vec();
        }
        if let Some(paths) = def.provider_paths {
            self.provider_paths = paths;
        }
        if let Some(paths) = def.package_paths {
            self.package_paths = paths;
        }
        if let Some(types) = def.package_types {
            self.package_types = types.into_iter().map(|(t, v)| (t, v.into_vec())).collect();
        }
        if let Some(hook) = def.name_filter {
            self.name_filter = hook;
        }
        if let Some(hook) = def.version_filter {
            self.version_filter = hook;
        }
        if let Some(defaults) = def.package_defaults {
            self.package_defaults = defaults;
        }
        if let Some(overrides) = def.package_overrides {
            self.package_overrides = overrides;
        }
        if let Some(ttl) = def.cache_ttl {
            self.cache_ttl = ttl;
        }
        if let Some(file) = def.cache_file {
            self.cache_file = file;
        }
        if let Some(trust) = def.trust_cert {
            self.trust_cert = trust;
        }
        if let Some(fallback) = def.version_fallback {
            self.version_fallback = fallback;
        }
    }

    /// Base URLs that carry a scheme, without trailing slashes.
    ///
    /// # Errors
    /// Returns [`ConfigError::NoValidUrls`] if none remain.
    pub fn valid_urls(&self) -> Result<Vec<String>> {
        let urls: Vec<String> = self
            .urls
            .iter()
            .filter(|u| Url::parse(u).is_ok())
            .map(|u| u.trim_end_matches('/').to_string())
            .collect();
        if urls.is_empty() {
            return Err(ConfigError::NoValidUrls {
                repository: self.name.clone(),
                urls: self.urls.clone(),
            });
        }
        Ok(urls)
    }

    /// Cache directory name derived from the first valid URL.
    ///
    /// # Errors
    /// Returns error if there is no valid URL.
    pub fn cache_dir_name(&self) -> Result<String> {
        let urls = self.valid_urls()?;
        Ok(urls[0]
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '.' {
                    c
                } else {
                    '-'
                }
            })
            .collect())
    }
}

/// Repository definition as written in composer.json.
///
/// Every key is optional; set keys replace the corresponding value of a
/// builtin preset or of the defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RepositoryDefinition {
    /// Repository type tag (`wp-svn`).
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub repo_type: Option<String>,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Base URL(s).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<OneOrMany>,
    /// Provider paths.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_paths: Option<Vec<PathSpec>>,
    /// Package paths.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_paths: Option<Vec<PathSpec>>,
    /// Package type to vendor(s).
    #[serde(default, alias = "types", skip_serializing_if = "Option::is_none")]
    pub package_types: Option<IndexMap<String, OneOrMany>>,
    /// Provider name filter.
    #[serde(default, alias = "provider-filter", skip_serializing_if = "Option::is_none")]
    pub name_filter: Option<Hook>,
    /// Version filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_filter: Option<Hook>,
    /// Package defaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_defaults: Option<IndexMap<String, sonic_rs::Value>>,
    /// Package overrides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_overrides: Option<IndexMap<String, sonic_rs::Value>>,
    /// Cache lifetime.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_ttl: Option<CacheTtl>,
    /// Cache entry name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_file: Option<String>,
    /// Trust server certificates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trust_cert: Option<bool>,
    /// Fallback version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_fallback: Option<String>,
}

impl RepositoryDefinition {
    /// Type tag, defaulting to `wp-svn`.
    #[must_use]
    pub fn repository_type(&self) -> &str {
        self.repo_type.as_deref().unwrap_or(SVN_REPOSITORY_TYPE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_spec_forms() {
        let tags = PathSpec::new("/tags/");
        assert!(tags.is_listing());
        assert_eq!(tags.relative(), "tags");

        let trunk = PathSpec::new("/trunk");
        assert!(!trunk.is_listing());
        assert_eq!(trunk.basename(), "trunk");
        assert_eq!(trunk.relative(), "trunk");

        let root = PathSpec::new("");
        assert_eq!(root.basename(), "");
        assert_eq!(root.join("https://core.svn.wordpress.org"), "https://core.svn.wordpress.org");
        assert_eq!(PathSpec::new("/").join("https://x.test/plugins"), "https://x.test/plugins");
        assert_eq!(
            PathSpec::new("release-candidates/").join("https://vip.test/plugins"),
            "https://vip.test/plugins/release-candidates"
        );
    }

    #[test]
    fn urls_without_scheme_are_dropped() {
        let config = RepositoryConfig {
            urls: vec!["x.test/plugins".into(), "https://x.test/plugins/".into()],
            ..RepositoryConfig::default()
        };
        assert_eq!(config.valid_urls().unwrap(), vec!["https://x.test/plugins"]);
        assert_eq!(config.cache_dir_name().unwrap(), "https---x.test-plugins");

        let none = RepositoryConfig {
            urls: vec!["nope".into()],
            ..RepositoryConfig::default()
        };
        assert!(matches!(none.valid_urls(), Err(ConfigError::NoValidUrls { .. })));
    }

    #[test]
    fn definition_overlays_defaults() {
        let def: RepositoryDefinition = sonic_rs::from_str(
            r#"{
                "type": "wp-svn",
                "url": "https://x.test/plugins/",
                "package-paths": ["/tags/", "/trunk"],
                "types": {"wordpress-plugin": "acme-plugin"},
                "cache-ttl": "config",
                "package-defaults": {"license": "GPL-2.0-or-later"}
            }"#,
        )
        .unwrap();
        assert_eq!(def.repository_type(), "wp-svn");

        let config = RepositoryConfig::from_definition(&def);
        assert_eq!(config.urls, vec!["https://x.test/plugins/"]);
        assert_eq!(config.provider_paths, vec![PathSpec::new("/")]);
        assert_eq!(config.package_paths.len(), 2);
        assert_eq!(config.package_types["wordpress-plugin"], vec!["acme-plugin"]);
        assert_eq!(config.cache_ttl, CacheTtl::Inherit);
        assert_eq!(config.version_filter, Hook::dev_trunk());
        assert!(config.package_defaults.contains_key("license"));
    }

    #[test]
    fn cache_ttl_forms() {
        assert_eq!(sonic_rs::from_str::<CacheTtl>("3600").unwrap(), CacheTtl::Seconds(3600));
        assert_eq!(sonic_rs::from_str::<CacheTtl>(r#""config""#).unwrap(), CacheTtl::Inherit);
        assert!(sonic_rs::from_str::<CacheTtl>(r#""forever""#).is_err());
        assert_eq!(
            CacheTtl::Inherit.resolve(Duration::from_secs(10)),
            Duration::from_secs(10)
        );
    }
}
