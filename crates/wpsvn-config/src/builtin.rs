//! Builtin WordPress repository presets.

use crate::error::{ConfigError, Result};
use crate::hooks::{self, Hook};
use crate::types::{CacheTtl, PathSpec, RepositoryConfig};
use indexmap::IndexMap;
use std::fmt;
use std::str::FromStr;

/// Builtins enabled unless the manifest disables them.
pub const DEFAULT_ENABLED: [BuiltinKind; 2] = [BuiltinKind::Plugins, BuiltinKind::Core];

/// A named builtin repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinKind {
    /// plugins.svn.wordpress.org
    Plugins,
    /// themes.svn.wordpress.org
    Themes,
    /// core.svn.wordpress.org
    Core,
    /// develop.svn.wordpress.org
    Develop,
    /// WordPress.com themes.
    WpcomThemes,
    /// WordPress VIP plugins.
    VipPlugins,
}

impl BuiltinKind {
    /// Every builtin, in registration order.
    #[must_use]
    pub const fn all() -> [Self; 6] {
        [
            Self::Plugins,
            Self::Themes,
            Self::Core,
            Self::Develop,
            Self::WpcomThemes,
            Self::VipPlugins,
        ]
    }

    /// Name used in `extra.composer-wp.repositories`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Plugins => "plugins",
            Self::Themes => "themes",
            Self::Core => "core",
            Self::Develop => "develop",
            Self::WpcomThemes => "wpcom-themes",
            Self::VipPlugins => "vip-plugins",
        }
    }

    /// Look up a builtin by name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().into_iter().find(|k| k.name() == name)
    }

    /// Preset configuration.
    #[must_use]
    pub fn config(self) -> RepositoryConfig {
        let base = RepositoryConfig {
            name: self.name().to_string(),
            ..RepositoryConfig::default()
        };
        match self {
            Self::Plugins => RepositoryConfig {
                urls: vec!["https://plugins.svn.wordpress.org/".into()],
                package_paths: paths(&["/tags/", "/trunk"]),
                package_types: types(&[
                    ("wordpress-plugin", &["wordpress-plugin"]),
                    ("wordpress-muplugin", &["wordpress-muplugin"]),
                ]),
                cache_ttl: CacheTtl::Inherit,
                ..base
            },
            Self::Themes => RepositoryConfig {
                urls: vec!["https://themes.svn.wordpress.org/".into()],
                package_types: types(&[("wordpress-theme", &["wordpress-theme"])]),
                cache_ttl: CacheTtl::Inherit,
                trust_cert: true,
                ..base
            },
            Self::Core => RepositoryConfig {
                urls: vec!["https://core.svn.wordpress.org/".into()],
                provider_paths: paths(&[""]),
                package_paths: paths(&["/tags/", "/trunk"]),
                package_types: types(&[("wordpress-core", &["wordpress", "wordpress-core"])]),
                name_filter: rename_root("wordpress"),
                ..base
            },
            Self::Develop => RepositoryConfig {
                urls: vec!["https://develop.svn.wordpress.org/".into()],
                provider_paths: paths(&[""]),
                package_paths: paths(&["/tags/", "/trunk"]),
                package_types: types(&[("wordpress-develop", &["wordpress", "wordpress-core"])]),
                name_filter: rename_root("develop"),
                ..base
            },
            Self::WpcomThemes => RepositoryConfig {
                urls: vec!["https://wpcom-themes.svn.automattic.com/".into()],
                package_paths: paths(&[""]),
                package_types: types(&[("wordpress-com-theme", &["wordpress-com"])]),
                name_filter: Hook::with_args(hooks::EXCLUDE, &["$arg[0]", ".ignore"]),
                version_filter: Hook::with_args(hooks::CONSTANT, &["dev-master"]),
                package_overrides: IndexMap::from([(
                    "type".to_string(),
                    sonic_rs::Value::from("wordpress-theme"),
                )]),
                ..base
            },
            Self::VipPlugins => RepositoryConfig {
                urls: vec!["https://vip-svn.wordpress.com/plugins/".into()],
                provider_paths: paths(&["/", "release-candidates/"]),
                package_paths: paths(&[""]),
                package_types: types(&[("wordpress-plugin", &["wordpress-vip"])]),
                name_filter: Hook::Simple(hooks::RC_SUFFIX),
                version_filter: Hook::with_args(hooks::CONSTANT, &["dev-master"]),
                ..base
            },
        }
    }
}

impl fmt::Display for BuiltinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BuiltinKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s).ok_or_else(|| ConfigError::UnknownRepositoryType(s.to_string()))
    }
}

fn paths(list: &[&str]) -> Vec<PathSpec> {
    list.iter().copied().map(PathSpec::from).collect()
}

fn types(list: &[(&str, &[&str])]) -> IndexMap<String, Vec<String>> {
    list.iter()
        .map(|(t, vendors)| {
            (
                (*t).to_string(),
                vendors.iter().map(|v| (*v).to_string()).collect(),
            )
        })
        .collect()
}

/// The root provider path yields an empty name; give it one.
fn rename_root(to: &str) -> Hook {
    Hook::with_args(hooks::SELECT, &["$arg[0]", "", to])
}
