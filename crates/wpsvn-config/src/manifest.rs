//! `extra.composer-wp` section of a composer.json manifest.
//!
//! ```json
//! {
//!   "extra": {
//!     "composer-wp": {
//!       "repositories": [
//!         { "themes": true, "core": false },
//!         { "plugins": { "cache-ttl": 3600 } },
//!         { "type": "wp-svn", "url": "https://svn.example.org/plugins/", "types": { "wordpress-plugin": "acme" } }
//!       ],
//!       "vendors": { "acme-plugin": "wordpress-plugin", "wordpress-muplugin": false }
//!     }
//!   }
//! }
//! ```

use crate::builtin::{BuiltinKind, DEFAULT_ENABLED};
use crate::error::{ConfigError, Result};
use crate::types::RepositoryDefinition;
use crate::vendors::VendorOverrides;
use indexmap::IndexMap;
use serde::Deserialize;
use sonic_rs::{JsonValueTrait, Value};
use tracing::debug;

/// Key under `extra` holding the settings.
pub const EXTRA_FIELD: &str = "composer-wp";

/// How the manifest configures a builtin.
#[derive(Debug, Clone, PartialEq)]
pub enum BuiltinSetting {
    /// Falsy value: do not activate.
    Disabled,
    /// `true`: activate with the preset.
    Enabled,
    /// Object: activate with these keys overlaid on the preset.
    Override(RepositoryDefinition),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BuiltinSettingRepr {
    Flag(Option<bool>),
    Definition(RepositoryDefinition),
}

impl From<BuiltinSettingRepr> for BuiltinSetting {
    fn from(repr: BuiltinSettingRepr) -> Self {
        match repr {
            BuiltinSettingRepr::Flag(Some(true)) => Self::Enabled,
            BuiltinSettingRepr::Flag(_) => Self::Disabled,
            BuiltinSettingRepr::Definition(def) => Self::Override(def),
        }
    }
}

/// A repository that should be activated.
#[derive(Debug, Clone, PartialEq)]
pub enum ActiveRepository {
    /// A builtin, optionally with overrides.
    Builtin(BuiltinKind, Option<RepositoryDefinition>),
    /// A user-defined repository.
    Custom(RepositoryDefinition),
}

impl ActiveRepository {
    /// Display name.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Builtin(kind, _) => kind.name().to_string(),
            Self::Custom(def) => def
                .name
                .clone()
                .or_else(|| def.url.clone().and_then(|u| u.into_vec().into_iter().next()))
                .unwrap_or_else(|| def.repository_type().to_string()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ExtraSection {
    #[serde(default)]
    repositories: Option<Value>,
    #[serde(default)]
    vendors: Option<VendorOverrides>,
}

/// Parsed plugin settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PluginSettings {
    /// Builtins mentioned in the manifest; the first mention wins.
    pub builtins: IndexMap<BuiltinKind, BuiltinSetting>,
    /// Custom repository definitions in order.
    pub custom: Vec<RepositoryDefinition>,
    /// Vendor aliases and disabled vendors.
    pub vendors: VendorOverrides,
}

impl PluginSettings {
    /// Parse a whole composer.json document.
    ///
    /// A manifest without `extra.composer-wp` yields the defaults.
    ///
    /// # Errors
    /// Returns error if the JSON or the section is malformed.
    pub fn from_manifest(json: &str) -> Result<Self> {
        let doc: Value = sonic_rs::from_str(json).map_err(|e| ConfigError::Json(e.to_string()))?;
        match doc.get("extra").and_then(|extra| extra.get(EXTRA_FIELD)) {
            Some(section) => Self::from_extra(section),
            None => Ok(Self::default()),
        }
    }

    /// Parse the `extra.composer-wp` value.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidManifest`] if `repositories` is not an
    /// array of objects.
    pub fn from_extra(section: &Value) -> Result<Self> {
        if section.is_null() {
            return Ok(Self::default());
        }
        let extra: ExtraSection = wpsvn_core::json::transcode(section)
            .map_err(|e| ConfigError::InvalidManifest(e.to_string()))?;

        let mut settings = Self {
            vendors: extra.vendors.unwrap_or_default(),
            ..Self::default()
        };

        let Some(repositories) = extra.repositories.filter(|r| !r.is_null()) else {
            return Ok(settings);
        };
        if !repositories.is_array() {
            return Err(ConfigError::InvalidManifest(format!(
                "[extra][{EXTRA_FIELD}][repositories] should be an array of repository definitions"
            )));
        }
        let entries: Vec<IndexMap<String, Value>> = wpsvn_core::json::transcode(&repositories)
            .map_err(|e| ConfigError::InvalidManifest(format!("repository definitions: {e}")))?;

        for entry in entries {
            let builtin_keys: Vec<(BuiltinKind, &Value)> = entry
                .iter()
                .filter_map(|(k, v)| BuiltinKind::from_name(k).map(|kind| (kind, v)))
                .collect();

            if builtin_keys.is_empty() {
                let def: RepositoryDefinition = wpsvn_core::json::transcode(&entry)
                    .map_err(|e| ConfigError::InvalidManifest(format!("repository definition: {e}")))?;
                settings.custom.push(def);
                continue;
            }

            for (kind, value) in builtin_keys {
                if settings.builtins.contains_key(&kind) {
                    debug!(repository = %kind, "builtin already configured, ignoring later definition");
                    continue;
                }
                let repr: BuiltinSettingRepr = wpsvn_core::json::transcode(value)
                    .map_err(|e| ConfigError::InvalidManifest(format!("repository '{kind}': {e}")))?;
                settings.builtins.insert(kind, repr.into());
            }
        }

        Ok(settings)
    }

    /// Repositories to activate: manifest order, then the default builtins
    /// not mentioned in the manifest.
    #[must_use]
    pub fn active_repositories(&self) -> Vec<ActiveRepository> {
        let mut active = Vec::new();
        for (kind, setting) in &self.builtins {
            match setting {
                BuiltinSetting::Disabled => {}
                BuiltinSetting::Enabled => active.push(ActiveRepository::Builtin(*kind, None)),
                BuiltinSetting::Override(def) => {
                    active.push(ActiveRepository::Builtin(*kind, Some(def.clone())));
                }
            }
        }
        active.extend(self.custom.iter().cloned().map(ActiveRepository::Custom));
        for kind in DEFAULT_ENABLED {
            if !self.builtins.contains_key(&kind) {
                active.push(ActiveRepository::Builtin(kind, None));
            }
        }
        active
    }
}
