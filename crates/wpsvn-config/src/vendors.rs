//! Virtual vendor resolution.
//!
//! A repository declares, per package type, the vendors that select it. The
//! user may add aliases (`"my-plugins": "wordpress-plugin"`) and disable
//! vendors (`"wordpress-muplugin": false`). Resolution is a pure function of
//! those inputs and produces an immutable [`VendorMap`] owned by one
//! repository instance.

use crate::error::{ConfigError, Result};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Deserializer, Serialize};

/// User-declared vendor aliases and disabled vendors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VendorOverrides {
    /// Alias vendor to the vendor or package type it stands for.
    pub aliases: IndexMap<String, String>,
    /// Vendors mapped to a falsy value.
    pub disabled: IndexSet<String>,
}

impl VendorOverrides {
    /// Add an alias.
    #[must_use]
    pub fn alias(mut self, vendor: impl Into<String>, target: impl Into<String>) -> Self {
        self.aliases.insert(vendor.into(), target.into());
        self
    }

    /// Disable a vendor.
    #[must_use]
    pub fn disable(mut self, vendor: impl Into<String>) -> Self {
        self.disabled.insert(vendor.into());
        self
    }

    /// Whether nothing is overridden.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty() && self.disabled.is_empty()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum VendorTarget {
    Alias(String),
    Off(Option<bool>),
}

impl<'de> Deserialize<'de> for VendorOverrides {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = IndexMap::<String, VendorTarget>::deserialize(deserializer)?;
        let mut overrides = Self::default();
        for (vendor, target) in raw {
            match target {
                VendorTarget::Alias(target) if !target.is_empty() => {
                    overrides.aliases.insert(vendor, target);
                }
                VendorTarget::Alias(_) | VendorTarget::Off(None | Some(false)) => {
                    overrides.disabled.insert(vendor);
                }
                VendorTarget::Off(Some(true)) => {
                    return Err(serde::de::Error::custom(format!(
                        "vendor '{vendor}' must map to a vendor, a package type, or false"
                    )));
                }
            }
        }
        Ok(overrides)
    }
}

impl Serialize for VendorOverrides {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.aliases.len() + self.disabled.len()))?;
        for (vendor, target) in &self.aliases {
            map.serialize_entry(vendor, target)?;
        }
        for vendor in &self.disabled {
            map.serialize_entry(vendor, &false)?;
        }
        map.end()
    }
}

/// Resolved vendors of one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorMap {
    types: IndexMap<String, Vec<String>>,
    vendors: IndexMap<String, String>,
}

impl VendorMap {
    /// Resolve vendors for a repository.
    ///
    /// For every package type, aliases whose target is one of the type's
    /// default vendors (or the type name itself) join the type's vendor set.
    /// Disabled vendors are then removed everywhere. Types left without a
    /// vendor are dropped.
    ///
    /// # Errors
    /// Returns [`ConfigError::NoVendors`] if no vendor survives.
    pub fn resolve(
        package_types: &IndexMap<String, Vec<String>>,
        overrides: &VendorOverrides,
        repository: &str,
    ) -> Result<Self> {
        let mut types: IndexMap<String, Vec<String>> = IndexMap::new();
        let mut vendors: IndexMap<String, String> = IndexMap::new();

        for (package_type, defaults) in package_types {
            let mut set: IndexSet<&str> = defaults.iter().map(String::as_str).collect();
            for (alias, target) in &overrides.aliases {
                if target == package_type || defaults.contains(target) {
                    set.insert(alias.as_str());
                }
            }
            let resolved: Vec<String> = set
                .into_iter()
                .filter(|v| !overrides.disabled.contains(*v))
                .filter(|v| !vendors.contains_key(*v))
                .map(str::to_string)
                .collect();
            if resolved.is_empty() {
                continue;
            }
            for vendor in &resolved {
                vendors.insert(vendor.clone(), package_type.clone());
            }
            types.insert(package_type.clone(), resolved);
        }

        if vendors.is_empty() {
            return Err(ConfigError::NoVendors {
                repository: repository.to_string(),
            });
        }
        Ok(Self { types, vendors })
    }

    /// Package type selected by a vendor.
    #[must_use]
    pub fn type_of(&self, vendor: &str) -> Option<&str> {
        self.vendors.get(vendor).map(String::as_str)
    }

    /// Whether the vendor belongs to this repository.
    #[must_use]
    pub fn contains(&self, vendor: &str) -> bool {
        self.vendors.contains_key(vendor)
    }

    /// First vendor of the first type; used when listing providers.
    #[must_use]
    pub fn default_vendor(&self) -> &str {
        self.vendors.keys().next().map_or("", String::as_str)
    }

    /// Vendors selecting a package type.
    #[must_use]
    pub fn vendors_of_type(&self, package_type: &str) -> &[String] {
        self.types.get(package_type).map_or(&[], Vec::as_slice)
    }

    /// Other vendors that select the same type as `vendor`.
    pub fn aliases_of<'a>(&'a self, vendor: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.type_of(vendor)
            .map(|t| self.vendors_of_type(t))
            .unwrap_or_default()
            .iter()
            .map(String::as_str)
            .filter(move |v| *v != vendor)
    }

    /// `(vendor, type)` pairs in resolution order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vendors.iter().map(|(v, t)| (v.as_str(), t.as_str()))
    }

    /// Type to vendors.
    #[must_use]
    pub const fn types(&self) -> &IndexMap<String, Vec<String>> {
        &self.types
    }

    /// Number of vendors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vendors.len()
    }

    /// Always false for a resolved map.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vendors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types(pairs: &[(&str, &[&str])]) -> IndexMap<String, Vec<String>> {
        pairs
            .iter()
            .map(|(t, vs)| (t.to_string(), vs.iter().map(|v| v.to_string()).collect()))
            .collect()
    }

    #[test]
    fn aliases_join_matching_type() {
        let declared = types(&[("typeX", &["A"]), ("typeY", &["C"])]);
        let overrides = VendorOverrides::default().alias("B", "A");
        let map = VendorMap::resolve(&declared, &overrides, "test").unwrap();

        assert_eq!(map.vendors_of_type("typeX"), ["A", "B"]);
        assert_eq!(map.vendors_of_type("typeY"), ["C"]);
        assert_eq!(map.type_of("B"), Some("typeX"));
        assert_eq!(map.aliases_of("A").collect::<Vec<_>>(), vec!["B"]);
        assert_eq!(map.aliases_of("C").count(), 0);
        assert_eq!(map.default_vendor(), "A");
    }

    #[test]
    fn alias_by_type_name() {
        let declared = types(&[("wordpress-plugin", &["wordpress-plugin"])]);
        let overrides = VendorOverrides::default().alias("acme-plugin", "wordpress-plugin");
        let map = VendorMap::resolve(&declared, &overrides, "test").unwrap();
        assert_eq!(map.type_of("acme-plugin"), Some("wordpress-plugin"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn disabled_vendor_is_removed_everywhere() {
        let declared = types(&[("typeX", &["A", "B"]), ("typeY", &["C"])]);
        let overrides = VendorOverrides::default().disable("B");
        let map = VendorMap::resolve(&declared, &overrides, "test").unwrap();

        assert_eq!(map.vendors_of_type("typeX"), ["A"]);
        assert!(!map.contains("B"));
        assert_eq!(map.type_of("B"), None);
        assert!(map.iter().all(|(v, _)| v != "B"));
    }

    #[test]
    fn nothing_left_is_an_error() {
        let declared = types(&[("typeX", &["A"])]);
        let overrides = VendorOverrides::default().disable("A");
        assert!(matches!(
            VendorMap::resolve(&declared, &overrides, "test"),
            Err(ConfigError::NoVendors { .. })
        ));
    }

    #[test]
    fn resolution_is_pure() {
        let declared = types(&[("typeX", &["A"])]);
        let first = VendorMap::resolve(&declared, &VendorOverrides::default().alias("B", "A"), "r").unwrap();
        let second = VendorMap::resolve(&declared, &VendorOverrides::default(), "r").unwrap();
        assert!(first.contains("B"));
        assert!(!second.contains("B"));
    }

    #[test]
    fn overrides_from_json() {
        let overrides: VendorOverrides =
            sonic_rs::from_str(r#"{"acme": "wordpress-plugin", "wordpress-muplugin": false, "old": null}"#).unwrap();
        assert_eq!(overrides.aliases.get("acme").map(String::as_str), Some("wordpress-plugin"));
        assert!(overrides.disabled.contains("wordpress-muplugin"));
        assert!(overrides.disabled.contains("old"));
        assert!(sonic_rs::from_str::<VendorOverrides>(r#"{"x": true}"#).is_err());
    }
}
