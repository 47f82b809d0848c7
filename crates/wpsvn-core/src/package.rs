//! Package names and synthesized package records.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Vendor-qualified package name (`vendor/name`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageName {
    vendor: String,
    name: String,
}

impl PackageName {
    /// Create new package name.
    #[must_use]
    pub fn new(vendor: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            vendor: vendor.into(),
            name: name.into(),
        }
    }

    /// Parse from "vendor/name". Anything other than exactly two
    /// non-empty parts is rejected.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.split('/');
        let vendor = parts.next()?;
        let name = parts.next()?;
        if parts.next().is_some() || vendor.is_empty() || name.is_empty() {
            return None;
        }
        Some(Self::new(vendor, name))
    }

    /// Get vendor.
    #[must_use]
    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    /// Get the bare provider name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Same provider under another vendor.
    #[must_use]
    pub fn with_vendor(&self, vendor: &str) -> Self {
        Self::new(vendor, self.name.clone())
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.vendor, self.name)
    }
}

/// VCS checkout location for one version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    /// VCS kind (always `svn` here).
    #[serde(rename = "type")]
    pub kind: String,
    /// Provider base URL, with trailing slash.
    pub url: String,
    /// Path under the base URL; never empty.
    pub reference: String,
}

/// Archive download for one version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistRef {
    /// Archive kind (zip).
    #[serde(rename = "type")]
    pub kind: String,
    /// Download URL.
    pub url: String,
}

impl DistRef {
    /// Zip archive at `url`.
    #[must_use]
    pub fn zip(url: impl Into<String>) -> Self {
        Self {
            kind: "zip".to_string(),
            url: url.into(),
        }
    }
}

/// Package author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Name.
    pub name: String,
    /// Homepage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
}

/// Same-version equivalence between two vendor-qualified names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Replacing package.
    pub source: String,
    /// Replaced package.
    pub target: String,
    /// Constraint on the target, e.g. `= 1.0`.
    pub constraint: String,
    /// Human readable tag, e.g. `'wordpress-plugin' alias for`.
    pub description: String,
}

/// A synthesized package version, as handed to a resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageRecord {
    /// Vendor-qualified name.
    pub name: String,
    /// Version as discovered.
    pub version: String,
    /// Composer-normalized version, when parsable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_normalized: Option<String>,
    /// Package type.
    #[serde(rename = "type")]
    pub package_type: String,
    /// Source checkout.
    pub source: SourceRef,
    /// Archive download.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dist: Option<DistRef>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Homepage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    /// Authors.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<Author>,
    /// Keywords.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    /// Support links (forum, source, docs).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub support: BTreeMap<String, String>,
    /// No longer maintained upstream.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub abandoned: bool,
    /// Alias equivalences.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replaces: Vec<Link>,
    /// Any other fields supplied by defaults or overrides.
    #[serde(default, flatten)]
    pub extra: BTreeMap<String, sonic_rs::Value>,
}

impl PackageRecord {
    /// Minimal record: name, version, type and svn source.
    #[must_use]
    pub fn new(
        name: &PackageName,
        version: impl Into<String>,
        package_type: impl Into<String>,
        source_url: impl Into<String>,
        reference: impl Into<String>,
    ) -> Self {
        let version = version.into();
        let reference = reference.into();
        Self {
            name: name.to_string(),
            version_normalized: crate::version::normalize_strict(&version).ok(),
            version,
            package_type: package_type.into(),
            source: SourceRef {
                kind: "svn".to_string(),
                url: source_url.into(),
                reference: if reference.is_empty() {
                    "/".to_string()
                } else {
                    reference
                },
            },
            dist: None,
            description: None,
            homepage: None,
            authors: Vec::new(),
            keywords: Vec::new(),
            support: BTreeMap::new(),
            abandoned: false,
            replaces: Vec::new(),
            extra: BTreeMap::new(),
        }
    }

    /// Parsed package name.
    #[must_use]
    pub fn package_name(&self) -> Option<PackageName> {
        PackageName::parse(&self.name)
    }

    /// Set a support link.
    pub fn set_support(&mut self, kind: &str, url: impl Into<String>) {
        self.support.insert(kind.to_string(), url.into());
    }
}
