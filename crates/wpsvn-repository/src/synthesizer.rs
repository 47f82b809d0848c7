//! Package record synthesis.
//!
//! Each discovered version becomes one [`PackageRecord`]:
//!
//! 1. base record: name, version, type and svn source
//! 2. configured defaults fill fields the base lacks
//! 3. configured overrides replace fields
//! 4. `replaces` links to every other vendor of the same type
//! 5. the repository's package filter hook enriches the record

use crate::error::{RepositoryError, Result};
use crate::hooks::{HookContext, PackageOrigin, RepositoryHooks};
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};
use wpsvn_config::VendorMap;
use wpsvn_core::{Link, PackageName, PackageRecord};

/// One version found under a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionEntry {
    /// Normalized version.
    pub version: String,
    /// Checkout URL, with trailing slash.
    pub source_url: String,
    /// Path under `source_url`; empty means the root.
    pub reference: String,
}

/// Builds package records for one repository.
#[derive(Debug, Clone)]
pub struct PackageSynthesizer {
    vendors: Arc<VendorMap>,
    defaults: IndexMap<String, sonic_rs::Value>,
    overrides: IndexMap<String, sonic_rs::Value>,
    hooks: Arc<dyn RepositoryHooks>,
}

impl PackageSynthesizer {
    /// Create a synthesizer.
    #[must_use]
    pub fn new(
        vendors: Arc<VendorMap>,
        defaults: IndexMap<String, sonic_rs::Value>,
        overrides: IndexMap<String, sonic_rs::Value>,
        hooks: Arc<dyn RepositoryHooks>,
    ) -> Self {
        Self {
            vendors,
            defaults,
            overrides,
            hooks,
        }
    }

    /// Steps 1 to 4: everything except the package filter.
    ///
    /// # Errors
    /// Returns [`RepositoryError::InvalidPackage`] if the vendor is unknown
    /// or defaults and overrides produce something that is not a package.
    pub fn build(&self, name: &PackageName, entry: &VersionEntry) -> Result<PackageRecord> {
        let invalid = |message: String| RepositoryError::InvalidPackage {
            name: name.to_string(),
            version: entry.version.clone(),
            message,
        };

        let package_type = self
            .vendors
            .type_of(name.vendor())
            .ok_or_else(|| invalid(format!("vendor '{}' is not served here", name.vendor())))?;

        let base = PackageRecord::new(
            name,
            entry.version.clone(),
            package_type,
            entry.source_url.clone(),
            entry.reference.clone(),
        );

        let mut record = if self.defaults.is_empty() && self.overrides.is_empty() {
            base
        } else {
            let mut fields: BTreeMap<String, sonic_rs::Value> =
                wpsvn_core::json::transcode(&base).map_err(|e| invalid(e.to_string()))?;
            for (key, value) in &self.defaults {
                fields.entry(key.clone()).or_insert_with(|| value.clone());
            }
            for (key, value) in &self.overrides {
                fields.insert(key.clone(), value.clone());
            }
            let mut merged: PackageRecord =
                wpsvn_core::json::transcode(&fields).map_err(|e| invalid(e.to_string()))?;
            merged.version_normalized = wpsvn_core::version::normalize_strict(&merged.version).ok();
            merged
        };

        if self.vendors.len() > 1 {
            let constraint = format!(
                "= {}",
                record
                    .version_normalized
                    .as_deref()
                    .unwrap_or(record.version.as_str())
            );
            record.replaces = self
                .vendors
                .aliases_of(name.vendor())
                .map(|alias| Link {
                    source: record.name.clone(),
                    target: name.with_vendor(alias).to_string(),
                    constraint: constraint.clone(),
                    description: format!("'{package_type}' alias for"),
                })
                .collect();
        }

        Ok(record)
    }

    /// All steps. A failing package filter is logged and the record is
    /// returned as built.
    ///
    /// # Errors
    /// Returns error if the record cannot be built.
    pub async fn synthesize(
        &self,
        name: &PackageName,
        entry: &VersionEntry,
        provider_url: &str,
        ctx: HookContext<'_>,
    ) -> Result<PackageRecord> {
        let mut record = self.build(name, entry)?;
        let origin = PackageOrigin {
            provider: name.name(),
            provider_url,
        };
        if let Err(e) = self.hooks.filter_package(&mut record, origin, ctx).await {
            warn!(
                package = %name,
                version = %entry.version,
                error = %e,
                "package filter failed, keeping package as built"
            );
        } else {
            debug!(package = %name, version = %entry.version, "package synthesized");
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::NoHooks;
    use std::future::Future;
    use std::pin::Pin;
    use wpsvn_config::VendorOverrides;

    fn vendors(pairs: &[(&str, &[&str])], overrides: &VendorOverrides) -> Arc<VendorMap> {
        let types = pairs
            .iter()
            .map(|(t, vs)| (t.to_string(), vs.iter().map(|v| v.to_string()).collect()))
            .collect();
        Arc::new(VendorMap::resolve(&types, overrides, "test").unwrap())
    }

    fn entry(version: &str, reference: &str) -> VersionEntry {
        VersionEntry {
            version: version.to_string(),
            source_url: "https://x.test/plugins/foo/".to_string(),
            reference: reference.to_string(),
        }
    }

    fn ctx() -> HookContext<'static> {
        HookContext {
            repository: "test",
            default_vendor: "A",
            urls: &[],
        }
    }

    #[test]
    fn replaces_only_same_type_vendors() {
        let map = vendors(
            &[("typeX", &["A"]), ("typeY", &["C"])],
            &VendorOverrides::default().alias("B", "typeX"),
        );
        let synth = PackageSynthesizer::new(map, IndexMap::new(), IndexMap::new(), Arc::new(NoHooks));
        let record = synth
            .build(&PackageName::new("A", "foo"), &entry("1.0", "tags/1.0"))
            .unwrap();

        assert_eq!(record.package_type, "typeX");
        assert_eq!(record.replaces.len(), 1);
        let link = &record.replaces[0];
        assert_eq!(link.source, "A/foo");
        assert_eq!(link.target, "B/foo");
        assert_eq!(link.constraint, "= 1.0.0.0");
        assert_eq!(link.description, "'typeX' alias for");
    }

    #[test]
    fn single_vendor_has_no_replaces() {
        let map = vendors(&[("typeX", &["A"])], &VendorOverrides::default());
        let synth = PackageSynthesizer::new(map, IndexMap::new(), IndexMap::new(), Arc::new(NoHooks));
        let record = synth
            .build(&PackageName::new("A", "foo"), &entry("1.0", "tags/1.0"))
            .unwrap();
        assert!(record.replaces.is_empty());
    }

    #[test]
    fn defaults_fill_gaps_and_overrides_win() {
        let map = vendors(&[("typeX", &["A"])], &VendorOverrides::default());
        let defaults = IndexMap::from([
            ("license".to_string(), sonic_rs::Value::from("GPL-2.0-or-later")),
            ("version".to_string(), sonic_rs::Value::from("9.9")),
        ]);
        let overrides = IndexMap::from([(
            "description".to_string(),
            sonic_rs::Value::from("Forced"),
        )]);
        let synth = PackageSynthesizer::new(map, defaults, overrides, Arc::new(NoHooks));
        let record = synth
            .build(&PackageName::new("A", "foo"), &entry("1.0", "tags/1.0"))
            .unwrap();

        assert_eq!(record.version, "1.0");
        assert_eq!(record.description.as_deref(), Some("Forced"));
        assert!(record.extra.contains_key("license"));
    }

    #[test]
    fn broken_override_is_a_construction_error() {
        let map = vendors(&[("typeX", &["A"])], &VendorOverrides::default());
        let overrides = IndexMap::from([("source".to_string(), sonic_rs::Value::from("nope"))]);
        let synth = PackageSynthesizer::new(map, IndexMap::new(), overrides, Arc::new(NoHooks));
        let err = synth
            .build(&PackageName::new("A", "foo"), &entry("1.0", "tags/1.0"))
            .unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidPackage { .. }));
    }

    #[derive(Debug)]
    struct FailingFilter;

    impl RepositoryHooks for FailingFilter {
        fn filter_package<'a>(
            &'a self,
            package: &'a mut PackageRecord,
            _origin: PackageOrigin<'a>,
            _ctx: HookContext<'a>,
        ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
            Box::pin(async move {
                package.description = Some("half done".into());
                Err(RepositoryError::Network {
                    url: "https://api.test".into(),
                    message: "down".into(),
                    status: None,
                })
            })
        }
    }

    #[tokio::test]
    async fn failing_filter_still_emits() {
        let map = vendors(&[("typeX", &["A"])], &VendorOverrides::default());
        let synth = PackageSynthesizer::new(map, IndexMap::new(), IndexMap::new(), Arc::new(FailingFilter));
        let record = synth
            .synthesize(
                &PackageName::new("A", "foo"),
                &entry("2.0", "tags/2.0"),
                "https://x.test/plugins/foo",
                ctx(),
            )
            .await
            .unwrap();
        assert_eq!(record.version, "2.0");
        assert_eq!(record.source.reference, "tags/2.0");
    }
}
