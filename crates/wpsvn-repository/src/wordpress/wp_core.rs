//! WordPress core and develop trees.

use super::api::encode;
use crate::error::Result;
use crate::hooks::{HookContext, PackageOrigin, RepositoryHooks};
use std::future::Future;
use std::pin::Pin;
use wpsvn_core::{DistRef, PackageRecord};

const CORE_DESCRIPTION: &str =
    "WordPress is web software you can use to create a beautiful website, blog, or app.";
const DEVELOP_DESCRIPTION: &str =
    "WordPress develop repo offering source files, unit tests, and i18n tools.";
const HOMEPAGE: &str = "https://wordpress.org/";

/// Which tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tree {
    Core,
    Develop,
}

/// Package filter for `core` and `develop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreHooks {
    tree: Tree,
}

impl CoreHooks {
    /// Release builds: archives, support links.
    #[must_use]
    pub const fn core() -> Self {
        Self { tree: Tree::Core }
    }

    /// Development tree: description and homepage only.
    #[must_use]
    pub const fn develop() -> Self {
        Self {
            tree: Tree::Develop,
        }
    }

    fn decorate(self, package: &mut PackageRecord, checkout: &str) {
        package.homepage = Some(HOMEPAGE.to_string());
        if self.tree == Tree::Develop {
            package.description = Some(DEVELOP_DESCRIPTION.to_string());
            return;
        }

        let version = checkout.replace("tags", "").replace(['/', ' '], "");
        // trunk has no release archive
        if !version.is_empty() && version != "trunk" {
            package.dist = Some(DistRef::zip(format!(
                "https://wordpress.org/wordpress-{}.zip",
                encode(&version)
            )));
        }
        package.description = Some(CORE_DESCRIPTION.to_string());
        package.set_support("forum", "https://wordpress.org/support/");
        package.set_support("source", format!("https://core.trac.wordpress.org/browser/{checkout}"));
        package.set_support("docs", "https://codex.wordpress.org/Main_Page");
    }
}

impl RepositoryHooks for CoreHooks {
    fn filter_package<'a>(
        &'a self,
        package: &'a mut PackageRecord,
        origin: PackageOrigin<'a>,
        _ctx: HookContext<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        let checkout = origin.checkout_path(package);
        self.decorate(package, &checkout);
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wpsvn_core::PackageName;

    const BASE: &str = "https://core.svn.wordpress.org";

    fn ctx() -> HookContext<'static> {
        HookContext {
            repository: "core",
            default_vendor: "wordpress",
            urls: &[],
        }
    }

    fn origin() -> PackageOrigin<'static> {
        PackageOrigin {
            provider: "wordpress",
            provider_url: BASE,
        }
    }

    fn package(version: &str, url: &str, reference: &str) -> PackageRecord {
        let name = PackageName::new("wordpress", "wordpress");
        PackageRecord::new(&name, version, "wordpress-core", url, reference)
    }

    #[tokio::test]
    async fn releases_get_archives() {
        let mut release = package("6.4.2", &format!("{BASE}/"), "tags/6.4.2");
        CoreHooks::core()
            .filter_package(&mut release, origin(), ctx())
            .await
            .unwrap();
        assert_eq!(
            release.dist.map(|d| d.url).as_deref(),
            Some("https://wordpress.org/wordpress-6.4.2.zip")
        );
        assert_eq!(
            release.support.get("source").map(String::as_str),
            Some("https://core.trac.wordpress.org/browser/tags/6.4.2")
        );
        assert_eq!(release.homepage.as_deref(), Some(HOMEPAGE));
    }

    #[tokio::test]
    async fn trunk_has_no_archive() {
        let mut trunk = package("dev-trunk", &format!("{BASE}/trunk/"), "");
        CoreHooks::core()
            .filter_package(&mut trunk, origin(), ctx())
            .await
            .unwrap();
        assert!(trunk.dist.is_none());
        assert_eq!(trunk.description.as_deref(), Some(CORE_DESCRIPTION));
        assert_eq!(
            trunk.support.get("source").map(String::as_str),
            Some("https://core.trac.wordpress.org/browser/trunk")
        );
    }

    #[tokio::test]
    async fn develop_only_describes() {
        let mut release = package("6.4.2", &format!("{BASE}/"), "tags/6.4.2");
        CoreHooks::develop()
            .filter_package(&mut release, origin(), ctx())
            .await
            .unwrap();
        assert!(release.dist.is_none());
        assert!(release.support.is_empty());
        assert_eq!(release.description.as_deref(), Some(DEVELOP_DESCRIPTION));
    }
}
