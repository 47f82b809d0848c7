//! Shared state for commands: settings and the activated repositories.

use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use wpsvn_config::{GlobalSettings, PluginSettings};
use wpsvn_repository::{Activation, RepositoryManager, RepositoryRegistry, WordPressApi};
use wpsvn_vcs::SvnClient;

/// Arguments that shape the context.
#[derive(Debug, Clone)]
pub struct ContextArgs {
    /// composer.json path.
    pub manifest: PathBuf,
    /// Cache root override.
    pub cache_dir: Option<PathBuf>,
    /// JSON output.
    pub json: bool,
}

/// Context built once per invocation.
#[derive(Debug)]
pub struct Context {
    /// Plugin settings from the manifest.
    pub settings: PluginSettings,
    /// Cache location and lifetimes.
    pub global: GlobalSettings,
    /// JSON output requested.
    pub json: bool,
}

impl Context {
    /// Read the manifest and environment.
    pub fn new(args: &ContextArgs) -> Result<Self> {
        let settings = load_settings(&args.manifest)?;
        let mut global = GlobalSettings::from_env();
        if let Some(dir) = &args.cache_dir {
            global = global.with_cache_dir(dir);
        }
        debug!(cache = %global.cache_repo_dir.display(), "settings loaded");
        Ok(Self {
            settings,
            global,
            json: args.json,
        })
    }

    /// Activate every enabled repository.
    pub async fn manager(&self) -> Result<RepositoryManager> {
        if !SvnClient::new().is_available().await {
            warn!("svn executable not found on PATH, listings will fail");
        }
        let api = WordPressApi::new().context("Failed to create HTTP client")?;
        let registry = RepositoryRegistry::new(api);
        let activation = Activation::new(&self.global, &self.settings.vendors);
        RepositoryManager::activate(&self.settings, &registry, &activation)
            .context("Failed to activate repositories")
    }
}

/// A missing manifest means the default repositories.
fn load_settings(path: &Path) -> Result<PluginSettings> {
    if !path.exists() {
        debug!(path = %path.display(), "no manifest, using defaults");
        return Ok(PluginSettings::default());
    }
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    PluginSettings::from_manifest(&json).with_context(|| format!("Invalid {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wpsvn_config::BuiltinKind;

    #[test]
    fn missing_manifest_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings(&dir.path().join("composer.json")).unwrap();
        assert_eq!(settings, PluginSettings::default());
    }

    #[test]
    fn manifest_settings_are_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("composer.json");
        std::fs::write(
            &path,
            r#"{"extra": {"composer-wp": {"repositories": [{"themes": true}]}}}"#,
        )
        .unwrap();
        let settings = load_settings(&path).unwrap();
        assert!(settings.builtins.contains_key(&BuiltinKind::Themes));
    }

    #[test]
    fn malformed_manifest_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("composer.json");
        std::fs::write(&path, r#"{"extra": {"composer-wp": {"repositories": {}}}}"#).unwrap();
        let err = load_settings(&path).unwrap_err();
        assert!(err.to_string().contains("composer.json"));
    }

    #[test]
    fn cache_dir_override() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context::new(&ContextArgs {
            manifest: dir.path().join("composer.json"),
            cache_dir: Some(dir.path().join("cache")),
            json: true,
        })
        .unwrap();
        assert_eq!(ctx.global.cache_repo_dir, dir.path().join("cache"));
        assert!(ctx.json);
    }
}
