//! Configuration errors.

use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while building repository configuration.
#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    /// None of the configured URLs carried a scheme.
    #[error("no valid URLs for repository '{repository}': {urls:?}")]
    #[diagnostic(
        code(wpsvn::config::no_valid_urls),
        help("repository URLs must be absolute, e.g. https://plugins.svn.wordpress.org/")
    )]
    NoValidUrls {
        /// Repository name.
        repository: String,
        /// URLs as configured.
        urls: Vec<String>,
    },

    /// Vendor resolution left no vendors.
    #[error("repository '{repository}' has no vendors")]
    #[diagnostic(
        code(wpsvn::config::no_vendors),
        help("declare at least one package type with a vendor, or re-enable a disabled vendor")
    )]
    NoVendors {
        /// Repository name.
        repository: String,
    },

    /// composer.json `extra` section is malformed.
    #[error("invalid manifest: {0}")]
    #[diagnostic(code(wpsvn::config::invalid_manifest))]
    InvalidManifest(String),

    /// A hook names a filter that does not exist.
    #[error("unknown filter '{0}'")]
    #[diagnostic(
        code(wpsvn::config::unknown_filter),
        help("known filters: identity, dev-trunk, constant, exclude, select, rc-suffix")
    )]
    UnknownFilter(String),

    /// A repository definition names a type nobody registered.
    #[error("unknown repository type '{0}'")]
    #[diagnostic(code(wpsvn::config::unknown_type), help("supported types: wp-svn"))]
    UnknownRepositoryType(String),

    /// JSON could not be decoded.
    #[error("json error: {0}")]
    #[diagnostic(code(wpsvn::config::json))]
    Json(String),
}

impl From<wpsvn_core::Error> for ConfigError {
    fn from(err: wpsvn_core::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type for configuration.
pub type Result<T> = std::result::Result<T, ConfigError>;
