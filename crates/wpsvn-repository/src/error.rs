//! Repository-specific error types.

use std::fmt;
use wpsvn_config::ConfigError;
use wpsvn_core::Error as CoreError;
use wpsvn_vcs::VcsError;

/// Repository-specific errors.
#[derive(Debug)]
pub enum RepositoryError {
    /// Repository configuration is unusable.
    Config(ConfigError),
    /// Listing a provider root failed; the repository cannot be activated.
    ProviderListing {
        /// URL that was listed.
        url: String,
        /// Underlying transport error.
        source: VcsError,
    },
    /// Listing the versions of one provider failed.
    PackageListing {
        /// Vendor-qualified name that was requested.
        name: String,
        /// URL that was listed.
        url: String,
        /// Underlying transport error.
        source: VcsError,
    },
    /// A package record could not be built.
    InvalidPackage {
        /// Package name.
        name: String,
        /// Version being built.
        version: String,
        /// Error message.
        message: String,
    },
    /// Network error talking to a metadata API.
    Network {
        /// URL that failed.
        url: String,
        /// Error message.
        message: String,
        /// HTTP status code if available.
        status: Option<u16>,
    },
    /// JSON parsing error.
    ParseError {
        /// URL or source of the JSON.
        source: String,
        /// Error message.
        message: String,
    },
    /// Cache error.
    Cache {
        /// Error message.
        message: String,
    },
    /// No factory registered for a repository type.
    UnknownType {
        /// The requested type tag.
        repo_type: String,
    },
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::ProviderListing { url, source } => {
                write!(f, "SVN Error: Could not retrieve provider listing from {url}: {source}")
            }
            Self::PackageListing { name, url, source } => {
                write!(
                    f,
                    "SVN Error: Could not retrieve package listing for {name} from {url}: {source}"
                )
            }
            Self::InvalidPackage {
                name,
                version,
                message,
            } => {
                write!(f, "Could not build {name} {version}: {message}")
            }
            Self::Network {
                url,
                message,
                status,
            } => {
                if let Some(code) = status {
                    write!(f, "HTTP {code} from {url}: {message}")
                } else {
                    write!(f, "Network error fetching {url}: {message}")
                }
            }
            Self::ParseError { source, message } => {
                write!(f, "Failed to parse response from {source}: {message}")
            }
            Self::Cache { message } => {
                write!(f, "Cache error: {message}")
            }
            Self::UnknownType { repo_type } => {
                write!(f, "Unknown repository type '{repo_type}'")
            }
        }
    }
}

impl RepositoryError {
    /// Whether this error means the repository itself is unusable, as
    /// opposed to one query against it failing.
    #[must_use]
    pub const fn is_activation(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::ProviderListing { .. } | Self::UnknownType { .. }
        )
    }
}

impl std::error::Error for RepositoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::ProviderListing { source, .. } | Self::PackageListing { source, .. } => {
                Some(source)
            }
            _ => None,
        }
    }
}

impl From<ConfigError> for RepositoryError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<CoreError> for RepositoryError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Json(e) => Self::ParseError {
                source: "json".to_string(),
                message: e.to_string(),
            },
            other => Self::Cache {
                message: other.to_string(),
            },
        }
    }
}

impl From<reqwest::Error> for RepositoryError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            url: err.url().map(ToString::to_string).unwrap_or_default(),
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_errors_name_the_url() {
        let err = RepositoryError::ProviderListing {
            url: "https://x.test/plugins".into(),
            source: VcsError::NotFound {
                url: "https://x.test/plugins".into(),
            },
        };
        let msg = err.to_string();
        assert!(msg.starts_with("SVN Error: Could not retrieve provider listing from https://x.test/plugins"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn network_error_display() {
        let err = RepositoryError::Network {
            url: "https://api.test".into(),
            message: "boom".into(),
            status: Some(500),
        };
        assert_eq!(err.to_string(), "HTTP 500 from https://api.test: boom");
    }
}
