//! Error types for listing operations.

use thiserror::Error;

/// Errors raised while talking to a Subversion server.
#[derive(Error, Debug)]
pub enum VcsError {
    /// The `svn` process could not be started or exited with failure.
    #[error("{command} failed: {message}")]
    Command {
        /// Command line, without secrets.
        command: String,
        /// stderr or spawn error.
        message: String,
        /// Exit code when the process ran.
        exit_code: Option<i32>,
    },

    /// The process did not finish before the deadline.
    #[error("listing {url} timed out after {seconds}s")]
    Timeout {
        /// URL being listed.
        url: String,
        /// Deadline in seconds.
        seconds: u64,
    },

    /// Path does not exist on the server.
    #[error("path not found: {url}")]
    NotFound {
        /// URL being listed.
        url: String,
    },

    /// Server refused the credentials.
    #[error("authentication failed for {url}: {reason}")]
    AuthenticationFailed {
        /// URL being listed.
        url: String,
        /// Server message.
        reason: String,
    },

    /// Server certificate was rejected and trust was not enabled.
    #[error("server certificate not trusted for {url}")]
    CertificateUntrusted {
        /// URL being listed.
        url: String,
    },

    /// Output was not valid UTF-8.
    #[error("invalid output from {url}: {message}")]
    InvalidOutput {
        /// URL being listed.
        url: String,
        /// Decode error.
        message: String,
    },
}

/// Result type for listing operations.
pub type Result<T> = std::result::Result<T, VcsError>;
