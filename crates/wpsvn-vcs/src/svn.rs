//! Subversion listing via the `svn` command line client.

use crate::error::{Result, VcsError};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Default deadline for a single `svn` invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Something that can list directory entries and read files at a URL.
pub trait ListingClient: Send + Sync + fmt::Debug {
    /// List the entry names directly under `url`.
    ///
    /// # Errors
    /// Returns error if the listing cannot be retrieved.
    fn list<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>>> + Send + 'a>>;

    /// Fetch the contents of a single file.
    ///
    /// # Errors
    /// Returns error if the file cannot be retrieved.
    fn cat<'a>(&'a self, url: &'a str) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;
}

/// Split an `svn ls` response into entry names.
///
/// Splitting on slashes as well as whitespace strips the trailing `/` that
/// marks directories.
#[must_use]
pub fn parse_svn_list(response: &str) -> Vec<String> {
    response
        .split([' ', '\n', '\r', '/'])
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// `svn` subprocess client.
#[derive(Debug, Clone)]
pub struct SvnClient {
    binary: String,
    trust_cert: bool,
    timeout: Duration,
}

impl Default for SvnClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SvnClient {
    /// Client using `svn` from `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            binary: "svn".to_string(),
            trust_cert: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Use a different executable.
    #[must_use]
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Accept unknown server certificates on `https` URLs without prompting.
    #[must_use]
    pub const fn with_trust_cert(mut self, trust: bool) -> Self {
        self.trust_cert = trust;
        self
    }

    /// Deadline for each invocation.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check if the client binary is available.
    pub async fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .await
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Arguments for `svn <subcommand> <url>`.
    #[must_use]
    pub fn command_args(&self, subcommand: &str, url: &str) -> Vec<String> {
        let mut args = vec![subcommand.to_string()];
        let secure = url.get(..5).is_some_and(|s| s.eq_ignore_ascii_case("https"));
        if secure && self.trust_cert {
            args.push("--non-interactive".to_string());
            args.push("--trust-server-cert".to_string());
        }
        args.push(url.to_string());
        args
    }

    async fn execute(&self, subcommand: &str, url: &str) -> Result<String> {
        let args = self.command_args(subcommand, url);
        let command = format!("{} {subcommand}", self.binary);
        debug!(command = %command, url = %url, "svn");

        let child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| VcsError::Timeout {
                url: url.to_string(),
                seconds: self.timeout.as_secs(),
            })?
            .map_err(|e| VcsError::Command {
                command: command.clone(),
                message: e.to_string(),
                exit_code: None,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(parse_svn_error(&command, &stderr, url, output.status.code()));
        }

        String::from_utf8(output.stdout).map_err(|e| VcsError::InvalidOutput {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

/// Classify `svn` stderr output.
fn parse_svn_error(command: &str, stderr: &str, url: &str, exit_code: Option<i32>) -> VcsError {
    let lower = stderr.to_lowercase();

    if lower.contains("e170000")
        || lower.contains("w160013")
        || lower.contains("non-existent")
        || lower.contains("path not found")
    {
        return VcsError::NotFound {
            url: url.to_string(),
        };
    }

    if lower.contains("e230001") || lower.contains("certificate verification failed") {
        return VcsError::CertificateUntrusted {
            url: url.to_string(),
        };
    }

    if lower.contains("e170001") || lower.contains("authorization failed") {
        return VcsError::AuthenticationFailed {
            url: url.to_string(),
            reason: stderr.trim().to_string(),
        };
    }

    VcsError::Command {
        command: command.to_string(),
        message: stderr.trim().to_string(),
        exit_code,
    }
}

impl ListingClient for SvnClient {
    fn list<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>>> + Send + 'a>> {
        Box::pin(async move {
            let raw = self.execute("ls", url).await?;
            Ok(parse_svn_list(&raw))
        })
    }

    fn cat<'a>(&'a self, url: &'a str) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(self.execute("cat", url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_list_strips_slashes() {
        let raw = "akismet/\r\nhello-dolly/\njetpack/\n";
        assert_eq!(parse_svn_list(raw), vec!["akismet", "hello-dolly", "jetpack"]);
        assert!(parse_svn_list("").is_empty());
        assert!(parse_svn_list("\n/\n").is_empty());
    }

    #[test]
    fn trust_cert_only_for_https() {
        let trusting = SvnClient::new().with_trust_cert(true);
        assert_eq!(
            trusting.command_args("ls", "https://themes.svn.wordpress.org"),
            vec!["ls", "--non-interactive", "--trust-server-cert", "https://themes.svn.wordpress.org"]
        );
        assert_eq!(
            trusting.command_args("ls", "svn://example.org/repo"),
            vec!["ls", "svn://example.org/repo"]
        );
        assert_eq!(
            SvnClient::new().command_args("ls", "https://x.test"),
            vec!["ls", "https://x.test"]
        );
    }

    #[test]
    fn classify_errors() {
        let url = "https://x.test/missing";
        assert!(matches!(
            parse_svn_error("svn ls", "svn: E170000: URL 'https://x.test/missing' non-existent", url, Some(1)),
            VcsError::NotFound { .. }
        ));
        assert!(matches!(
            parse_svn_error("svn ls", "svn: E230001: Server SSL certificate verification failed", url, Some(1)),
            VcsError::CertificateUntrusted { .. }
        ));
        assert!(matches!(
            parse_svn_error("svn ls", "svn: E170001: Authorization failed", url, Some(1)),
            VcsError::AuthenticationFailed { .. }
        ));
        assert!(matches!(
            parse_svn_error("svn ls", "svn: E999: boom", url, Some(1)),
            VcsError::Command { exit_code: Some(1), .. }
        ));
    }

    #[tokio::test]
    async fn missing_binary_is_command_error() {
        let client = SvnClient::new().with_binary("wpsvn-definitely-not-installed");
        let err = client.list("https://x.test/").await.unwrap_err();
        assert!(matches!(err, VcsError::Command { exit_code: None, .. }));
        assert!(!client.is_available().await);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn list_runs_the_binary() {
        // `echo` prints its arguments, which exercises spawning and parsing.
        let client = SvnClient::new().with_binary("echo").with_trust_cert(true);
        let items = client.list("https://x.test/plugins").await.unwrap();
        assert_eq!(
            items,
            vec!["ls", "--non-interactive", "--trust-server-cert", "https:", "x.test", "plugins"]
        );
    }
}
