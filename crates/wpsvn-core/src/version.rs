//! Version normalization (Composer-compatible).
//!
//! Directory names found under `tags/` are rarely clean version numbers.
//! [`VersionNormalizer`] first checks a name against the Composer version
//! grammar, then tries a sanitizing pass, and finally gives up with a
//! fallback so that one odd tag never aborts discovery.

use crate::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Fallback used when a raw version cannot be repaired.
pub const DEFAULT_FALLBACK: &str = "dev-default";

/// Letter runs that survive sanitization.
const MODIFIER_TOKENS: &[&str] = &[
    "stable", "beta", "b", "rc", "alpha", "a", "patch", "pl", "p", "dev", "master", "trunk",
    "default",
];

const MODIFIER: &str =
    r"[._-]?(?:(stable|beta|b|RC|alpha|a|patch|pl|p)((?:[.-]?\d+)*)?)?([.-]?dev)?";

static CLASSICAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)^v?(\d{{1,5}})(\.\d+)?(\.\d+)?(\.\d+)?{MODIFIER}$"))
        .expect("invalid classical version regex")
});

static DATETIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)^v?(\d{{4}}(?:[.:-]?\d{{2}}){{1,6}}(?:[.:-]?\d{{1,3}}){{0,2}}){MODIFIER}$"
    ))
    .expect("invalid datetime version regex")
});

static STABILITY_TAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i){MODIFIER}(?:\+.*)?$")).expect("invalid stability regex")
});

static DEV_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(.*?)[.-]?dev$").expect("invalid dev suffix regex"));

static NUMERIC_BRANCH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^v?(\d+)(\.(?:\d+|[x*]))?(\.(?:\d+|[x*]))?(\.(?:\d+|[x*]))?$")
        .expect("invalid branch regex")
});

static STABILITY_FLAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)@(?:stable|rc|beta|alpha|dev)$").expect("invalid stability flag regex")
});

static ALIAS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^,\s]+) +as +[^,\s]+$").expect("invalid alias regex"));

static BUILD_METADATA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^,\s+]+)\+\S+$").expect("invalid build metadata regex"));

/// Package stability level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stability {
    /// Development version.
    Dev,
    /// Alpha version.
    Alpha,
    /// Beta version.
    Beta,
    /// Release candidate.
    Rc,
    /// Stable release.
    #[default]
    Stable,
}

impl fmt::Display for Stability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dev => write!(f, "dev"),
            Self::Alpha => write!(f, "alpha"),
            Self::Beta => write!(f, "beta"),
            Self::Rc => write!(f, "RC"),
            Self::Stable => write!(f, "stable"),
        }
    }
}

impl FromStr for Stability {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dev" => Ok(Self::Dev),
            "alpha" => Ok(Self::Alpha),
            "beta" => Ok(Self::Beta),
            "rc" => Ok(Self::Rc),
            "stable" => Ok(Self::Stable),
            _ => Err(Error::InvalidVersion(format!("unknown stability '{s}'"))),
        }
    }
}

impl Serialize for Stability {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Stability {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Stability of a version string, using Composer rules.
#[must_use]
pub fn parse_stability(version: &str) -> Stability {
    let version = version.split('#').next().unwrap_or_default();
    let lower = version.to_ascii_lowercase();
    if lower.starts_with("dev-") || lower.ends_with("-dev") {
        return Stability::Dev;
    }

    let Some(caps) = STABILITY_TAIL.captures(&lower) else {
        return Stability::Stable;
    };
    if caps.get(3).is_some_and(|m| !m.as_str().is_empty()) {
        return Stability::Dev;
    }
    match caps.get(1).map(|m| m.as_str()) {
        Some("beta" | "b") => Stability::Beta,
        Some("alpha" | "a") => Stability::Alpha,
        Some("rc") => Stability::Rc,
        _ => Stability::Stable,
    }
}

/// Which stabilities a consumer is willing to take.
#[derive(Debug, Clone, Default)]
pub struct StabilityPolicy {
    minimum: Option<Stability>,
    flags: HashMap<String, Stability>,
}

impl StabilityPolicy {
    /// Accept every stability.
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    /// Accept versions at or above `minimum`.
    #[must_use]
    pub fn minimum(minimum: Stability) -> Self {
        Self {
            minimum: Some(minimum),
            flags: HashMap::new(),
        }
    }

    /// Per-package override, keyed by bare provider name.
    #[must_use]
    pub fn with_flag(mut self, name: impl Into<String>, stability: Stability) -> Self {
        self.flags.insert(name.into(), stability);
        self
    }

    /// Whether a version of `name` with the given stability is acceptable.
    #[must_use]
    pub fn accepts(&self, name: &str, stability: Stability) -> bool {
        if let Some(flag) = self.flags.get(name) {
            return stability >= *flag;
        }
        self.minimum.is_none_or(|min| stability >= min)
    }
}

fn expand_stability(modifier: &str) -> String {
    match modifier.to_ascii_lowercase().as_str() {
        "a" => "alpha".to_string(),
        "b" => "beta".to_string(),
        "p" | "pl" => "patch".to_string(),
        "rc" => "RC".to_string(),
        other => other.to_string(),
    }
}

fn normalize_branch(name: &str) -> Option<String> {
    let caps = NUMERIC_BRANCH.captures(name.trim())?;
    let mut version = String::new();
    for i in 1..5 {
        match caps.get(i) {
            Some(m) => version.push_str(&m.as_str().replace(['*', 'X'], "x")),
            None => version.push_str(".x"),
        }
    }
    Some(format!("{}-dev", version.replace('x', "9999999")))
}

/// Normalize a version string to Composer's canonical form.
///
/// # Errors
/// Returns [`Error::InvalidVersion`] when the string is not a valid version.
pub fn normalize_strict(version: &str) -> Result<String> {
    let original = version;
    let mut version = version.trim().to_string();

    if let Some(aliased) = ALIAS.captures(&version).map(|c| c[1].to_string()) {
        version = aliased;
    }
    if let Some(m) = STABILITY_FLAG.find(&version) {
        version.truncate(m.start());
    }
    if matches!(version.as_str(), "master" | "trunk" | "default") {
        version = format!("dev-{version}");
    }
    if version.get(..4).is_some_and(|p| p.eq_ignore_ascii_case("dev-")) {
        return Ok(format!("dev-{}", &version[4..]));
    }
    if let Some(stripped) = BUILD_METADATA.captures(&version).map(|c| c[1].to_string()) {
        version = stripped;
    }

    let matched = if let Some(caps) = CLASSICAL.captures(&version) {
        let mut base = caps[1].to_string();
        for i in 2..5 {
            base.push_str(caps.get(i).map_or(".0", |m| m.as_str()));
        }
        Some((base, caps.get(5), caps.get(6), caps.get(7)))
    } else if let Some(caps) = DATETIME.captures(&version) {
        let base: String = caps[1]
            .chars()
            .map(|c| if c.is_ascii_digit() { c } else { '.' })
            .collect();
        Some((base, caps.get(2), caps.get(3), caps.get(4)))
    } else {
        None
    };

    if let Some((mut base, modifier, number, dev)) = matched {
        if let Some(modifier) = modifier.filter(|m| !m.as_str().is_empty()) {
            if modifier.as_str().eq_ignore_ascii_case("stable") {
                return Ok(base);
            }
            base.push('-');
            base.push_str(&expand_stability(modifier.as_str()));
            if let Some(number) = number {
                base.push_str(number.as_str().trim_start_matches(['.', '-']));
            }
        }
        if dev.is_some_and(|m| !m.as_str().is_empty()) {
            base.push_str("-dev");
        }
        return Ok(base);
    }

    if let Some(caps) = DEV_SUFFIX.captures(&version) {
        if let Some(branch) = normalize_branch(&caps[1]) {
            return Ok(branch);
        }
    }

    Err(Error::InvalidVersion(original.to_string()))
}

/// Whether the string passes the strict version grammar.
#[must_use]
pub fn is_valid(version: &str) -> bool {
    normalize_strict(version).is_ok()
}

/// Rewrite the literal `trunk` to `dev-trunk`.
#[must_use]
pub fn dev_trunk(version: &str) -> String {
    if version == "trunk" {
        "dev-trunk".to_string()
    } else {
        version.to_string()
    }
}

/// Drop everything outside `[.\-_a-zA-Z0-9]`, then drop letter runs that
/// start on a word boundary and are not modifier tokens.
fn sanitize(raw: &str) -> String {
    let kept: Vec<char> = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();

    let mut out = String::with_capacity(kept.len());
    let mut i = 0;
    while i < kept.len() {
        let c = kept[i];
        if !c.is_ascii_alphabetic() {
            out.push(c);
            i += 1;
            continue;
        }
        let start = i;
        while i < kept.len() && kept[i].is_ascii_alphabetic() {
            i += 1;
        }
        let run: String = kept[start..i].iter().collect();
        let at_boundary =
            start == 0 || !(kept[start - 1].is_ascii_alphanumeric() || kept[start - 1] == '_');
        let is_token = MODIFIER_TOKENS.iter().any(|t| t.eq_ignore_ascii_case(&run));
        if !at_boundary || is_token {
            out.push_str(&run);
        }
    }
    out
}

/// Turns raw VCS path fragments into resolver-parsable versions.
#[derive(Debug, Clone)]
pub struct VersionNormalizer {
    fallback: String,
}

impl Default for VersionNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_FALLBACK)
    }
}

impl VersionNormalizer {
    /// Create a normalizer with the given fallback sentinel.
    #[must_use]
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            fallback: fallback.into(),
        }
    }

    /// The fallback sentinel.
    #[must_use]
    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Repair a raw version without applying any filter.
    ///
    /// Valid input is returned unchanged; otherwise the sanitized form if it
    /// validates, else the fallback.
    #[must_use]
    pub fn fix(&self, raw: &str) -> String {
        if is_valid(raw) {
            return raw.to_string();
        }
        let cleaned = sanitize(raw);
        if is_valid(&cleaned) {
            debug!(raw = %raw, version = %cleaned, "sanitized version");
            return cleaned;
        }
        debug!(raw = %raw, fallback = %self.fallback, "unparsable version");
        self.fallback.clone()
    }

    /// Repair a raw version and apply the default `trunk` filter.
    #[must_use]
    pub fn normalize(&self, raw: &str) -> String {
        dev_trunk(&self.fix(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_examples() {
        let n = VersionNormalizer::default();
        assert_eq!(n.normalize("trunk"), "dev-trunk");
        assert_eq!(n.normalize("1.2.3"), "1.2.3");
        assert_eq!(n.normalize("1.2.3 beta"), "1.2.3beta");
        assert_eq!(n.normalize("???"), "dev-default");
    }

    #[test]
    fn custom_fallback() {
        let n = VersionNormalizer::new("");
        assert_eq!(n.normalize("not a version"), "");
    }

    #[test]
    fn sanitize_drops_unknown_words() {
        let n = VersionNormalizer::default();
        assert_eq!(n.fix("release 2.0"), "2.0");
        assert_eq!(n.fix("1.0 (final)"), "dev-default");
        assert_eq!(n.fix("2.1-RC1"), "2.1-RC1");
    }

    #[test]
    fn strict_normalization() {
        assert_eq!(normalize_strict("1.2").unwrap(), "1.2.0.0");
        assert_eq!(normalize_strict("v2.0.1").unwrap(), "2.0.1.0");
        assert_eq!(normalize_strict("1.0.0-beta2").unwrap(), "1.0.0.0-beta2");
        assert_eq!(normalize_strict("1.0rc1").unwrap(), "1.0.0.0-RC1");
        assert_eq!(normalize_strict("1.0-stable").unwrap(), "1.0.0.0");
        assert_eq!(normalize_strict("1.x-dev").unwrap(), "1.9999999.9999999.9999999-dev");
        assert_eq!(normalize_strict("trunk").unwrap(), "dev-trunk");
        assert_eq!(normalize_strict("dev-feature").unwrap(), "dev-feature");
        assert_eq!(normalize_strict("20240101").unwrap(), "20240101");
        assert!(normalize_strict("").is_err());
        assert!(normalize_strict("foo").is_err());
        assert!(normalize_strict("1.2.3 beta").is_err());
    }

    #[test]
    fn stability_parsing() {
        assert_eq!(parse_stability("1.0.0"), Stability::Stable);
        assert_eq!(parse_stability("dev-trunk"), Stability::Dev);
        assert_eq!(parse_stability("1.0-dev"), Stability::Dev);
        assert_eq!(parse_stability("1.0.0-beta2"), Stability::Beta);
        assert_eq!(parse_stability("1.0a1"), Stability::Alpha);
        assert_eq!(parse_stability("2.0-RC1"), Stability::Rc);
    }

    #[test]
    fn stability_policy() {
        let policy = StabilityPolicy::minimum(Stability::Stable).with_flag("foo", Stability::Dev);
        assert!(policy.accepts("bar", Stability::Stable));
        assert!(!policy.accepts("bar", Stability::Beta));
        assert!(policy.accepts("foo", Stability::Dev));
        assert!(StabilityPolicy::any().accepts("bar", Stability::Dev));
    }
}
