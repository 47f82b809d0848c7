//! Name and version filter hooks.
//!
//! A hook is either absent ([`Hook::Noop`]), a named filter called with the
//! value followed by its context ([`Hook::Simple`]), or a named filter called
//! with a fixed argument list in which `$arg[N]` placeholders are replaced by
//! the N-th call argument ([`Hook::Bound`]).
//!
//! In JSON a hook is written as `"dev-trunk"`, as
//! `["exclude", ["$arg[0]", ".ignore"]]`, or as `false` to disable it.
//!
//! Filters return `None` (or an empty string) to drop the value.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Signature shared by all named filters.
pub type FilterFn = fn(&[String]) -> Option<String>;

/// A filter function with a stable name.
#[derive(Clone, Copy)]
pub struct NamedFilter {
    name: &'static str,
    func: FilterFn,
}

impl NamedFilter {
    /// Filter name as used in configuration.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Call the filter.
    #[must_use]
    pub fn call(&self, args: &[String]) -> Option<String> {
        (self.func)(args)
    }
}

impl fmt::Debug for NamedFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NamedFilter").field(&self.name).finish()
    }
}

impl PartialEq for NamedFilter {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for NamedFilter {}

fn first(args: &[String]) -> Option<String> {
    args.first().cloned()
}

fn dev_trunk(args: &[String]) -> Option<String> {
    args.first().map(|v| wpsvn_core::version::dev_trunk(v))
}

/// `[value, excluded...]`: the value unless it is one of the excluded names.
fn exclude(args: &[String]) -> Option<String> {
    let (value, excluded) = args.split_first()?;
    if excluded.contains(value) {
        None
    } else {
        Some(value.clone())
    }
}

/// `[value, wanted, replacement?]`: only `wanted` passes, optionally renamed.
fn select(args: &[String]) -> Option<String> {
    match args {
        [value, wanted, rest @ ..] if value == wanted => {
            Some(rest.first().cloned().unwrap_or_else(|| value.clone()))
        }
        _ => None,
    }
}

/// `[name, rel_path, ...]`: drops the `release-candidates` directory itself
/// and suffixes providers listed inside it with `-rc`.
fn rc_suffix(args: &[String]) -> Option<String> {
    let name = args.first()?;
    if name == "release-candidates" {
        return None;
    }
    if args.get(1).is_some_and(|path| path == "release-candidates/") {
        return Some(format!("{name}-rc"));
    }
    Some(name.clone())
}

/// Passes the first argument through.
pub const IDENTITY: NamedFilter = NamedFilter {
    name: "identity",
    func: first,
};

/// Rewrites `trunk` to `dev-trunk`.
pub const DEV_TRUNK: NamedFilter = NamedFilter {
    name: "dev-trunk",
    func: dev_trunk,
};

/// Returns its first bound argument regardless of the value.
pub const CONSTANT: NamedFilter = NamedFilter {
    name: "constant",
    func: first,
};

/// Drops excluded names.
pub const EXCLUDE: NamedFilter = NamedFilter {
    name: "exclude",
    func: exclude,
};

/// Keeps one name, optionally renaming it.
pub const SELECT: NamedFilter = NamedFilter {
    name: "select",
    func: select,
};

/// Suffixes release candidates.
pub const RC_SUFFIX: NamedFilter = NamedFilter {
    name: "rc-suffix",
    func: rc_suffix,
};

const FILTERS: [NamedFilter; 6] = [IDENTITY, DEV_TRUNK, CONSTANT, EXCLUDE, SELECT, RC_SUFFIX];

/// Look up a named filter.
///
/// # Errors
/// Returns [`ConfigError::UnknownFilter`] for unknown names.
pub fn filter(name: &str) -> Result<NamedFilter> {
    FILTERS
        .iter()
        .find(|f| f.name == name)
        .copied()
        .ok_or_else(|| ConfigError::UnknownFilter(name.to_string()))
}

/// One entry of a bound argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookArg {
    /// `$arg[N]`: the N-th call argument.
    Placeholder(usize),
    /// Passed as-is.
    Literal(String),
}

impl HookArg {
    /// Parse `$arg[N]` placeholders; everything else is literal.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        raw.strip_prefix("$arg[")
            .and_then(|rest| rest.strip_suffix(']'))
            .and_then(|n| n.parse().ok())
            .map_or_else(|| Self::Literal(raw.to_string()), Self::Placeholder)
    }

    fn resolve(&self, args: &[String]) -> String {
        match self {
            Self::Placeholder(n) => args
                .get(*n)
                .cloned()
                .unwrap_or_else(|| format!("$arg[{n}]")),
            Self::Literal(s) => s.clone(),
        }
    }
}

impl fmt::Display for HookArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Placeholder(n) => write!(f, "$arg[{n}]"),
            Self::Literal(s) => f.write_str(s),
        }
    }
}

/// A configurable filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Hook {
    /// Pass the value through unchanged.
    #[default]
    Noop,
    /// Call the filter with `[value, context...]`.
    Simple(NamedFilter),
    /// Call the filter with the bound arguments.
    Bound {
        /// Filter to call.
        filter: NamedFilter,
        /// Argument template.
        args: Vec<HookArg>,
    },
}

impl Hook {
    /// Hook for a named filter.
    ///
    /// # Errors
    /// Returns error for unknown filter names.
    pub fn named(name: &str) -> Result<Self> {
        Ok(Self::Simple(filter(name)?))
    }

    /// Hook for a named filter with bound arguments.
    ///
    /// # Errors
    /// Returns error for unknown filter names.
    pub fn bound<S: AsRef<str>>(name: &str, args: &[S]) -> Result<Self> {
        Ok(Self::with_args(filter(name)?, args))
    }

    /// Bind arguments to a known filter.
    #[must_use]
    pub fn with_args<S: AsRef<str>>(filter: NamedFilter, args: &[S]) -> Self {
        Self::Bound {
            filter,
            args: args.iter().map(|a| HookArg::parse(a.as_ref())).collect(),
        }
    }

    /// The default version filter.
    #[must_use]
    pub fn dev_trunk() -> Self {
        Self::Simple(DEV_TRUNK)
    }

    /// Apply the hook. `None` means the value was filtered out.
    #[must_use]
    pub fn apply(&self, value: &str, context: &[&str]) -> Option<String> {
        let args: Vec<String> = std::iter::once(value)
            .chain(context.iter().copied())
            .map(str::to_string)
            .collect();
        let out = match self {
            Self::Noop => Some(value.to_string()),
            Self::Simple(filter) => filter.call(&args),
            Self::Bound {
                filter,
                args: template,
            } => {
                let resolved: Vec<String> = template.iter().map(|a| a.resolve(&args)).collect();
                filter.call(&resolved)
            }
        };
        out.filter(|v| !v.is_empty())
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum HookRepr {
    Flag(bool),
    Name(String),
    Bound(String, Vec<String>),
}

impl Serialize for Hook {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let repr = match self {
            Self::Noop => HookRepr::Flag(false),
            Self::Simple(filter) => HookRepr::Name(filter.name.to_string()),
            Self::Bound { filter, args } => HookRepr::Bound(
                filter.name.to_string(),
                args.iter().map(ToString::to_string).collect(),
            ),
        };
        repr.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Hook {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match HookRepr::deserialize(deserializer)? {
            HookRepr::Flag(false) => Ok(Self::Noop),
            HookRepr::Flag(true) => Err(serde::de::Error::custom(
                "a hook must be a filter name, [name, [args]] or false",
            )),
            HookRepr::Name(name) => Self::named(&name).map_err(serde::de::Error::custom),
            HookRepr::Bound(name, args) => Self::bound(&name, &args).map_err(serde::de::Error::custom),
        }
    }
}
