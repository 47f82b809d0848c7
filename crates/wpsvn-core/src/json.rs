//! sonic-rs wrappers returning the crate error.
//!
//! Cache entries, manifest sections and API payloads all pass through here.

use crate::{Error, Result};
use serde::{Serialize, de::DeserializeOwned};

/// Parse a JSON document.
///
/// # Errors
/// Returns [`Error::Json`] for malformed input or a shape mismatch.
pub fn from_json<T: DeserializeOwned>(s: &str) -> Result<T> {
    sonic_rs::from_str(s).map_err(Error::from)
}

/// Compact form, as written to the cache.
///
/// # Errors
/// Returns [`Error::Json`] if `value` cannot be serialized.
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    sonic_rs::to_string(value).map_err(Error::from)
}

/// Indented form for terminal output.
///
/// # Errors
/// Returns [`Error::Json`] if `value` cannot be serialized.
pub fn to_json_pretty<T: Serialize>(value: &T) -> Result<String> {
    sonic_rs::to_string_pretty(value).map_err(Error::from)
}

/// Convert between two serde representations of the same data.
///
/// # Errors
/// Returns error if `T` cannot be read back as `U`.
pub fn transcode<T: Serialize, U: DeserializeOwned>(value: &T) -> Result<U> {
    from_json(&to_json(value)?)
}
