//! Core types for wpsvn: errors, version normalization, package records and
//! content hashing.

#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod hash;
pub mod json;
pub mod package;
pub mod version;

pub use error::{Error, Result};
pub use hash::ContentHash;
pub use package::{Author, DistRef, Link, PackageName, PackageRecord, SourceRef};
pub use version::{
    DEFAULT_FALLBACK, Stability, StabilityPolicy, VersionNormalizer, parse_stability,
};
