//! Remote listing for wpsvn.
//!
//! The repository engine only needs two operations from a version control
//! server: list a directory and read a file. [`ListingClient`] captures
//! that; [`SvnClient`] implements it by running `svn ls` / `svn cat` under a
//! deadline.

#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod svn;

pub use error::{Result, VcsError};
pub use svn::{DEFAULT_TIMEOUT, ListingClient, SvnClient, parse_svn_list};
