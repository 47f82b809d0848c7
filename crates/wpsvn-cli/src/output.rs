//! Terminal output helpers.

use anyhow::Result;
use console::style;
use serde::Serialize;

/// Print an error to stderr.
pub fn error(message: &str) {
    eprintln!("{} {message}", style("error:").red().bold());
}

/// Print a dimmed note.
pub fn note(message: &str) {
    println!("{}", style(message).dim());
}

/// Print a section header.
pub fn header(title: &str) {
    println!("{}", style(title).cyan().bold());
}

/// Print `value` as pretty JSON.
pub fn json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", wpsvn_core::json::to_json_pretty(value)?);
    Ok(())
}
