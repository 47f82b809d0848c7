//! CLI commands for wpsvn.

pub mod providers;
pub mod search;
pub mod show;

use crate::context::ContextArgs;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// wpsvn - SVN trees as virtual Composer repositories
#[derive(Parser, Debug)]
#[command(name = "wpsvn")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// composer.json holding the `extra.composer-wp` settings
    #[arg(long, global = true, default_value = "composer.json")]
    pub manifest: PathBuf,

    /// Cache root (defaults to `$COMPOSER_CACHE_DIR/repo`)
    #[arg(long, global = true, env = "WPSVN_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Arguments shared by every command.
    pub fn to_context_args(&self) -> ContextArgs {
        ContextArgs {
            manifest: self.manifest.clone(),
            cache_dir: self.cache_dir.clone(),
            json: self.json,
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List every package the active repositories provide
    Providers(providers::ProvidersArgs),

    /// Show every version of a package
    Show(show::ShowArgs),

    /// Search the active repositories
    Search(search::SearchArgs),
}
