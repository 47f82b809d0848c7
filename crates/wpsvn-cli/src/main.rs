//! wpsvn - browse WordPress-style SVN trees as Composer repositories.
//!
//! Reads the `extra.composer-wp` section of a composer.json, activates the
//! repositories it enables and answers provider, package and search queries
//! the way the Composer plugin would.

#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod commands;
mod context;
mod output;

use clap::Parser;
use commands::{Cli, Commands};
use context::Context;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            output::error(&format!("Failed to start runtime: {e}"));
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run_command(&cli)) {
        Ok(code) => code,
        Err(e) => {
            output::error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

async fn run_command(cli: &Cli) -> anyhow::Result<ExitCode> {
    let ctx = Context::new(&cli.to_context_args())?;
    match &cli.command {
        Commands::Providers(args) => commands::providers::run(&ctx, args).await,
        Commands::Show(args) => commands::show::run(&ctx, args).await,
        Commands::Search(args) => commands::search::run(&ctx, args).await,
    }
}
