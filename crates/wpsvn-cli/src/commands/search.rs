//! Search command implementation.

use crate::context::Context;
use crate::output;
use anyhow::Result;
use clap::Args;
use console::style;
use std::process::ExitCode;
use tracing::info;

/// Arguments for the search command.
#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Search query, or a vendor to list everything under it
    pub query: String,

    /// Only show package names
    #[arg(short = 'N', long)]
    pub only_name: bool,
}

/// Run the search command.
pub async fn run(ctx: &Context, args: &SearchArgs) -> Result<ExitCode> {
    info!(query = %args.query, "running search command");
    let manager = ctx.manager().await?;
    let results = manager.search(&args.query).await?;

    if ctx.json {
        output::json(&results)?;
        return Ok(ExitCode::SUCCESS);
    }
    if results.is_empty() {
        output::note("No packages found");
        return Ok(ExitCode::SUCCESS);
    }

    for result in &results {
        if args.only_name {
            println!("{}", result.name);
            continue;
        }
        match &result.description {
            Some(description) => println!(
                "{} {}",
                style(&result.name).green().bold(),
                description
            ),
            None => println!("{}", style(&result.name).green().bold()),
        }
        if let Some(url) = &result.url {
            println!("  {}", style(url).dim());
        }
    }
    Ok(ExitCode::SUCCESS)
}
