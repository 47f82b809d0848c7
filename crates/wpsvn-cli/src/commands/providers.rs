//! Providers command implementation.

use crate::context::Context;
use crate::output;
use anyhow::{Result, bail};
use clap::Args;
use console::style;
use std::process::ExitCode;
use tracing::info;

/// Arguments for the providers command.
#[derive(Args, Debug, Clone)]
pub struct ProvidersArgs {
    /// Only list this repository
    #[arg(short, long)]
    pub repository: Option<String>,
}

/// Run the providers command.
pub async fn run(ctx: &Context, args: &ProvidersArgs) -> Result<ExitCode> {
    info!(repository = ?args.repository, "running providers command");
    let manager = ctx.manager().await?;

    let names = match &args.repository {
        Some(name) => {
            let Some(repo) = manager.get(name) else {
                bail!("No active repository named '{name}'");
            };
            repo.provider_names().await?
        }
        None => manager.providers().await?,
    };

    if ctx.json {
        output::json(&names)?;
        return Ok(ExitCode::SUCCESS);
    }
    if names.is_empty() {
        output::note("No providers found");
        return Ok(ExitCode::SUCCESS);
    }
    for name in &names {
        println!("{}", style(name).green());
    }
    output::note(&format!("{} providers", names.len()));
    Ok(ExitCode::SUCCESS)
}
