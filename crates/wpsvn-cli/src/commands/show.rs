//! Show command implementation.

use crate::context::Context;
use crate::output;
use anyhow::{Result, bail};
use clap::Args;
use console::style;
use std::process::ExitCode;
use tracing::info;
use wpsvn_core::{PackageName, PackageRecord};

/// Arguments for the show command.
#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    /// Package name (vendor/name)
    pub package: String,
}

/// Run the show command.
pub async fn run(ctx: &Context, args: &ShowArgs) -> Result<ExitCode> {
    info!(package = %args.package, "running show command");
    if PackageName::parse(&args.package).is_none() {
        bail!("Invalid package name '{}', expected vendor/name", args.package);
    }

    let manager = ctx.manager().await?;
    let packages = manager.what_provides(&args.package).await?;

    if ctx.json {
        output::json(&packages)?;
    } else if packages.is_empty() {
        println!(
            "{} {}",
            style("Nothing provides").yellow(),
            style(&args.package).bold()
        );
    } else {
        print_packages(&packages);
    }

    Ok(if packages.is_empty() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn print_packages(packages: &[PackageRecord]) {
    let first = &packages[0];
    output::header(&first.name);
    if let Some(description) = &first.description {
        println!("{description}");
    }
    if let Some(homepage) = &first.homepage {
        println!("{} {}", style("homepage").dim(), homepage);
    }
    if first.abandoned {
        println!("{}", style("abandoned").red());
    }
    println!();

    for package in packages {
        println!(
            "{} {}",
            style(&package.version).green().bold(),
            style(format!("({})", package.package_type)).dim()
        );
        println!(
            "  {} {} @ {}",
            style("source").dim(),
            package.source.url,
            package.source.reference
        );
        if let Some(dist) = &package.dist {
            println!("  {} {}", style("dist").dim(), dist.url);
        }
        for link in &package.replaces {
            println!("  {} {}", style("replaces").dim(), link.target);
        }
    }
}
