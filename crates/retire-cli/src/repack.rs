//! # `pkg-retire repack`
//!
//! Packs staged packages under the archive root into new sealed volumes.

use anyhow::{Context, Result};
use clap::Args;

use retire_engine::{repack_run, RepackReport};

use crate::config::Settings;
use crate::output;
use crate::retire::exit_code;

/// Arguments for `repack`.
#[derive(Args, Debug)]
pub struct RepackArgs {
    /// Volume capacity in bytes. Overrides `capacity_bytes` from the config.
    #[arg(long)]
    pub capacity: Option<u64>,

    /// Plan the volumes without moving anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Print the full report as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Execute `repack`.
pub async fn run_repack(args: &RepackArgs, settings: &Settings) -> Result<u8> {
    let report = repack_with(settings, args.capacity, args.dry_run).await?;
    if args.json {
        output::print_json(&report)?;
    } else {
        print!("{}", output::repack_summary(&report, args.dry_run));
    }
    Ok(exit_code(report.errors.is_empty()))
}

pub(crate) async fn repack_with(
    settings: &Settings,
    capacity: Option<u64>,
    dry_run: bool,
) -> Result<RepackReport> {
    let ctx = settings.repack_context(capacity, dry_run)?;
    // Read for volume numbering only; repacking never writes the catalog.
    let catalog = settings.open_catalog().await?;
    let report = repack_run(&ctx, &catalog).await;
    catalog.close().await;
    report.context("repack run aborted")
}
