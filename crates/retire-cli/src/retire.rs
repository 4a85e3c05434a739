//! # `pkg-retire retire`
//!
//! Moves obsolete packages from the live repository into the archive
//! staging area, skipping content the catalog already holds.

use anyhow::{Context, Result};
use clap::Args;

use retire_engine::{retire_run, RetireReport};

use crate::config::Settings;
use crate::listing::ListingClient;
use crate::output;

/// Arguments for `retire`.
#[derive(Args, Debug)]
pub struct RetireArgs {
    /// Report what would be retired without moving anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Print the full report as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Execute `retire`.
pub async fn run_retire(args: &RetireArgs, settings: &Settings) -> Result<u8> {
    let report = retire_with(settings, args.dry_run).await?;
    if args.json {
        output::print_json(&report)?;
    } else {
        print!("{}", output::retire_summary(&report, args.dry_run));
    }
    Ok(exit_code(report.errors.is_empty()))
}

/// Run a retire pass with the live listing applied, if one is configured.
pub(crate) async fn retire_with(settings: &Settings, dry_run: bool) -> Result<RetireReport> {
    let mut ctx = settings.retire_context(dry_run)?;
    if let Some(url) = settings.listing_url() {
        let live = ListingClient::new(url.clone())?
            .fetch()
            .await
            .context("cannot fetch the live listing; refusing to retire without it")?;
        ctx = ctx.with_live_set(live);
    }

    let catalog = settings.open_catalog().await?;
    let report = retire_run(&ctx, &catalog).await;
    catalog.close().await;
    report.context("retire run aborted")
}

/// `0` for a clean run, `2` when some items failed.
pub(crate) fn exit_code(clean: bool) -> u8 {
    if clean {
        0
    } else {
        2
    }
}
