//! # `pkg-retire ingest`
//!
//! Records the members of one or more sealed volumes in the catalog.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use retire_catalog::Catalog;
use retire_engine::{ingest_catalog, IngestReport};

use crate::config::Settings;
use crate::output;
use crate::retire::exit_code;

/// Arguments for `ingest`.
#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Volume directory to catalog (`<archive_root>/volume<N>`). Repeatable.
    #[arg(long = "volume", required = true)]
    pub volumes: Vec<PathBuf>,

    /// Print the reports as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Execute `ingest`.
pub async fn run_ingest(args: &IngestArgs, settings: &Settings) -> Result<u8> {
    let catalog = settings.open_catalog().await?;
    let reports = ingest_all(&catalog, &args.volumes).await;
    catalog.close().await;
    let reports = reports?;

    if args.json {
        output::print_json(&reports)?;
    } else {
        for report in &reports {
            print!("{}", output::ingest_summary(report));
        }
    }
    Ok(exit_code(reports.iter().all(|r| r.errors.is_empty())))
}

/// Ingest `volumes` in order, stopping at the first fatal error.
pub(crate) async fn ingest_all(
    catalog: &Catalog,
    volumes: &[PathBuf],
) -> Result<Vec<IngestReport>> {
    let mut reports = Vec::with_capacity(volumes.len());
    for volume in volumes {
        let report = ingest_catalog(volume, catalog)
            .await
            .with_context(|| format!("ingest of {} aborted", volume.display()))?;
        reports.push(report);
    }
    Ok(reports)
}
