//! # `pkg-retire run`
//!
//! The whole cycle in one invocation: retire obsolete packages into the
//! staging area, pack the staging area into new volumes, then catalog
//! every volume just sealed. A dry run stops after planning the volumes.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use retire_engine::{IngestReport, RepackReport, RetireReport};

use crate::config::Settings;
use crate::ingest::ingest_all;
use crate::output;
use crate::repack::repack_with;
use crate::retire::{exit_code, retire_with};

/// Arguments for `run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Volume capacity in bytes. Overrides `capacity_bytes` from the config.
    #[arg(long)]
    pub capacity: Option<u64>,

    /// Report what would happen without moving or cataloging anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Print the combined report as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Reports from every phase of a full run.
#[derive(Debug, Serialize)]
pub struct PipelineReport {
    pub retire: RetireReport,
    pub repack: RepackReport,
    pub ingest: Vec<IngestReport>,
}

impl PipelineReport {
    fn is_clean(&self) -> bool {
        self.retire.errors.is_empty()
            && self.repack.errors.is_empty()
            && self.ingest.iter().all(|r| r.errors.is_empty())
    }
}

/// Execute `run`.
pub async fn run_pipeline(args: &RunArgs, settings: &Settings) -> Result<u8> {
    let retire = retire_with(settings, args.dry_run).await?;
    // A dry retire creates nothing, so there may be no archive to plan over yet.
    let repack = if args.dry_run && !settings.archive_root()?.is_dir() {
        RepackReport::default()
    } else {
        repack_with(settings, args.capacity, args.dry_run).await?
    };

    let ingest = if args.dry_run {
        Vec::new()
    } else {
        let volumes: Vec<_> = repack.volumes.iter().map(|v| v.dir.clone()).collect();
        let catalog = settings.open_catalog().await?;
        let reports = ingest_all(&catalog, &volumes).await;
        catalog.close().await;
        reports?
    };

    let report = PipelineReport {
        retire,
        repack,
        ingest,
    };
    if args.json {
        output::print_json(&report)?;
    } else {
        print!("{}", output::retire_summary(&report.retire, args.dry_run));
        print!("{}", output::repack_summary(&report.repack, args.dry_run));
        for ingest in &report.ingest {
            print!("{}", output::ingest_summary(ingest));
        }
    }
    Ok(exit_code(report.is_clean()))
}
