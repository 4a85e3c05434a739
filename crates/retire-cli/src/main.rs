//! # pkg-retire entry point
//!
//! Parses arguments, loads configuration, installs the tracing
//! subscriber, and dispatches to the subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use retire_cli::config::{ConfigOverrides, RetireConfig, Settings};
use retire_cli::ingest::{run_ingest, IngestArgs};
use retire_cli::pipeline::{run_pipeline, RunArgs};
use retire_cli::repack::{run_repack, RepackArgs};
use retire_cli::retire::{run_retire, RetireArgs};

/// Retire obsolete packages from a live repository into archive volumes.
#[derive(Parser, Debug)]
#[command(name = "pkg-retire", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(flatten)]
    overrides: ConfigOverrides,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Move obsolete packages into the archive staging area.
    Retire(RetireArgs),

    /// Pack staged packages into new sealed volumes.
    Repack(RepackArgs),

    /// Record sealed volumes in the catalog.
    Ingest(IngestArgs),

    /// Retire, repack, and ingest in one pass.
    Run(RunArgs),
}

fn init_tracing(verbose: u8, json: bool) {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_settings(cli: &Cli) -> anyhow::Result<Settings> {
    let file = match &cli.config {
        Some(path) => RetireConfig::load(path)?,
        None => RetireConfig::default(),
    };
    Settings::resolve(file, &cli.overrides)
}

async fn dispatch(cli: &Cli) -> anyhow::Result<u8> {
    let settings = load_settings(cli)?;
    tracing::debug!(?settings, "resolved settings");
    match &cli.command {
        Commands::Retire(args) => run_retire(args, &settings).await,
        Commands::Repack(args) => run_repack(args, &settings).await,
        Commands::Ingest(args) => run_ingest(args, &settings).await,
        Commands::Run(args) => run_pipeline(args, &settings).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    match dispatch(&cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_retire_dry_run() {
        let cli = Cli::try_parse_from(["pkg-retire", "retire", "--dry-run"]).unwrap();
        if let Commands::Retire(args) = cli.command {
            assert!(args.dry_run);
            assert!(!args.json);
        } else {
            panic!("expected retire");
        }
    }

    #[test]
    fn parse_repack_capacity() {
        let cli = Cli::try_parse_from(["pkg-retire", "repack", "--capacity", "15"]).unwrap();
        if let Commands::Repack(args) = cli.command {
            assert_eq!(args.capacity, Some(15));
        } else {
            panic!("expected repack");
        }
    }

    #[test]
    fn parse_ingest_requires_volume() {
        assert!(Cli::try_parse_from(["pkg-retire", "ingest"]).is_err());
        let cli = Cli::try_parse_from([
            "pkg-retire",
            "ingest",
            "--volume",
            "/a/volume0",
            "--volume",
            "/a/volume1",
        ])
        .unwrap();
        if let Commands::Ingest(args) = cli.command {
            assert_eq!(args.volumes.len(), 2);
        } else {
            panic!("expected ingest");
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "pkg-retire",
            "run",
            "-vv",
            "--repo-root",
            "/srv/pool",
            "--comparator",
            "dpkg",
            "--log-json",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(cli.log_json);
        assert_eq!(cli.overrides.repo_root, Some(PathBuf::from("/srv/pool")));
        assert_eq!(
            cli.overrides.comparator,
            Some(retire_cli::ComparatorKind::Dpkg)
        );
    }

    #[test]
    fn unknown_comparator_is_rejected() {
        assert!(Cli::try_parse_from(["pkg-retire", "--comparator", "rpm", "retire"]).is_err());
    }
}
