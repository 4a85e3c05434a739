//! # Configuration
//!
//! Settings come from an optional YAML file passed with `--config`,
//! overlaid by command-line flags. A flag always wins over the file.
//!
//! ```yaml
//! repo_root: /srv/mirror/pool
//! archive_root: /srv/archive
//! catalog: /srv/archive/catalog.sqlite
//! capacity_bytes: 25000000000
//! listing_url: https://mirror.example.org/ls-lR.txt
//! comparator: native
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use url::Url;

use retire_catalog::Catalog;
use retire_core::{DpkgComparator, NativeComparator, VersionComparator};
use retire_engine::{RunContext, DEFAULT_CAPACITY_BYTES};

/// Which version ordering to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ComparatorKind {
    /// Built-in Debian-style ordering.
    #[default]
    Native,
    /// Delegate to `dpkg --compare-versions`.
    Dpkg,
}

impl ComparatorKind {
    /// Instantiate the comparator.
    pub fn build(self) -> Arc<dyn VersionComparator> {
        match self {
            Self::Native => Arc::new(NativeComparator),
            Self::Dpkg => Arc::new(DpkgComparator::new()),
        }
    }
}

/// On-disk configuration file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetireConfig {
    pub repo_root: Option<PathBuf>,
    pub archive_root: Option<PathBuf>,
    pub catalog: Option<PathBuf>,
    pub capacity_bytes: Option<u64>,
    pub listing_url: Option<String>,
    pub comparator: Option<ComparatorKind>,
}

impl RetireConfig {
    /// Read and parse a YAML configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    /// Parse configuration from YAML text. An empty document is the
    /// default configuration.
    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }
}

/// Flags that override the configuration file.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Live repository root to retire packages from.
    #[arg(long, global = true)]
    pub repo_root: Option<PathBuf>,

    /// Archive root holding staged packages and sealed volumes.
    #[arg(long, global = true)]
    pub archive_root: Option<PathBuf>,

    /// Path to the SQLite catalog.
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    /// URL of the plain-text listing of still-served files.
    #[arg(long, global = true)]
    pub listing_url: Option<String>,

    /// Version comparator.
    #[arg(long, global = true, value_enum)]
    pub comparator: Option<ComparatorKind>,
}

/// Fully resolved settings for one invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    repo_root: Option<PathBuf>,
    archive_root: Option<PathBuf>,
    catalog: Option<PathBuf>,
    capacity_bytes: u64,
    listing_url: Option<Url>,
    comparator: ComparatorKind,
}

impl Settings {
    /// Overlay `overrides` on `file` and validate the result.
    pub fn resolve(file: RetireConfig, overrides: &ConfigOverrides) -> Result<Self> {
        let capacity_bytes = file.capacity_bytes.unwrap_or(DEFAULT_CAPACITY_BYTES);
        if capacity_bytes == 0 {
            bail!("capacity_bytes must be greater than zero");
        }
        let listing_url = overrides
            .listing_url
            .clone()
            .or(file.listing_url)
            .map(|raw| Url::parse(&raw).with_context(|| format!("invalid listing_url {raw:?}")))
            .transpose()?;

        Ok(Self {
            repo_root: overrides.repo_root.clone().or(file.repo_root),
            archive_root: overrides.archive_root.clone().or(file.archive_root),
            catalog: overrides.catalog.clone().or(file.catalog),
            capacity_bytes,
            listing_url,
            comparator: overrides.comparator.or(file.comparator).unwrap_or_default(),
        })
    }

    /// Live repository root.
    pub fn repo_root(&self) -> Result<&Path> {
        self.repo_root
            .as_deref()
            .context("repo_root is not set; pass --repo-root or set it in the config file")
    }

    /// Archive root.
    pub fn archive_root(&self) -> Result<&Path> {
        self.archive_root
            .as_deref()
            .context("archive_root is not set; pass --archive-root or set it in the config file")
    }

    /// Catalog database path.
    pub fn catalog_path(&self) -> Result<&Path> {
        self.catalog
            .as_deref()
            .context("catalog is not set; pass --catalog or set it in the config file")
    }

    pub fn capacity_bytes(&self) -> u64 {
        self.capacity_bytes
    }

    pub fn listing_url(&self) -> Option<&Url> {
        self.listing_url.as_ref()
    }

    pub fn comparator(&self) -> ComparatorKind {
        self.comparator
    }

    /// Context for a retire run. Needs both roots.
    pub fn retire_context(&self, dry_run: bool) -> Result<RunContext> {
        Ok(RunContext::new(self.repo_root()?, self.archive_root()?)
            .with_capacity(self.capacity_bytes)
            .with_comparator(self.comparator.build())
            .with_dry_run(dry_run))
    }

    /// Context for a repack run. Only the archive root is touched, so it
    /// also stands in for the repository root.
    pub fn repack_context(&self, capacity: Option<u64>, dry_run: bool) -> Result<RunContext> {
        let capacity = capacity.unwrap_or(self.capacity_bytes);
        if capacity == 0 {
            bail!("--capacity must be greater than zero");
        }
        let archive = self.archive_root()?;
        Ok(RunContext::new(archive, archive)
            .with_capacity(capacity)
            .with_comparator(self.comparator.build())
            .with_dry_run(dry_run))
    }

    /// Open (creating if needed) the catalog database.
    pub async fn open_catalog(&self) -> Result<Catalog> {
        let path = self.catalog_path()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        Catalog::open(path)
            .await
            .with_context(|| format!("failed to open catalog {}", path.display()))
    }
}
