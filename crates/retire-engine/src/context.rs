//! # Run Context
//!
//! Everything a run needs is carried explicitly in a [`RunContext`] and
//! passed to each phase. There is no process-wide state.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use retire_core::{NativeComparator, VersionComparator};

/// Default volume capacity: 25 GB, in plain bytes.
pub const DEFAULT_CAPACITY_BYTES: u64 = 25_000_000_000;

/// Filenames the live index still serves.
///
/// Entries are basenames; a listing line like `pool/main/b/bash_5.2_amd64.deb`
/// contributes `bash_5.2_amd64.deb`.
#[derive(Debug, Clone, Default)]
pub struct LiveSet {
    names: HashSet<String>,
}

impl LiveSet {
    /// Parse a plain-text listing, one path per line. Blank lines are
    /// ignored.
    pub fn from_listing(text: &str) -> Self {
        text.lines().map(str::to_string).collect()
    }

    /// Whether `identifier` is still live.
    pub fn contains(&self, identifier: &str) -> bool {
        self.names.contains(identifier)
    }

    /// Number of live names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the listing was empty.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl FromIterator<String> for LiveSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let names = iter
            .into_iter()
            .filter_map(|line| {
                let line = line.trim();
                let base = line.rsplit('/').next().unwrap_or(line);
                (!base.is_empty()).then(|| base.to_string())
            })
            .collect();
        Self { names }
    }
}

/// Parameters shared by every phase of a run.
#[derive(Debug, Clone)]
pub struct RunContext {
    repo_root: PathBuf,
    archive_root: PathBuf,
    capacity_bytes: u64,
    comparator: Arc<dyn VersionComparator>,
    live: Option<LiveSet>,
    dry_run: bool,
}

impl RunContext {
    /// A context over `repo_root` and `archive_root` with the native
    /// comparator, default capacity, no live listing, and real moves.
    pub fn new(repo_root: impl Into<PathBuf>, archive_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
            archive_root: archive_root.into(),
            capacity_bytes: DEFAULT_CAPACITY_BYTES,
            comparator: Arc::new(NativeComparator),
            live: None,
            dry_run: false,
        }
    }

    /// Set the volume capacity in bytes.
    pub fn with_capacity(mut self, capacity_bytes: u64) -> Self {
        self.capacity_bytes = capacity_bytes;
        self
    }

    /// Replace the version comparator.
    pub fn with_comparator(mut self, comparator: Arc<dyn VersionComparator>) -> Self {
        self.comparator = comparator;
        self
    }

    /// Protect every file named in `live` from retirement.
    pub fn with_live_set(mut self, live: LiveSet) -> Self {
        self.live = Some(live);
        self
    }

    /// Plan only; perform no filesystem changes.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// The live repository root.
    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    /// The archive root holding staged items and volumes.
    pub fn archive_root(&self) -> &Path {
        &self.archive_root
    }

    /// Volume capacity in bytes.
    pub fn capacity_bytes(&self) -> u64 {
        self.capacity_bytes
    }

    /// The version comparator.
    pub fn comparator(&self) -> &dyn VersionComparator {
        self.comparator.as_ref()
    }

    /// The live listing, if one was supplied.
    pub fn live(&self) -> Option<&LiveSet> {
        self.live.as_ref()
    }

    /// Whether this is a dry run.
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}
