//! # Package Items
//!
//! A [`PackageItem`] is one regular file found by the indexer. It knows
//! its provenance (the *origin group*, the name of the directory that
//! immediately contains it), its size, its parsed identifier if the file
//! name is well formed, and its content hash once somebody asks for it.
//!
//! ## Lifecycle
//!
//! ```text
//! Indexed ──► Current
//!    │
//!    └──────► Obsolete ──► Archived | DuplicateSkipped | Errored
//! ```
//!
//! `Current` is terminal for a run: current items are never touched.

use std::cell::OnceCell;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::digest::{hash_file, ContentHash};
use crate::error::RetireError;
use crate::identifier::PackageId;

/// Where an item is in its per-run lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemState {
    /// Found by the indexer, not yet classified.
    Indexed,
    /// Newest version of its name; stays in the repository.
    Current,
    /// Superseded or unparsable; a retirement candidate.
    Obsolete,
    /// Moved into the archive.
    Archived,
    /// Left alone because identical content is already archived.
    DuplicateSkipped,
    /// Processing failed; see the run report.
    Errored,
}

impl ItemState {
    /// Whether the lifecycle permits moving from `self` to `next`.
    pub fn can_transition_to(self, next: ItemState) -> bool {
        use ItemState::*;
        matches!(
            (self, next),
            (Indexed, Current)
                | (Indexed, Obsolete)
                | (Obsolete, Archived)
                | (Obsolete, DuplicateSkipped)
                | (Obsolete, Errored)
        )
    }

    /// Whether no further transition is possible.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Current | Self::Archived | Self::DuplicateSkipped | Self::Errored
        )
    }

    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Indexed => "indexed",
            Self::Current => "current",
            Self::Obsolete => "obsolete",
            Self::Archived => "archived",
            Self::DuplicateSkipped => "duplicate_skipped",
            Self::Errored => "errored",
        }
    }
}

impl std::fmt::Display for ItemState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One indexed file.
#[derive(Debug, Clone)]
pub struct PackageItem {
    identifier: String,
    id: Option<PackageId>,
    path: PathBuf,
    size: u64,
    origin_group: String,
    state: ItemState,
    hash: OnceCell<ContentHash>,
}

impl PackageItem {
    /// Build an item for the file at `path`.
    ///
    /// The identifier is the file name; the origin group is the name of
    /// the parent directory (empty for a file directly under `/`). An
    /// unparsable identifier yields an item with no [`PackageId`].
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        let path = path.into();
        let identifier = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let origin_group = path
            .parent()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let id = PackageId::parse(&identifier).ok();
        Self {
            identifier,
            id,
            path,
            size,
            origin_group,
            state: ItemState::Indexed,
            hash: OnceCell::new(),
        }
    }

    /// The raw file name.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Parsed identifier, or `None` if the file name is malformed.
    pub fn package_id(&self) -> Option<&PackageId> {
        self.id.as_ref()
    }

    /// Re-run the parse to obtain the malformed-name error for reporting.
    pub fn parse_error(&self) -> Option<RetireError> {
        match &self.id {
            Some(_) => None,
            None => PackageId::parse(&self.identifier).err(),
        }
    }

    /// Package name, falling back to the raw identifier when unparsable.
    pub fn name(&self) -> &str {
        self.id
            .as_ref()
            .map(|id| id.name.as_str())
            .unwrap_or(&self.identifier)
    }

    /// Package version, if parsed.
    pub fn version(&self) -> Option<&str> {
        self.id.as_ref().map(|id| id.version.as_str())
    }

    /// Package architecture, if parsed.
    pub fn architecture(&self) -> Option<&str> {
        self.id.as_ref().map(|id| id.architecture.as_str())
    }

    /// Absolute path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size in bytes as seen by the indexer.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Name of the directory that contained the file.
    pub fn origin_group(&self) -> &str {
        &self.origin_group
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ItemState {
        self.state
    }

    /// Advance the lifecycle, rejecting illegal transitions.
    pub fn transition(&mut self, next: ItemState) -> Result<(), RetireError> {
        if !self.state.can_transition_to(next) {
            return Err(RetireError::InvalidTransition {
                identifier: self.identifier.clone(),
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }

    /// Content hash, computed on first use and cached for the run.
    pub fn content_hash(&self) -> Result<&ContentHash, RetireError> {
        if let Some(hash) = self.hash.get() {
            return Ok(hash);
        }
        let hash = hash_file(&self.path).map_err(|e| RetireError::io(&self.path, e))?;
        Ok(self.hash.get_or_init(|| hash))
    }

    /// Whether the hash has already been computed.
    pub fn is_hashed(&self) -> bool {
        self.hash.get().is_some()
    }
}
