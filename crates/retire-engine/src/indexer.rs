//! # Indexer
//!
//! Enumerates every regular file under a root into a [`Registry`].
//!
//! Traversal keeps an explicit stack of pending directories, so depth is
//! bounded by memory rather than by the call stack. Symbolic links are
//! neither followed nor indexed. Unreadable subdirectories are recorded
//! and skipped; only a missing or unreadable root fails the call.

use std::fs;
use std::path::{Path, PathBuf};

use retire_core::{PackageItem, RetireError};

/// The result of indexing one root.
#[derive(Debug, Default)]
pub struct Registry {
    /// Indexed files, sorted by path.
    pub items: Vec<PackageItem>,
    /// Subtrees that could not be read.
    pub errors: Vec<RetireError>,
}

impl Registry {
    /// Total size of all indexed items in bytes.
    pub fn total_bytes(&self) -> u64 {
        self.items.iter().map(PackageItem::size).sum()
    }
}

/// Index every regular file under `root`.
pub fn index(root: &Path) -> Result<Registry, RetireError> {
    index_with(root, |_| false)
}

/// Index every regular file under `root`, pruning any entry (file or
/// directory) for which `skip` returns `true`.
pub fn index_with(root: &Path, skip: impl Fn(&Path) -> bool) -> Result<Registry, RetireError> {
    if !root.is_dir() {
        return Err(RetireError::NotFound {
            path: root.to_path_buf(),
        });
    }

    let mut registry = Registry::default();
    let mut pending: Vec<PathBuf> = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if dir == root => return Err(RetireError::io(&dir, e)),
            Err(e) => {
                tracing::warn!(dir = %dir.display(), "skipping unreadable directory: {e}");
                registry.errors.push(RetireError::io(&dir, e));
                continue;
            }
        };

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    registry.errors.push(RetireError::io(&dir, e));
                    continue;
                }
            };
            let path = entry.path();
            if skip(&path) {
                continue;
            }
            let file_type = match entry.file_type() {
                Ok(t) => t,
                Err(e) => {
                    registry.errors.push(RetireError::io(&path, e));
                    continue;
                }
            };
            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_file() {
                match entry.metadata() {
                    Ok(meta) => registry.items.push(PackageItem::new(path, meta.len())),
                    Err(e) => registry.errors.push(RetireError::io(&path, e)),
                }
            }
        }
    }

    registry.items.sort_by(|a, b| a.path().cmp(b.path()));
    tracing::debug!(
        root = %root.display(),
        items = registry.items.len(),
        "indexed"
    );
    Ok(registry)
}
