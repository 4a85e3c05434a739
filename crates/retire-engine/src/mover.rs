//! # Mover
//!
//! Physical relocation of items and cleanup of the directories they leave
//! behind.
//!
//! Moves are idempotent. A missing source means an earlier run already
//! moved the file; an existing destination is never overwritten. Both are
//! reported, not treated as failures. Every move is attempted once.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use retire_core::{hash_file, ContentHash, ItemState, PackageItem, RetireError};

use crate::packer::Volume;
use crate::report::{Disposition, ItemOutcome, SealedVolume};

/// Name of the member manifest written into every sealed volume.
pub const MANIFEST_FILE: &str = "MANIFEST";

/// Result of one move attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The file now lives at `dest`.
    Moved {
        /// New location.
        dest: PathBuf,
    },
    /// Nothing at the source path.
    SourceMissing,
    /// Something already occupies the destination; source left in place.
    DestinationExists {
        /// Occupied location.
        dest: PathBuf,
    },
}

/// Move `src` to `dest`, creating `dest`'s parent as needed.
///
/// Tries a rename first and falls back to copy-then-remove when the two
/// paths are on different filesystems.
pub fn move_file(src: &Path, dest: &Path) -> Result<MoveOutcome, RetireError> {
    match fs::symlink_metadata(src) {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(MoveOutcome::SourceMissing),
        Err(e) => return Err(RetireError::io(src, e)),
    }
    if fs::symlink_metadata(dest).is_ok() {
        return Ok(MoveOutcome::DestinationExists {
            dest: dest.to_path_buf(),
        });
    }
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| RetireError::io(parent, e))?;
    }

    if let Err(rename_err) = fs::rename(src, dest) {
        tracing::debug!(src = %src.display(), "rename failed, copying instead: {rename_err}");
        if let Err(e) = fs::copy(src, dest) {
            // Leave no partial copy behind.
            let _ = fs::remove_file(dest);
            return Err(RetireError::io(src, e));
        }
        fs::remove_file(src).map_err(|e| RetireError::io(src, e))?;
    }

    Ok(MoveOutcome::Moved {
        dest: dest.to_path_buf(),
    })
}

/// Remove every empty directory below `root`, deepest first. `root`
/// itself is kept. Returns how many directories were removed.
pub fn prune_empty_dirs(root: &Path) -> Result<usize, RetireError> {
    let mut dirs = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(RetireError::io(&dir, e)),
        };
        for entry in entries {
            let entry = entry.map_err(|e| RetireError::io(&dir, e))?;
            if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                pending.push(entry.path());
            }
        }
        if dir != root {
            dirs.push(dir);
        }
    }

    // Pre-order discovery reversed visits children before parents.
    let mut removed = 0;
    for dir in dirs.iter().rev() {
        let is_empty = fs::read_dir(dir)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false);
        if !is_empty {
            continue;
        }
        match fs::remove_dir(dir) {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(RetireError::io(dir, e)),
        }
    }
    Ok(removed)
}

/// Render `path` relative to `base` with `/` separators.
pub fn relative_path(base: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(base).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Whether `stored_path` under `archive_root` still holds content hashing
/// to `hash`.
pub fn archived_copy_intact(archive_root: &Path, stored_path: &str, hash: &ContentHash) -> bool {
    let path = archive_root.join(stored_path);
    match hash_file(&path) {
        Ok(found) => found == *hash,
        Err(e) => {
            tracing::debug!(path = %path.display(), "archived copy unreadable: {e}");
            false
        }
    }
}

/// Collects outcomes and errors while executing moves.
#[derive(Debug, Default)]
pub struct MoveLog {
    /// Event trail.
    pub outcomes: Vec<ItemOutcome>,
    /// Per-item failures.
    pub errors: Vec<RetireError>,
}

/// Executes a pack plan under an archive root.
#[derive(Debug)]
pub struct Mover<'a> {
    archive_root: &'a Path,
}

impl<'a> Mover<'a> {
    /// A mover placing volumes under `archive_root`.
    pub fn new(archive_root: &'a Path) -> Self {
        Self { archive_root }
    }

    /// Materialize and seal one volume.
    ///
    /// Provisions the volume directory with one subdirectory per origin
    /// group, moves every member into its group, writes the manifest, and
    /// prunes the subdirectories left empty. Returns `None` if no member
    /// ended up in the volume, in which case the directory is removed.
    pub fn seal(
        &self,
        volume: Volume,
        origin_groups: &BTreeSet<String>,
        log: &mut MoveLog,
    ) -> Option<SealedVolume> {
        let id = volume.id();
        let dir = self.archive_root.join(volume.dir_name());

        for group in origin_groups {
            let sub = dir.join(group);
            if let Err(e) = fs::create_dir_all(&sub) {
                tracing::error!(volume = id, dir = %sub.display(), "cannot provision volume: {e}");
                log.errors.push(RetireError::io(&sub, e));
                return None;
            }
        }

        let mut used_bytes = 0;
        let mut members = Vec::new();
        for mut item in volume.into_members() {
            let dest = dir.join(item.origin_group()).join(item.identifier());
            match move_file(item.path(), &dest) {
                Ok(MoveOutcome::Moved { dest }) => {
                    let rel = relative_path(self.archive_root, &dest);
                    tracing::info!(volume = id, "archived {rel}");
                    if let Err(e) = item.transition(ItemState::Archived) {
                        log.errors.push(e);
                    }
                    used_bytes += item.size();
                    log.outcomes
                        .push(ItemOutcome::new(&item, Disposition::Archived).with_detail(&rel));
                    members.push(rel);
                }
                Ok(MoveOutcome::SourceMissing) => {
                    log.outcomes.push(
                        ItemOutcome::new(&item, Disposition::AlreadyMoved)
                            .with_detail("source missing"),
                    );
                }
                Ok(MoveOutcome::DestinationExists { dest }) => {
                    log.outcomes.push(
                        ItemOutcome::new(&item, Disposition::AlreadyMoved)
                            .with_detail(dest.display()),
                    );
                }
                Err(e) => {
                    tracing::error!(identifier = item.identifier(), "move failed: {e}");
                    if let Err(te) = item.transition(ItemState::Errored) {
                        log.errors.push(te);
                    }
                    log.outcomes
                        .push(ItemOutcome::new(&item, Disposition::Errored).with_detail(&e));
                    log.errors.push(e);
                }
            }
        }

        if !members.is_empty() {
            let manifest = dir.join(MANIFEST_FILE);
            let mut body = members.join("\n");
            body.push('\n');
            if let Err(e) = fs::write(&manifest, body) {
                log.errors.push(RetireError::io(&manifest, e));
            }
        }
        if let Err(e) = prune_empty_dirs(&dir) {
            log.errors.push(e);
        }

        if members.is_empty() {
            let _ = fs::remove_dir(&dir);
            return None;
        }

        tracing::info!(volume = id, members = members.len(), used_bytes, "sealed volume");
        Some(SealedVolume {
            id,
            dir,
            used_bytes,
            members,
        })
    }

    /// Move `item` into `<archive_root>/<origin group>/`.
    pub fn stage(&self, item: &PackageItem) -> Result<MoveOutcome, RetireError> {
        let dest = self
            .archive_root
            .join(item.origin_group())
            .join(item.identifier());
        move_file(item.path(), &dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packer::BinPacker;
    use retire_core::NativeComparator;

    fn touch(path: &Path, len: usize) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, vec![b'x'; len]).unwrap();
    }

    #[test]
    fn moves_and_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src/a");
        touch(&src, 3);
        let dest = dir.path().join("deep/er/a");
        assert_eq!(
            move_file(&src, &dest).unwrap(),
            MoveOutcome::Moved { dest: dest.clone() }
        );
        assert!(!src.exists());
        assert_eq!(fs::read(&dest).unwrap().len(), 3);
    }

    #[test]
    fn missing_source_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let out = move_file(&dir.path().join("gone"), &dir.path().join("dest")).unwrap();
        assert_eq!(out, MoveOutcome::SourceMissing);
        assert!(!dir.path().join("dest").exists());
    }

    #[test]
    fn existing_destination_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        let dest = dir.path().join("dest");
        touch(&src, 1);
        touch(&dest, 2);
        assert!(matches!(
            move_file(&src, &dest).unwrap(),
            MoveOutcome::DestinationExists { .. }
        ));
        assert!(src.exists());
        assert_eq!(fs::read(&dest).unwrap().len(), 2);
    }

    #[test]
    fn prune_removes_nested_empties_but_keeps_root_and_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b/c")).unwrap();
        fs::create_dir_all(dir.path().join("d")).unwrap();
        touch(&dir.path().join("e/f/keep"), 1);

        let removed = prune_empty_dirs(dir.path()).unwrap();
        assert_eq!(removed, 4);
        assert!(dir.path().exists());
        assert!(!dir.path().join("a").exists());
        assert!(!dir.path().join("d").exists());
        assert!(dir.path().join("e/f/keep").exists());
    }

    #[test]
    fn prune_of_missing_root_is_noop() {
        assert_eq!(prune_empty_dirs(Path::new("/nonexistent/prune/root")).unwrap(), 0);
    }

    #[test]
    fn relative_path_uses_forward_slashes() {
        let rel = relative_path(Path::new("/a"), Path::new("/a/volume0/main/x.deb"));
        assert_eq!(rel, "volume0/main/x.deb");
    }

    #[test]
    fn seal_writes_manifest_and_prunes_unused_groups() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("archive");
        let src = archive.join("main/a_1_all.deb");
        touch(&src, 4);

        let mut item = PackageItem::new(&src, 4);
        item.transition(ItemState::Obsolete).unwrap();
        let mut plan = BinPacker::new(100, 0, &NativeComparator).plan(vec![item]);
        plan.origin_groups.insert("contrib".into());

        let mut log = MoveLog::default();
        let volume = plan.volumes.remove(0);
        let sealed = Mover::new(&archive)
            .seal(volume, &plan.origin_groups, &mut log)
            .unwrap();

        assert_eq!(sealed.members, ["volume0/main/a_1_all.deb"]);
        assert_eq!(sealed.used_bytes, 4);
        assert!(log.errors.is_empty());
        assert!(archive.join("volume0/main/a_1_all.deb").exists());
        assert!(!archive.join("volume0/contrib").exists());
        let manifest = fs::read_to_string(archive.join("volume0").join(MANIFEST_FILE)).unwrap();
        assert_eq!(manifest, "volume0/main/a_1_all.deb\n");
    }

    #[test]
    fn seal_with_no_surviving_members_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("archive");
        fs::create_dir_all(&archive).unwrap();
        let items = vec![PackageItem::new(archive.join("main/gone_1_all.deb"), 4)];
        let mut plan = BinPacker::new(100, 0, &NativeComparator).plan(items);

        let mut log = MoveLog::default();
        let volume = plan.volumes.remove(0);
        assert!(Mover::new(&archive)
            .seal(volume, &plan.origin_groups, &mut log)
            .is_none());
        assert!(!archive.join("volume0").exists());
        assert_eq!(log.outcomes[0].disposition, Disposition::AlreadyMoved);
    }
}
