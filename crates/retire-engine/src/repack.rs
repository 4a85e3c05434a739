//! # Repack Run
//!
//! Packs the loose items staged under the archive root into new sealed
//! volumes. Existing `volume<N>` directories are left untouched.
//!
//! New volume ids continue after the highest id either still on disk or
//! ever cataloged, so a volume shipped off the archive root never has its
//! id reissued.

use std::fs;
use std::path::Path;

use retire_catalog::Catalog;
use retire_core::{ItemState, RetireError};

use crate::context::RunContext;
use crate::indexer;
use crate::mover::{prune_empty_dirs, relative_path, MoveLog, Mover};
use crate::packer::{parse_volume_id, volume_dir_name, BinPacker, PackPlan};
use crate::report::{Disposition, ItemOutcome, RepackReport, SealedVolume};

/// Ids of the volumes already sealed under `archive_root`, ascending.
pub fn existing_volume_ids(archive_root: &Path) -> Result<Vec<u32>, RetireError> {
    let entries = fs::read_dir(archive_root).map_err(|e| RetireError::io(archive_root, e))?;
    let mut ids = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| RetireError::io(archive_root, e))?;
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if let Some(id) = entry.file_name().to_str().and_then(parse_volume_id) {
            if is_dir {
                ids.push(id);
            }
        }
    }
    ids.sort_unstable();
    Ok(ids)
}

fn is_sealed_volume(archive_root: &Path, path: &Path) -> bool {
    path.parent() == Some(archive_root)
        && path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(parse_volume_id)
            .is_some()
        && path.is_dir()
}

/// First id for a new volume: one past the highest id on disk or in
/// `catalog`, or `0` if neither holds any.
pub async fn next_volume_id(archive_root: &Path, catalog: &Catalog) -> Result<u32, RetireError> {
    let on_disk = existing_volume_ids(archive_root)?.last().copied();
    let cataloged = catalog.max_volume_id().await?;
    match on_disk.max(cataloged) {
        None => Ok(0),
        Some(highest) => highest.checked_add(1).ok_or_else(|| RetireError::InvalidVolume {
            path: archive_root.join(volume_dir_name(highest)),
            reason: "volume ids exhausted".into(),
        }),
    }
}

/// Pack staged items into volumes of the context's capacity.
pub async fn repack_run(ctx: &RunContext, catalog: &Catalog) -> Result<RepackReport, RetireError> {
    let archive_root = ctx.archive_root();
    let registry = indexer::index_with(archive_root, |p| is_sealed_volume(archive_root, p))?;
    let first_id = next_volume_id(archive_root, catalog).await?;

    let mut report = RepackReport {
        errors: registry.errors,
        ..RepackReport::default()
    };
    let mut items = registry.items;
    for item in &mut items {
        item.transition(ItemState::Obsolete)?;
    }
    tracing::info!(
        staged = items.len(),
        capacity = ctx.capacity_bytes(),
        first_id,
        "packing staged items"
    );

    let PackPlan {
        volumes,
        rejected,
        origin_groups,
    } = BinPacker::new(ctx.capacity_bytes(), first_id, ctx.comparator()).plan(items);

    for (item, err) in rejected {
        report
            .outcomes
            .push(ItemOutcome::new(&item, Disposition::TooLarge).with_detail(&err));
        report.errors.push(err);
    }

    if ctx.is_dry_run() {
        for volume in volumes {
            let dir = archive_root.join(volume.dir_name());
            let members = volume
                .members()
                .iter()
                .map(|item| {
                    let dest = dir.join(item.origin_group()).join(item.identifier());
                    report.outcomes.push(
                        ItemOutcome::new(item, Disposition::WouldArchive)
                            .with_detail(dest.display()),
                    );
                    relative_path(archive_root, &dest)
                })
                .collect();
            report.volumes.push(SealedVolume {
                id: volume.id(),
                dir,
                used_bytes: volume.used_bytes(),
                members,
            });
        }
        return Ok(report);
    }

    let mover = Mover::new(archive_root);
    let mut log = MoveLog::default();
    for volume in volumes {
        if let Some(sealed) = mover.seal(volume, &origin_groups, &mut log) {
            report.volumes.push(sealed);
        }
    }
    if let Err(e) = prune_empty_dirs(archive_root) {
        log.errors.push(e);
    }
    report.outcomes.extend(log.outcomes);
    report.errors.extend(log.errors);

    tracing::info!(
        volumes = report.volume_count(),
        errors = report.errors.len(),
        "repack run finished"
    );
    Ok(report)
}
