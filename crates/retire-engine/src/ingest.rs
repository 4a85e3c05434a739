//! # Catalog Ingestion
//!
//! Records every member of a sealed volume in the catalog. Stored paths
//! are relative to the archive root (the volume's parent directory), so
//! they stay valid if the whole archive is relocated.
//!
//! A hash already cataloged under another path is rebound to the new
//! path when the old archived copy is gone or no longer matches, which is
//! how a stale entry heals after the retire run archived the content
//! again. If the old copy is intact, ingestion aborts: two archived copies
//! of one content are a catalog inconsistency for an operator to
//! reconcile.

use std::path::Path;

use retire_catalog::{Catalog, CatalogEntry, CatalogError, InsertOutcome};
use retire_core::RetireError;

use crate::indexer;
use crate::mover::{archived_copy_intact, relative_path, MANIFEST_FILE};
use crate::packer::parse_volume_id;
use crate::report::IngestReport;

/// Catalog every member of the volume at `volume_root`.
pub async fn ingest_catalog(volume_root: &Path, catalog: &Catalog) -> Result<IngestReport, RetireError> {
    if !volume_root.is_dir() {
        return Err(RetireError::NotFound {
            path: volume_root.to_path_buf(),
        });
    }
    let volume_id = volume_root
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(parse_volume_id)
        .ok_or_else(|| RetireError::InvalidVolume {
            path: volume_root.to_path_buf(),
            reason: "directory name is not volume<N>".into(),
        })?;
    let archive_root = volume_root.parent().unwrap_or(volume_root);

    let registry = indexer::index_with(volume_root, |p| {
        p.parent() == Some(volume_root) && p.file_name().is_some_and(|n| n == MANIFEST_FILE)
    })?;

    let mut report = IngestReport {
        volume_id,
        errors: registry.errors,
        ..IngestReport::default()
    };

    for item in &registry.items {
        let stored_path = relative_path(archive_root, item.path());
        let entry = match CatalogEntry::for_item(item, stored_path, volume_id) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::error!(identifier = item.identifier(), "cannot catalog: {e}");
                report.errors.push(e);
                continue;
            }
        };
        let outcome = match catalog.insert(&entry).await {
            Ok(outcome) => outcome,
            Err(CatalogError::DuplicateHash { existing, .. })
                if !archived_copy_intact(archive_root, &existing, &entry.hash) =>
            {
                if catalog.rebind(&entry, &existing).await? {
                    report.rebound += 1;
                    continue;
                }
                // Someone else rebound the row first; settle against theirs.
                catalog.insert(&entry).await?
            }
            Err(e) => return Err(e.into()),
        };
        match outcome {
            InsertOutcome::Inserted => report.inserted += 1,
            InsertOutcome::AlreadyPresent => report.already_present += 1,
        }
    }

    tracing::info!(
        volume = volume_id,
        inserted = report.inserted,
        already_present = report.already_present,
        rebound = report.rebound,
        "ingested volume"
    );
    Ok(report)
}
