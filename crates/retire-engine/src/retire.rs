//! # Retire Run
//!
//! Moves obsolete packages out of the live repository into the archive
//! staging area, `<archive root>/<origin group>/<file>`, skipping content
//! that is already archived.
//!
//! ## Restart safety
//!
//! Catalog inserts and moves are not transactional, so the catalog is
//! only a hint. An entry counts as "already archived" only if its stored
//! path still exists under the archive root and still hashes to the
//! cataloged value. Stale entries are logged and the item is moved;
//! ingesting the volume it lands in rebinds the entry to its new path.

use std::collections::HashSet;
use std::fs;

use retire_catalog::Catalog;
use retire_core::{ContentHash, ItemState, PackageItem, RetireError};

use crate::context::RunContext;
use crate::indexer;
use crate::mover::{archived_copy_intact, prune_empty_dirs, MoveOutcome, Mover};
use crate::packer::placement_order;
use crate::report::{Disposition, ItemOutcome, RetireReport};
use crate::selector;

/// Retire every obsolete item under the context's repository root.
///
/// Fails before touching the filesystem if the repository root is
/// missing, and mid-run only if the catalog itself fails. Per-item
/// problems are collected into the report.
pub async fn retire_run(ctx: &RunContext, catalog: &Catalog) -> Result<RetireReport, RetireError> {
    let archive_root = ctx.archive_root();
    let registry = indexer::index(ctx.repo_root())?;

    let mut report = RetireReport {
        errors: registry.errors,
        ..RetireReport::default()
    };
    let mut items = registry.items;
    let selection = selector::select(&mut items, ctx.comparator(), ctx.live())?;
    report.current = selection.current;
    report.still_live = selection.still_live;
    report.warnings = selection.malformed;

    let mut candidates: Vec<PackageItem> = items
        .into_iter()
        .filter(|i| i.state() == ItemState::Obsolete)
        .collect();
    candidates.sort_by(|a, b| placement_order(a, b, ctx.comparator()));
    tracing::info!(
        obsolete = candidates.len(),
        current = report.current,
        dry_run = ctx.is_dry_run(),
        "selected retirement candidates"
    );

    if !ctx.is_dry_run() {
        fs::create_dir_all(archive_root).map_err(|e| RetireError::io(archive_root, e))?;
    }

    let mover = Mover::new(archive_root);
    let mut seen: HashSet<ContentHash> = HashSet::new();

    for mut item in candidates {
        let hashed = item.content_hash().cloned();
        let hash = match hashed {
            Ok(hash) => hash,
            Err(e) => {
                tracing::error!(identifier = item.identifier(), "cannot hash: {e}");
                item.transition(ItemState::Errored)?;
                report
                    .outcomes
                    .push(ItemOutcome::new(&item, Disposition::Errored).with_detail(&e));
                report.errors.push(e);
                continue;
            }
        };

        if seen.contains(&hash) {
            item.transition(ItemState::DuplicateSkipped)?;
            report.duplicate_skipped += 1;
            report.outcomes.push(
                ItemOutcome::new(&item, Disposition::DuplicateSkipped)
                    .with_detail("same content already retired in this run"),
            );
            continue;
        }

        if let Some(entry) = catalog.lookup(&hash).await? {
            if archived_copy_intact(archive_root, &entry.stored_path, &entry.hash) {
                tracing::info!(
                    identifier = item.identifier(),
                    stored_path = %entry.stored_path,
                    "already archived"
                );
                item.transition(ItemState::DuplicateSkipped)?;
                report.duplicate_skipped += 1;
                report.outcomes.push(
                    ItemOutcome::new(&item, Disposition::DuplicateSkipped)
                        .with_detail(&entry.stored_path),
                );
                continue;
            }
            tracing::warn!(
                identifier = item.identifier(),
                stored_path = %entry.stored_path,
                "catalog entry has no intact archived copy, retiring again; ingest will rebind it"
            );
        }

        if ctx.is_dry_run() {
            seen.insert(hash);
            let dest = archive_root.join(item.origin_group()).join(item.identifier());
            report.outcomes.push(
                ItemOutcome::new(&item, Disposition::WouldArchive).with_detail(dest.display()),
            );
            continue;
        }

        match mover.stage(&item) {
            Ok(MoveOutcome::Moved { dest }) => {
                tracing::info!(identifier = item.identifier(), dest = %dest.display(), "retired");
                item.transition(ItemState::Archived)?;
                seen.insert(hash);
                report.moved += 1;
                report.bytes_moved += item.size();
                report.outcomes.push(
                    ItemOutcome::new(&item, Disposition::Archived).with_detail(dest.display()),
                );
            }
            Ok(MoveOutcome::SourceMissing) => {
                report.already_moved += 1;
                report.outcomes.push(
                    ItemOutcome::new(&item, Disposition::AlreadyMoved).with_detail("source missing"),
                );
            }
            Ok(MoveOutcome::DestinationExists { dest }) => {
                tracing::warn!(dest = %dest.display(), "destination occupied, leaving source in place");
                report.already_moved += 1;
                report.outcomes.push(
                    ItemOutcome::new(&item, Disposition::AlreadyMoved).with_detail(dest.display()),
                );
            }
            Err(e) => {
                tracing::error!(identifier = item.identifier(), "move failed: {e}");
                item.transition(ItemState::Errored)?;
                report
                    .outcomes
                    .push(ItemOutcome::new(&item, Disposition::Errored).with_detail(&e));
                report.errors.push(e);
            }
        }
    }

    if !ctx.is_dry_run() {
        for root in [ctx.repo_root(), archive_root] {
            match prune_empty_dirs(root) {
                Ok(n) if n > 0 => tracing::debug!(root = %root.display(), removed = n, "pruned empty directories"),
                Ok(_) => {}
                Err(e) => report.errors.push(e),
            }
        }
    }

    tracing::info!(
        moved = report.moved,
        duplicate_skipped = report.duplicate_skipped,
        already_moved = report.already_moved,
        errors = report.errors.len(),
        "retire run finished"
    );
    Ok(report)
}
