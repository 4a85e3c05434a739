//! Run reports.
//!
//! Each run returns a report: counters, one [`ItemOutcome`] per item the
//! run acted on (the structured event trail of the run), and the per-item
//! errors it collected along the way.

use std::path::PathBuf;

use retire_core::{PackageItem, RetireError};
use serde::{Serialize, Serializer};

/// What happened to one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// Moved into the archive.
    Archived,
    /// Would have been moved; dry run.
    WouldArchive,
    /// Identical content is already archived.
    DuplicateSkipped,
    /// Source gone or destination already present; nothing to do.
    AlreadyMoved,
    /// Larger than a whole volume.
    TooLarge,
    /// Failed; see `detail`.
    Errored,
}

/// One entry in a run's event trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemOutcome {
    /// File name.
    pub identifier: String,
    /// Provenance directory.
    pub origin_group: String,
    /// Outcome.
    pub disposition: Disposition,
    /// Destination, duplicate location, or error text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ItemOutcome {
    /// An outcome for `item` with no detail.
    pub fn new(item: &PackageItem, disposition: Disposition) -> Self {
        Self {
            identifier: item.identifier().to_string(),
            origin_group: item.origin_group().to_string(),
            disposition,
            detail: None,
        }
    }

    /// Attach a detail string.
    pub fn with_detail(mut self, detail: impl ToString) -> Self {
        self.detail = Some(detail.to_string());
        self
    }
}

fn errors_as_strings<S: Serializer>(errors: &[RetireError], s: S) -> Result<S::Ok, S::Error> {
    s.collect_seq(errors.iter().map(ToString::to_string))
}

/// Result of a retire run.
#[derive(Debug, Default, Serialize)]
pub struct RetireReport {
    /// Items moved into the archive staging area.
    pub moved: usize,
    /// Bytes moved.
    pub bytes_moved: u64,
    /// Items skipped because their content is already archived.
    pub duplicate_skipped: usize,
    /// Items a previous run already handled.
    pub already_moved: usize,
    /// Items kept because the live index still serves them.
    pub still_live: usize,
    /// Items left in place as the newest version.
    pub current: usize,
    /// Event trail for every obsolete item.
    pub outcomes: Vec<ItemOutcome>,
    /// Non-fatal diagnostics, e.g. malformed identifiers.
    #[serde(serialize_with = "errors_as_strings")]
    pub warnings: Vec<RetireError>,
    /// Per-item failures.
    #[serde(serialize_with = "errors_as_strings")]
    pub errors: Vec<RetireError>,
}

/// A volume the mover has sealed on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SealedVolume {
    /// Volume id.
    pub id: u32,
    /// Volume directory.
    pub dir: PathBuf,
    /// Sum of member sizes.
    pub used_bytes: u64,
    /// Member paths relative to the archive root, as written to the manifest.
    pub members: Vec<String>,
}

/// Result of a repack run.
#[derive(Debug, Default, Serialize)]
pub struct RepackReport {
    /// Volumes sealed by this run, in id order.
    pub volumes: Vec<SealedVolume>,
    /// Event trail for every staged item.
    pub outcomes: Vec<ItemOutcome>,
    /// Per-item failures, including oversized items.
    #[serde(serialize_with = "errors_as_strings")]
    pub errors: Vec<RetireError>,
}

impl RepackReport {
    /// Number of volumes sealed (or planned, on a dry run).
    pub fn volume_count(&self) -> usize {
        self.volumes.len()
    }
}

/// Result of cataloging one volume.
#[derive(Debug, Default, Serialize)]
pub struct IngestReport {
    /// Volume id.
    pub volume_id: u32,
    /// New catalog rows.
    pub inserted: usize,
    /// Members already cataloged at the same path.
    pub already_present: usize,
    /// Members whose hash was cataloged at a path that no longer holds
    /// the content, now bound to this volume instead.
    pub rebound: usize,
    /// Members that could not be hashed.
    #[serde(serialize_with = "errors_as_strings")]
    pub errors: Vec<RetireError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_serializes_snake_case_without_empty_detail() {
        let item = PackageItem::new("/repo/main/a_1_all.deb", 1);
        let json = serde_json::to_value(ItemOutcome::new(&item, Disposition::DuplicateSkipped)).unwrap();
        assert_eq!(json["disposition"], "duplicate_skipped");
        assert_eq!(json["origin_group"], "main");
        assert!(json.get("detail").is_none());
    }

    #[test]
    fn errors_serialize_as_messages() {
        let report = RetireReport {
            errors: vec![RetireError::ItemTooLarge {
                identifier: "big".into(),
                size: 2,
                capacity: 1,
            }],
            ..RetireReport::default()
        };
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["errors"][0].as_str().unwrap().contains("big"));
    }
}
