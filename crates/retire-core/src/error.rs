//! # Error Types — Retirement Failure Taxonomy
//!
//! Every failure a retirement run can observe is one variant of
//! [`RetireError`]. Variants fall into two classes:
//!
//! - **Run-fatal**: the root is missing, or the catalog disagrees with
//!   itself. These abort the run because continuing could archive the
//!   same content twice or lose provenance.
//! - **Item-scoped**: a malformed identifier, an oversized item, or an I/O
//!   failure on one file. These are collected into the run report and the
//!   run moves on to the next item.

use std::path::PathBuf;

use thiserror::Error;

use crate::item::ItemState;

/// Errors produced by the retirement pipeline.
#[derive(Error, Debug)]
pub enum RetireError {
    /// A root directory required by the run does not exist.
    #[error("root not found: {}", path.display())]
    NotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// An identifier does not have the `<name>_<version>_<arch>.<ext>` shape.
    #[error("malformed package identifier {identifier:?}: {reason}")]
    MalformedName {
        /// The raw identifier (file name).
        identifier: String,
        /// Why parsing failed.
        reason: String,
    },

    /// A content hash is already cataloged under a different stored path.
    #[error("hash {hash} is cataloged at {existing}, refusing to bind it to {attempted}")]
    DuplicateHash {
        /// The conflicting content hash (hex).
        hash: String,
        /// Stored path already bound to the hash.
        existing: String,
        /// Stored path the caller tried to bind.
        attempted: String,
    },

    /// An item cannot fit even into an empty volume.
    #[error("{identifier} is {size} bytes and cannot fit a volume of {capacity} bytes")]
    ItemTooLarge {
        /// The oversized item.
        identifier: String,
        /// Item size in bytes.
        size: u64,
        /// Volume capacity in bytes.
        capacity: u64,
    },

    /// A filesystem operation on a single path failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Path the operation was applied to.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A directory handed to ingestion is not an archive volume.
    #[error("not an archive volume: {} ({reason})", path.display())]
    InvalidVolume {
        /// The offending directory.
        path: PathBuf,
        /// Why it was rejected.
        reason: String,
    },

    /// The persistent catalog failed.
    #[error("catalog error: {0}")]
    Catalog(String),

    /// An item was driven through an illegal lifecycle transition.
    #[error("invalid item transition from {from} to {to} for {identifier}")]
    InvalidTransition {
        /// Item identifier.
        identifier: String,
        /// State the item was in.
        from: ItemState,
        /// State that was requested.
        to: ItemState,
    },
}

impl RetireError {
    /// Wrap an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error must abort the whole run.
    ///
    /// Missing or invalid roots and catalog inconsistencies are fatal; everything
    /// else is scoped to a single item.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::InvalidVolume { .. }
                | Self::DuplicateHash { .. }
                | Self::Catalog(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = RetireError::NotFound {
            path: PathBuf::from("/srv/pool"),
        };
        assert!(format!("{err}").contains("/srv/pool"));
    }

    #[test]
    fn duplicate_hash_display_names_both_paths() {
        let err = RetireError::DuplicateHash {
            hash: "ab".repeat(32),
            existing: "volume0/main/a_1_all.deb".into(),
            attempted: "volume3/main/a_1_all.deb".into(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("volume0/main/a_1_all.deb"));
        assert!(msg.contains("volume3/main/a_1_all.deb"));
    }

    #[test]
    fn item_too_large_display() {
        let err = RetireError::ItemTooLarge {
            identifier: "big_1_amd64.deb".into(),
            size: 30,
            capacity: 15,
        };
        let msg = format!("{err}");
        assert!(msg.contains("30"));
        assert!(msg.contains("15"));
    }

    #[test]
    fn io_error_keeps_source() {
        let err = RetireError::io(
            "/tmp/x",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(format!("{err}").contains("denied"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn fatality_classification() {
        assert!(RetireError::NotFound {
            path: PathBuf::from("/x")
        }
        .is_fatal());
        assert!(RetireError::Catalog("locked".into()).is_fatal());
        assert!(RetireError::DuplicateHash {
            hash: String::new(),
            existing: String::new(),
            attempted: String::new(),
        }
        .is_fatal());
        assert!(!RetireError::MalformedName {
            identifier: "x".into(),
            reason: "y".into(),
        }
        .is_fatal());
        assert!(!RetireError::ItemTooLarge {
            identifier: "x".into(),
            size: 2,
            capacity: 1,
        }
        .is_fatal());
    }
}
