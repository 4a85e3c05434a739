//! # retire-cli — `pkg-retire`
//!
//! Command-line front end for the retirement pipeline.
//!
//! ## Subcommands
//!
//! - `pkg-retire retire`: move obsolete packages into the archive staging area.
//! - `pkg-retire repack`: pack staged packages into capacity-bounded volumes.
//! - `pkg-retire ingest`: record sealed volumes in the catalog.
//! - `pkg-retire run`: all three, in order.
//!
//! ```bash
//! pkg-retire --config retire.yaml retire --dry-run
//! pkg-retire --archive-root /srv/archive repack --capacity 4700000000
//! pkg-retire --catalog catalog.sqlite ingest --volume /srv/archive/volume3
//! pkg-retire -v --config retire.yaml run
//! ```

pub mod config;
pub mod ingest;
pub mod listing;
pub mod output;
pub mod pipeline;
pub mod repack;
pub mod retire;

pub use config::{ComparatorKind, ConfigOverrides, RetireConfig, Settings};
pub use listing::{ListingClient, ListingError, RetryPolicy};
