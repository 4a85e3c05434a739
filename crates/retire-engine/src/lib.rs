//! # retire-engine — Package Retirement Pipeline
//!
//! ```text
//! index ─► resolve identifiers ─► select obsolete ─► catalog lookup ─► pack ─► move
//! ```
//!
//! Three runs are exposed, each taking an explicit [`RunContext`]:
//!
//! - [`retire_run`] moves obsolete, not-yet-archived packages from the
//!   live repository into the archive staging area.
//! - [`repack_run`] packs staged packages into capacity-bounded volumes.
//! - [`ingest_catalog`] records a sealed volume's members in the catalog.
//!
//! All phases are single-threaded and strictly sequential. Per-item
//! failures are collected into the returned report; only a missing root
//! or an inconsistent catalog aborts a run.

pub mod context;
pub mod indexer;
pub mod ingest;
pub mod mover;
pub mod packer;
pub mod repack;
pub mod report;
pub mod retire;
pub mod selector;

pub use context::{LiveSet, RunContext, DEFAULT_CAPACITY_BYTES};
pub use indexer::{index, index_with, Registry};
pub use ingest::ingest_catalog;
pub use mover::{move_file, prune_empty_dirs, MoveOutcome, Mover, MANIFEST_FILE};
pub use packer::{parse_volume_id, volume_dir_name, BinPacker, PackPlan, Volume};
pub use repack::{existing_volume_ids, next_volume_id, repack_run};
pub use report::{Disposition, IngestReport, ItemOutcome, RepackReport, RetireReport, SealedVolume};
pub use retire::retire_run;
pub use selector::{select, Selection};
