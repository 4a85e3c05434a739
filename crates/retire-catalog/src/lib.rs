//! # retire-catalog — Archived Content Catalog
//!
//! A persistent index of every package already sealed into an archive
//! volume, keyed by content hash. Retirement runs consult it to avoid
//! archiving the same bytes twice; ingestion adds the members of newly
//! sealed volumes.
//!
//! The catalog is *advisory*. Callers must confirm that a cataloged
//! stored path still exists and still hashes to the same value before
//! skipping work on the strength of an entry.
//!
//! Schema (applied by embedded migrations):
//!
//! ```sql
//! deb(name, version, architecture, hash UNIQUE, stored_path, volume_id)
//! ```

pub mod entry;
pub mod error;
pub mod store;

pub use entry::CatalogEntry;
pub use error::CatalogError;
pub use store::{Catalog, InsertOutcome};
