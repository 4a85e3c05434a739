//! # retire-core — Foundational Types for Package Retirement
//!
//! Leaf crate of the workspace. It defines what a package item is, how
//! package identifiers and versions are read and ordered, how content is
//! hashed for deduplication, and the error taxonomy shared by every phase
//! of a retirement run.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `retire-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod digest;
pub mod error;
pub mod identifier;
pub mod item;
pub mod version;

pub use digest::{hash_file, hash_reader, ContentHash, CHUNK_SIZE};
pub use error::RetireError;
pub use identifier::PackageId;
pub use item::{ItemState, PackageItem};
pub use version::{compare_versions, DpkgComparator, NativeComparator, VersionComparator};
