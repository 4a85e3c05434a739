//! Catalog error types.

use retire_core::RetireError;
use thiserror::Error;

/// Errors from catalog operations.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The database rejected or failed a query.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Embedded schema migrations could not be applied.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// The hash is already bound to a different stored path.
    #[error("hash {hash} is cataloged at {existing}, refusing to bind it to {attempted}")]
    DuplicateHash {
        /// The conflicting content hash.
        hash: String,
        /// Stored path already in the catalog.
        existing: String,
        /// Stored path the caller tried to insert.
        attempted: String,
    },

    /// A row holds data that cannot be mapped back to an entry.
    #[error("corrupt catalog row: {0}")]
    CorruptRow(String),
}

impl From<CatalogError> for RetireError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::DuplicateHash {
                hash,
                existing,
                attempted,
            } => RetireError::DuplicateHash {
                hash,
                existing,
                attempted,
            },
            other => RetireError::Catalog(other.to_string()),
        }
    }
}
