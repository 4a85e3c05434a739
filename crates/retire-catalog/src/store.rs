//! # SQLite Catalog Store
//!
//! All functions operate on the `deb` table. Rows are never deleted. The
//! only update is [`Catalog::rebind`], which moves a hash to a new stored
//! path once the caller has confirmed the old archived copy is gone.
//!
//! ## Uniqueness
//!
//! `hash` carries a `UNIQUE` constraint and inserts use
//! `ON CONFLICT(hash) DO NOTHING`. Concurrent writers racing on one hash
//! are therefore serialized by SQLite itself; the loser reads back the
//! winning row and either reports it as already present (same stored
//! path) or fails with [`CatalogError::DuplicateHash`].

use std::path::Path;
use std::str::FromStr;

use retire_core::ContentHash;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::entry::{CatalogEntry, DebRow};
use crate::error::CatalogError;

/// Result of [`Catalog::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new row was written.
    Inserted,
    /// The identical (hash, stored path) pair was already cataloged.
    AlreadyPresent,
}

/// Handle to the persistent catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    pool: SqlitePool,
}

impl Catalog {
    /// Open (creating if needed) the catalog database at `path` and apply
    /// migrations.
    pub async fn open(path: &Path) -> Result<Self, CatalogError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;
        tracing::info!(path = %path.display(), "opened catalog");
        Self::from_pool(pool).await
    }

    /// A private in-memory catalog, discarded when the handle is dropped.
    ///
    /// The pool is pinned to a single connection that never expires, since
    /// every SQLite in-memory connection is its own database.
    pub async fn in_memory() -> Result<Self, CatalogError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Self::from_pool(pool).await
    }

    /// Wrap an existing pool and apply migrations.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, CatalogError> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::debug!("catalog migrations applied");
        Ok(Self { pool })
    }

    /// Fetch the entry for `hash`, if cataloged.
    pub async fn lookup(&self, hash: &ContentHash) -> Result<Option<CatalogEntry>, CatalogError> {
        let row = sqlx::query_as::<_, DebRow>(
            "SELECT name, version, architecture, hash, stored_path, volume_id
             FROM deb WHERE hash = ?",
        )
        .bind(hash.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(DebRow::into_entry).transpose()
    }

    /// Record `entry`.
    ///
    /// Re-inserting an identical (hash, stored path) pair is a no-op.
    /// A hash already bound to another stored path is a
    /// [`CatalogError::DuplicateHash`] and is never resolved here.
    pub async fn insert(&self, entry: &CatalogEntry) -> Result<InsertOutcome, CatalogError> {
        let result = sqlx::query(
            "INSERT INTO deb (name, version, architecture, hash, stored_path, volume_id)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(hash) DO NOTHING",
        )
        .bind(&entry.name)
        .bind(&entry.version)
        .bind(&entry.architecture)
        .bind(entry.hash.as_str())
        .bind(&entry.stored_path)
        .bind(i64::from(entry.volume_id))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            tracing::debug!(hash = %entry.hash, stored_path = %entry.stored_path, "cataloged");
            return Ok(InsertOutcome::Inserted);
        }

        let existing = self.lookup(&entry.hash).await?.ok_or_else(|| {
            CatalogError::CorruptRow(format!(
                "insert of {} conflicted but no row holds the hash",
                entry.hash
            ))
        })?;
        if existing.stored_path == entry.stored_path {
            return Ok(InsertOutcome::AlreadyPresent);
        }

        tracing::error!(
            hash = %entry.hash,
            existing = %existing.stored_path,
            attempted = %entry.stored_path,
            "catalog hash conflict"
        );
        Err(CatalogError::DuplicateHash {
            hash: entry.hash.to_string(),
            existing: existing.stored_path,
            attempted: entry.stored_path.clone(),
        })
    }

    /// Rebind `entry.hash` from `stale_path` to `entry`'s stored path and
    /// volume.
    ///
    /// The update only applies while the row still points at `stale_path`,
    /// so a concurrent rebind cannot be overwritten. Returns whether a row
    /// changed. Callers must have verified that nothing intact remains at
    /// `stale_path`.
    pub async fn rebind(&self, entry: &CatalogEntry, stale_path: &str) -> Result<bool, CatalogError> {
        let result = sqlx::query(
            "UPDATE deb
             SET name = ?, version = ?, architecture = ?, stored_path = ?, volume_id = ?
             WHERE hash = ? AND stored_path = ?",
        )
        .bind(&entry.name)
        .bind(&entry.version)
        .bind(&entry.architecture)
        .bind(&entry.stored_path)
        .bind(i64::from(entry.volume_id))
        .bind(entry.hash.as_str())
        .bind(stale_path)
        .execute(&self.pool)
        .await?;

        let changed = result.rows_affected() > 0;
        if changed {
            tracing::warn!(
                hash = %entry.hash,
                from = stale_path,
                to = %entry.stored_path,
                "rebound catalog entry"
            );
        }
        Ok(changed)
    }

    /// Highest volume id ever cataloged.
    pub async fn max_volume_id(&self) -> Result<Option<u32>, CatalogError> {
        let (max,): (Option<i64>,) = sqlx::query_as("SELECT MAX(volume_id) FROM deb")
            .fetch_one(&self.pool)
            .await?;
        max.map(|id| {
            u32::try_from(id)
                .map_err(|_| CatalogError::CorruptRow(format!("volume_id {id} out of range")))
        })
        .transpose()
    }

    /// All entries sealed into `volume_id`, ordered by stored path.
    pub async fn entries_for_volume(&self, volume_id: u32) -> Result<Vec<CatalogEntry>, CatalogError> {
        let rows = sqlx::query_as::<_, DebRow>(
            "SELECT name, version, architecture, hash, stored_path, volume_id
             FROM deb WHERE volume_id = ? ORDER BY stored_path",
        )
        .bind(i64::from(volume_id))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(DebRow::into_entry).collect()
    }

    /// Number of cataloged entries.
    pub async fn count(&self) -> Result<u64, CatalogError> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM deb")
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(n).unwrap_or(0))
    }

    /// Close the underlying pool, flushing pending writes.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
