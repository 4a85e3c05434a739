//! Catalog entries and their row mapping.

use retire_core::{ContentHash, PackageItem};
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// One archived package, keyed by content hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Content hash; unique across the catalog.
    pub hash: ContentHash,
    /// Package name, or the raw identifier when it could not be parsed.
    pub name: String,
    /// Parsed version, if any.
    pub version: Option<String>,
    /// Parsed architecture, if any.
    pub architecture: Option<String>,
    /// Location relative to the archive root, `/`-separated.
    pub stored_path: String,
    /// Volume the package was sealed into.
    pub volume_id: u32,
}

impl CatalogEntry {
    /// Describe `item` as archived at `stored_path` inside `volume_id`.
    ///
    /// Hashes the item if it has not been hashed yet.
    pub fn for_item(
        item: &PackageItem,
        stored_path: impl Into<String>,
        volume_id: u32,
    ) -> Result<Self, retire_core::RetireError> {
        Ok(Self {
            hash: item.content_hash()?.clone(),
            name: item.name().to_string(),
            version: item.version().map(str::to_string),
            architecture: item.architecture().map(str::to_string),
            stored_path: stored_path.into(),
            volume_id,
        })
    }
}

/// Raw `deb` row as stored.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct DebRow {
    pub name: String,
    pub version: Option<String>,
    pub architecture: Option<String>,
    pub hash: String,
    pub stored_path: String,
    pub volume_id: i64,
}

impl DebRow {
    pub(crate) fn into_entry(self) -> Result<CatalogEntry, CatalogError> {
        let hash = ContentHash::from_hex(&self.hash)
            .ok_or_else(|| CatalogError::CorruptRow(format!("invalid hash {:?}", self.hash)))?;
        let volume_id = u32::try_from(self.volume_id).map_err(|_| {
            CatalogError::CorruptRow(format!(
                "volume id {} out of range for {}",
                self.volume_id, self.stored_path
            ))
        })?;
        Ok(CatalogEntry {
            hash,
            name: self.name,
            version: self.version,
            architecture: self.architecture,
            stored_path: self.stored_path,
            volume_id,
        })
    }
}
