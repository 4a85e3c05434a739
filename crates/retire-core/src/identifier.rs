//! # Package Identifiers
//!
//! Package files are named `<name>_<version>_<arch>.<ext>`, for example
//! `bash_5.2.15-1_amd64.deb`. The version may carry an epoch and the
//! architecture field carries the file extension after its first `.`.
//!
//! Anything else is *malformed*. A malformed identifier is not an error
//! for the run; the item is kept and later treated as obsolete without
//! any version comparison.

use serde::{Deserialize, Serialize};

use crate::error::RetireError;

/// The parsed components of a well-formed package identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageId {
    /// Package name.
    pub name: String,
    /// Version string, compared with a [`VersionComparator`](crate::VersionComparator).
    pub version: String,
    /// Target architecture (`amd64`, `all`, ...).
    pub architecture: String,
    /// File extension (`deb`, `pkg`, ...).
    pub extension: String,
}

impl PackageId {
    /// Parse an identifier of the form `<name>_<version>_<arch>.<ext>`.
    ///
    /// Exactly three `_`-delimited fields are required, none of them
    /// empty, and the last one must carry a non-empty extension.
    pub fn parse(identifier: &str) -> Result<Self, RetireError> {
        let malformed = |reason: &str| RetireError::MalformedName {
            identifier: identifier.to_string(),
            reason: reason.to_string(),
        };

        let fields: Vec<&str> = identifier.split('_').collect();
        if fields.len() != 3 {
            return Err(malformed(&format!(
                "expected 3 underscore-delimited fields, found {}",
                fields.len()
            )));
        }
        let (name, version, tail) = (fields[0], fields[1], fields[2]);
        if name.is_empty() {
            return Err(malformed("empty name"));
        }
        if version.is_empty() {
            return Err(malformed("empty version"));
        }
        let (architecture, extension) = tail
            .split_once('.')
            .ok_or_else(|| malformed("missing file extension"))?;
        if architecture.is_empty() {
            return Err(malformed("empty architecture"));
        }
        if extension.is_empty() {
            return Err(malformed("empty file extension"));
        }

        Ok(Self {
            name: name.to_string(),
            version: version.to_string(),
            architecture: architecture.to_string(),
            extension: extension.to_string(),
        })
    }
}

impl std::fmt::Display for PackageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}_{}_{}.{}",
            self.name, self.version, self.architecture, self.extension
        )
    }
}
