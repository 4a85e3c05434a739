//! # Content Hashing
//!
//! Content hashes key the archive catalog: two files with the same hash
//! are treated as the same archived content.
//!
//! Files are streamed through SHA-256 in fixed [`CHUNK_SIZE`] chunks, so
//! memory use does not grow with file size.
//!
//! The hash only guards against *accidental* duplicates in a trusted
//! repository. It is not a security control and no integrity or
//! authenticity guarantee should be derived from it.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Read buffer size for streamed hashing.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Lowercase hex SHA-256 of a file's content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    /// Accept an existing hex digest, e.g. one read back from the catalog.
    ///
    /// Returns `None` unless the input is 64 hex characters. Uppercase
    /// input is normalized to lowercase.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim();
        if hex.len() == 64 && hex.bytes().all(|c| c.is_ascii_hexdigit()) {
            Some(Self(hex.to_ascii_lowercase()))
        } else {
            None
        }
    }

    /// The digest as a hex string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hash everything `reader` yields, one chunk at a time.
pub fn hash_reader<R: Read>(mut reader: R) -> io::Result<ContentHash> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
    }
    let hex = hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect();
    Ok(ContentHash(hex))
}

/// Hash the content of the file at `path`.
pub fn hash_file(path: &Path) -> io::Result<ContentHash> {
    hash_reader(File::open(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    // sha256("") and sha256("abc")
    const EMPTY: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
    const ABC: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

    #[test]
    fn known_vectors() {
        assert_eq!(hash_reader(&b""[..]).unwrap().as_str(), EMPTY);
        assert_eq!(hash_reader(&b"abc"[..]).unwrap().as_str(), ABC);
    }

    #[test]
    fn chunk_boundaries_do_not_change_the_digest() {
        let data = vec![0x5au8; CHUNK_SIZE * 3 + 17];
        let streamed = hash_reader(&data[..]).unwrap();
        let mut hasher = Sha256::new();
        hasher.update(&data);
        let whole: String = hasher
            .finalize()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect();
        assert_eq!(streamed.as_str(), whole);
    }

    #[test]
    fn hash_file_matches_reader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        std::fs::write(&path, b"abc").unwrap();
        assert_eq!(hash_file(&path).unwrap().as_str(), ABC);
    }

    #[test]
    fn hash_file_missing_is_not_found() {
        let err = hash_file(Path::new("/nonexistent/for/tests")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn from_hex_validates_and_normalizes() {
        let upper = ABC.to_ascii_uppercase();
        assert_eq!(ContentHash::from_hex(&upper).unwrap().as_str(), ABC);
        assert!(ContentHash::from_hex("abc").is_none());
        assert!(ContentHash::from_hex(&"zz".repeat(32)).is_none());
    }
}
