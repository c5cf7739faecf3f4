//! On-disk format of a cached scan result.
//!
//! Each entry file holds a [`CacheEnvelope`]: the serialized
//! [`CachedResult`] plus a SHA-256 checksum of its compact JSON form.
//! Anything that fails to parse, fails the checksum, carries another
//! version or describes an impossible result is rejected as a whole.
//!
//! Paths are stored as plain strings when they are valid UTF-8 and as
//! `{"base64": "..."}` objects holding the raw bytes otherwise, so any name
//! the filesystem accepts survives a round trip.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::CacheError;
use crate::duplicates::{DuplicateGroup, ScanResult};
use crate::scanner::{hex_to_hash, DirectorySet};

/// Current version of the cache file format.
pub const CACHE_VERSION: u32 = 2;

/// A duplicate group as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedGroup {
    /// Hex-encoded BLAKE3 content hash.
    pub hash: String,
    /// File size in bytes.
    pub size: u64,
    /// Paths of every copy.
    #[serde(with = "stored_paths")]
    pub paths: Vec<PathBuf>,
}

/// Versioned, serializable form of a [`ScanResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResult {
    /// Format version.
    pub version: u32,
    /// When the entry was written.
    pub created_at: DateTime<Utc>,
    /// Fingerprint of `directories`.
    pub fingerprint: String,
    /// Chunk size the hashes were computed with.
    pub chunk_size: usize,
    /// Canonical scanned directories, sorted.
    #[serde(with = "stored_paths")]
    pub directories: Vec<PathBuf>,
    /// Duplicate groups, smallest size first.
    pub groups: Vec<CachedGroup>,
    /// Zero-byte files.
    #[serde(with = "stored_paths")]
    pub empty_files: Vec<PathBuf>,
}

/// Lossless serde representation of path lists.
mod stored_paths {
    use std::path::{Path, PathBuf};

    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    #[serde(untagged)]
    enum StoredPath {
        Text(String),
        Bytes { base64: String },
    }

    impl StoredPath {
        fn from_path(path: &Path) -> Self {
            match path.to_str() {
                Some(text) => Self::Text(text.to_string()),
                None => Self::Bytes {
                    base64: STANDARD.encode(raw_bytes(path)),
                },
            }
        }

        fn into_path(self) -> Result<PathBuf, String> {
            match self {
                Self::Text(text) => Ok(PathBuf::from(text)),
                Self::Bytes { base64 } => {
                    let bytes = STANDARD
                        .decode(base64.as_bytes())
                        .map_err(|e| format!("invalid base64 path: {e}"))?;
                    from_raw_bytes(bytes)
                }
            }
        }
    }

    #[cfg(unix)]
    fn raw_bytes(path: &Path) -> Vec<u8> {
        use std::os::unix::ffi::OsStrExt;
        path.as_os_str().as_bytes().to_vec()
    }

    #[cfg(unix)]
    fn from_raw_bytes(bytes: Vec<u8>) -> Result<PathBuf, String> {
        use std::os::unix::ffi::OsStringExt;
        Ok(PathBuf::from(std::ffi::OsString::from_vec(bytes)))
    }

    #[cfg(not(unix))]
    fn raw_bytes(path: &Path) -> Vec<u8> {
        path.as_os_str().as_encoded_bytes().to_vec()
    }

    #[cfg(not(unix))]
    fn from_raw_bytes(bytes: Vec<u8>) -> Result<PathBuf, String> {
        String::from_utf8(bytes)
            .map(PathBuf::from)
            .map_err(|_| "path bytes are not representable on this platform".to_string())
    }

    pub fn serialize<S: Serializer>(paths: &[PathBuf], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(paths.iter().map(|p| StoredPath::from_path(p)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<PathBuf>, D::Error> {
        Vec::<StoredPath>::deserialize(deserializer)?
            .into_iter()
            .map(|p| p.into_path().map_err(D::Error::custom))
            .collect()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheEnvelope {
    /// SHA256 checksum of the compact JSON of `result`.
    checksum: String,
    result: CachedResult,
}

impl CachedResult {
    /// Capture `result` under `fingerprint`.
    #[must_use]
    pub fn from_scan(result: &ScanResult, fingerprint: &str) -> Self {
        Self {
            version: CACHE_VERSION,
            created_at: Utc::now(),
            fingerprint: fingerprint.to_string(),
            chunk_size: result.chunk_size,
            directories: result.directories.to_vec(),
            groups: result
                .groups()
                .map(|g| CachedGroup {
                    hash: g.hash_hex(),
                    size: g.size,
                    paths: g.paths.clone(),
                })
                .collect(),
            empty_files: result.empty_files.clone(),
        }
    }

    /// Rebuild a [`ScanResult`] for `directories`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Corrupt`] if the entry was recorded for other
    /// directories or contains values no scan could have produced.
    pub fn into_scan(self, directories: &DirectorySet) -> Result<ScanResult, CacheError> {
        if self.directories != directories.to_vec() {
            return Err(CacheError::Corrupt(
                "entry was recorded for a different directory set".to_string(),
            ));
        }
        if self.chunk_size == 0 {
            return Err(CacheError::Corrupt("chunk size is zero".to_string()));
        }

        let mut duplicates: BTreeMap<u64, Vec<DuplicateGroup>> = BTreeMap::new();
        for group in self.groups {
            let hash = hex_to_hash(&group.hash).ok_or_else(|| {
                CacheError::Corrupt(format!("malformed content hash '{}'", group.hash))
            })?;
            if group.paths.len() < 2 {
                return Err(CacheError::Corrupt(format!(
                    "group {} has fewer than two paths",
                    group.hash
                )));
            }
            duplicates
                .entry(group.size)
                .or_default()
                .push(DuplicateGroup::new(hash, group.size, group.paths));
        }

        Ok(ScanResult {
            directories: directories.clone(),
            duplicates,
            empty_files: self.empty_files,
            chunk_size: self.chunk_size,
        })
    }
}

fn checksum_of(result: &CachedResult) -> Result<String, CacheError> {
    // Must match between encode and decode: compact form.
    let compact = serde_json::to_string(result)?;
    let mut hasher = Sha256::new();
    hasher.update(compact.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

/// Serialize `result` into the checksummed envelope.
///
/// # Errors
///
/// Returns [`CacheError::Serialize`] if serialization fails.
pub fn encode(result: &CachedResult) -> Result<String, CacheError> {
    let envelope = CacheEnvelope {
        checksum: checksum_of(result)?,
        result: result.clone(),
    };
    Ok(serde_json::to_string_pretty(&envelope)?)
}

/// Parse and verify an envelope.
///
/// # Errors
///
/// - [`CacheError::Serialize`] if the text is not a valid envelope
/// - [`CacheError::ChecksumMismatch`] if the payload was altered
/// - [`CacheError::UnsupportedVersion`] for any version but [`CACHE_VERSION`]
pub fn decode(text: &str) -> Result<CachedResult, CacheError> {
    let envelope: CacheEnvelope = serde_json::from_str(text)?;

    if checksum_of(&envelope.result)? != envelope.checksum {
        return Err(CacheError::ChecksumMismatch);
    }
    if envelope.result.version != CACHE_VERSION {
        return Err(CacheError::UnsupportedVersion(envelope.result.version));
    }

    Ok(envelope.result)
}
