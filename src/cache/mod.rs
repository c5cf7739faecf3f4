//! Persistent cache of scan results.
//!
//! Repeated invocations on the same directories reuse a stored
//! [`ScanResult`](crate::duplicates::ScanResult) instead of rescanning.
//!
//! # Architecture
//!
//! * [`store`]: the [`ResultCache`], which fingerprints directory sets and
//!   manages entry files under a cache root.
//! * [`entry`]: the versioned, checksummed file format.
//!
//! # Invalidation
//!
//! An entry is ignored when it is older than the caller's threshold, when it
//! fails to parse or verify, or when it was recorded for another directory
//! set. Real deletions invalidate every entry for the scanned directories.
//!
//! The cache root is shared between processes without locking. Entries are
//! written to a temporary file and renamed into place, and a damaged entry
//! is treated as a miss.

pub mod entry;
pub mod store;

use std::path::PathBuf;

use thiserror::Error;

pub use entry::{CachedGroup, CachedResult, CACHE_VERSION};
pub use store::{fingerprint, CleanupReport, ResultCache, REUSE_THRESHOLD, SHOW_THRESHOLD};

/// Errors raised while reading or writing cache entries.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Filesystem failure on an entry or the cache root.
    #[error("cache I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The entry is not valid JSON of the expected shape.
    #[error("cache serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The payload does not match its recorded checksum.
    #[error("cache entry checksum mismatch")]
    ChecksumMismatch,

    /// The entry was written by an incompatible format version.
    #[error("unsupported cache version {0} (expected {CACHE_VERSION})")]
    UnsupportedVersion(u32),

    /// The entry parsed but describes an impossible result.
    #[error("corrupt cache entry: {0}")]
    Corrupt(String),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
