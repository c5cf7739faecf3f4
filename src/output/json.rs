//! JSON output formatter for duplicate scan results.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "duplicates": [
//!     {
//!       "hash": "abc123...",
//!       "size": 2048,
//!       "files": ["/data/a/photo.jpg", "/data/b/photo.jpg"]
//!     }
//!   ],
//!   "empty_files": ["/data/a/placeholder"],
//!   "summary": {
//!     "total_files": 100,
//!     "duplicate_groups": 1,
//!     "reclaimable_space": 2048,
//!     "from_cache": false,
//!     "exit_code_name": "DK000"
//!   }
//! }
//! ```
//!
//! Groups appear in the order given, which the CLI makes largest size first.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::duplicates::{DuplicateGroup, ScanSummary};
use crate::error::ExitCode;

/// A single duplicate group in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDuplicateGroup {
    /// BLAKE3 hash as hexadecimal string (64 characters)
    pub hash: String,
    /// File size in bytes
    pub size: u64,
    /// Paths of every copy
    pub files: Vec<String>,
}

impl JsonDuplicateGroup {
    /// Convert a [`DuplicateGroup`].
    #[must_use]
    pub fn from_duplicate_group(group: &DuplicateGroup) -> Self {
        Self {
            hash: group.hash_hex(),
            size: group.size,
            files: group.paths.iter().map(|p| path_string(p)).collect(),
        }
    }
}

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Number of regular files discovered (0 for cached results)
    pub total_files: usize,
    /// Total size of discovered files in bytes (0 for cached results)
    pub total_size: u64,
    /// Number of zero-byte files
    pub empty_files: usize,
    /// Number of confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Number of redundant copies (excluding one per group)
    pub duplicate_files: usize,
    /// Bytes freed by keeping one copy per group
    pub reclaimable_space: u64,
    /// Reclaimable space as a percentage of `total_size` (0 for cached results)
    pub wasted_percentage: f64,
    /// Files that vanished or became unreadable before hashing
    pub failed_hashes: usize,
    /// Entries the walk could not read
    pub scan_errors: usize,
    /// Duration of the scan in milliseconds
    pub scan_duration_ms: u64,
    /// Whether the result came from the cache rather than a fresh scan
    pub from_cache: bool,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "DK000")
    pub exit_code_name: String,
}

impl JsonSummary {
    /// Create a JSON summary from a [`ScanSummary`].
    #[must_use]
    pub fn from_scan_summary(summary: &ScanSummary, from_cache: bool, exit_code: ExitCode) -> Self {
        Self {
            total_files: summary.total_files,
            total_size: summary.total_size,
            empty_files: summary.empty_files,
            duplicate_groups: summary.duplicate_groups,
            duplicate_files: summary.duplicate_files,
            reclaimable_space: summary.reclaimable_space,
            wasted_percentage: summary.wasted_percentage(),
            failed_hashes: summary.failed_hashes,
            scan_errors: summary.scan_errors.len(),
            scan_duration_ms: u64::try_from(summary.scan_duration.as_millis()).unwrap_or(u64::MAX),
            from_cache,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Duplicate groups
    pub duplicates: Vec<JsonDuplicateGroup>,
    /// Zero-byte files
    pub empty_files: Vec<String>,
    /// Scan summary statistics
    pub summary: JsonSummary,
}

impl JsonOutput {
    /// Build the output from size-sorted groups.
    ///
    /// # Example
    ///
    /// ```
    /// use dupkeeper::duplicates::{DuplicateGroup, ScanSummary};
    /// use dupkeeper::error::ExitCode;
    /// use dupkeeper::output::json::JsonOutput;
    /// use std::path::PathBuf;
    ///
    /// let group = DuplicateGroup::new([0u8; 32], 1024, vec![
    ///     PathBuf::from("/file1.txt"),
    ///     PathBuf::from("/file2.txt"),
    /// ]);
    /// let sorted = vec![(1024, std::slice::from_ref(&group))];
    ///
    /// let output = JsonOutput::new(&sorted, &[], &ScanSummary::default(), false, ExitCode::Success);
    /// assert_eq!(output.duplicates.len(), 1);
    /// ```
    #[must_use]
    pub fn new(
        sorted_groups: &[(u64, &[DuplicateGroup])],
        empty_files: &[PathBuf],
        summary: &ScanSummary,
        from_cache: bool,
        exit_code: ExitCode,
    ) -> Self {
        Self {
            duplicates: sorted_groups
                .iter()
                .flat_map(|(_, groups)| groups.iter())
                .map(JsonDuplicateGroup::from_duplicate_group)
                .collect(),
            empty_files: empty_files.iter().map(|p| path_string(p)).collect(),
            summary: JsonSummary::from_scan_summary(summary, from_cache, exit_code),
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write pretty-printed JSON and a trailing newline to `writer`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), JsonOutputError> {
        let json = self.to_json_pretty()?;
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON output: {0}")]
    Io(#[from] std::io::Error),
}
