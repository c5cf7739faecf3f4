//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Size-based file grouping with empty-file separation
//! - Concurrent content hashing of same-size candidates
//! - Duplicate group management and the owning [`DuplicateFinder`]

pub mod finder;
pub mod groups;

pub use finder::{
    default_hash_threads, hash_candidates, scan_directories, DuplicateFinder, FinderConfig,
    FinderError, ScanResult, ScanSummary, SortOrder,
};
pub use groups::{group_by_hash, group_by_size, DuplicateGroup, GroupingStats, SizePartition};
