//! Duplicate grouping and size-based file organization.
//!
//! # Overview
//!
//! Size grouping is the first phase of duplicate detection. Files with
//! different sizes cannot be duplicates, so bucketing by exact size removes
//! most files from consideration without reading a single byte.
//!
//! Zero-byte files are split off into their own list here and never hashed.
//!
//! # Example
//!
//! ```
//! use dupkeeper::scanner::FileEntry;
//! use dupkeeper::duplicates::group_by_size;
//! use std::path::PathBuf;
//!
//! let files = vec![
//!     FileEntry::new(PathBuf::from("/file1.txt"), 1024),
//!     FileEntry::new(PathBuf::from("/file2.txt"), 1024),
//!     FileEntry::new(PathBuf::from("/file3.txt"), 2048),
//!     FileEntry::new(PathBuf::from("/empty.txt"), 0),
//! ];
//!
//! let (partition, stats) = group_by_size(files);
//!
//! assert_eq!(stats.total_files, 4);
//! assert_eq!(stats.potential_duplicates, 2);  // Two 1024-byte files
//! assert_eq!(partition.candidates.len(), 1);
//! assert_eq!(partition.empty_files, vec![PathBuf::from("/empty.txt")]);
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use crate::scanner::{hash_to_hex, FileEntry, Hash};

/// Confirmed group of byte-identical files.
///
/// All paths share the same size and content hash, and a group always
/// holds at least two paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    /// BLAKE3 hash of the file content
    pub hash: Hash,
    /// File size in bytes (shared by all files)
    pub size: u64,
    /// Paths of the identical files
    pub paths: Vec<PathBuf>,
}

impl DuplicateGroup {
    /// Create a new duplicate group.
    #[must_use]
    pub fn new(hash: Hash, size: u64, paths: Vec<PathBuf>) -> Self {
        Self { hash, size, paths }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Total wasted space (all copies minus one).
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.size * self.duplicate_count() as u64
    }

    /// Number of redundant copies (total - 1).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.paths.len().saturating_sub(1)
    }

    /// Hash as hexadecimal string.
    #[must_use]
    pub fn hash_hex(&self) -> String {
        hash_to_hex(&self.hash)
    }

    /// Sort paths lexicographically.
    pub fn sort_paths(&mut self) {
        self.paths.sort();
    }
}

/// Output of the size grouping phase.
#[derive(Debug, Clone, Default)]
pub struct SizePartition {
    /// Non-empty files whose size is shared with at least one other file
    pub candidates: HashMap<u64, Vec<FileEntry>>,
    /// Every zero-byte file, in discovery order
    pub empty_files: Vec<PathBuf>,
}

impl SizePartition {
    /// Number of files that still need hashing.
    #[must_use]
    pub fn candidate_count(&self) -> usize {
        self.candidates.values().map(Vec::len).sum()
    }
}

/// Statistics from size grouping phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Total number of files processed
    pub total_files: usize,
    /// Total size of all files in bytes
    pub total_size: u64,
    /// Number of unique non-zero file sizes
    pub unique_sizes: usize,
    /// Number of files that could be duplicates (in groups of 2+)
    pub potential_duplicates: usize,
    /// Number of files eliminated as unique (singleton groups)
    pub eliminated_unique: usize,
    /// Number of empty files encountered (size 0, handled separately)
    pub empty_files: usize,
    /// Number of size groups with 2+ files
    pub duplicate_groups: usize,
}

impl GroupingStats {
    /// Percentage of files eliminated by size grouping.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.eliminated_unique as f64 / self.total_files as f64) * 100.0
        }
    }
}

/// Group files by size (first phase of duplicate detection).
///
/// Zero-byte files go to [`SizePartition::empty_files`]; sizes seen only
/// once are dropped. No file I/O is performed.
///
/// # Example
///
/// ```
/// use dupkeeper::scanner::FileEntry;
/// use dupkeeper::duplicates::group_by_size;
/// use std::path::PathBuf;
///
/// let files = vec![
///     FileEntry::new(PathBuf::from("/a.txt"), 100),
///     FileEntry::new(PathBuf::from("/b.txt"), 100),
///     FileEntry::new(PathBuf::from("/c.txt"), 200),
/// ];
///
/// let (partition, stats) = group_by_size(files);
///
/// assert_eq!(partition.candidates.len(), 1);
/// assert_eq!(partition.candidates[&100].len(), 2);
/// assert_eq!(stats.eliminated_unique, 1);  // The 200-byte file
/// ```
#[must_use]
pub fn group_by_size(
    files: impl IntoIterator<Item = FileEntry>,
) -> (SizePartition, GroupingStats) {
    let mut all_groups: HashMap<u64, Vec<FileEntry>> = HashMap::new();
    let mut empty_files = Vec::new();
    let mut stats = GroupingStats::default();

    for file in files {
        stats.total_files += 1;
        stats.total_size += file.size;

        if file.size == 0 {
            log::trace!("Empty file: {}", file.path.display());
            empty_files.push(file.path);
            continue;
        }

        all_groups.entry(file.size).or_default().push(file);
    }

    stats.empty_files = empty_files.len();
    stats.unique_sizes = all_groups.len();

    let candidates: HashMap<u64, Vec<FileEntry>> = all_groups
        .into_iter()
        .filter(|(size, files)| {
            if files.len() == 1 {
                stats.eliminated_unique += 1;
                log::trace!(
                    "Eliminated unique size {}: {}",
                    size,
                    files[0].path.display()
                );
                false
            } else {
                stats.potential_duplicates += files.len();
                stats.duplicate_groups += 1;
                log::debug!(
                    "Size group {} bytes: {} potential duplicates",
                    size,
                    files.len()
                );
                true
            }
        })
        .collect();

    log::info!(
        "Size grouping complete: {} files → {} candidates, {} empty ({:.1}% eliminated)",
        stats.total_files,
        stats.potential_duplicates,
        stats.empty_files,
        stats.elimination_rate()
    );

    (
        SizePartition {
            candidates,
            empty_files,
        },
        stats,
    )
}

/// Regroup hashed candidates by `(size, hash)`.
///
/// Only groups with two or more paths survive. Within a size, groups are
/// ordered by hash and paths keep their input order.
#[must_use]
pub fn group_by_hash(
    hashed: impl IntoIterator<Item = (FileEntry, Hash)>,
) -> BTreeMap<u64, Vec<DuplicateGroup>> {
    let mut by_key: BTreeMap<(u64, Hash), Vec<PathBuf>> = BTreeMap::new();
    for (file, hash) in hashed {
        by_key.entry((file.size, hash)).or_default().push(file.path);
    }

    let mut duplicates: BTreeMap<u64, Vec<DuplicateGroup>> = BTreeMap::new();
    for ((size, hash), paths) in by_key {
        if paths.len() < 2 {
            continue;
        }
        log::debug!(
            "Duplicate group {}: {} files of {} bytes",
            hash_to_hex(&hash),
            paths.len(),
            size
        );
        duplicates
            .entry(size)
            .or_default()
            .push(DuplicateGroup::new(hash, size, paths));
    }

    duplicates
}
