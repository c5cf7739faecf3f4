//! Duplicate finder implementation with two-phase detection.
//!
//! # Overview
//!
//! This module orchestrates the duplicate detection pipeline:
//! 1. **Walk** - Collect every regular file under the directory set
//! 2. **Size grouping** - Bucket files by size, split off empty files
//!    (see [`crate::duplicates::groups`])
//! 3. **Hashing** - Stream every same-size candidate through BLAKE3 on a
//!    dedicated worker pool, then regroup by `(size, hash)`
//!
//! # Example
//!
//! ```no_run
//! use dupkeeper::duplicates::{DuplicateFinder, FinderConfig, SortOrder};
//!
//! let finder = DuplicateFinder::scan_paths(["/data/a", "/data/b"], FinderConfig::default())
//!     .unwrap();
//!
//! for (size, groups) in finder.size_sorted_duplicates(SortOrder::Descending) {
//!     for group in groups {
//!         println!("{} bytes: {:?}", size, group.paths);
//!     }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytesize::ByteSize;
use rayon::prelude::*;

use super::groups::{group_by_hash, group_by_size, DuplicateGroup};
use crate::progress::{ProgressCallback, PHASE_HASHING, PHASE_WALKING};
use crate::scanner::{
    DirectorySet, FileEntry, Hash, HashError, Hasher, ResolveError, ScanError, Walker,
    DEFAULT_CHUNK_SIZE,
};

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Bytes read per chunk while hashing. Must be positive.
    pub chunk_size: usize,
    /// Number of worker threads in the hashing pool.
    pub hash_threads: usize,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("chunk_size", &self.chunk_size)
            .field("hash_threads", &self.hash_threads)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            hash_threads: default_hash_threads(),
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the hashing chunk size. Zero is rejected when a scan starts.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the number of hashing threads.
    #[must_use]
    pub fn with_hash_threads(mut self, threads: usize) -> Self {
        self.hash_threads = threads.max(1);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn validate(&self) -> Result<(), FinderError> {
        if self.chunk_size == 0 {
            return Err(FinderError::InvalidChunkSize);
        }
        Ok(())
    }
}

/// Number of CPU cores available to this process, at least one.
#[must_use]
pub fn default_hash_threads() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}

/// Ordering for [`DuplicateFinder::size_sorted_duplicates`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Smallest files first
    Ascending,
    /// Largest files first
    #[default]
    Descending,
}

/// Everything a single scan produces.
///
/// This is the unit the result cache persists and the deletion engine
/// consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    /// Directories that were scanned
    pub directories: DirectorySet,
    /// Duplicate groups partitioned by file size
    pub duplicates: BTreeMap<u64, Vec<DuplicateGroup>>,
    /// Every zero-byte regular file discovered
    pub empty_files: Vec<PathBuf>,
    /// Chunk size the hashes were computed with
    pub chunk_size: usize,
}

impl ScanResult {
    /// Number of duplicate groups across all sizes.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.duplicates.values().map(Vec::len).sum()
    }

    /// Iterate every duplicate group, smallest size first.
    pub fn groups(&self) -> impl Iterator<Item = &DuplicateGroup> {
        self.duplicates.values().flatten()
    }

    /// Number of redundant copies (files beyond the first in each group).
    #[must_use]
    pub fn duplicate_file_count(&self) -> usize {
        self.groups().map(DuplicateGroup::duplicate_count).sum()
    }

    /// Bytes freed if every group were reduced to one copy.
    #[must_use]
    pub fn reclaimable_space(&self) -> u64 {
        self.groups().map(DuplicateGroup::wasted_space).sum()
    }

    /// Whether any duplicates were found.
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        self.duplicates.values().any(|groups| !groups.is_empty())
    }
}

/// Summary statistics from a duplicate scan.
///
/// Every discovered file lands in exactly one bucket: empty, eliminated by
/// size, failed to hash, unique after hashing, or member of a duplicate group.
#[derive(Debug, Default)]
pub struct ScanSummary {
    /// Total number of regular files discovered
    pub total_files: usize,
    /// Total size of all discovered files in bytes
    pub total_size: u64,
    /// Number of zero-byte files
    pub empty_files: usize,
    /// Number of files eliminated by size grouping (unique sizes)
    pub eliminated_by_size: usize,
    /// Number of candidates successfully hashed
    pub hashed_files: usize,
    /// Number of candidates that could not be hashed
    pub failed_hashes: usize,
    /// Number of hashed candidates whose content turned out unique
    pub unique_after_hash: usize,
    /// Number of confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Number of files that belong to a duplicate group
    pub grouped_files: usize,
    /// Number of redundant copies (excluding one original per group)
    pub duplicate_files: usize,
    /// Total space that can be reclaimed by removing duplicates
    pub reclaimable_space: u64,
    /// Duration of the entire scan
    pub scan_duration: Duration,
    /// Traversal errors encountered during the walk
    pub scan_errors: Vec<ScanError>,
    /// Hashing failures; the affected files were dropped from candidacy
    pub hash_errors: Vec<HashError>,
}

impl ScanSummary {
    /// Build a summary describing an existing result, e.g. one loaded from
    /// the cache. Only the group totals are known.
    #[must_use]
    pub fn from_result(result: &ScanResult) -> Self {
        Self {
            empty_files: result.empty_files.len(),
            duplicate_groups: result.group_count(),
            grouped_files: result.groups().map(DuplicateGroup::len).sum(),
            duplicate_files: result.duplicate_file_count(),
            reclaimable_space: result.reclaimable_space(),
            ..Self::default()
        }
    }

    /// Calculate the percentage of space that is wasted by duplicates.
    #[must_use]
    pub fn wasted_percentage(&self) -> f64 {
        if self.total_size == 0 {
            0.0
        } else {
            (self.reclaimable_space as f64 / self.total_size as f64) * 100.0
        }
    }

    /// Format reclaimable space as human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        ByteSize::b(self.reclaimable_space).to_string()
    }
}

/// Errors that can occur during duplicate finding.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The supplied directories could not be resolved.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// The hashing chunk size was zero.
    #[error("chunk size must be a positive number of bytes")]
    InvalidChunkSize,
}

/// Hash every candidate on a dedicated pool of `config.hash_threads` workers.
///
/// Files that fail to hash are logged, returned as errors and excluded from
/// the hashed output. Results are collected at a single join point; output
/// order follows input order.
pub fn hash_candidates(
    files: Vec<FileEntry>,
    config: &FinderConfig,
) -> (Vec<(FileEntry, Hash)>, Vec<HashError>) {
    if files.is_empty() {
        log::debug!("Hashing: no candidates to process");
        return (Vec::new(), Vec::new());
    }

    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_start(PHASE_HASHING, files.len());
    }

    log::info!(
        "Hashing {} candidates on {} thread(s)",
        files.len(),
        config.hash_threads
    );

    let hasher = Hasher::new(config.chunk_size);
    let completed = AtomicUsize::new(0);

    let hash_all = || -> Vec<(FileEntry, Result<Hash, HashError>)> {
        files
            .into_par_iter()
            .map(|file| {
                let result = hasher.full_hash(&file.path);
                let current = completed.fetch_add(1, Ordering::Relaxed) + 1;
                if let Some(ref callback) = config.progress_callback {
                    callback.on_progress(current, file.path.to_string_lossy().as_ref());
                    callback.on_item_completed(file.size);
                }
                (file, result)
            })
            .collect()
    };

    let results = match rayon::ThreadPoolBuilder::new()
        .num_threads(config.hash_threads.max(1))
        .thread_name(|i| format!("dupkeeper-hash-{i}"))
        .build()
    {
        Ok(pool) => pool.install(hash_all),
        Err(e) => {
            log::warn!(
                "Failed to create hashing pool ({}), using global pool with {} threads",
                e,
                rayon::current_num_threads()
            );
            hash_all()
        }
    };

    let mut hashed = Vec::with_capacity(results.len());
    let mut errors = Vec::new();
    for (file, result) in results {
        match result {
            Ok(hash) => hashed.push((file, hash)),
            Err(e) => {
                log::warn!("Failed to hash {}: {}", file.path.display(), e);
                errors.push(e);
            }
        }
    }

    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_end(PHASE_HASHING);
    }

    (hashed, errors)
}

/// Run one complete scan of `dirs`.
///
/// Never fails: traversal and hashing errors are logged and collected into
/// the returned [`ScanSummary`]. `config` is assumed valid.
pub fn scan_directories(dirs: &DirectorySet, config: &FinderConfig) -> (ScanResult, ScanSummary) {
    let start_time = Instant::now();
    let mut summary = ScanSummary::default();

    // Walk
    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_start(PHASE_WALKING, 0);
    }

    let walker = Walker::new(dirs);
    let mut files = Vec::new();
    for entry in walker.walk() {
        match entry {
            Ok(file) => {
                if let Some(ref callback) = config.progress_callback {
                    callback.on_progress(files.len() + 1, file.path.to_string_lossy().as_ref());
                }
                files.push(file);
            }
            Err(e) => summary.scan_errors.push(e),
        }
    }

    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_end(PHASE_WALKING);
    }

    log::info!(
        "Walk complete: {} files found, {} errors",
        files.len(),
        summary.scan_errors.len()
    );

    // Size grouping
    let (partition, size_stats) = group_by_size(files);
    summary.total_files = size_stats.total_files;
    summary.total_size = size_stats.total_size;
    summary.empty_files = size_stats.empty_files;
    summary.eliminated_by_size = size_stats.eliminated_unique;

    // Hashing, in a stable order so group membership lists are reproducible
    let mut candidates: Vec<FileEntry> = partition.candidates.into_values().flatten().collect();
    candidates.sort_by(|a, b| a.path.cmp(&b.path));
    let candidate_count = candidates.len();

    let (hashed, hash_errors) = hash_candidates(candidates, config);
    summary.hashed_files = hashed.len();
    summary.failed_hashes = hash_errors.len();
    summary.hash_errors = hash_errors;

    let duplicates = group_by_hash(hashed);

    let result = ScanResult {
        directories: dirs.clone(),
        duplicates,
        empty_files: partition.empty_files,
        chunk_size: config.chunk_size,
    };

    summary.duplicate_groups = result.group_count();
    summary.grouped_files = result.groups().map(DuplicateGroup::len).sum();
    summary.duplicate_files = result.duplicate_file_count();
    summary.reclaimable_space = result.reclaimable_space();
    summary.unique_after_hash = summary.hashed_files - summary.grouped_files;
    summary.scan_duration = start_time.elapsed();

    log::info!(
        "Scan complete: {} candidates → {} duplicate groups, {} reclaimable ({} hash failures) in {:.2?}",
        candidate_count,
        summary.duplicate_groups,
        summary.reclaimable_display(),
        summary.failed_hashes,
        summary.scan_duration
    );

    (result, summary)
}

/// Duplicate finder owning the current scan result.
///
/// A finder is created by scanning (or by adopting a cached result) and can
/// be rescanned in place with [`DuplicateFinder::refresh`].
#[derive(Debug)]
pub struct DuplicateFinder {
    config: FinderConfig,
    result: ScanResult,
    summary: ScanSummary,
}

impl DuplicateFinder {
    /// Scan an already-resolved directory set.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::InvalidChunkSize`] if `config.chunk_size` is zero.
    pub fn scan(directories: DirectorySet, config: FinderConfig) -> Result<Self, FinderError> {
        config.validate()?;
        let (result, summary) = scan_directories(&directories, &config);
        Ok(Self {
            config,
            result,
            summary,
        })
    }

    /// Resolve `paths` and scan them.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::Resolve`] if any path is invalid, or
    /// [`FinderError::InvalidChunkSize`] if `config.chunk_size` is zero.
    /// Chunk size is checked first so no filesystem work happens on bad input.
    pub fn scan_paths<I, P>(paths: I, config: FinderConfig) -> Result<Self, FinderError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        config.validate()?;
        let directories = DirectorySet::resolve(paths)?;
        Self::scan(directories, config)
    }

    /// Adopt a previously computed result without rescanning.
    ///
    /// The finder's chunk size follows the result so a later
    /// [`refresh`](Self::refresh) hashes the same way.
    #[must_use]
    pub fn from_result(result: ScanResult, config: FinderConfig) -> Self {
        let config = config.with_chunk_size(result.chunk_size.max(1));
        let summary = ScanSummary::from_result(&result);
        Self {
            config,
            result,
            summary,
        }
    }

    /// Discard the current result and rescan the same directories.
    pub fn refresh(&mut self) {
        log::info!("Refreshing scan of {} director(ies)", self.result.directories.len());
        let (result, summary) = scan_directories(&self.result.directories, &self.config);
        self.result = result;
        self.summary = summary;
    }

    /// Sort the paths of every duplicate group lexicographically.
    pub fn sort_duplicates_alphabetically(&mut self) {
        for group in self.result.duplicates.values_mut().flatten() {
            group.sort_paths();
        }
    }

    /// Duplicate groups as `(size, groups)` pairs ordered by size.
    #[must_use]
    pub fn size_sorted_duplicates(&self, order: SortOrder) -> Vec<(u64, &[DuplicateGroup])> {
        let mut sorted: Vec<(u64, &[DuplicateGroup])> = self
            .result
            .duplicates
            .iter()
            .map(|(size, groups)| (*size, groups.as_slice()))
            .collect();
        if order == SortOrder::Descending {
            sorted.reverse();
        }
        sorted
    }

    /// The current scan result.
    #[must_use]
    pub fn result(&self) -> &ScanResult {
        &self.result
    }

    /// Consume the finder, returning its scan result.
    #[must_use]
    pub fn into_result(self) -> ScanResult {
        self.result
    }

    /// Statistics for the current result.
    #[must_use]
    pub fn summary(&self) -> &ScanSummary {
        &self.summary
    }

    /// Configuration used for scans and refreshes.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Directories covered by the current result.
    #[must_use]
    pub fn directories(&self) -> &DirectorySet {
        &self.result.directories
    }

    /// Duplicate groups keyed by size.
    #[must_use]
    pub fn duplicates(&self) -> &BTreeMap<u64, Vec<DuplicateGroup>> {
        &self.result.duplicates
    }

    /// Zero-byte files discovered by the last scan.
    #[must_use]
    pub fn empty_files(&self) -> &[PathBuf] {
        &self.result.empty_files
    }

    /// Chunk size the current hashes were computed with.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.result.chunk_size
    }
}
