//! File deletion primitives.
//!
//! # Overview
//!
//! This module removes individual files and batches of files:
//! - Permanent unlink (default)
//! - Move to system trash via the `trash` crate (opt-in, recoverable)
//! - Dry runs that report what would be removed without touching disk
//!
//! Per-file failures never abort a batch; they are collected into the
//! [`DeletionReport`]. Deciding *which* files may go is the job of
//! [`crate::actions::policy`].
//!
//! # Example
//!
//! ```no_run
//! use dupkeeper::actions::delete::{delete_paths, DeleteConfig};
//! use std::path::PathBuf;
//!
//! let report = delete_paths(vec![(PathBuf::from("/tmp/copy.txt"), 12)], &DeleteConfig::dry_run());
//! for path in &report.removed {
//!     println!("Would have deleted: {}", path.display());
//! }
//! ```

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Error type for deletion operations.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// File was not found (may have been deleted or moved since the scan).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to delete.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Trash operation failed.
    #[error("trash operation failed for {path}: {message}")]
    TrashFailed { path: PathBuf, message: String },

    /// Attempted to delete all copies (at least one must be preserved).
    #[error("cannot delete all copies - at least one file must be preserved")]
    AllCopiesWouldBeDeleted,

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DeleteError {
    /// Get the path associated with this error (if any).
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::TrashFailed { path: p, .. }
            | Self::Io { path: p, .. } => Some(p),
            Self::AllCopiesWouldBeDeleted => None,
        }
    }

    fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}

/// Configuration for deletion operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteConfig {
    /// Report what would be removed without touching the filesystem.
    pub dry_run: bool,
    /// Move files to the system trash instead of unlinking them.
    pub trash: bool,
    /// Allow deleting against a result already invalidated by an earlier
    /// real deletion. See [`DeleteConfig::ignoring_stale_results`].
    pub ignore_stale_results: bool,
}

impl DeleteConfig {
    /// Config for a dry run.
    #[must_use]
    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            trash: false,
            ignore_stale_results: false,
        }
    }

    /// Config for a real run that unlinks files.
    #[must_use]
    pub fn execute() -> Self {
        Self {
            dry_run: false,
            trash: false,
            ignore_stale_results: false,
        }
    }

    /// Move files to the system trash instead of unlinking them.
    #[must_use]
    pub fn with_trash(mut self, trash: bool) -> Self {
        self.trash = trash;
        self
    }

    /// Skip the stale-result check.
    ///
    /// # Safety of the data
    ///
    /// After a real deletion the duplicate groups no longer reflect the
    /// filesystem. Deleting again without a refresh can remove the last
    /// remaining copy of a file whose other copies were already removed.
    /// Only use this when the caller has verified the tree by other means.
    #[must_use]
    pub fn ignoring_stale_results(mut self) -> Self {
        self.ignore_stale_results = true;
        self
    }
}

impl Default for DeleteConfig {
    fn default() -> Self {
        Self::dry_run()
    }
}

/// Outcome of a deletion operation.
#[derive(Debug, Default)]
pub struct DeletionReport {
    /// Files removed (or that would be removed, in a dry run).
    pub removed: Vec<PathBuf>,
    /// Files that could not be removed, with the reason.
    pub failed: Vec<(PathBuf, DeleteError)>,
    /// Whether this report describes a dry run.
    pub dry_run: bool,
    /// Total bytes freed (or that would be freed).
    pub bytes_freed: u64,
}

impl DeletionReport {
    /// Empty report for the given mode.
    #[must_use]
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Self::default()
        }
    }

    /// Number of removed files.
    #[must_use]
    pub fn removed_count(&self) -> usize {
        self.removed.len()
    }

    /// Number of failed deletions.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failed.len()
    }

    /// Check if all deletions succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    /// Whether at least one file was actually removed from disk.
    #[must_use]
    pub fn removed_any(&self) -> bool {
        !self.dry_run && !self.removed.is_empty()
    }

    /// Human-readable summary of the operation.
    #[must_use]
    pub fn summary(&self) -> String {
        let verb = if self.dry_run { "Would delete" } else { "Deleted" };
        let freed = bytesize::ByteSize::b(self.bytes_freed);
        if self.all_succeeded() {
            format!("{} {} file(s), {} freed", verb, self.removed_count(), freed)
        } else {
            format!(
                "{} {} file(s), {} failed, {} freed",
                verb,
                self.removed_count(),
                self.failure_count(),
                freed
            )
        }
    }
}

/// Permanently delete a single file.
///
/// **WARNING**: This operation cannot be undone.
///
/// Returns the size of the removed file.
///
/// # Errors
///
/// - `NotFound` if the file doesn't exist
/// - `PermissionDenied` if deletion is not allowed
/// - `Io` for any other failure
pub fn remove_file(path: &Path) -> Result<u64, DeleteError> {
    let size = fs::symlink_metadata(path)
        .map_err(|e| DeleteError::from_io(path, e))?
        .len();

    fs::remove_file(path).map_err(|e| {
        log::warn!("Delete failed for {}: {}", path.display(), e);
        DeleteError::from_io(path, e)
    })?;

    log::info!("Deleted: {} ({} bytes)", path.display(), size);
    Ok(size)
}

/// Move a single file to the system trash.
///
/// Returns the size of the trashed file.
///
/// # Errors
///
/// - `NotFound` / `PermissionDenied` if the file cannot be inspected
/// - `TrashFailed` if the trash operation fails
pub fn delete_to_trash(path: &Path) -> Result<u64, DeleteError> {
    let size = fs::symlink_metadata(path)
        .map_err(|e| DeleteError::from_io(path, e))?
        .len();

    trash::delete(path).map_err(|e| {
        log::warn!("Trash operation failed for {}: {}", path.display(), e);
        DeleteError::TrashFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;

    log::info!("Moved to trash: {} ({} bytes)", path.display(), size);
    Ok(size)
}

/// Delete `targets` sequentially, collecting per-file failures.
///
/// Each target carries the size recorded at scan time, which is what a
/// dry run reports as freed.
pub fn delete_paths(targets: Vec<(PathBuf, u64)>, config: &DeleteConfig) -> DeletionReport {
    let mut report = DeletionReport::new(config.dry_run);

    for (path, size) in targets {
        if config.dry_run {
            log::debug!("Would delete: {}", path.display());
            report.bytes_freed += size;
            report.removed.push(path);
            continue;
        }

        let outcome = if config.trash {
            delete_to_trash(&path)
        } else {
            remove_file(&path)
        };

        match outcome {
            Ok(freed) => {
                report.bytes_freed += freed;
                report.removed.push(path);
            }
            Err(e) => report.failed.push((path, e)),
        }
    }

    report
}

/// Validate that at least one file in a group survives a selection.
///
/// # Errors
///
/// Returns `AllCopiesWouldBeDeleted` if every path in `group_paths` is
/// also in `selected_paths`.
pub fn validate_preserves_copy(
    selected_paths: &[PathBuf],
    group_paths: &[PathBuf],
) -> Result<(), DeleteError> {
    let selected_set: HashSet<&PathBuf> = selected_paths.iter().collect();
    let preserved_count = group_paths
        .iter()
        .filter(|p| !selected_set.contains(p))
        .count();

    if preserved_count == 0 {
        log::error!(
            "Refusing to delete all {} copies of a duplicate group",
            group_paths.len()
        );
        Err(DeleteError::AllCopiesWouldBeDeleted)
    } else {
        log::trace!(
            "Deletion validated: {} files selected, {} preserved",
            selected_paths.len(),
            preserved_count
        );
        Ok(())
    }
}
