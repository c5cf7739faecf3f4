//! Directory walker implementation using walkdir.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for traversing a
//! [`DirectorySet`] and collecting regular files for duplicate detection.
//!
//! # Behavior
//!
//! - Single-threaded, depth-first traversal with children sorted by name
//! - Symbolic links are never followed and never reported as files
//! - Members nested inside other members are walked once, via their ancestor
//! - Per-entry failures are yielded as [`ScanError`] values; an unreadable
//!   directory only prunes its own subtree
//!
//! # Example
//!
//! ```no_run
//! use dupkeeper::scanner::{DirectorySet, Walker};
//!
//! let dirs = DirectorySet::resolve(["."]).unwrap();
//! let files: Vec<_> = Walker::new(&dirs).walk().filter_map(Result::ok).collect();
//! println!("Found {} files", files.len());
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::{DirectorySet, FileEntry, ScanError};

/// Directory walker for file discovery.
#[derive(Debug, Clone)]
pub struct Walker {
    /// Roots to walk, already stripped of nested duplicates
    roots: Vec<PathBuf>,
}

impl Walker {
    /// Create a walker over every directory in `dirs`.
    #[must_use]
    pub fn new(dirs: &DirectorySet) -> Self {
        let roots: Vec<PathBuf> = dirs.scan_roots().into_iter().map(Path::to_path_buf).collect();
        if roots.len() < dirs.len() {
            log::debug!(
                "Skipping {} nested director{} already covered by another root",
                dirs.len() - roots.len(),
                if dirs.len() - roots.len() == 1 { "y" } else { "ies" }
            );
        }
        Self { roots }
    }

    /// Roots this walker will traverse.
    #[must_use]
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Walk every root, yielding regular files and per-entry errors.
    ///
    /// Iteration never stops on an error; callers decide whether to log,
    /// collect or ignore each [`ScanError`].
    pub fn walk(&self) -> impl Iterator<Item = Result<FileEntry, ScanError>> + '_ {
        self.roots.iter().flat_map(|root| {
            log::debug!("Walking {}", root.display());
            WalkDir::new(root)
                .follow_links(false)
                .sort_by_file_name()
                .into_iter()
                .filter_map(move |entry_result| match entry_result {
                    Ok(entry) => {
                        let file_type = entry.file_type();

                        if file_type.is_symlink() {
                            log::trace!("Skipping symlink: {}", entry.path().display());
                            return None;
                        }
                        if !file_type.is_file() {
                            return None;
                        }

                        match entry.metadata() {
                            Ok(metadata) => Some(Ok(FileEntry::new(
                                entry.into_path(),
                                metadata.len(),
                            ))),
                            Err(e) => {
                                let path = entry.path().to_path_buf();
                                Some(Err(handle_walk_error(path, e)))
                            }
                        }
                    }
                    Err(e) => {
                        let path = e.path().map_or_else(|| root.clone(), Path::to_path_buf);
                        Some(Err(handle_walk_error(path, e)))
                    }
                })
        })
    }
}

/// Convert a walkdir error into a [`ScanError`], logging it on the way.
fn handle_walk_error(path: PathBuf, error: walkdir::Error) -> ScanError {
    match error.io_error().map(std::io::Error::kind) {
        Some(ErrorKind::PermissionDenied) => {
            log::warn!("Permission denied: {}", path.display());
            ScanError::PermissionDenied(path)
        }
        Some(ErrorKind::NotFound) => {
            log::debug!("Entry vanished during walk: {}", path.display());
            ScanError::NotFound(path)
        }
        _ => {
            log::warn!("Walker error for {}: {}", path.display(), error);
            ScanError::Io {
                path,
                source: std::io::Error::from(error),
            }
        }
    }
}
