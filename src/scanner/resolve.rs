//! Canonical directory sets.
//!
//! Every operation that accepts user-supplied directories funnels them
//! through [`DirectorySet::resolve`], so two spellings of the same directory
//! (relative vs. absolute, through a symlink, with `..` segments) collapse
//! into one canonical entry.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Errors raised while resolving user-supplied directories.
#[derive(thiserror::Error, Debug)]
pub enum ResolveError {
    /// The value is not usable as a path at all.
    #[error("invalid path value {value:?}: {reason}")]
    InvalidInput {
        /// Lossy rendering of the offending value
        value: String,
        /// Why the value was rejected
        reason: &'static str,
    },

    /// The path does not name an existing directory.
    #[error("invalid directory {path}: {reason}")]
    InvalidPath {
        /// Path as supplied by the caller
        path: PathBuf,
        /// Why resolution failed
        reason: String,
    },

    /// No directories were supplied.
    #[error("no valid directories provided")]
    EmptyInput,
}

/// Non-empty set of canonical, existing directory paths.
///
/// Iteration order is sorted, which the cache fingerprint and the
/// deletion survivor rule both rely on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(transparent)]
pub struct DirectorySet(BTreeSet<PathBuf>);

impl DirectorySet {
    /// Validate and canonicalize `dirs`.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::InvalidInput`] for an empty path or one containing a NUL byte
    /// - [`ResolveError::InvalidPath`] if an element does not resolve to an existing directory
    /// - [`ResolveError::EmptyInput`] if `dirs` yields nothing
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dupkeeper::scanner::DirectorySet;
    ///
    /// let dirs = DirectorySet::resolve(["docs", "./docs", "docs/../docs"]).unwrap();
    /// assert_eq!(dirs.len(), 1);
    /// ```
    pub fn resolve<I, P>(dirs: I) -> Result<Self, ResolveError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut set = BTreeSet::new();

        for dir in dirs {
            let dir = dir.as_ref();
            check_path_value(dir)?;

            let canonical = fs::canonicalize(dir).map_err(|e| ResolveError::InvalidPath {
                path: dir.to_path_buf(),
                reason: e.to_string(),
            })?;

            if !canonical.is_dir() {
                return Err(ResolveError::InvalidPath {
                    path: dir.to_path_buf(),
                    reason: "not a directory".to_string(),
                });
            }

            log::trace!("Resolved {} -> {}", dir.display(), canonical.display());
            set.insert(canonical);
        }

        if set.is_empty() {
            return Err(ResolveError::EmptyInput);
        }

        Ok(Self(set))
    }

    /// Number of distinct directories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty. Never true for a resolved set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate the canonical paths in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.0.iter().map(PathBuf::as_path)
    }

    /// Sorted canonical paths as an owned vector.
    #[must_use]
    pub fn to_vec(&self) -> Vec<PathBuf> {
        self.0.iter().cloned().collect()
    }

    /// Whether `path` lies at or below any member directory.
    ///
    /// Comparison is component-wise, so `/data/a` does not contain `/data/ab`.
    #[must_use]
    pub fn contains_path(&self, path: &Path) -> bool {
        self.0.iter().any(|dir| path.starts_with(dir))
    }

    /// Members that are not nested inside another member.
    ///
    /// Walking only these roots visits every file under the set exactly once.
    #[must_use]
    pub fn scan_roots(&self) -> Vec<&Path> {
        self.0
            .iter()
            .filter(|dir| {
                !self
                    .0
                    .iter()
                    .any(|other| other != *dir && dir.starts_with(other))
            })
            .map(PathBuf::as_path)
            .collect()
    }
}

impl<'a> IntoIterator for &'a DirectorySet {
    type Item = &'a PathBuf;
    type IntoIter = std::collections::btree_set::Iter<'a, PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

fn check_path_value(path: &Path) -> Result<(), ResolveError> {
    let raw = path.as_os_str();
    if raw.is_empty() {
        return Err(ResolveError::InvalidInput {
            value: String::new(),
            reason: "empty path",
        });
    }
    if raw.as_encoded_bytes().contains(&0) {
        return Err(ResolveError::InvalidInput {
            value: raw.to_string_lossy().into_owned(),
            reason: "path contains a NUL byte",
        });
    }
    Ok(())
}
