//! Deletion policy: deciding which duplicates may be removed.
//!
//! # Survivor rule
//!
//! For every duplicate group the members that match the deletion target
//! (inside a target directory, or matching a glob pattern) are the
//! "inside" set:
//!
//! - no inside members: the group is left alone
//! - at least one member outside the target: every inside member goes
//! - every member inside the target: all but the lexicographically
//!   smallest path go
//!
//! Empty files are the exception. They carry no content to preserve, so
//! [`DeletionEngine::delete_empty_files`] removes every one of them.
//!
//! # Staleness
//!
//! A real deletion leaves the scan result describing files that no longer
//! exist. Running the survivor rule against that result could count a
//! removed copy as a surviving one, so once a real deletion has happened the
//! engine refuses further work with [`PolicyError::StaleResults`] until
//! [`DeletionEngine::refresh`] rescans.
//!
//! # Example
//!
//! ```no_run
//! use dupkeeper::actions::{DeleteConfig, DeletionEngine};
//! use dupkeeper::duplicates::{DuplicateFinder, FinderConfig};
//!
//! let finder = DuplicateFinder::scan_paths(["/photos", "/backup"], FinderConfig::default())?;
//! let mut engine = DeletionEngine::new(finder);
//!
//! let report = engine.remove_in_directories(["/backup"], &DeleteConfig::dry_run())?;
//! for path in &report.removed {
//!     println!("Would have deleted: {}", path.display());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::path::{Path, PathBuf};

use glob::Pattern;
use thiserror::Error;

use super::delete::{delete_paths, validate_preserves_copy, DeleteConfig, DeleteError, DeletionReport};
use crate::duplicates::DuplicateFinder;
use crate::scanner::{DirectorySet, ResolveError};

/// Errors that stop a deletion operation before any file is touched.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// A real deletion already ran against this scan result.
    #[error("scan results are stale after a previous deletion; refresh before deleting again")]
    StaleResults,

    /// Target directories could not be resolved.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// A glob pattern failed to compile.
    #[error("invalid glob pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// A computed plan would remove every copy of a group.
    #[error(transparent)]
    Unsafe(#[from] DeleteError),
}

/// Select the members of one duplicate group that may be deleted.
///
/// `is_target` decides membership in the deletion target. The result never
/// contains every path of `paths` when `paths` has at least one entry.
///
/// # Example
///
/// ```
/// use dupkeeper::actions::policy::select_group_deletions;
/// use std::path::{Path, PathBuf};
///
/// let group = vec![PathBuf::from("/b/x"), PathBuf::from("/a/x")];
/// let doomed = select_group_deletions(&group, |_: &Path| true);
/// assert_eq!(doomed, vec![PathBuf::from("/b/x")]);
/// ```
pub fn select_group_deletions<F>(paths: &[PathBuf], is_target: F) -> Vec<PathBuf>
where
    F: Fn(&Path) -> bool,
{
    let mut inside: Vec<PathBuf> = paths.iter().filter(|p| is_target(p)).cloned().collect();

    if inside.is_empty() {
        return inside;
    }

    if inside.len() < paths.len() {
        return inside;
    }

    // Whole group is targeted: the smallest path survives.
    inside.sort();
    inside.remove(0);
    inside
}

fn compile_patterns<I, S>(patterns: I) -> Result<Vec<Pattern>, PolicyError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    patterns
        .into_iter()
        .map(|raw| {
            let raw = raw.as_ref();
            Pattern::new(raw).map_err(|e| PolicyError::InvalidPattern {
                pattern: raw.to_string(),
                message: e.msg.to_string(),
            })
        })
        .collect()
}

/// Deletion engine wrapping the result of one [`DuplicateFinder`].
#[derive(Debug)]
pub struct DeletionEngine {
    finder: DuplicateFinder,
    stale: bool,
}

impl DeletionEngine {
    /// Wrap a finder. Groups are sorted so survivors are deterministic.
    #[must_use]
    pub fn new(mut finder: DuplicateFinder) -> Self {
        finder.sort_duplicates_alphabetically();
        Self {
            finder,
            stale: false,
        }
    }

    /// The wrapped finder.
    #[must_use]
    pub fn finder(&self) -> &DuplicateFinder {
        &self.finder
    }

    /// Whether a real deletion has run since the last scan.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Rescan the directories and clear the stale flag.
    pub fn refresh(&mut self) {
        self.finder.refresh();
        self.finder.sort_duplicates_alphabetically();
        self.stale = false;
    }

    /// Paths [`remove_in_directories`](Self::remove_in_directories) would
    /// select, without checking staleness or touching the filesystem.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::Resolve`] if a target is not a directory.
    pub fn plan_in_directories<I, P>(&self, targets: I) -> Result<Vec<PathBuf>, PolicyError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let targets = DirectorySet::resolve(targets)?;
        Ok(into_paths(self.select(|p| targets.contains_path(p))?))
    }

    /// Paths [`remove_by_pattern`](Self::remove_by_pattern) would select.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidPattern`] if a pattern does not compile.
    pub fn plan_by_pattern<I, S>(&self, patterns: I) -> Result<Vec<PathBuf>, PolicyError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = compile_patterns(patterns)?;
        Ok(into_paths(
            self.select(|p| patterns.iter().any(|pat| pat.matches_path(p)))?,
        ))
    }

    /// Paths [`delete_empty_files`](Self::delete_empty_files) would select.
    #[must_use]
    pub fn plan_empty_files(&self) -> Vec<PathBuf> {
        self.finder.empty_files().to_vec()
    }

    /// Delete duplicates that lie inside any of `targets`.
    ///
    /// # Errors
    ///
    /// - [`PolicyError::StaleResults`] after an earlier real deletion
    /// - [`PolicyError::Resolve`] if a target is not a directory
    pub fn remove_in_directories<I, P>(
        &mut self,
        targets: I,
        config: &DeleteConfig,
    ) -> Result<DeletionReport, PolicyError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.ensure_fresh(config)?;
        let targets = DirectorySet::resolve(targets)?;
        log::info!(
            "Selecting duplicates inside {} target director(ies)",
            targets.len()
        );
        let selected = self.select(|p| targets.contains_path(p))?;
        Ok(self.execute(selected, config))
    }

    /// Delete duplicates whose full path matches any of `patterns`.
    ///
    /// # Errors
    ///
    /// - [`PolicyError::StaleResults`] after an earlier real deletion
    /// - [`PolicyError::InvalidPattern`] if a pattern does not compile
    pub fn remove_by_pattern<I, S>(
        &mut self,
        patterns: I,
        config: &DeleteConfig,
    ) -> Result<DeletionReport, PolicyError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ensure_fresh(config)?;
        let patterns = compile_patterns(patterns)?;
        log::info!("Selecting duplicates matching {} pattern(s)", patterns.len());
        let selected = self.select(|p| patterns.iter().any(|pat| pat.matches_path(p)))?;
        Ok(self.execute(selected, config))
    }

    /// Delete every empty file found by the scan.
    ///
    /// No copy is kept: empty files are all identical and carry nothing
    /// worth preserving.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::StaleResults`] after an earlier real deletion.
    pub fn delete_empty_files(&mut self, config: &DeleteConfig) -> Result<DeletionReport, PolicyError> {
        self.ensure_fresh(config)?;
        let selected = self
            .plan_empty_files()
            .into_iter()
            .map(|path| (path, 0))
            .collect();
        Ok(self.execute(selected, config))
    }

    fn ensure_fresh(&self, config: &DeleteConfig) -> Result<(), PolicyError> {
        if !self.stale {
            return Ok(());
        }
        if config.ignore_stale_results {
            log::warn!("Deleting against stale scan results; surviving copies are not guaranteed");
            return Ok(());
        }
        Err(PolicyError::StaleResults)
    }

    fn select<F>(&self, is_target: F) -> Result<Vec<(PathBuf, u64)>, PolicyError>
    where
        F: Fn(&Path) -> bool,
    {
        let mut selected = Vec::new();
        for group in self.finder.result().groups() {
            let doomed = select_group_deletions(&group.paths, &is_target);
            if doomed.is_empty() {
                continue;
            }
            validate_preserves_copy(&doomed, &group.paths)?;
            log::debug!(
                "Group {} ({} bytes): {} of {} selected",
                &group.hash_hex()[..16],
                group.size,
                doomed.len(),
                group.len()
            );
            selected.extend(doomed.into_iter().map(|path| (path, group.size)));
        }
        Ok(selected)
    }

    fn execute(&mut self, selected: Vec<(PathBuf, u64)>, config: &DeleteConfig) -> DeletionReport {
        let report = delete_paths(selected, config);
        if report.removed_any() {
            self.stale = true;
        }
        log::info!("{}", report.summary());
        report
    }
}

fn into_paths(selected: Vec<(PathBuf, u64)>) -> Vec<PathBuf> {
    selected.into_iter().map(|(path, _)| path).collect()
}
