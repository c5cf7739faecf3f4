//! Plain-text rendering of scan results, deletion reports and cache cleanup.
//!
//! Every renderer returns a `String`; the caller decides where it goes.
//! Color is applied with `yansi` only when the renderer was created with
//! color enabled.

use bytesize::ByteSize;
use yansi::Paint;

use crate::actions::DeletionReport;
use crate::cache::CleanupReport;
use crate::duplicates::DuplicateGroup;

/// Text renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextOutput {
    color: bool,
}

impl TextOutput {
    /// Create a renderer; `color` enables ANSI styling.
    #[must_use]
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn header(&self, text: &str) -> String {
        if self.color {
            text.bold().yellow().to_string()
        } else {
            text.to_string()
        }
    }

    fn failure(&self, text: &str) -> String {
        if self.color {
            text.red().to_string()
        } else {
            text.to_string()
        }
    }

    /// Render size-sorted duplicate groups.
    ///
    /// Each group is a header line followed by one path per line.
    ///
    /// # Example
    ///
    /// ```
    /// use dupkeeper::duplicates::DuplicateGroup;
    /// use dupkeeper::output::TextOutput;
    /// use std::path::PathBuf;
    ///
    /// let group = DuplicateGroup::new([0u8; 32], 3, vec![PathBuf::from("/a"), PathBuf::from("/b")]);
    /// let text = TextOutput::new(false).duplicates(&[(3, std::slice::from_ref(&group))]);
    /// assert_eq!(text, "\nThe following files are duplicates, filesize=3 (3 B):\n/a\n/b\n\n");
    /// ```
    #[must_use]
    pub fn duplicates(&self, sorted_groups: &[(u64, &[DuplicateGroup])]) -> String {
        if sorted_groups.iter().all(|(_, groups)| groups.is_empty()) {
            return "No duplicates found!\n".to_string();
        }

        let mut out = String::new();
        for (size, groups) in sorted_groups {
            for group in *groups {
                let header = format!(
                    "The following files are duplicates, filesize={} ({}):",
                    size,
                    ByteSize::b(*size)
                );
                out.push('\n');
                out.push_str(&self.header(&header));
                out.push('\n');
                for path in &group.paths {
                    out.push_str(&path.display().to_string());
                    out.push('\n');
                }
            }
        }
        out.push('\n');
        out
    }

    /// Render a hint about empty files, or nothing if there are none.
    #[must_use]
    pub fn empty_files_hint(&self, count: usize) -> Option<String> {
        (count > 0).then(|| {
            format!(
                "{count} empty file(s) found. Use delete-duplicates --empty-files to remove them."
            )
        })
    }

    /// Render the outcome of a deletion run.
    ///
    /// One `Deleted:` (or `Would have deleted:`) line per file, then a blank
    /// line and one error line per failure. A run that selected nothing
    /// prints `Nothing to delete.`
    #[must_use]
    pub fn deletion(&self, report: &DeletionReport) -> String {
        if report.removed.is_empty() && report.failed.is_empty() {
            return "Nothing to delete.\n".to_string();
        }

        let verb = if report.dry_run {
            "Would have deleted:"
        } else {
            "Deleted:"
        };

        let mut out = String::new();
        for path in &report.removed {
            out.push_str(&format!("{} {}\n", verb, path.display()));
        }

        if !report.failed.is_empty() {
            if !out.is_empty() {
                out.push('\n');
            }
            for (path, err) in &report.failed {
                out.push_str(&self.failure(&format!("Error deleting: {}, {}", path.display(), err)));
                out.push('\n');
            }
        }
        out
    }

    /// Render the outcome of `clear-cache`.
    #[must_use]
    pub fn cleanup(&self, report: &CleanupReport) -> String {
        let mut out = String::new();

        if !report.removed.is_empty() {
            out.push_str("Deleted the following cache files:\n");
            for path in &report.removed {
                out.push_str(&path.display().to_string());
                out.push('\n');
            }
        }

        if report.has_failures() {
            out.push_str(&self.failure("Error deleting the following cache files:"));
            out.push('\n');
            for (path, err) in &report.failed {
                out.push_str(&format!("{}: {}\n", path.display(), err));
            }
        }

        if out.is_empty() {
            out.push_str("No cached results to delete.\n");
        }
        out
    }
}
