//! Output formatters for scan results and deletion reports.
//!
//! - [`text`] renders the human-readable listing printed by default
//! - [`json`] serializes results for scripting (`--output json`)
//!
//! # Example
//!
//! ```no_run
//! use dupkeeper::duplicates::{DuplicateFinder, FinderConfig, SortOrder};
//! use dupkeeper::output::TextOutput;
//!
//! let finder = DuplicateFinder::scan_paths(["."], FinderConfig::default()).unwrap();
//! let sorted = finder.size_sorted_duplicates(SortOrder::Descending);
//! print!("{}", TextOutput::new(false).duplicates(&sorted));
//! ```

pub mod json;
pub mod text;

pub use json::{JsonOutput, JsonOutputError};
pub use text::TextOutput;
