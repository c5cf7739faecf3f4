//! File actions module.
//!
//! - [`delete`]: deletion primitives (unlink or system trash), dry runs and
//!   per-file failure reporting
//! - [`policy`]: the [`DeletionEngine`], which decides which copies of a
//!   duplicate group may be removed and guards against deleting from a
//!   stale scan
//!
//! ```no_run
//! use dupkeeper::actions::{DeleteConfig, DeletionEngine};
//! use dupkeeper::duplicates::{DuplicateFinder, FinderConfig};
//!
//! let finder = DuplicateFinder::scan_paths(["/music"], FinderConfig::default()).unwrap();
//! let mut engine = DeletionEngine::new(finder);
//! let report = engine
//!     .remove_by_pattern(["*/Copy of *"], &DeleteConfig::execute().with_trash(true))
//!     .unwrap();
//! println!("{}", report.summary());
//! ```

pub mod delete;
pub mod policy;

// Re-export commonly used types
pub use delete::{
    delete_paths, delete_to_trash, remove_file, validate_preserves_copy, DeleteConfig,
    DeleteError, DeletionReport,
};
pub use policy::{select_group_deletions, DeletionEngine, PolicyError};
