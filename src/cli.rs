//! Command-line interface definitions for dupkeeper.
//!
//! This module defines all CLI arguments, subcommands, and options using the clap derive API.
//! Global options (verbosity, color, cache location) apply to every subcommand.
//!
//! # Example
//!
//! ```bash
//! # Scan two directories and cache the result
//! dupkeeper find-duplicates ~/Photos /mnt/backup/Photos
//!
//! # Show the cached result if it is less than an hour old
//! dupkeeper show-duplicates ~/Photos /mnt/backup/Photos --threshold 60
//!
//! # Preview removing every copy that lives in the backup
//! dupkeeper delete-duplicates ~/Photos /mnt/backup/Photos --delete-dirs /mnt/backup/Photos -n
//!
//! # Remove editor backups that duplicate another file
//! dupkeeper delete-duplicates ~/src --delete-patterns "*.bak" "*~"
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Find byte-identical files and remove redundant copies safely.
///
/// dupkeeper groups files by size, hashes same-size candidates with BLAKE3,
/// caches the result per directory set, and only ever deletes a copy when
/// another copy of the same content survives.
#[derive(Debug, Parser)]
#[command(name = "dupkeeper")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Directory holding cached scan results
    ///
    /// Defaults to a per-user directory under the system temp directory.
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Configuration file to load instead of the platform default
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print errors as JSON objects on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for dupkeeper.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan directories for duplicate files and cache the result
    FindDuplicates(FindArgs),
    /// Show a cached scan result
    ShowDuplicates(ShowArgs),
    /// Delete duplicate files, always keeping at least one copy
    DeleteDuplicates(DeleteArgs),
    /// Remove every cached scan result
    ClearCache,
}

/// Hashing options shared by subcommands that may scan.
#[derive(Debug, Args, Default)]
pub struct HashingArgs {
    /// Bytes read per hashing step (e.g., 8192, 64KiB, 1MiB)
    #[arg(long, value_name = "SIZE", value_parser = parse_chunk_size)]
    pub chunk_size: Option<usize>,

    /// Number of hashing threads (default: number of CPU cores)
    #[arg(long, value_name = "N")]
    pub threads: Option<usize>,
}

/// Arguments for the find-duplicates subcommand.
#[derive(Debug, Args)]
pub struct FindArgs {
    /// Directories to scan for duplicates
    #[arg(value_name = "DIR", required = true)]
    pub directories: Vec<PathBuf>,

    #[command(flatten)]
    pub hashing: HashingArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the show-duplicates subcommand.
#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Directories whose cached result should be shown
    #[arg(value_name = "DIR", required = true)]
    pub directories: Vec<PathBuf>,

    /// Maximum age of the cached result in minutes (default: 1440, one day)
    #[arg(long, value_name = "MINUTES")]
    pub threshold: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// What a delete-duplicates run should remove. Exactly one is required.
#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct DeleteTargetArgs {
    /// Delete duplicates inside these directories
    ///
    /// If a copy exists outside them, every copy inside is removed;
    /// otherwise all but one copy (the first in sorted order) are removed.
    #[arg(long, value_name = "DIR", num_args = 1..)]
    pub delete_dirs: Vec<PathBuf>,

    /// Delete duplicates whose full path matches one of these glob patterns
    ///
    /// Same survivor rule as --delete-dirs. `*` also matches `/`.
    #[arg(long, value_name = "PATTERN", num_args = 1..)]
    pub delete_patterns: Vec<String>,

    /// Delete every empty file found by the scan
    #[arg(long)]
    pub empty_files: bool,
}

/// Resolved deletion target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    /// Duplicates inside these directories
    Directories(Vec<PathBuf>),
    /// Duplicates matching these glob patterns
    Patterns(Vec<String>),
    /// All empty files
    EmptyFiles,
}

impl DeleteTargetArgs {
    /// The single target selected on the command line.
    #[must_use]
    pub fn target(&self) -> DeleteTarget {
        if self.empty_files {
            DeleteTarget::EmptyFiles
        } else if !self.delete_patterns.is_empty() {
            DeleteTarget::Patterns(self.delete_patterns.clone())
        } else {
            DeleteTarget::Directories(self.delete_dirs.clone())
        }
    }
}

/// Arguments for the delete-duplicates subcommand.
#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Directories to scan for duplicates
    #[arg(value_name = "DIR", required = true)]
    pub directories: Vec<PathBuf>,

    #[command(flatten)]
    pub target: DeleteTargetArgs,

    /// Show what would be deleted without deleting anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Move files to the system trash instead of deleting them permanently
    #[arg(long)]
    pub trash: bool,

    /// Ignore any cached result and scan again before deleting
    #[arg(long)]
    pub rescan: bool,

    #[command(flatten)]
    pub hashing: HashingArgs,
}

/// Output format for scan results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable listing
    #[default]
    Text,
    /// JSON output for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Parse a human-readable size string into bytes.
///
/// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
/// Case-insensitive. Numbers without suffix are treated as bytes.
///
/// # Examples
///
/// ```
/// use dupkeeper::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("1KB").unwrap(), 1000);
/// assert_eq!(parse_size("64KiB").unwrap(), 65_536);
/// ```
/// # Errors
///
/// Returns an error if the string is empty, contains an invalid number,
/// a negative number, or an unknown size suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1_024,
        "MB" | "M" => 1_000_000,
        "MIB" => 1_048_576,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1_073_741_824,
        "TB" | "T" => 1_000_000_000_000,
        "TIB" => 1_099_511_627_776,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}

/// Parse a hashing chunk size, rejecting zero.
///
/// # Errors
///
/// Returns an error for anything [`parse_size`] rejects, for zero, and for
/// sizes that do not fit in memory addressing.
pub fn parse_chunk_size(s: &str) -> Result<usize, String> {
    let bytes = parse_size(s)?;
    if bytes == 0 {
        return Err("Chunk size must be at least one byte".to_string());
    }
    usize::try_from(bytes).map_err(|_| format!("Chunk size too large: {bytes}"))
}
