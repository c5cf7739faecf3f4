//! Exit codes and structured error reporting for the binary.

use serde::Serialize;

/// Process exit codes.
///
/// - 0: Success (duplicates found, or the command has no duplicate outcome)
/// - 1: General error (bad input, unsafe request, unexpected failure)
/// - 2: No duplicates found
/// - 3: Partial failure (some files could not be deleted)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Completed normally.
    Success = 0,
    /// An error stopped the command.
    GeneralError = 1,
    /// Completed normally but no duplicates were found.
    NoDuplicates = 2,
    /// Completed, but some deletions failed.
    PartialFailure = 3,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DK000",
            Self::GeneralError => "DK001",
            Self::NoDuplicates => "DK002",
            Self::PartialFailure => "DK003",
        }
    }
}

/// Structured error information for `--json-errors`.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "DK001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including its causes
    pub message: String,
}

impl StructuredError {
    /// Create a structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
        }
    }
}
