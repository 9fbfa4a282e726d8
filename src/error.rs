//! Structured error handling and exit codes.

use serde::Serialize;

/// Exit codes for the tabdupe application.
///
/// - 0: Success (scan completed, duplicates found)
/// - 1: General error (unexpected failure)
/// - 2: No duplicates found
/// - 3: Partial success (some rows had to be skipped)
/// - 130: Interrupted (a prompt was cancelled)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: Scan completed and duplicates were found.
    Success = 0,
    /// General error: An unexpected error occurred.
    GeneralError = 1,
    /// No duplicates: Scan completed but every value is unique.
    NoDuplicates = 2,
    /// Partial success: Scan completed but some rows were skipped.
    PartialSuccess = 3,
    /// Interrupted: The user cancelled an interactive prompt.
    Interrupted = 130,
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
            Self::Success => "TD000",
            Self::GeneralError => "TD001",
            Self::NoDuplicates => "TD002",
            Self::PartialSuccess => "TD003",
            Self::Interrupted => "TD130",
        }
    }
}

/// Raised when the user backs out of an interactive prompt.
#[derive(Debug, thiserror::Error)]
#[error("Operation cancelled by user")]
pub struct Cancelled;

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "TD001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Causes below the top-level message, outermost first
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: err.to_string(),
            causes: err.chain().skip(1).map(ToString::to_string).collect(),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}

/// Pick the exit code for an error returned by the application.
#[must_use]
pub fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    if err.downcast_ref::<Cancelled>().is_some() {
        ExitCode::Interrupted
    } else {
        ExitCode::GeneralError
    }
}

/// Log level for the full error chain of a failed run.
///
/// Unexpected failures are logged at `error` so the diagnostic trace shows
/// up without `-v`; a cancelled prompt only matters when debugging.
#[must_use]
pub fn diagnostic_level(code: ExitCode) -> log::Level {
    match code {
        ExitCode::GeneralError => log::Level::Error,
        _ => log::Level::Debug,
    }
}
