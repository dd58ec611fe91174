//! Exit codes for CLI operations following Unix conventions.
//!
//! # Exit Code Semantics
//!
//! - `0`: Success
//! - `1`: General error - unspecified failure
//! - `2`: No input - the corpus or vector file holds no usable documents
//! - `3-7`: One code per error class, so scripts can branch on the failure
//! - `126-255`: Reserved by shell

use crate::error::{ErrorKind, SimilarityError};

/// Standard exit codes for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Operation succeeded (code 0)
    Success = 0,

    /// Unspecified error occurred (code 1)
    GeneralError = 1,

    /// Nothing to process, e.g. a corpus directory without documents (code 2)
    NoInput = 2,

    /// Unknown document or section (code 3)
    NotFound = 3,

    /// File I/O error, including corrupt artifacts (code 5)
    IoError = 5,

    /// Configuration error (code 6)
    ConfigError = 6,

    /// Operation attempted in the wrong state (code 7)
    StateError = 7,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl ExitCode {
    /// Convert a `SimilarityError` to the appropriate exit code.
    pub fn from_error(error: &SimilarityError) -> Self {
        if let SimilarityError::EmptyInput { .. } = error {
            return ExitCode::NoInput;
        }

        match error.kind() {
            ErrorKind::NotFound => ExitCode::NotFound,
            ErrorKind::Io => ExitCode::IoError,
            ErrorKind::Config => ExitCode::ConfigError,
            ErrorKind::State => ExitCode::StateError,
        }
    }

    /// Check if this exit code indicates success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, ExitCode::Success)
    }

    /// Get a human-readable description of the exit code.
    pub fn description(&self) -> &str {
        match self {
            ExitCode::Success => "Success",
            ExitCode::GeneralError => "General error",
            ExitCode::NoInput => "No usable input documents",
            ExitCode::NotFound => "Not found",
            ExitCode::IoError => "I/O error",
            ExitCode::ConfigError => "Configuration error",
            ExitCode::StateError => "Invalid state",
        }
    }
}
