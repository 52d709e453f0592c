//! Structured error handling and exit codes.
//!
//! Library modules define their own `thiserror` enums. This module maps
//! each of them onto a small set of user-facing categories so `main` can
//! report a stable code prefix alongside the message.

use serde::Serialize;

use crate::actions::{GatherError, RestoreError};
use crate::config::ConfigError;
use crate::duplicates::FinderError;
use crate::scanner::{HashError, ScanError};

/// Exit codes for the DupeStash application.
///
/// - 0: Success (gather or restore completed)
/// - 1: Failure (any error, including usage errors)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// The requested operation completed.
    Success = 0,
    /// The operation failed or the invocation was invalid.
    Failure = 1,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

/// User-facing error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Open/read/write/list/move/unlink failure at the OS boundary.
    Io,
    /// An expected archive directory or manifest is absent or unreadable.
    NotFound,
    /// The archive target overlaps the scanned tree or an existing archive.
    Conflict,
    /// Bad command-line invocation.
    Usage,
}

impl ErrorCategory {
    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Io => "DS001",
            Self::NotFound => "DS002",
            Self::Conflict => "DS003",
            Self::Usage => "DS004",
        }
    }

    /// Classify an application error by walking its source chain.
    ///
    /// The first library error found decides the category; anything
    /// unrecognised is reported as an I/O failure.
    #[must_use]
    pub fn of(err: &anyhow::Error) -> Self {
        for cause in err.chain() {
            if let Some(e) = cause.downcast_ref::<GatherError>() {
                return e.category();
            }
            if let Some(e) = cause.downcast_ref::<RestoreError>() {
                return e.category();
            }
            if let Some(e) = cause.downcast_ref::<FinderError>() {
                return e.category();
            }
            if let Some(e) = cause.downcast_ref::<ScanError>() {
                return e.category();
            }
            if cause.downcast_ref::<HashError>().is_some() {
                return Self::Io;
            }
            if cause.downcast_ref::<ConfigError>().is_some() {
                return Self::Usage;
            }
            if cause.downcast_ref::<clap::Error>().is_some() {
                return Self::Usage;
            }
        }
        Self::Io
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "DS003")
    pub code: String,
    /// The error category
    pub category: ErrorCategory,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including its causes
    pub message: String,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error.
    #[must_use]
    pub fn new(err: &anyhow::Error) -> Self {
        let category = ErrorCategory::of(err);
        Self {
            code: category.code_prefix().to_string(),
            category,
            exit_code: ExitCode::Failure.as_i32(),
            message: format!("{err:#}"),
        }
    }
}
