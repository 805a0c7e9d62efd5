//! Domain-specific error types and error handling utilities.
//!
//! This module defines [`StatusError`] which covers every failure a collection
//! cycle can run into. It uses `thiserror` for ergonomic error definitions and
//! includes constructors for the common failure scenarios.
//!
//! # Public API
//! - [`StatusError`]: Main error enum covering all failure modes
//! - [`Result<T>`]: Type alias for `std::result::Result<T, StatusError>`
//!
//! # Error Categories
//! - **Configuration**: git binary missing, unreadable settings
//! - **Probes**: non-zero exits from required git queries, bad marker files
//! - **Aggregation**: partial results that are missing or overlap
//! - **Plumbing**: I/O, git2 discovery, JSON

use std::path::PathBuf;
use thiserror::Error;

/// Domain-specific error types for git-glance
#[derive(Error, Debug)]
pub enum StatusError {
    // Configuration errors
    #[error("git binary {path} not found")]
    GitBinaryNotFound { path: PathBuf },

    #[error("Could not find configuration directory")]
    ConfigDirectoryNotFound,

    #[error("Failed to read settings file '{path}': {source}")]
    SettingsReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse settings file '{path}': {source}")]
    SettingsParseFailed {
        path: PathBuf,
        source: serde_json::Error,
    },

    // Probe errors
    #[error("Failed to run {program} {args}: {source}")]
    SpawnFailed {
        program: PathBuf,
        args: String,
        source: std::io::Error,
    },

    #[error("{probe} probe failed: git {args} exited with {code:?}: {output}")]
    ProbeFailed {
        probe: &'static str,
        args: String,
        code: Option<i32>,
        output: String,
    },

    #[error("Unreadable marker file '{path}': {reason}")]
    InvalidMarker { path: PathBuf, reason: String },

    // Aggregation errors
    #[error("Field '{field}' was reported by more than one probe")]
    FieldConflict { field: &'static str },

    #[error("No probe reported field '{field}'")]
    MissingField { field: &'static str },

    // CLI
    #[error("Not in a git repository: {path}")]
    NotInRepository { path: PathBuf },

    #[error("Could not collect status for {path}, rerun with --debug for details")]
    StatusUnavailable { path: PathBuf },

    #[error("Invalid watch command '{line}': {reason}")]
    InvalidCommand { line: String, reason: String },

    // Plumbing
    #[error("Git repository error: {0}")]
    GitRepo(#[from] git2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience type alias for Results using StatusError
pub type Result<T> = std::result::Result<T, StatusError>;

impl StatusError {
    /// Create a git binary not found error
    pub fn git_binary_not_found(path: impl Into<PathBuf>) -> Self {
        Self::GitBinaryNotFound { path: path.into() }
    }

    /// Create a spawn failure for a program and its argument vector
    pub fn spawn_failed(program: impl Into<PathBuf>, args: &[&str], source: std::io::Error) -> Self {
        Self::SpawnFailed {
            program: program.into(),
            args: args.join(" "),
            source,
        }
    }

    /// Create a probe failure carrying the captured output
    pub fn probe_failed(
        probe: &'static str,
        args: &[&str],
        code: Option<i32>,
        output: impl Into<String>,
    ) -> Self {
        Self::ProbeFailed {
            probe,
            args: args.join(" "),
            code,
            output: output.into().trim().to_string(),
        }
    }

    /// Create an invalid marker file error
    pub fn invalid_marker(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidMarker {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a settings read failed error
    pub fn settings_read_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::SettingsReadFailed {
            path: path.into(),
            source,
        }
    }

    /// Create a settings parse failed error
    pub fn settings_parse_failed(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::SettingsParseFailed {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_command(line: &str, reason: impl Into<String>) -> Self {
        Self::InvalidCommand {
            line: line.to_string(),
            reason: reason.into(),
        }
    }

    /// Configuration errors are not retried and are logged loudly
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::GitBinaryNotFound { .. }
                | Self::ConfigDirectoryNotFound
                | Self::SettingsReadFailed { .. }
                | Self::SettingsParseFailed { .. }
        )
    }
}
