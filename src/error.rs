//! Error types used by the brewvisor engine.
//!
//! This module defines the error enums of the crate:
//!
//! - [`BrewError`]: why a single operation failed (delivered to its observer).
//! - [`ErrorKind`]: the coarse three-way classification of a [`BrewError`].
//! - [`ConfigError`]: rejected configuration or builder input.
//!
//! All of them provide `as_label` for logs and event payloads.

use std::path::PathBuf;

use thiserror::Error;

/// # Coarse classification of an operation failure.
///
/// Every [`BrewError`] maps onto exactly one kind via [`BrewError::kind`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Absence of an error. Never produced by the engine itself.
    None,
    /// Homebrew reported a failure, or the process could not be launched.
    Unknown,
    /// The operation was cancelled before or during execution.
    OperationCancelled,
}

impl ErrorKind {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ErrorKind::None => "none",
            ErrorKind::Unknown => "unknown",
            ErrorKind::OperationCancelled => "operation_cancelled",
        }
    }
}

/// # Failure of a single operation.
///
/// Handed to [`Observer::on_failed`](crate::Observer::on_failed) exactly once
/// per failed submission. Cancellation always wins over the other variants,
/// whatever the process exit code was.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BrewError {
    /// The brew process exited with a non-zero status.
    #[error("brew exited with status {code}")]
    Exit {
        /// Exit status reported by the process.
        code: i32,
    },

    /// The brew executable could not be started.
    #[error("failed to launch {}: {reason}", program.display())]
    Launch {
        /// Executable that was attempted.
        program: PathBuf,
        /// Underlying OS error message.
        reason: String,
    },

    /// Termination was requested by the caller.
    #[error("operation cancelled")]
    Cancelled,
}

impl BrewError {
    /// Returns the coarse classification of this error.
    ///
    /// # Example
    /// ```
    /// use brewvisor::{BrewError, ErrorKind};
    ///
    /// assert_eq!(BrewError::Exit { code: 1 }.kind(), ErrorKind::Unknown);
    /// assert_eq!(BrewError::Cancelled.kind(), ErrorKind::OperationCancelled);
    /// ```
    pub fn kind(&self) -> ErrorKind {
        match self {
            BrewError::Exit { .. } | BrewError::Launch { .. } => ErrorKind::Unknown,
            BrewError::Cancelled => ErrorKind::OperationCancelled,
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            BrewError::Exit { .. } => "brew_exit_failure",
            BrewError::Launch { .. } => "brew_launch_failure",
            BrewError::Cancelled => "brew_cancelled",
        }
    }

    /// True if the failure came from a caller-requested cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, BrewError::Cancelled)
    }
}

/// # Errors produced while configuring the engine.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An empty string was given as the brew executable path.
    #[error("brew path must not be empty")]
    EmptyBrewPath,

    /// `build()` was called outside a tokio runtime and no handle was supplied.
    #[error("no tokio runtime available; build inside a runtime or call with_runtime()")]
    NoRuntime,
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::EmptyBrewPath => "config_empty_brew_path",
            ConfigError::NoRuntime => "config_no_runtime",
        }
    }
}
