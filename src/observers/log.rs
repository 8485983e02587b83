//! # LogObserver: tracing-backed observer
//!
//! A minimal observer that writes every callback to `tracing`.
//! Use it for demos, or as the observer of fire-and-forget submissions.
//!
//! ## Example output (with a fmt subscriber)
//! ```text
//! INFO brewvisor::observers::log: output operation="install wget" output="==> Downloading"
//! INFO brewvisor::observers::log: finished operation="install wget"
//! WARN brewvisor::observers::log: failed operation="search nope" kind="unknown" error=brew exited with status 1
//! ```

use async_trait::async_trait;

use crate::error::BrewError;
use crate::observers::Observer;
use crate::operations::Operation;

/// Observer that logs through `tracing`.
#[derive(Default, Debug, Clone, Copy)]
pub struct LogObserver;

impl LogObserver {
    /// Construct a new [`LogObserver`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Observer for LogObserver {
    async fn on_output(&self, op: &Operation, output: &str) {
        tracing::info!(operation = %op, output, "output");
    }

    async fn on_finished(&self, op: &Operation) {
        tracing::info!(operation = %op, "finished");
    }

    async fn on_failed(&self, op: &Operation, error: &BrewError) {
        tracing::warn!(
            operation = %op,
            kind = error.kind().as_label(),
            error = %error,
            "failed"
        );
    }
}
