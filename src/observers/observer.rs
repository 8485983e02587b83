//! # Observer trait.
//!
//! All three callbacks have empty default bodies, so an implementation may
//! override none, some, or all of them.
//!
//! ## Rules
//! - For one submission, `on_output` calls (if any) precede the terminal call.
//! - Exactly one of `on_finished` / `on_failed` is called per submission, once.
//! - Nothing is delivered for a submission after its terminal call.
//! - Callbacks of different submissions may interleave in any order.
//! - Panics are caught by the engine and reported as
//!   [`EventKind::ObserverPanicked`](crate::EventKind::ObserverPanicked).
//!
//! ## Output shape
//! - **Streaming** operations (`install`): one `on_output` per line, without the
//!   trailing newline.
//! - **Batch** operations: at most one `on_output` with the whole output
//!   (every line newline-terminated), only on success and only if there was any.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use brewvisor::{BrewError, Observer, Operation};
//!
//! struct Printer;
//!
//! #[async_trait]
//! impl Observer for Printer {
//!     async fn on_output(&self, op: &Operation, output: &str) {
//!         println!("[{op}] {output}");
//!     }
//!
//!     async fn on_failed(&self, op: &Operation, error: &BrewError) {
//!         eprintln!("[{op}] failed: {error} ({})", error.kind().as_label());
//!     }
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::BrewError;
use crate::operations::Operation;

/// Shared handle to an observer.
pub type ObserverRef = Arc<dyn Observer>;

/// Receiver of one submission's output and outcome.
///
/// Callbacks run on the engine's tokio runtime; avoid blocking in them.
#[async_trait]
pub trait Observer: Send + Sync + 'static {
    /// Output produced by the brew process.
    async fn on_output(&self, _operation: &Operation, _output: &str) {}

    /// The process exited successfully.
    async fn on_finished(&self, _operation: &Operation) {}

    /// The operation failed or was cancelled.
    async fn on_failed(&self, _operation: &Operation, _error: &BrewError) {}
}

/// Observer that ignores every callback.
#[async_trait]
impl Observer for () {}
