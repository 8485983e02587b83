//! # Launcher and process traits.
//!
//! ## Rules
//! - `Process::next_line` must be **cancel-safe**: the runner polls it inside
//!   `tokio::select!` next to the cancellation token, and a dropped call must
//!   not lose a line.
//! - `Process::next_line` returns `Ok(None)` once both output streams are closed,
//!   or shortly after the process exited even if a descendant keeps them open.
//! - `Process::terminate` is idempotent and may be called after the process exited.
//! - `Process::wait` may be called once output is exhausted or after `terminate`.

use std::io;
use std::sync::Arc;

use async_trait::async_trait;

use super::Invocation;

/// Shared handle to a launcher.
pub type LauncherRef = Arc<dyn Launcher>;

/// Starts processes.
#[async_trait]
pub trait Launcher: Send + Sync + 'static {
    /// Starts the process described by `invocation`.
    ///
    /// Errors mean nothing was started.
    async fn launch(&self, invocation: &Invocation) -> io::Result<Box<dyn Process>>;
}

/// One live subprocess.
#[async_trait]
pub trait Process: Send {
    /// Next line of output (stdout or stderr), without the line terminator.
    async fn next_line(&mut self) -> io::Result<Option<String>>;

    /// Asks the process to stop: SIGTERM, then SIGKILL once the grace period
    /// of its [`Invocation`] ran out.
    async fn terminate(&mut self) -> io::Result<()>;

    /// Waits for the process to exit and returns its exit code.
    async fn wait(&mut self) -> io::Result<i32>;
}
