//! # Process runner seam.
//!
//! The engine never touches `tokio::process` directly; it goes through two traits:
//! - [`Launcher`] - turns an [`Invocation`] into a running [`Process`]
//! - [`Process`] - one live subprocess: merged output lines, terminate, wait
//!
//! Implementations:
//! - [`SystemLauncher`] - real subprocesses via `tokio::process` (default)
//! - [`ScriptedLauncher`] - replays [`Script`]s; for tests and demos
//!
//! ```text
//! Invocation { program, args, environment, terminate_grace }
//!        │
//!        ▼
//!   Launcher::launch ──► Box<dyn Process>
//!                          ├─► next_line()  (stdout + stderr, one line at a time, ends at exit)
//!                          ├─► terminate()  (SIGTERM, grace, SIGKILL; idempotent)
//!                          └─► wait()       (exit code)
//! ```

mod invocation;
mod launcher;
mod scripted;
mod system;

pub use invocation::Invocation;
pub use launcher::{Launcher, LauncherRef, Process};
pub use scripted::{Script, ScriptedLauncher};
pub use system::SystemLauncher;
