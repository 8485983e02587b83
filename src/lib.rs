//! # brewvisor
//!
//! **Brewvisor** queues, runs and observes invocations of the Homebrew
//! command-line tool.
//!
//! Callers submit [`Operation`]s together with an [`Observer`]. The engine
//! schedules them (bounded-concurrent or strictly serial), runs one `brew`
//! subprocess per operation, relays its output and reports exactly one
//! terminal outcome per submission. Parsing the tool's output is left to the
//! caller.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  Operation   │   │  Operation   │   │  Operation   │
//!     │ + Observer   │   │ + Observer   │   │ + Observer   │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Brew (engine facade)                                             │
//! │  - BrewConfig (brew path, environment, concurrency mode)          │
//! │  - snapshots Invocation + Admission per submission                │
//! │  - cancel / cancel_all / cancel_all_of_kind / pending_count       │
//! └──────────────────────────────┬────────────────────────────────────┘
//!                                ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  ExecutionQueue (one mutex, FIFO admission)                       │
//! │  Pending ──admit()──► Running ──finish()──► removed               │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │ runner task  │   │ runner task  │   │ runner task  │
//!     │ (1 process)  │   │ (1 process)  │   │ (1 process)  │
//!     └┬─────────────┘   └┬─────────────┘   └┬─────────────┘
//!      │ Launcher::launch ─► Process::next_line / terminate / wait
//!      │
//!      ├──► Observer: on_output* then on_finished | on_failed
//!      └──► Bus (broadcast): OperationQueued, OperationStarted, ...
//! ```
//!
//! ### Lifecycle of one submission
//! ```text
//! submit ─► busy = true, publish OperationQueued
//!   │
//!   ├─ cancel while pending ─► removed, never launched ─► on_failed(Cancelled)
//!   │
//!   └─ admitted ─► publish OperationStarted ─► launch
//!         ├─ launch error           ─► on_failed(Launch)          (kind: unknown)
//!         ├─ streaming: on_output(line) per line
//!         ├─ batch:     buffer lines
//!         ├─ cancel while running   ─► SIGTERM, grace, SIGKILL ─► on_failed(Cancelled)
//!         ├─ exit 0                 ─► [on_output(all)] ─► on_finished
//!         └─ exit != 0              ─► on_failed(Exit)            (kind: unknown)
//! busy = false once no entry of the operation is live
//! ```
//!
//! ## Features
//! | Area              | Description                                                    | Key types / traits                         |
//! |-------------------|----------------------------------------------------------------|--------------------------------------------|
//! | **Engine**        | Submit, cancel and count operations.                           | [`Brew`], [`BrewBuilder`]                  |
//! | **Operations**    | Immutable descriptions of one `brew` invocation.               | [`Operation`], [`OperationKind`]           |
//! | **Observers**     | Per-submission callbacks for output and outcome.               | [`Observer`]                               |
//! | **Processes**     | Pluggable process seam, real and scripted.                     | [`Launcher`], [`Process`], [`ScriptedLauncher`] |
//! | **Events**        | Runtime event stream for diagnostics.                          | [`Event`], [`EventKind`]                   |
//! | **Errors**        | Typed outcomes and their coarse kinds.                         | [`BrewError`], [`ErrorKind`], [`ConfigError`] |
//! | **Configuration** | Engine settings, changeable at runtime for later submissions.  | [`BrewConfig`]                             |
//!
//! ## Optional features
//! - `logging`: exports a tracing-backed [`LogObserver`].
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use tokio::sync::mpsc;
//! use brewvisor::{Brew, BrewConfig, BrewError, Observer, Operation, Script, ScriptedLauncher};
//!
//! struct Forward(mpsc::UnboundedSender<String>);
//!
//! #[async_trait]
//! impl Observer for Forward {
//!     async fn on_output(&self, _op: &Operation, output: &str) {
//!         let _ = self.0.send(output.to_string());
//!     }
//!     async fn on_finished(&self, _op: &Operation) {
//!         let _ = self.0.send("finished".to_string());
//!     }
//!     async fn on_failed(&self, _op: &Operation, error: &BrewError) {
//!         let _ = self.0.send(format!("failed: {error}"));
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let launcher = ScriptedLauncher::new()
//!         .push(Script::exit(0).with_lines(["Downloading...", "Installed"]));
//!     let brew = Brew::builder(BrewConfig::default())
//!         .with_launcher(launcher)
//!         .build()?;
//!
//!     let (tx, mut rx) = mpsc::unbounded_channel();
//!     brew.submit(Operation::install("wget").into_ref(), Arc::new(Forward(tx)));
//!
//!     assert_eq!(rx.recv().await.as_deref(), Some("Downloading..."));
//!     assert_eq!(rx.recv().await.as_deref(), Some("Installed"));
//!     assert_eq!(rx.recv().await.as_deref(), Some("finished"));
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod error;
mod events;
mod observers;
mod operations;
mod process;

// ---- Public re-exports ----

pub use config::{BrewConfig, DEFAULT_BREW_PATH, DEFAULT_TERMINATE_GRACE};
pub use core::{Brew, BrewBuilder};
pub use error::{BrewError, ConfigError, ErrorKind};
pub use events::{Event, EventKind};
pub use observers::{Observer, ObserverRef};
pub use operations::{Operation, OperationKind, OperationRef, RelayPolicy};
pub use process::{
    Invocation, Launcher, LauncherRef, Process, Script, ScriptedLauncher, SystemLauncher,
};

// Optional: expose a tracing-backed observer.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use observers::LogObserver;
