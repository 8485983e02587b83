//! # Brew: the engine facade.
//!
//! [`Brew`] is the single entry point callers talk to. It owns the live
//! [`BrewConfig`], the execution queue and the runtime event bus.
//!
//! ## High-level architecture
//! ```text
//! caller ── submit(op, observer) ──► Brew
//!                                     │  snapshot under config read lock:
//!                                     │    Invocation { brew_path, argv, environment, terminate_grace }
//!                                     │    Admission  { Serial | Concurrent{limit} }
//!                                     ▼
//!                              ExecutionQueue ── admit() ──► runner task (one per running entry)
//!                                                                │
//!                          observer.on_output / on_finished / on_failed ◄──┘
//!
//! caller ── cancel(op) / cancel_all() / cancel_all_of_kind(k) ──► ExecutionQueue::cancel_where
//! caller ── set_*(..) ──► BrewConfig (affects later submissions only)
//! ```
//!
//! ## Rules
//! - `submit` and the `cancel*` methods never block and never fail; every
//!   failure reaches the submitting observer as `on_failed`.
//! - They may be called from any thread, inside or outside the runtime.
//! - Dropping the facade cancels every live entry.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use brewvisor::{Brew, BrewConfig, Operation, Script, ScriptedLauncher};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let launcher = ScriptedLauncher::new().push(Script::exit(0).with_lines(["wget"]));
//!     let brew = Brew::builder(BrewConfig::default())
//!         .with_launcher(launcher)
//!         .build()?;
//!
//!     brew.submit(Operation::list().into_ref(), Arc::new(()));
//!     assert!(brew.pending_count() <= 1);
//!     Ok(())
//! }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use tokio::sync::broadcast;

use crate::config::BrewConfig;
use crate::error::ConfigError;
use crate::events::{Bus, Event};
use crate::observers::ObserverRef;
use crate::operations::{Operation, OperationKind, OperationRef};
use crate::process::Invocation;

use super::admission::Admission;
use super::builder::BrewBuilder;
use super::queue::ExecutionQueue;

/// Queues, runs and observes brew operations.
pub struct Brew {
    config: RwLock<BrewConfig>,
    queue: Arc<ExecutionQueue>,
    bus: Bus,
}

impl Brew {
    /// Returns a builder for an engine with the given configuration.
    pub fn builder(cfg: BrewConfig) -> BrewBuilder {
        BrewBuilder::new(cfg)
    }

    /// Builds an engine that launches the real executable on the current runtime.
    ///
    /// Fails with [`ConfigError::NoRuntime`] outside a tokio runtime.
    pub fn new(cfg: BrewConfig) -> Result<Self, ConfigError> {
        Self::builder(cfg).build()
    }

    pub(super) fn from_parts(cfg: BrewConfig, queue: Arc<ExecutionQueue>, bus: Bus) -> Self {
        Self {
            config: RwLock::new(cfg),
            queue,
            bus,
        }
    }

    fn read_config(&self) -> RwLockReadGuard<'_, BrewConfig> {
        self.config.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_config(&self) -> RwLockWriteGuard<'_, BrewConfig> {
        self.config.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `operation` to the queue; `observer` receives its callbacks.
    ///
    /// The operation is marked busy until its terminal callback is due.
    /// Returns the id of the new queue entry, which also tags its runtime events.
    pub fn submit(&self, operation: OperationRef, observer: ObserverRef) -> u64 {
        let (invocation, admission) = {
            let cfg = self.read_config();
            (
                Invocation::for_operation(&operation, &cfg),
                Admission::from_config(&cfg),
            )
        };
        self.queue.submit(operation, observer, invocation, admission)
    }

    /// Cancels every live entry equivalent to `operation` (same kind and arguments).
    ///
    /// Returns how many entries matched; zero is not an error.
    pub fn cancel(&self, operation: &Operation) -> usize {
        self.queue
            .cancel_where(|entry| entry.operation.is_equivalent(operation))
    }

    /// Cancels the live entry with this id, if any.
    pub fn cancel_entry(&self, id: u64) -> bool {
        self.queue.cancel_where(|entry| entry.id == id) > 0
    }

    /// Cancels every live entry.
    pub fn cancel_all(&self) -> usize {
        self.queue.cancel_where(|_| true)
    }

    /// Cancels every live entry whose operation is of `kind`.
    pub fn cancel_all_of_kind(&self, kind: &OperationKind) -> usize {
        self.queue
            .cancel_where(|entry| entry.operation.kind() == kind)
    }

    /// Number of entries not yet terminal, pending and running alike.
    ///
    /// A snapshot: completions on other tasks may change it immediately.
    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    /// Number of entries whose process is currently running.
    pub fn running_count(&self) -> usize {
        self.queue.running()
    }

    /// Subscribes to runtime events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Current configuration snapshot.
    pub fn config(&self) -> BrewConfig {
        self.read_config().clone()
    }

    /// Executable used for operations submitted from now on.
    pub fn brew_path(&self) -> PathBuf {
        self.read_config().brew_path.clone()
    }

    /// Sets the executable for later submissions; `None` restores the default.
    pub fn set_brew_path(&self, path: Option<&Path>) -> Result<(), ConfigError> {
        self.write_config().set_brew_path(path)?;
        tracing::debug!(path = ?path, "brew path changed");
        Ok(())
    }

    /// Environment later submissions will run with.
    ///
    /// Without an override this is a snapshot of the current process environment.
    pub fn environment(&self) -> HashMap<String, String> {
        self.read_config().effective_environment()
    }

    /// Replaces the environment for later submissions; `None` inherits again.
    pub fn set_environment(&self, environment: Option<HashMap<String, String>>) {
        let overridden = environment.is_some();
        self.write_config().environment = environment;
        tracing::debug!(overridden, "brew environment changed");
    }

    /// Whether later submissions may run concurrently.
    pub fn concurrent_operations(&self) -> bool {
        self.read_config().concurrent
    }

    /// Switches between concurrent and serial mode for later submissions.
    pub fn set_concurrent_operations(&self, concurrent: bool) {
        self.write_config().concurrent = concurrent;
        tracing::debug!(concurrent, "brew concurrency mode changed");
    }

    /// Concurrency bound applied to later concurrent submissions.
    pub fn max_concurrent(&self) -> usize {
        self.read_config().concurrency_limit()
    }

    /// Sets the concurrency bound for later submissions (`0` is treated as 1).
    pub fn set_max_concurrent(&self, max: usize) {
        self.write_config().max_concurrent = max;
    }

    /// Time a cancelled process of a later submission gets between SIGTERM and SIGKILL.
    pub fn terminate_grace(&self) -> Duration {
        self.read_config().terminate_grace
    }

    /// Sets the SIGTERM grace period for later submissions.
    pub fn set_terminate_grace(&self, grace: Duration) {
        self.write_config().terminate_grace = grace;
    }
}

impl Drop for Brew {
    fn drop(&mut self) {
        let cancelled = self.queue.cancel_where(|_| true);
        if cancelled > 0 {
            tracing::debug!(cancelled, "brew engine dropped; cancelled live operations");
        }
    }
}
