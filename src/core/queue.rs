//! # Execution queue: admission, dispatch, cancellation bookkeeping.
//!
//! The queue owns every live entry (pending or running) in submission order
//! behind one mutex. All transitions happen under that lock:
//!
//! ```text
//! submit ──► Pending ──admit()──► Running ──finish()──► removed ─► terminal callback
//!               │                    │
//!            cancel()             cancel()
//!               │                    └─► token.cancel() → runner terminates process
//!               ▼                                         → finish() classifies Cancelled
//!           removed ─► on_failed(Cancelled)
//! ```
//!
//! ## Rules
//! - The lock is never held across an `.await`.
//! - Admission is strict FIFO over pending entries; see [`Admission`].
//! - Each entry is removed exactly once, by `cancel` (pending) or `finish` (running),
//!   and exactly one terminal callback follows the removal.
//! - Cancellation takes precedence: an entry whose token was cancelled before
//!   `finish` took the lock is classified as cancelled, whatever its exit code.
//! - Runner tasks are spawned on the runtime handle captured at build time, so
//!   `submit`/`cancel` work from any thread.

use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use futures::FutureExt;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use crate::error::BrewError;
use crate::events::{Bus, Event, EventKind};
use crate::observers::{Delivery, ObserverRef};
use crate::operations::{OperationRef, RelayPolicy};
use crate::process::{Invocation, LauncherRef};

use super::admission::Admission;
use super::entry::{Entry, EntryStatus, Job};
use super::runner::{ProcessExit, RunReport, run_entry};

/// Live entries in submission order.
#[derive(Default)]
struct QueueState {
    entries: VecDeque<Entry>,
}

impl QueueState {
    fn running(&self) -> usize {
        self.entries.iter().filter(|e| e.is_running()).count()
    }

    fn serial_running(&self) -> bool {
        self.entries
            .iter()
            .any(|e| e.is_running() && e.admission.is_serial())
    }

    /// Marks every admissible pending entry as running, oldest first, and
    /// returns their jobs. Stops at the first pending entry that must wait.
    fn admit(&mut self) -> Vec<Job> {
        let mut running = self.running();
        let mut serial_running = self.serial_running();
        let mut jobs = Vec::new();

        for entry in self.entries.iter_mut().filter(|e| e.is_pending()) {
            if !entry.admission.admits(running, serial_running) {
                break;
            }
            entry.status = EntryStatus::Running {
                started_at: Instant::now(),
            };
            running += 1;
            serial_running |= entry.admission.is_serial();
            jobs.push(entry.job());
        }
        jobs
    }

    fn take(&mut self, id: u64) -> Option<Entry> {
        let idx = self.entries.iter().position(|e| e.id == id)?;
        self.entries.remove(idx)
    }
}

/// Scheduler for submitted operations.
pub(super) struct ExecutionQueue {
    state: Mutex<QueueState>,
    launcher: LauncherRef,
    bus: Bus,
    runtime: Handle,
    next_id: AtomicU64,
}

impl ExecutionQueue {
    pub(super) fn new(launcher: LauncherRef, bus: Bus, runtime: Handle) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(QueueState::default()),
            launcher,
            bus,
            runtime,
            next_id: AtomicU64::new(1),
        })
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends a new entry and starts whatever may start. Never blocks on I/O.
    pub(super) fn submit(
        self: &Arc<Self>,
        operation: OperationRef,
        observer: ObserverRef,
        invocation: Invocation,
        admission: Admission,
    ) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let command = invocation.command_line();
        operation.enter();

        let entry = Entry {
            id,
            delivery: Delivery::new(id, operation.clone(), observer, self.bus.clone()),
            operation,
            invocation,
            admission,
            token: CancellationToken::new(),
            status: EntryStatus::Pending {
                queued_at: Instant::now(),
            },
        };

        let jobs = {
            let mut state = self.lock();
            state.entries.push_back(entry);
            self.bus.publish(
                Event::new(EventKind::OperationQueued)
                    .with_entry(id)
                    .with_command(command.as_str()),
            );
            tracing::debug!(entry = id, command = %command, ?admission, "queued brew operation");
            state.admit()
        };
        self.dispatch(jobs);
        id
    }

    /// Cancels every live entry matching `matches`; returns how many matched.
    ///
    /// Pending entries are removed at once and their observers get
    /// `on_failed(Cancelled)` promptly. Running entries get their token
    /// cancelled; their runner reports the cancellation after the process exits.
    pub(super) fn cancel_where<F>(self: &Arc<Self>, matches: F) -> usize
    where
        F: Fn(&Entry) -> bool,
    {
        let mut removed = Vec::new();
        let mut matched = 0;

        let jobs = {
            let mut state = self.lock();
            state.entries.retain(|entry| {
                if !matches(entry) {
                    return true;
                }
                matched += 1;
                match entry.status {
                    EntryStatus::Pending { queued_at } => {
                        entry.token.cancel();
                        entry.operation.leave();
                        tracing::debug!(
                            entry = entry.id,
                            waited = ?queued_at.elapsed(),
                            "cancelled pending brew operation"
                        );
                        self.publish_cancel_requested(entry, "pending");
                        self.bus.publish(
                            Event::new(EventKind::OperationCancelled)
                                .with_entry(entry.id)
                                .with_command(entry.invocation.command_line()),
                        );
                        removed.push(entry.delivery.clone());
                        false
                    }
                    EntryStatus::Running { started_at } => {
                        if !entry.token.is_cancelled() {
                            entry.token.cancel();
                            tracing::debug!(
                                entry = entry.id,
                                running_for = ?started_at.elapsed(),
                                "cancelling running brew operation"
                            );
                            self.publish_cancel_requested(entry, "running");
                        }
                        true
                    }
                }
            });
            state.admit()
        };

        for delivery in removed {
            self.runtime.spawn(async move {
                delivery.failed(&BrewError::Cancelled).await;
            });
        }
        self.dispatch(jobs);
        matched
    }

    /// Number of live entries (pending + running).
    pub(super) fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Number of running entries.
    pub(super) fn running(&self) -> usize {
        self.lock().running()
    }

    fn publish_cancel_requested(&self, entry: &Entry, stage: &'static str) {
        self.bus.publish(
            Event::new(EventKind::CancelRequested)
                .with_entry(entry.id)
                .with_command(entry.invocation.command_line())
                .with_reason(stage),
        );
    }

    fn dispatch(self: &Arc<Self>, jobs: Vec<Job>) {
        for job in jobs {
            let me = Arc::clone(self);
            self.runtime.spawn(async move { me.drive(job).await });
        }
    }

    /// Runner task body: run the process, classify, remove, then notify.
    async fn drive(self: Arc<Self>, job: Job) {
        let run = AssertUnwindSafe(run_entry(&*self.launcher, &job, &self.bus))
            .catch_unwind()
            .await;
        let report = run.unwrap_or_else(|_| {
            tracing::warn!(entry = job.id, "brew runner panicked");
            RunReport {
                exit: ProcessExit::LaunchFailed("runner panicked".to_string()),
                output: String::new(),
            }
        });

        let Some(outcome) = self.finish(&job, &report.exit) else {
            return;
        };

        if outcome.is_ok()
            && job.operation.relay() == RelayPolicy::Batch
            && !report.output.is_empty()
        {
            job.delivery.output(&report.output).await;
        }
        job.delivery.terminal(&outcome).await;
    }

    /// Removes the entry, classifies its outcome and admits successors.
    fn finish(self: &Arc<Self>, job: &Job, exit: &ProcessExit) -> Option<Result<(), BrewError>> {
        let (outcome, jobs) = {
            let mut state = self.lock();
            let entry = state.take(job.id)?;
            entry.operation.leave();

            let outcome = classify(entry.token.is_cancelled(), exit, &entry.invocation.program);
            self.publish_terminal(&entry, exit, &outcome);
            (outcome, state.admit())
        };
        self.dispatch(jobs);
        Some(outcome)
    }

    fn publish_terminal(&self, entry: &Entry, exit: &ProcessExit, outcome: &Result<(), BrewError>) {
        let kind = match outcome {
            Ok(()) => EventKind::OperationFinished,
            Err(BrewError::Cancelled) => EventKind::OperationCancelled,
            Err(_) => EventKind::OperationFailed,
        };
        let mut ev = Event::new(kind)
            .with_entry(entry.id)
            .with_command(entry.invocation.command_line());
        if let ProcessExit::Exited(code) = exit {
            ev = ev.with_exit_code(*code);
        }
        if let Err(e) = outcome {
            ev = ev.with_reason(e.to_string());
        }
        self.bus.publish(ev);

        match outcome {
            Ok(()) => tracing::info!(entry = entry.id, "brew operation finished"),
            Err(e) => tracing::info!(
                entry = entry.id,
                kind = e.kind().as_label(),
                error = %e,
                "brew operation failed"
            ),
        }
    }
}

/// Maps how a process ended onto the observer-facing outcome.
fn classify(cancelled: bool, exit: &ProcessExit, program: &Path) -> Result<(), BrewError> {
    if cancelled {
        return Err(BrewError::Cancelled);
    }
    match exit {
        ProcessExit::Exited(0) => Ok(()),
        ProcessExit::Exited(code) => Err(BrewError::Exit { code: *code }),
        ProcessExit::LaunchFailed(reason) => Err(BrewError::Launch {
            program: program.to_path_buf(),
            reason: reason.clone(),
        }),
        // Only reachable with a cancelled token.
        ProcessExit::NotLaunched => Err(BrewError::Cancelled),
    }
}
