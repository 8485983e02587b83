//! # Runtime events emitted by the execution queue and runners.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Queue events**: an entry was queued or a cancel was requested for it
//! - **Lifecycle events**: a process started or could not be launched
//! - **Terminal events**: finished, failed or cancelled (exactly one per entry)
//!
//! The [`Event`] struct carries additional metadata such as timestamps, the
//! queue entry id, the command line, exit codes and reasons.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use brewvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::OperationFailed)
//!     .with_entry(3)
//!     .with_command("search wget")
//!     .with_exit_code(1)
//!     .with_reason("brew exited with status 1");
//!
//! assert_eq!(ev.kind, EventKind::OperationFailed);
//! assert_eq!(ev.command.as_deref(), Some("search wget"));
//! assert_eq!(ev.exit_code, Some(1));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Queue events ===
    /// A new entry was appended to the queue.
    ///
    /// Sets:
    /// - `entry`: queue entry id
    /// - `command`: command line (without the executable)
    OperationQueued,

    /// Cancellation was requested for a pending or running entry.
    ///
    /// Sets:
    /// - `entry`: queue entry id
    /// - `command`: command line
    /// - `reason`: `"pending"` or `"running"`
    CancelRequested,

    // === Lifecycle events ===
    /// The entry was admitted and its process is being launched.
    ///
    /// Sets:
    /// - `entry`: queue entry id
    /// - `command`: command line
    OperationStarted,

    /// The executable could not be started.
    ///
    /// Sets:
    /// - `entry`: queue entry id
    /// - `command`: command line
    /// - `reason`: launch error message
    LaunchFailed,

    /// An observer callback panicked; the panic was contained.
    ///
    /// Sets:
    /// - `entry`: queue entry id
    /// - `reason`: panic payload if it was a string
    ObserverPanicked,

    // === Terminal events ===
    /// The process exited with status 0.
    ///
    /// Sets:
    /// - `entry`, `command`, `exit_code`
    OperationFinished,

    /// The process exited non-zero or never launched.
    ///
    /// Sets:
    /// - `entry`, `command`, `reason`
    /// - `exit_code` when the process ran
    OperationFailed,

    /// The entry was cancelled (pending or running).
    ///
    /// Sets:
    /// - `entry`, `command`
    /// - `exit_code` when a process was running and exited
    OperationCancelled,
}

impl EventKind {
    /// True for the three kinds emitted exactly once per entry.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EventKind::OperationFinished | EventKind::OperationFailed | EventKind::OperationCancelled
        )
    }
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Queue entry the event refers to.
    pub entry: Option<u64>,
    /// Command line of the operation, without the executable.
    pub command: Option<Arc<str>>,
    /// Process exit code, when a process ran to completion.
    pub exit_code: Option<i32>,
    /// Human-readable reason (errors, panic payloads, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            entry: None,
            command: None,
            exit_code: None,
            reason: None,
        }
    }

    /// Attaches a queue entry id.
    #[inline]
    pub fn with_entry(mut self, entry: u64) -> Self {
        self.entry = Some(entry);
        self
    }

    /// Attaches a command line.
    #[inline]
    pub fn with_command(mut self, command: impl Into<Arc<str>>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Attaches a process exit code.
    #[inline]
    pub fn with_exit_code(mut self, code: i32) -> Self {
        self.exit_code = Some(code);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}
