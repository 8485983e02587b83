use std::time::Instant;

use tokio_util::sync::CancellationToken;

use crate::observers::Delivery;
use crate::operations::OperationRef;
use crate::process::Invocation;

use super::admission::Admission;

/// One submission waiting in, or running from, the execution queue.
pub(super) struct Entry {
    /// Queue-unique id, assigned in submission order.
    pub id: u64,
    /// The submitted operation.
    pub operation: OperationRef,
    /// Observer callbacks for this submission.
    pub delivery: Delivery,
    /// Process description, snapshotted at submit time.
    pub invocation: Invocation,
    /// Admission mode, snapshotted at submit time.
    pub admission: Admission,
    /// Cancelled when the caller asks for this entry to stop.
    pub token: CancellationToken,
    /// Current status.
    pub status: EntryStatus,
}

/// Status of a live queue entry. Terminal entries are removed from the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum EntryStatus {
    /// Waiting for admission; no process exists.
    Pending {
        /// When the entry was queued.
        queued_at: Instant,
    },

    /// Admitted; a runner task owns its process.
    Running {
        /// When the entry was admitted.
        started_at: Instant,
    },
}

impl Entry {
    pub fn is_pending(&self) -> bool {
        matches!(self.status, EntryStatus::Pending { .. })
    }

    pub fn is_running(&self) -> bool {
        matches!(self.status, EntryStatus::Running { .. })
    }

    /// Everything the runner task needs.
    pub fn job(&self) -> Job {
        Job {
            id: self.id,
            operation: self.operation.clone(),
            delivery: self.delivery.clone(),
            invocation: self.invocation.clone(),
            token: self.token.clone(),
        }
    }
}

/// Work handed from the queue to a runner task.
pub(super) struct Job {
    pub id: u64,
    pub operation: OperationRef,
    pub delivery: Delivery,
    pub invocation: Invocation,
    pub token: CancellationToken,
}
