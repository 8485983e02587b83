//! # Per-entry admission mode
//!
//! Every queue entry snapshots the engine's concurrency setting when it is
//! submitted. The snapshot decides when the entry may leave the pending state.
//!
//! ## Variants
//! - `Serial`: start only when **nothing** is running; while it runs nothing else starts.
//! - `Concurrent { limit }`: start while fewer than `limit` entries run and no serial entry runs.
//!
//! ## Invariants
//! - Admission is strict FIFO: a blocked entry also blocks every entry behind it.
//! - Switching the engine's mode never changes the mode of entries already queued.

use crate::config::BrewConfig;

/// Admission mode of one queue entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    /// Runs alone, in submission order.
    Serial,

    /// Runs next to at most `limit - 1` others.
    Concurrent {
        /// Bound on simultaneously running entries (at least 1).
        limit: usize,
    },
}

impl Admission {
    /// Snapshots the admission mode from the current configuration.
    pub fn from_config(cfg: &BrewConfig) -> Self {
        if cfg.concurrent {
            Admission::Concurrent {
                limit: cfg.concurrency_limit(),
            }
        } else {
            Admission::Serial
        }
    }

    /// Whether an entry with this mode may start given what is running now.
    ///
    /// - `running`: number of running entries
    /// - `serial_running`: whether one of them was admitted as `Serial`
    pub fn admits(&self, running: usize, serial_running: bool) -> bool {
        if serial_running {
            return false;
        }
        match self {
            Admission::Serial => running == 0,
            Admission::Concurrent { limit } => running < (*limit).max(1),
        }
    }

    /// True for [`Admission::Serial`].
    #[inline]
    pub fn is_serial(&self) -> bool {
        matches!(self, Admission::Serial)
    }
}
