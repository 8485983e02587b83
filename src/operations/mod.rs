//! # Operation descriptions.
//!
//! This module provides the value objects the engine queues and runs:
//! - [`OperationKind`] - closed set of Homebrew commands (plus a custom escape hatch)
//! - [`RelayPolicy`] - whether output is streamed per line or delivered once
//! - [`Operation`] - one unit of work (kind + arguments + busy/installed flags)
//! - [`OperationRef`] - shared handle to an operation (`Arc<Operation>`)

mod kind;
mod operation;

pub use kind::{OperationKind, RelayPolicy};
pub use operation::{Operation, OperationRef};
