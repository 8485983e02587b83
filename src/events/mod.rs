//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to runtime events emitted by the execution queue and the
//! per-operation runners.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `ExecutionQueue` (queued/cancel/finish), `runner::run_entry`
//!   (started/launch failure), observer delivery (panics).
//! - **Consumers**: whoever calls [`Brew::subscribe`](crate::Brew::subscribe).
//!
//! Events complement observers: an observer only hears about the operations it
//! was submitted with, the bus sees everything.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
