//! # Observers: per-submission callbacks.
//!
//! The [`Observer`] trait is the main **extension point** for callers.
//! Every submission carries one observer; the engine reports that
//! submission's output and its single terminal outcome to it.
//!
//! ```text
//! Brew::submit(op, observer)
//!        │
//!        ▼
//!   ExecutionQueue ──► runner ──► Delivery ──► observer.on_output(op, text)   (0..n times)
//!                                         └──► observer.on_finished(op)       (exactly one of
//!                                         └──► observer.on_failed(op, err)     these two)
//! ```
//!
//! Provided implementations:
//! - [`LogObserver`] (enabled via `logging` feature) → writes callbacks to `tracing`

mod delivery;
#[cfg(feature = "logging")]
mod log;
mod observer;

pub(crate) use delivery::Delivery;
#[cfg(feature = "logging")]
pub use log::LogObserver;
pub use observer::{Observer, ObserverRef};
