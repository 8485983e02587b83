//! # Panic-isolated observer delivery.
//!
//! [`Delivery`] pairs one submission's observer with its operation and entry
//! id, and invokes callbacks under `catch_unwind` so a misbehaving observer
//! cannot take down the runner task that drives the process.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use crate::error::BrewError;
use crate::events::{Bus, Event, EventKind};
use crate::operations::OperationRef;

use super::ObserverRef;

/// Callback sink for a single queue entry.
#[derive(Clone)]
pub(crate) struct Delivery {
    entry: u64,
    operation: OperationRef,
    observer: ObserverRef,
    bus: Bus,
}

impl Delivery {
    pub(crate) fn new(entry: u64, operation: OperationRef, observer: ObserverRef, bus: Bus) -> Self {
        Self {
            entry,
            operation,
            observer,
            bus,
        }
    }

    pub(crate) async fn output(&self, text: &str) {
        let fut = self.observer.on_output(&self.operation, text);
        self.guard(fut).await;
    }

    pub(crate) async fn finished(&self) {
        let fut = self.observer.on_finished(&self.operation);
        self.guard(fut).await;
    }

    pub(crate) async fn failed(&self, error: &BrewError) {
        let fut = self.observer.on_failed(&self.operation, error);
        self.guard(fut).await;
    }

    /// Delivers the terminal callback matching `outcome`.
    pub(crate) async fn terminal(&self, outcome: &Result<(), BrewError>) {
        match outcome {
            Ok(()) => self.finished().await,
            Err(e) => self.failed(e).await,
        }
    }

    async fn guard<F: Future<Output = ()>>(&self, fut: F) {
        if let Err(panic) = AssertUnwindSafe(fut).catch_unwind().await {
            let info = panic_message(panic.as_ref());
            tracing::warn!(entry = self.entry, panic = %info, "observer panicked");
            self.bus.publish(
                Event::new(EventKind::ObserverPanicked)
                    .with_entry(self.entry)
                    .with_reason(info),
            );
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
