#![allow(dead_code)]

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use brewvisor::{BrewError, ErrorKind, Observer, Operation};
use tokio::sync::Notify;

pub const WAIT: Duration = Duration::from_secs(10);

/// One observer callback, as seen by [`Recorder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Output(String),
    Finished,
    Failed(ErrorKind),
}

impl Call {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Call::Output(_))
    }
}

/// Observer that records every callback it receives.
#[derive(Default)]
pub struct Recorder {
    calls: Mutex<Vec<Call>>,
    changed: Notify,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn push(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
        self.changed.notify_waiters();
    }

    /// Waits for the terminal callback and returns every call received so far.
    pub async fn done(&self) -> Vec<Call> {
        let wait = async {
            loop {
                let changed = self.changed.notified();
                let calls = self.calls();
                if calls.iter().any(Call::is_terminal) {
                    return calls;
                }
                changed.await;
            }
        };
        tokio::time::timeout(WAIT, wait)
            .await
            .expect("no terminal callback in time")
    }
}

#[async_trait]
impl Observer for Recorder {
    async fn on_output(&self, _op: &Operation, output: &str) {
        self.push(Call::Output(output.to_string()));
    }

    async fn on_finished(&self, _op: &Operation) {
        self.push(Call::Finished);
    }

    async fn on_failed(&self, _op: &Operation, error: &BrewError) {
        self.push(Call::Failed(error.kind()));
    }
}

/// Polls `cond` until it holds.
pub async fn eventually<F>(mut cond: F)
where
    F: FnMut() -> bool,
{
    let wait = async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    };
    tokio::time::timeout(WAIT, wait)
        .await
        .expect("condition not reached in time");
}

/// Runs `fut` with the shared test timeout.
pub async fn within<F: Future>(fut: F) -> F::Output {
    tokio::time::timeout(WAIT, fut)
        .await
        .expect("timed out")
}
