//! # Run a single queue entry's process.
//!
//! Launches one process, relays its output according to the operation's
//! [`RelayPolicy`], honours cancellation, and reports how the process ended.
//! Classification into success/failure happens in the queue, under its lock.
//!
//! ## Flow
//! ```text
//! token cancelled? ── yes ─► NotLaunched
//!        │ no
//!        ▼
//! launcher.launch() ── Err ─► LaunchFailed (publish LaunchFailed)
//!        │ Ok
//!        ▼
//! loop select! {                         (biased: cancellation first)
//!   token.cancelled() ─► terminate ─► wait ─► Exited(code)
//!   next_line()       ─► Streaming: delivery.output(line)
//!                        Batch:     buffer line + '\n'
//!                     ─► EOF: leave loop
//! }
//! select! { token.cancelled() ─► terminate ─► wait;  wait() ─► Exited(code) }
//! ```
//!
//! ## Rules
//! - Streaming output is delivered from this task, so it always precedes the
//!   terminal callback delivered later by the same task.
//! - Read errors end the output phase; the exit code still decides the outcome.
//! - After a cancellation nothing more is read from the process.

use tokio::select;

use crate::events::{Bus, Event, EventKind};
use crate::operations::RelayPolicy;
use crate::process::{Launcher, Process};

use super::entry::Job;

/// How the process of an entry ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum ProcessExit {
    /// Cancelled before a process was launched.
    NotLaunched,
    /// The launcher could not start the process.
    LaunchFailed(String),
    /// The process exited (on its own or after termination) with this code.
    Exited(i32),
}

/// Result of running one entry.
#[derive(Debug)]
pub(super) struct RunReport {
    pub exit: ProcessExit,
    /// Accumulated output of a batch-policy operation (empty when streaming).
    pub output: String,
}

enum Step {
    Cancelled,
    Line(std::io::Result<Option<String>>),
}

/// Runs `job` to completion and reports how its process ended.
pub(super) async fn run_entry(launcher: &dyn Launcher, job: &Job, bus: &Bus) -> RunReport {
    let mut output = String::new();
    let command = job.invocation.command_line();

    if job.token.is_cancelled() {
        return RunReport {
            exit: ProcessExit::NotLaunched,
            output,
        };
    }

    bus.publish(
        Event::new(EventKind::OperationStarted)
            .with_entry(job.id)
            .with_command(command.as_str()),
    );
    tracing::info!(entry = job.id, command = %command, "starting brew operation");

    let mut process = match launcher.launch(&job.invocation).await {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(
                entry = job.id,
                program = %job.invocation.program.display(),
                error = %e,
                "failed to launch brew"
            );
            bus.publish(
                Event::new(EventKind::LaunchFailed)
                    .with_entry(job.id)
                    .with_command(command.as_str())
                    .with_reason(e.to_string()),
            );
            return RunReport {
                exit: ProcessExit::LaunchFailed(e.to_string()),
                output,
            };
        }
    };

    let relay = job.operation.relay();
    loop {
        let step = select! {
            biased;
            _ = job.token.cancelled() => Step::Cancelled,
            line = process.next_line() => Step::Line(line),
        };

        match step {
            Step::Cancelled => {
                let exit = stop(process.as_mut(), job.id).await;
                return RunReport { exit, output };
            }
            Step::Line(Ok(Some(line))) => match relay {
                RelayPolicy::Streaming => job.delivery.output(&line).await,
                RelayPolicy::Batch => {
                    output.push_str(&line);
                    output.push('\n');
                }
            },
            Step::Line(Ok(None)) => break,
            Step::Line(Err(e)) => {
                tracing::warn!(entry = job.id, error = %e, "error reading brew output");
                break;
            }
        }
    }

    let waited = select! {
        biased;
        _ = job.token.cancelled() => None,
        status = process.wait() => Some(status),
    };

    let exit = match waited {
        None => stop(process.as_mut(), job.id).await,
        Some(Ok(code)) => ProcessExit::Exited(code),
        Some(Err(e)) => {
            tracing::warn!(entry = job.id, error = %e, "failed to wait for brew");
            ProcessExit::Exited(-1)
        }
    };
    RunReport { exit, output }
}

/// Terminates `process` and reaps it.
async fn stop(process: &mut dyn Process, entry: u64) -> ProcessExit {
    tracing::debug!(entry, "terminating brew process");
    if let Err(e) = process.terminate().await {
        tracing::warn!(entry, error = %e, "failed to terminate brew");
    }
    match process.wait().await {
        Ok(code) => ProcessExit::Exited(code),
        Err(e) => {
            tracing::warn!(entry, error = %e, "failed to wait for terminated brew");
            ProcessExit::Exited(-1)
        }
    }
}
