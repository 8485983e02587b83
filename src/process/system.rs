//! # System launcher backed by `tokio::process`.
//!
//! ```text
//! Command(program, args, env) ──spawn──► Child
//!                                         ├─ stdout ─► reader task ─┐
//!                                         └─ stderr ─► reader task ─┼─► mpsc ─► next_line()
//!                                                                   │
//!                        (channel closes when both readers finish) ─┘
//!
//! next_line():  select! { buffered line ─► Some(line)
//!                         child exited  ─► drain for at most OUTPUT_DRAIN ─► None }
//!
//! terminate():  SIGTERM ─► wait up to terminate_grace ─► SIGKILL
//! ```
//!
//! ## Rules
//! - stdin is `/dev/null`; brew never gets to prompt.
//! - With an environment override the inherited environment is cleared first.
//! - Lines are decoded lossily; invalid UTF-8 never aborts a run.
//! - Output ends when the child exits, not when its pipes close: a background
//!   descendant that inherited stdout/stderr cannot hold the run open.
//! - The child is killed if the [`Process`] is dropped while still running.
//! - A signal-terminated child reports `128 + signal` on unix.

use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::select;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::{Invocation, Launcher, Process};

/// How long output is still collected after the child exited.
const OUTPUT_DRAIN: Duration = Duration::from_millis(250);

/// Launches real subprocesses.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLauncher;

impl SystemLauncher {
    /// Construct a new [`SystemLauncher`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Launcher for SystemLauncher {
    async fn launch(&self, invocation: &Invocation) -> io::Result<Box<dyn Process>> {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(env) = &invocation.environment {
            cmd.env_clear();
            cmd.envs(env);
        }

        let mut child = cmd.spawn()?;
        tracing::debug!(pid = ?child.id(), program = %invocation.program.display(), "spawned brew");

        let (tx, rx) = mpsc::unbounded_channel();
        let mut pumps = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            pumps.push(tokio::spawn(pump_lines(stdout, tx.clone())));
        }
        if let Some(stderr) = child.stderr.take() {
            pumps.push(tokio::spawn(pump_lines(stderr, tx)));
        }

        Ok(Box::new(ChildProcess {
            child,
            lines: rx,
            pumps,
            grace: invocation.terminate_grace,
            exited: None,
            drain_until: None,
            output_closed: false,
        }))
    }
}

/// A spawned child with its merged output stream.
struct ChildProcess {
    child: Child,
    lines: mpsc::UnboundedReceiver<io::Result<String>>,
    pumps: Vec<JoinHandle<()>>,
    grace: Duration,
    exited: Option<i32>,
    /// Set when the exit is first observed by `next_line`.
    drain_until: Option<Instant>,
    output_closed: bool,
}

enum Next {
    Line(Option<io::Result<String>>),
    Exited(io::Result<ExitStatus>),
}

impl ChildProcess {
    fn take_line(&mut self, line: Option<io::Result<String>>) -> io::Result<Option<String>> {
        if line.is_none() {
            self.output_closed = true;
        }
        line.transpose()
    }

    fn record_exit(&mut self, status: ExitStatus) -> i32 {
        let code = exit_code(status);
        self.exited = Some(code);
        code
    }

    /// Stops the reader tasks; a descendant may still hold the pipes.
    fn close_output(&mut self) {
        self.output_closed = true;
        self.lines.close();
        for pump in &self.pumps {
            pump.abort();
        }
    }

    #[cfg(unix)]
    fn send_sigterm(&self) -> io::Result<()> {
        use nix::errno::Errno;
        use nix::sys::signal::{Signal, kill};
        use nix::unistd::Pid;

        let Some(pid) = self.child.id() else {
            return Ok(());
        };
        let Ok(raw) = i32::try_from(pid) else {
            return Ok(());
        };
        match kill(Pid::from_raw(raw), Signal::SIGTERM) {
            Ok(()) | Err(Errno::ESRCH) => Ok(()),
            Err(e) => Err(io::Error::from(e)),
        }
    }

    #[cfg(not(unix))]
    fn send_sigterm(&self) -> io::Result<()> {
        Ok(())
    }

    fn kill(&mut self) -> io::Result<()> {
        match self.child.start_kill() {
            Ok(()) => Ok(()),
            // Already reaped.
            Err(e) if e.kind() == io::ErrorKind::InvalidInput => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl Process for ChildProcess {
    async fn next_line(&mut self) -> io::Result<Option<String>> {
        if self.output_closed {
            return Ok(None);
        }

        if self.exited.is_none() {
            let next = select! {
                biased;
                line = self.lines.recv() => Next::Line(line),
                status = self.child.wait() => Next::Exited(status),
            };
            match next {
                Next::Line(line) => return self.take_line(line),
                Next::Exited(status) => {
                    self.record_exit(status?);
                }
            }
        }

        let deadline = *self.drain_until.get_or_insert_with(|| Instant::now() + OUTPUT_DRAIN);
        match tokio::time::timeout_at(deadline, self.lines.recv()).await {
            Ok(line) => self.take_line(line),
            Err(_) => {
                tracing::debug!(pid = ?self.child.id(), "brew exited with its output still open");
                self.close_output();
                Ok(None)
            }
        }
    }

    async fn terminate(&mut self) -> io::Result<()> {
        if self.exited.is_some() {
            return Ok(());
        }

        self.send_sigterm()?;
        if !self.grace.is_zero() {
            if let Ok(status) = tokio::time::timeout(self.grace, self.child.wait()).await {
                self.record_exit(status?);
                return Ok(());
            }
        }

        tracing::debug!(pid = ?self.child.id(), grace = ?self.grace, "brew ignored SIGTERM; killing");
        self.kill()
    }

    async fn wait(&mut self) -> io::Result<i32> {
        if let Some(code) = self.exited {
            return Ok(code);
        }
        let status = self.child.wait().await?;
        Ok(self.record_exit(status))
    }
}

impl Drop for ChildProcess {
    fn drop(&mut self) {
        for pump in &self.pumps {
            pump.abort();
        }
    }
}

/// Reads `pipe` line by line into `tx` until EOF or the receiver is gone.
async fn pump_lines<R>(pipe: R, tx: mpsc::UnboundedSender<io::Result<String>>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(pipe);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(trim_line_end(&buf)).into_owned();
                if tx.send(Ok(line)).is_err() {
                    break;
                }
            }
            Err(e) => {
                let _ = tx.send(Err(e));
                break;
            }
        }
    }
}

fn trim_line_end(buf: &[u8]) -> &[u8] {
    let buf = buf.strip_suffix(b"\n").unwrap_or(buf);
    buf.strip_suffix(b"\r").unwrap_or(buf)
}

fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or_else(|| {
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            128 + status.signal().unwrap_or(0)
        }
        #[cfg(not(unix))]
        {
            -1
        }
    })
}
