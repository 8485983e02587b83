//! # Scripted launcher (test double).
//!
//! [`ScriptedLauncher`] hands out fake processes that replay a [`Script`]:
//! a list of output lines followed by an exit code, a hang until terminated,
//! or a launch failure. Scripts are consumed in launch order; once the queue
//! is empty the default script is used.
//!
//! It also records every [`Invocation`] and tracks how many fake processes are
//! alive at once, which is what concurrency tests assert on.
//!
//! ## Example
//! ```rust
//! use brewvisor::{Script, ScriptedLauncher};
//!
//! let launcher = ScriptedLauncher::new()
//!     .push(Script::exit(0).with_lines(["Downloading...", "Installed"]))
//!     .push(Script::exit(1))
//!     .push(Script::hang());
//! assert_eq!(launcher.launches(), 0);
//! ```

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use super::{Invocation, Launcher, Process};

/// Exit code reported by a hanging script after it was terminated (SIGTERM).
const TERMINATED_EXIT_CODE: i32 = 128 + 15;

/// What a scripted process does after printing its lines.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Ending {
    Exit(i32),
    Hang,
    FailLaunch(String),
}

/// Behaviour of one fake process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Script {
    lines: Vec<String>,
    ending: Ending,
    delay: Duration,
}

impl Script {
    /// Prints its lines, then exits with `code`.
    pub fn exit(code: i32) -> Self {
        Self {
            lines: Vec::new(),
            ending: Ending::Exit(code),
            delay: Duration::ZERO,
        }
    }

    /// Prints its lines, then runs until terminated.
    pub fn hang() -> Self {
        Self {
            lines: Vec::new(),
            ending: Ending::Hang,
            delay: Duration::ZERO,
        }
    }

    /// Never starts; `launch` fails with `NotFound` and `reason`.
    pub fn fail_to_launch(reason: impl Into<String>) -> Self {
        Self {
            lines: Vec::new(),
            ending: Ending::FailLaunch(reason.into()),
            delay: Duration::ZERO,
        }
    }

    /// Sets the output lines.
    pub fn with_lines<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lines = lines.into_iter().map(Into::into).collect();
        self
    }

    /// Sleeps `delay` before every line and before exiting.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Default)]
struct Counters {
    launches: AtomicUsize,
    alive: AtomicUsize,
    peak: AtomicUsize,
}

/// Launcher that replays scripts instead of spawning processes.
pub struct ScriptedLauncher {
    scripts: Mutex<VecDeque<Script>>,
    fallback: Script,
    invocations: Mutex<Vec<Invocation>>,
    counters: Arc<Counters>,
}

impl ScriptedLauncher {
    /// Creates a launcher whose processes exit 0 silently unless scripted.
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(VecDeque::new()),
            fallback: Script::exit(0),
            invocations: Mutex::new(Vec::new()),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Queues a script for the next unscripted launch.
    pub fn push(self, script: Script) -> Self {
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(script);
        self
    }

    /// Sets the script used once the queue is empty.
    pub fn with_default(mut self, script: Script) -> Self {
        self.fallback = script;
        self
    }

    /// Number of successful launches so far.
    pub fn launches(&self) -> usize {
        self.counters.launches.load(Ordering::SeqCst)
    }

    /// Number of fake processes currently alive.
    pub fn alive(&self) -> usize {
        self.counters.alive.load(Ordering::SeqCst)
    }

    /// Highest number of fake processes alive at the same time.
    pub fn peak_alive(&self) -> usize {
        self.counters.peak.load(Ordering::SeqCst)
    }

    /// Every invocation passed to `launch`, including failed ones.
    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn next_script(&self) -> Script {
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

impl Default for ScriptedLauncher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Launcher for ScriptedLauncher {
    async fn launch(&self, invocation: &Invocation) -> io::Result<Box<dyn Process>> {
        self.invocations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(invocation.clone());

        let script = self.next_script();
        if let Ending::FailLaunch(reason) = &script.ending {
            return Err(io::Error::new(io::ErrorKind::NotFound, reason.clone()));
        }

        self.counters.launches.fetch_add(1, Ordering::SeqCst);
        let alive = self.counters.alive.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.peak.fetch_max(alive, Ordering::SeqCst);

        Ok(Box::new(ScriptedProcess {
            lines: script.lines.into(),
            ending: script.ending,
            delay: script.delay,
            terminated: false,
            exited: false,
            counters: Arc::clone(&self.counters),
        }))
    }
}

struct ScriptedProcess {
    lines: VecDeque<String>,
    ending: Ending,
    delay: Duration,
    terminated: bool,
    exited: bool,
    counters: Arc<Counters>,
}

impl ScriptedProcess {
    fn mark_exited(&mut self) {
        if !self.exited {
            self.exited = true;
            self.counters.alive.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl Process for ScriptedProcess {
    async fn next_line(&mut self) -> io::Result<Option<String>> {
        if self.terminated {
            return Ok(None);
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(line) = self.lines.pop_front() {
            return Ok(Some(line));
        }
        if self.ending == Ending::Hang {
            std::future::pending::<()>().await;
        }
        Ok(None)
    }

    async fn terminate(&mut self) -> io::Result<()> {
        self.terminated = true;
        Ok(())
    }

    async fn wait(&mut self) -> io::Result<i32> {
        let code = match (&self.ending, self.terminated) {
            (_, true) => TERMINATED_EXIT_CODE,
            (Ending::Exit(code), false) => *code,
            (Ending::Hang, false) => std::future::pending::<i32>().await,
            (Ending::FailLaunch(_), false) => -1,
        };
        self.mark_exited();
        Ok(code)
    }
}

impl Drop for ScriptedProcess {
    fn drop(&mut self) {
        self.mark_exited();
    }
}
