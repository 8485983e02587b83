//! # Invocation: everything needed to start one brew process.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::BrewConfig;
use crate::operations::Operation;

/// Executable, argument vector and environment policy of one process.
///
/// Built from the engine configuration at submit time and never changed
/// afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    /// Executable to run.
    pub program: PathBuf,
    /// Arguments after the executable (command word first).
    pub args: Vec<String>,
    /// Replacement environment; `None` inherits the current process environment.
    pub environment: Option<HashMap<String, String>>,
    /// Time between SIGTERM and SIGKILL when the process is terminated.
    pub terminate_grace: Duration,
}

impl Invocation {
    /// Builds the invocation of `operation` under `cfg`.
    pub fn for_operation(operation: &Operation, cfg: &BrewConfig) -> Self {
        Self {
            program: cfg.brew_path.clone(),
            args: operation.argv(),
            environment: cfg.environment.clone(),
            terminate_grace: cfg.terminate_grace,
        }
    }

    /// The arguments joined by spaces, without the executable.
    pub fn command_line(&self) -> String {
        self.args.join(" ")
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}
