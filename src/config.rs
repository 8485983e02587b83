//! # Engine-wide configuration.
//!
//! Provides [`BrewConfig`], the settings every newly submitted operation is
//! launched with.
//!
//! Config is used in two ways:
//! 1. **Engine creation**: `Brew::builder(config).build()`
//! 2. **Runtime changes**: the `set_*` methods on [`Brew`](crate::Brew) replace
//!    fields of the live copy; each queue entry snapshots what it needs at
//!    submit time, so changes never reach operations already queued or running.
//!
//! ## Sentinel values
//! - `environment = None` → inherit the environment of the current process
//! - `max_concurrent = 0` → treated as 1
//! - `bus_capacity = 0` → treated as 1
//! - `terminate_grace = 0` → SIGKILL right after SIGTERM

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

/// Location of the Homebrew executable on a default install.
pub const DEFAULT_BREW_PATH: &str = "/usr/local/bin/brew";

/// How long a cancelled process may take to exit after SIGTERM by default.
pub const DEFAULT_TERMINATE_GRACE: Duration = Duration::from_secs(5);

/// Global configuration for the engine.
///
/// ## Field semantics
/// - `brew_path`: absolute path of the Homebrew executable
/// - `environment`: full replacement environment for launched processes (`None` = inherit)
/// - `concurrent`: run operations concurrently (`true`) or strictly one at a time (`false`)
/// - `max_concurrent`: bound on simultaneously running operations in concurrent mode
/// - `bus_capacity`: runtime event bus ring buffer size
/// - `terminate_grace`: time between SIGTERM and SIGKILL when cancelling a running process
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BrewConfig {
    /// Absolute path of the Homebrew executable.
    ///
    /// Only checked for emptiness here; a missing file surfaces as a launch
    /// failure of the next operation.
    pub brew_path: PathBuf,

    /// Environment variables for launched processes.
    ///
    /// - `None` = processes inherit the environment of this process
    /// - `Some(map)` = the map **replaces** the inherited environment entirely
    pub environment: Option<HashMap<String, String>>,

    /// Whether queued operations may run concurrently.
    pub concurrent: bool,

    /// Maximum number of operations running at once in concurrent mode.
    pub max_concurrent: usize,

    /// Capacity of the runtime event bus.
    pub bus_capacity: usize,

    /// Grace period a cancelled process gets to clean up before it is killed.
    pub terminate_grace: Duration,
}

impl BrewConfig {
    /// Returns the concurrency bound clamped to a minimum of 1.
    #[inline]
    pub fn concurrency_limit(&self) -> usize {
        self.max_concurrent.max(1)
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Validates and stores a new brew path; `None` restores [`DEFAULT_BREW_PATH`].
    pub fn set_brew_path(&mut self, path: Option<&Path>) -> Result<(), ConfigError> {
        match path {
            None => self.brew_path = PathBuf::from(DEFAULT_BREW_PATH),
            Some(p) if p.as_os_str().is_empty() => return Err(ConfigError::EmptyBrewPath),
            Some(p) => self.brew_path = p.to_path_buf(),
        }
        Ok(())
    }

    /// Returns the environment launched processes will see.
    ///
    /// With no override this is a snapshot of the current process environment.
    pub fn effective_environment(&self) -> HashMap<String, String> {
        match &self.environment {
            Some(env) => env.clone(),
            None => std::env::vars().collect(),
        }
    }
}

impl Default for BrewConfig {
    /// Default configuration:
    ///
    /// - `brew_path = /usr/local/bin/brew`
    /// - `environment = None` (inherit)
    /// - `concurrent = true`
    /// - `max_concurrent = 4`
    /// - `bus_capacity = 1024`
    /// - `terminate_grace = 5s`
    fn default() -> Self {
        Self {
            brew_path: PathBuf::from(DEFAULT_BREW_PATH),
            environment: None,
            concurrent: true,
            max_concurrent: 4,
            bus_capacity: 1024,
            terminate_grace: DEFAULT_TERMINATE_GRACE,
        }
    }
}
