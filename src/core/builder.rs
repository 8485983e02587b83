use std::sync::Arc;

use tokio::runtime::Handle;

use crate::config::BrewConfig;
use crate::error::ConfigError;
use crate::events::Bus;
use crate::process::{Launcher, LauncherRef, SystemLauncher};

use super::brew::Brew;
use super::queue::ExecutionQueue;

/// Builder for constructing a [`Brew`] engine.
pub struct BrewBuilder {
    cfg: BrewConfig,
    launcher: Option<LauncherRef>,
    runtime: Option<Handle>,
}

impl BrewBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: BrewConfig) -> Self {
        Self {
            cfg,
            launcher: None,
            runtime: None,
        }
    }

    /// Replaces the process launcher (defaults to [`SystemLauncher`]).
    pub fn with_launcher(self, launcher: impl Launcher) -> Self {
        self.with_launcher_ref(Arc::new(launcher))
    }

    /// Same as [`with_launcher`](Self::with_launcher) for an already shared launcher.
    pub fn with_launcher_ref(mut self, launcher: LauncherRef) -> Self {
        self.launcher = Some(launcher);
        self
    }

    /// Runtime the runner tasks are spawned on.
    ///
    /// Defaults to the runtime `build()` is called from.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Builds the engine.
    ///
    /// Fails if the brew path is empty, or if no runtime was supplied and
    /// `build()` runs outside one.
    pub fn build(self) -> Result<Brew, ConfigError> {
        if self.cfg.brew_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyBrewPath);
        }
        let runtime = match self.runtime {
            Some(handle) => handle,
            None => Handle::try_current().map_err(|_| ConfigError::NoRuntime)?,
        };
        let launcher = self
            .launcher
            .unwrap_or_else(|| Arc::new(SystemLauncher::new()));

        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let queue = ExecutionQueue::new(launcher, bus.clone(), runtime);

        tracing::debug!(
            brew_path = %self.cfg.brew_path.display(),
            concurrent = self.cfg.concurrent,
            max_concurrent = self.cfg.concurrency_limit(),
            "brew engine built"
        );
        Ok(Brew::from_parts(self.cfg, queue, bus))
    }
}
