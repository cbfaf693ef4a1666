// ─── Launch Settings ───
// JSON-backed defaults applied to a builder and its launcher.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::java::RuntimeCapabilities;
use crate::core::launch::command::{CommandBuilder, JvmCommandBuilder};
use crate::core::launch::launcher::Launcher;
use crate::core::launch::lifecycle::{DEFAULT_DESTROY_GRACE, ProcessHandle};

const DEFAULT_STARTUP_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchSettings {
    /// Runtime to launch with; `JAVA_HOME` when absent.
    pub java_home: Option<PathBuf>,
    pub java_options: Vec<String>,
    pub module_options: Vec<String>,
    pub server_arguments: Vec<String>,
    /// `null` values remove the variable from the inherited environment.
    pub environment: BTreeMap<String, Option<String>>,
    pub redirect_error_stream: bool,
    pub output_file: Option<PathBuf>,
    pub error_file: Option<PathBuf>,
    pub working_directory: Option<PathBuf>,
    pub startup_timeout_secs: u64,
    pub destroy_grace_secs: u64,
}

impl Default for LaunchSettings {
    fn default() -> Self {
        Self {
            java_home: None,
            java_options: Vec::new(),
            module_options: Vec::new(),
            server_arguments: Vec::new(),
            environment: BTreeMap::new(),
            redirect_error_stream: false,
            output_file: None,
            error_file: None,
            working_directory: None,
            startup_timeout_secs: DEFAULT_STARTUP_TIMEOUT_SECS,
            destroy_grace_secs: DEFAULT_DESTROY_GRACE.as_secs(),
        }
    }
}

impl LaunchSettings {
    pub fn load(path: &Path) -> LauncherResult<Self> {
        let bytes = std::fs::read(path).map_err(|source| LauncherError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Self = serde_json::from_slice(&bytes)?;
        debug!("Loaded launch settings from {:?}", path);
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> LauncherResult<()> {
        let payload = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, payload).map_err(|source| LauncherError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Capabilities of the configured runtime.
    pub fn runtime(&self) -> LauncherResult<Arc<RuntimeCapabilities>> {
        match &self.java_home {
            Some(home) => RuntimeCapabilities::discover(home),
            None => RuntimeCapabilities::current(),
        }
    }

    /// Feeds the configured options through the builder's setters, so the
    /// usual gating applies.
    pub fn apply_to<B: JvmCommandBuilder>(&self, builder: &mut B) -> LauncherResult<()> {
        builder.add_java_options(&self.java_options)?;
        builder.add_module_options(&self.module_options);
        builder.add_server_arguments(&self.server_arguments);
        Ok(())
    }

    pub fn launcher<'a>(&self, builder: &'a dyn CommandBuilder) -> Launcher<'a> {
        let mut launcher = Launcher::of(builder)
            .add_environment_variables(self.environment.clone())
            .set_redirect_error_stream(self.redirect_error_stream);
        if let Some(file) = &self.output_file {
            launcher = launcher.redirect_output(file);
        }
        if let Some(file) = &self.error_file {
            launcher = launcher.redirect_error(file);
        }
        if let Some(dir) = &self.working_directory {
            launcher = launcher.set_directory(dir);
        }
        launcher
    }

    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_secs)
    }

    pub fn destroy_grace(&self) -> Duration {
        Duration::from_secs(self.destroy_grace_secs)
    }

    /// Waits up to the startup timeout for `handle` to exit.
    pub fn wait_for(&self, handle: &ProcessHandle) -> bool {
        handle.wait_for(self.startup_timeout())
    }

    /// Terminates `handle`, allowing the configured grace period before the
    /// forced kill.
    pub fn destroy(&self, handle: &ProcessHandle) {
        handle.destroy_with_grace(self.destroy_grace());
    }
}
