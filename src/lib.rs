pub mod core;

use tracing_subscriber::EnvFilter;

pub use crate::core::error::{LauncherError, LauncherResult};
pub use crate::core::java::RuntimeCapabilities;
pub use crate::core::launch::{
    BootableJarCommandBuilder, CliCommandBuilder, CommandBuilder, DomainCommandBuilder,
    JvmCommandBuilder, Launcher, ModulesCommandBuilder, ProcessHandle, StandaloneCommandBuilder,
};
pub use crate::core::settings::LaunchSettings;

/// Installs a `fmt` subscriber filtered by `RUST_LOG`. Safe to call more than
/// once; later calls leave the first subscriber in place.
pub fn init_logging() {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,server_launcher=debug")),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!("Server launcher logging initialized");
    }
}
