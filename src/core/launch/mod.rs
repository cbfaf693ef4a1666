pub mod arguments;
pub mod bootable;
pub mod cli;
pub mod command;
pub mod domain;
pub mod launcher;
pub mod lifecycle;
pub mod modules;
pub mod rules;
pub mod standalone;

pub use arguments::{Argument, ArgumentCollection};
pub use bootable::BootableJarCommandBuilder;
pub use cli::CliCommandBuilder;
pub use command::{CommandBuilder, JvmCommandBuilder};
pub use domain::DomainCommandBuilder;
pub use launcher::{EnvironmentOverlay, Launcher, OutputTarget, StreamRedirection, launch};
pub use lifecycle::{ProcessHandle, ProcessStatus, destroy_process, wait_for};
pub use modules::ModulesCommandBuilder;
pub use standalone::StandaloneCommandBuilder;
