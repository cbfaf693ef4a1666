// ─── Admin Console ───
// The management CLI, booted either through the module launcher or from the
// self-contained client jar.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::error::LauncherResult;
use crate::core::java::RuntimeCapabilities;
use crate::core::java::paths::{absolute, safe_path_str};

use super::command::{CommandBuilder, CommandCore, JvmCommandBuilder, Topology};
use super::modules::ModuleLayout;

const CLI_MODULE: &str = "org.jboss.as.cli";

const MODULAR_CLI_TOPOLOGY: Topology = Topology {
    name: "cli",
    process_tag: None,
    module_agent: true,
    suppress_module_access: false,
};

const CLIENT_JAR_TOPOLOGY: Topology = Topology {
    name: "cli-client-jar",
    process_tag: None,
    module_agent: false,
    suppress_module_access: false,
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum CliLauncher {
    Modular,
    ClientJar,
}

#[derive(Debug, Clone)]
pub struct CliCommandBuilder {
    core: CommandCore,
    layout: ModuleLayout,
    launcher: CliLauncher,
}

impl CliCommandBuilder {
    /// Boots the CLI module through the module launcher, using `JAVA_HOME`.
    pub fn modular(home: impl AsRef<Path>) -> LauncherResult<Self> {
        Ok(Self::modular_with_runtime(home, RuntimeCapabilities::current()?))
    }

    /// Runs `bin/client/jboss-cli-client.jar`, using `JAVA_HOME`.
    pub fn client_jar(home: impl AsRef<Path>) -> LauncherResult<Self> {
        Ok(Self::client_jar_with_runtime(home, RuntimeCapabilities::current()?))
    }

    pub fn modular_with_runtime(
        home: impl AsRef<Path>,
        capabilities: Arc<RuntimeCapabilities>,
    ) -> Self {
        Self {
            core: CommandCore::new(capabilities, MODULAR_CLI_TOPOLOGY),
            layout: ModuleLayout::new(home),
            launcher: CliLauncher::Modular,
        }
    }

    pub fn client_jar_with_runtime(
        home: impl AsRef<Path>,
        capabilities: Arc<RuntimeCapabilities>,
    ) -> Self {
        Self {
            core: CommandCore::new(capabilities, CLIENT_JAR_TOPOLOGY),
            layout: ModuleLayout::new(home),
            launcher: CliLauncher::ClientJar,
        }
    }

    pub fn client_jar_path(&self) -> PathBuf {
        self.layout
            .home()
            .join("bin")
            .join("client")
            .join("jboss-cli-client.jar")
    }

    fn set_single(&mut self, key: &str, value: Option<String>) -> &mut Self {
        let arguments = self.core.server_arguments_mut();
        match value {
            Some(value) => arguments.set_single(key, format!("{key}={value}")),
            None => {
                arguments.remove(key);
            }
        }
        self
    }

    /// `host:port`, optionally prefixed with a protocol.
    pub fn set_controller(&mut self, controller: Option<&str>) -> &mut Self {
        self.set_single("--controller", controller.map(str::to_string))
    }

    pub fn set_controller_host_port(&mut self, host: &str, port: u16) -> &mut Self {
        self.set_controller(Some(&format!("{host}:{port}")))
    }

    pub fn set_connect(&mut self, connect: bool) -> &mut Self {
        let arguments = self.core.server_arguments_mut();
        arguments.remove("--connect");
        if connect {
            arguments.append("--connect");
        }
        self
    }

    pub fn set_user(&mut self, user: Option<&str>) -> &mut Self {
        self.set_single("--user", user.map(str::to_string))
    }

    pub fn set_password(&mut self, password: Option<&str>) -> &mut Self {
        self.set_single("--password", password.map(str::to_string))
    }

    /// A single command; clears any command list.
    pub fn set_command(&mut self, command: Option<&str>) -> &mut Self {
        self.core.server_arguments_mut().remove("--commands");
        self.set_single("--command", command.map(str::to_string))
    }

    /// Replaces any previous command or command list.
    pub fn set_commands<I, S>(&mut self, commands: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = commands
            .into_iter()
            .map(|command| command.as_ref().trim().to_string())
            .filter(|command| !command.is_empty())
            .collect::<Vec<_>>()
            .join(",");
        self.core.server_arguments_mut().remove("--command");
        self.set_single("--commands", (!joined.is_empty()).then_some(joined))
    }

    /// Script file executed by the CLI.
    pub fn set_script_file(&mut self, file: Option<&Path>) -> &mut Self {
        self.set_single("--file", file.map(|file| safe_path_str(&absolute(file))))
    }

    /// Connection timeout in milliseconds.
    pub fn set_timeout(&mut self, timeout_ms: Option<u64>) -> &mut Self {
        self.set_single("--timeout", timeout_ms.map(|ms| ms.to_string()))
    }

    fn invocation(&self) -> Vec<String> {
        match self.launcher {
            CliLauncher::Modular => self.layout.invocation(CLI_MODULE),
            CliLauncher::ClientJar => vec![
                "-jar".to_string(),
                safe_path_str(&self.client_jar_path()),
            ],
        }
    }
}

impl CommandBuilder for CliCommandBuilder {
    fn build_arguments(&self) -> Vec<String> {
        self.core.flatten(
            Some(&self.layout.modules_jar()),
            self.invocation(),
            Vec::new(),
        )
    }

    fn build(&self) -> Vec<String> {
        self.core.with_executable(self.build_arguments())
    }
}

impl JvmCommandBuilder for CliCommandBuilder {
    fn command(&self) -> &CommandCore {
        &self.core
    }

    fn command_mut(&mut self) -> &mut CommandCore {
        &mut self.core
    }
}
