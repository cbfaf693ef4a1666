// ─── Standalone Server ───

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::error::LauncherResult;
use crate::core::java::RuntimeCapabilities;
use crate::core::java::paths::{absolute, safe_path_str};

use super::command::{CommandBuilder, CommandCore, JvmCommandBuilder, Topology};
use super::modules::ModuleLayout;

const STANDALONE_MODULE: &str = "org.jboss.as.standalone";

const STANDALONE_TOPOLOGY: Topology = Topology {
    name: "standalone",
    process_tag: Some("-D[Standalone]"),
    module_agent: true,
    suppress_module_access: false,
};

#[derive(Debug, Clone)]
pub struct StandaloneCommandBuilder {
    core: CommandCore,
    layout: ModuleLayout,
    base_dir: Option<PathBuf>,
    read_only_configuration: Option<String>,
}

impl StandaloneCommandBuilder {
    /// Uses the runtime selected by `JAVA_HOME`.
    pub fn of(home: impl AsRef<Path>) -> LauncherResult<Self> {
        Ok(Self::with_runtime(home, RuntimeCapabilities::current()?))
    }

    pub fn with_runtime(home: impl AsRef<Path>, capabilities: Arc<RuntimeCapabilities>) -> Self {
        Self {
            core: CommandCore::new(capabilities, STANDALONE_TOPOLOGY),
            layout: ModuleLayout::new(home),
            base_dir: None,
            read_only_configuration: None,
        }
    }

    pub fn layout(&self) -> &ModuleLayout {
        &self.layout
    }

    /// `<home>/standalone` unless overridden.
    pub fn base_dir(&self) -> PathBuf {
        self.base_dir
            .clone()
            .unwrap_or_else(|| self.layout.home().join("standalone"))
    }

    pub fn set_base_dir(&mut self, dir: Option<&Path>) -> &mut Self {
        self.base_dir = dir.map(absolute);
        self
    }

    pub fn add_module_dir(&mut self, dir: impl AsRef<Path>) -> &mut Self {
        self.layout.add_module_dir(dir);
        self
    }

    pub fn set_module_dirs<I, P>(&mut self, dirs: I) -> &mut Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.layout.set_module_dirs(dirs);
        self
    }

    pub fn set_admin_only(&mut self) -> &mut Self {
        self.core.set_admin_only(true);
        self
    }

    /// Hint for the default interface; `None` removes the hint.
    pub fn set_bind_address_hint(&mut self, address: Option<&str>) -> &mut Self {
        self.core.set_bind_address_hint(None, address);
        self
    }

    pub fn set_interface_bind_address_hint(
        &mut self,
        interface: &str,
        address: Option<&str>,
    ) -> &mut Self {
        self.core.set_bind_address_hint(Some(interface), address);
        self
    }

    pub fn set_debug(&mut self, suspend: bool, port: u16) -> &mut Self {
        self.core.set_debug(suspend, port);
        self
    }

    pub fn clear_debug(&mut self) -> &mut Self {
        self.core.clear_debug();
        self
    }

    /// Configuration file, relative to the configuration directory.
    pub fn set_server_configuration(&mut self, file: Option<&str>) -> &mut Self {
        self.core.set_server_configuration(file);
        self
    }

    /// Boots from `file` without persisting changes back to it.
    pub fn set_server_read_only_configuration(&mut self, file: Option<&str>) -> &mut Self {
        self.read_only_configuration = file.map(str::to_string);
        self
    }

    fn invocation(&self) -> Vec<String> {
        let base_dir = self.base_dir();
        let mut cmd = vec![
            format!(
                "-Dorg.jboss.boot.log.file={}",
                safe_path_str(&base_dir.join("log").join("server.log"))
            ),
            format!(
                "-Dlogging.configuration=file:{}",
                safe_path_str(&base_dir.join("configuration").join("logging.properties"))
            ),
        ];
        cmd.extend(self.layout.invocation(STANDALONE_MODULE));
        cmd.push(format!(
            "-Djboss.home.dir={}",
            safe_path_str(self.layout.home())
        ));
        cmd.push(format!(
            "-Djboss.server.base.dir={}",
            safe_path_str(&base_dir)
        ));
        cmd
    }

    fn extra_server_tokens(&self) -> Vec<String> {
        self.read_only_configuration
            .iter()
            .map(|file| format!("--read-only-server-config={file}"))
            .collect()
    }
}

impl CommandBuilder for StandaloneCommandBuilder {
    fn build_arguments(&self) -> Vec<String> {
        self.core.flatten(
            Some(&self.layout.modules_jar()),
            self.invocation(),
            self.extra_server_tokens(),
        )
    }

    fn build(&self) -> Vec<String> {
        self.core.with_executable(self.build_arguments())
    }
}

impl JvmCommandBuilder for StandaloneCommandBuilder {
    fn command(&self) -> &CommandCore {
        &self.core
    }

    fn command_mut(&mut self) -> &mut CommandCore {
        &mut self.core
    }
}
