// ─── Packaged Server Jar ───
// A self-contained server jar carries its module configuration in its
// manifest, so no module agent or module access table is injected.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::java::RuntimeCapabilities;
use crate::core::java::paths::{absolute, safe_path_str};

use super::command::{CommandBuilder, CommandCore, JvmCommandBuilder, Topology};

const INSTALL_DIR_ARG: &str = "--install-dir";
const YAML_ARG: &str = "--yaml";

const BOOTABLE_JAR_TOPOLOGY: Topology = Topology {
    name: "bootable-jar",
    process_tag: None,
    module_agent: false,
    suppress_module_access: true,
};

#[derive(Debug, Clone)]
pub struct BootableJarCommandBuilder {
    core: CommandCore,
    jar: PathBuf,
}

impl BootableJarCommandBuilder {
    /// Uses the runtime selected by `JAVA_HOME`.
    pub fn of(jar: impl AsRef<Path>) -> LauncherResult<Self> {
        Ok(Self::with_runtime(jar, RuntimeCapabilities::current()?))
    }

    pub fn with_runtime(jar: impl AsRef<Path>, capabilities: Arc<RuntimeCapabilities>) -> Self {
        Self {
            core: CommandCore::new(capabilities, BOOTABLE_JAR_TOPOLOGY),
            jar: absolute(jar.as_ref()),
        }
    }

    pub fn jar(&self) -> &Path {
        &self.jar
    }

    /// Directory the jar unpacks its server into. Last call wins.
    pub fn set_install_dir(&mut self, dir: Option<&Path>) -> &mut Self {
        let arguments = self.core.server_arguments_mut();
        match dir {
            Some(dir) => arguments.set_single(
                INSTALL_DIR_ARG,
                format!("{INSTALL_DIR_ARG}={}", safe_path_str(&absolute(dir))),
            ),
            None => {
                arguments.remove(INSTALL_DIR_ARG);
            }
        }
        self
    }

    /// Replaces the whole YAML overlay list; one `--yaml=` per file.
    pub fn set_yaml_files<I, P>(&mut self, files: I) -> LauncherResult<&mut Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut tokens = Vec::new();
        for file in files {
            let file = file.as_ref();
            if file.as_os_str().is_empty() {
                return Err(LauncherError::InvalidArgument(
                    "YAML file path must not be empty".into(),
                ));
            }
            tokens.push(format!("{YAML_ARG}={}", safe_path_str(&absolute(file))));
        }

        let arguments = self.core.server_arguments_mut();
        arguments.remove(YAML_ARG);
        for token in tokens {
            arguments.append_keyed(YAML_ARG, token);
        }
        Ok(self)
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
}

impl CommandBuilder for BootableJarCommandBuilder {
    fn build_arguments(&self) -> Vec<String> {
        self.core.flatten(
            None,
            vec!["-jar".to_string(), safe_path_str(&self.jar)],
            Vec::new(),
        )
    }

    fn build(&self) -> Vec<String> {
        self.core.with_executable(self.build_arguments())
    }
}

impl JvmCommandBuilder for BootableJarCommandBuilder {
    fn command(&self) -> &CommandCore {
        &self.core
    }

    fn command_mut(&mut self) -> &mut CommandCore {
        &mut self.core
    }
}
