// ─── Managed Domain ───
// Launches the process controller, which in turn spawns the host controller
// with the JVM options collected here. Both JVMs get the runtime-gated module
// access and security manager tokens.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::error::LauncherResult;
use crate::core::java::RuntimeCapabilities;
use crate::core::java::paths::{absolute, safe_path_str};

use super::arguments::ArgumentCollection;
use super::command::{CommandBuilder, CommandCore, JvmCommandBuilder, Topology};
use super::modules::ModuleLayout;

const PROCESS_CONTROLLER_MODULE: &str = "org.jboss.as.process-controller";

const DOMAIN_TOPOLOGY: Topology = Topology {
    name: "domain",
    process_tag: Some("-D[Process Controller]"),
    module_agent: true,
    suppress_module_access: false,
};

#[derive(Debug, Clone)]
pub struct DomainCommandBuilder {
    core: CommandCore,
    layout: ModuleLayout,
    base_dir: Option<PathBuf>,
    host_controller_java_options: ArgumentCollection,
    primary_address: Option<String>,
    primary_port: Option<u16>,
    host_configuration: Option<String>,
}

impl DomainCommandBuilder {
    /// Uses the runtime selected by `JAVA_HOME`.
    pub fn of(home: impl AsRef<Path>) -> LauncherResult<Self> {
        Ok(Self::with_runtime(home, RuntimeCapabilities::current()?))
    }

    pub fn with_runtime(home: impl AsRef<Path>, capabilities: Arc<RuntimeCapabilities>) -> Self {
        Self {
            core: CommandCore::new(capabilities, DOMAIN_TOPOLOGY),
            layout: ModuleLayout::new(home),
            base_dir: None,
            host_controller_java_options: ArgumentCollection::new(),
            primary_address: None,
            primary_port: None,
            host_configuration: None,
        }
    }

    pub fn layout(&self) -> &ModuleLayout {
        &self.layout
    }

    /// `<home>/domain` unless overridden.
    pub fn base_dir(&self) -> PathBuf {
        self.base_dir
            .clone()
            .unwrap_or_else(|| self.layout.home().join("domain"))
    }

    pub fn set_base_dir(&mut self, dir: Option<&Path>) -> &mut Self {
        self.base_dir = dir.map(absolute);
        self
    }

    pub fn add_module_dir(&mut self, dir: impl AsRef<Path>) -> &mut Self {
        self.layout.add_module_dir(dir);
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

    /// Address of the primary host controller this host registers with.
    pub fn set_primary_address_hint(&mut self, address: Option<&str>) -> &mut Self {
        self.primary_address = address.map(str::to_string);
        self
    }

    pub fn set_primary_port_hint(&mut self, port: Option<u16>) -> &mut Self {
        self.primary_port = port;
        self
    }

    pub fn set_domain_configuration(&mut self, file: Option<&str>) -> &mut Self {
        self.core.set_server_configuration(file);
        self
    }

    pub fn set_host_configuration(&mut self, file: Option<&str>) -> &mut Self {
        self.host_configuration = file.map(str::to_string);
        self
    }

    /// JVM options for the host controller process; system properties are
    /// last-write-wins like the process controller's options.
    pub fn add_host_controller_java_option(&mut self, option: &str) -> &mut Self {
        let option = option.trim();
        if !option.is_empty() {
            self.host_controller_java_options.add(option);
        }
        self
    }

    pub fn set_host_controller_java_options<I, S>(&mut self, options: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.host_controller_java_options.clear();
        for option in options {
            self.add_host_controller_java_option(option.as_ref());
        }
        self
    }

    pub fn host_controller_java_options(&self) -> Vec<String> {
        self.host_controller_java_options.to_ordered_list()
    }

    fn invocation(&self) -> Vec<String> {
        let base_dir = self.base_dir();
        let java = safe_path_str(self.core.capabilities().executable());

        let mut cmd = self.layout.invocation(PROCESS_CONTROLLER_MODULE);
        cmd.push("-jboss-home".to_string());
        cmd.push(safe_path_str(self.layout.home()));
        cmd.push("-jvm".to_string());
        cmd.push(java.clone());
        cmd.push("-mp".to_string());
        cmd.push(self.layout.module_path());
        cmd.push("--".to_string());
        cmd.push(format!(
            "-Dorg.jboss.boot.log.file={}",
            safe_path_str(&base_dir.join("log").join("host-controller.log"))
        ));
        cmd.push(format!(
            "-Dlogging.configuration=file:{}",
            safe_path_str(&base_dir.join("configuration").join("logging.properties"))
        ));
        cmd.extend(self.core.runtime_rule_tokens());
        cmd.extend(self.host_controller_java_options.to_ordered_list());
        cmd.push("--".to_string());
        cmd.push("-default-jvm".to_string());
        cmd.push(java);
        cmd.push(format!(
            "-Djboss.home.dir={}",
            safe_path_str(self.layout.home())
        ));
        cmd.push(format!(
            "-Djboss.domain.base.dir={}",
            safe_path_str(&base_dir)
        ));
        cmd
    }

    fn extra_server_tokens(&self) -> Vec<String> {
        let mut tokens = Vec::new();
        if let Some(address) = &self.primary_address {
            tokens.push(format!("--primary-address={address}"));
        }
        if let Some(port) = self.primary_port {
            tokens.push(format!("--primary-port={port}"));
        }
        if let Some(file) = &self.host_configuration {
            tokens.push(format!("--host-config={file}"));
        }
        tokens
    }
}

impl CommandBuilder for DomainCommandBuilder {
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

impl JvmCommandBuilder for DomainCommandBuilder {
    fn command(&self) -> &CommandCore {
        &self.core
    }

    fn command_mut(&mut self) -> &mut CommandCore {
        &mut self.core
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::LauncherError;

    fn builder(version: &str) -> DomainCommandBuilder {
        DomainCommandBuilder::with_runtime(
            "/opt/server",
            Arc::new(RuntimeCapabilities::new("/opt/jdk", version)),
        )
    }

    fn count(cmd: &[String], token: &str) -> usize {
        cmd.iter().filter(|arg| *arg == token).count()
    }

    #[test]
    fn domain_arguments() {
        let mut builder = builder("21.0.5");
        builder
            .set_admin_only()
            .set_bind_address_hint(Some("0.0.0.0"))
            .set_primary_address_hint(Some("0.0.0.0"))
            .set_domain_configuration(Some("domain.xml"))
            .set_host_configuration(Some("host.xml"))
            .set_interface_bind_address_hint("management", Some("0.0.0.0"));
        builder.add_java_option("-Djava.security.manager").unwrap();

        let cmd = builder.build_arguments();
        assert_eq!(cmd[0], "-D[Process Controller]");
        assert!(cmd.contains(&"--admin-only".to_string()));
        assert!(cmd.contains(&"-b=0.0.0.0".to_string()));
        assert!(cmd.contains(&"--primary-address=0.0.0.0".to_string()));
        assert!(cmd.contains(&"-bmanagement=0.0.0.0".to_string()));
        assert!(cmd.contains(&"-c=domain.xml".to_string()));
        assert!(cmd.contains(&"--host-config=host.xml".to_string()));
        assert!(cmd.contains(&"org.jboss.as.process-controller".to_string()));
        assert_eq!(count(&cmd, "--add-modules=java.se"), 2);
        assert_eq!(count(&cmd, "-Djava.security.manager=allow"), 2);

        builder.set_bind_address_hint(None);
        let cmd = builder.build_arguments();
        assert!(!cmd.contains(&"-b=0.0.0.0".to_string()));
    }

    #[test]
    fn host_controller_options_sit_between_separators() {
        let mut builder = builder("17");
        builder
            .add_host_controller_java_option("-Xmx512m")
            .add_host_controller_java_option("-Dhc=1")
            .add_host_controller_java_option("-Dhc=2");

        let cmd = builder.build_arguments();
        let separators: Vec<usize> = cmd
            .iter()
            .enumerate()
            .filter(|(_, arg)| *arg == "--")
            .map(|(index, _)| index)
            .collect();
        assert_eq!(separators.len(), 2);
        let section = &cmd[separators[0] + 1..separators[1]];
        assert!(section.contains(&"-Xmx512m".to_string()));
        assert!(section.contains(&"-Dhc=2".to_string()));
        assert!(!section.contains(&"-Dhc=1".to_string()));
        assert_eq!(cmd[separators[1] + 1], "-default-jvm");
    }

    #[test]
    fn host_controller_jvm_gets_runtime_rules() {
        let mut builder = builder("21");
        builder.add_host_controller_java_option("-Xmx512m");
        let cmd = builder.build_arguments();
        let first = cmd.iter().position(|arg| arg == "--").unwrap();
        let second = first + 1 + cmd[first + 1..].iter().position(|arg| arg == "--").unwrap();

        let controller = &cmd[..first];
        let host = &cmd[first + 1..second];
        for section in [controller, host] {
            assert_eq!(count(section, "--add-modules=java.se"), 1);
            assert_eq!(count(section, "--add-opens=java.base/java.lang=ALL-UNNAMED"), 1);
            assert_eq!(count(section, "-Djava.security.manager=allow"), 0);
        }
        let opens = host
            .iter()
            .position(|arg| arg == "--add-modules=java.se")
            .unwrap();
        let xmx = host.iter().position(|arg| arg == "-Xmx512m").unwrap();
        assert!(opens < xmx);

        let removed = DomainCommandBuilder::with_runtime(
            "/opt/server",
            Arc::new(RuntimeCapabilities::new("/opt/jdk", "25")),
        );
        assert!(!removed.build_arguments().iter().any(|arg| arg.starts_with("--add-")));
    }

    #[test]
    fn primary_port_and_clearing() {
        let mut builder = builder("17");
        builder
            .set_primary_address_hint(Some("10.0.0.1"))
            .set_primary_port_hint(Some(9990));
        assert!(builder.build_arguments().contains(&"--primary-port=9990".to_string()));

        builder.set_primary_address_hint(None).set_primary_port_hint(None);
        let cmd = builder.build_arguments();
        assert!(!cmd.iter().any(|arg| arg.starts_with("--primary-")));
    }

    #[test]
    fn security_manager_rejected_on_java_25() {
        let mut builder = builder("25.0.1");
        assert!(matches!(
            builder.add_java_option("-Djava.security.manager"),
            Err(LauncherError::UnsupportedOption { .. })
        ));
        assert!(matches!(
            builder.set_use_security_manager(true),
            Err(LauncherError::UnsupportedOption { .. })
        ));
        let cmd = builder.build_arguments();
        assert_eq!(count(&cmd, "-secmgr"), 0);
        assert!(!cmd.iter().any(|arg| arg.starts_with("--add-")));
    }
}
