// ─── Command Core ───
// State shared by every topology builder and the flatten algorithm that turns
// it into an argument vector. Topology builders own one core each and layer
// their fixed invocation tokens and extra setters on top.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::java::RuntimeCapabilities;
use crate::core::java::paths::safe_path_str;

use super::arguments::{Argument, ArgumentCollection};
use super::rules::{self, RuleContext};

const SECURITY_MANAGER_PROPERTY: &str = "java.security.manager";

/// The JDWP agent token for a debug session listening on `port`.
pub fn debug_argument(suspend: bool, port: u16) -> String {
    format!(
        "-agentlib:jdwp=transport=dt_socket,server=y,suspend={},address={}",
        if suspend { "y" } else { "n" },
        port
    )
}

/// Produces the final argument vector handed to the process launcher.
pub trait CommandBuilder {
    /// Every argument after the executable.
    fn build_arguments(&self) -> Vec<String>;

    /// The directly executable vector: launcher executable first.
    fn build(&self) -> Vec<String>;
}

/// Fixed shape of a launch topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Topology {
    pub name: &'static str,
    /// Marker property identifying the process in `ps` output.
    pub process_tag: Option<&'static str>,
    /// Attach the module launcher jar as a Java agent.
    pub module_agent: bool,
    /// The topology provides its own module configuration.
    pub suppress_module_access: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DebugSettings {
    suspend: bool,
    port: u16,
}

#[derive(Debug, Clone)]
pub struct CommandCore {
    capabilities: Arc<RuntimeCapabilities>,
    topology: Topology,
    module_options: ArgumentCollection,
    java_options: ArgumentCollection,
    server_arguments: ArgumentCollection,
    use_security_manager: bool,
    default_bind_address: Option<String>,
    interface_bind_addresses: BTreeMap<String, String>,
    debug: Option<DebugSettings>,
    server_configuration: Option<String>,
    admin_only: bool,
}

impl CommandCore {
    pub fn new(capabilities: Arc<RuntimeCapabilities>, topology: Topology) -> Self {
        Self {
            capabilities,
            topology,
            module_options: ArgumentCollection::new(),
            java_options: ArgumentCollection::new(),
            server_arguments: ArgumentCollection::new(),
            use_security_manager: false,
            default_bind_address: None,
            interface_bind_addresses: BTreeMap::new(),
            debug: None,
            server_configuration: None,
            admin_only: false,
        }
    }

    pub fn capabilities(&self) -> &Arc<RuntimeCapabilities> {
        &self.capabilities
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    // ── JVM options ─────────────────────────────────────

    /// A bare `-Djava.security.manager` becomes the security manager request
    /// instead of a stored option.
    pub fn add_java_option(&mut self, option: &str) -> LauncherResult<()> {
        let option = option.trim();
        if option.is_empty() {
            return Ok(());
        }
        if is_security_manager_request(option) {
            return self.request_security_manager(option);
        }
        self.java_options.add(option);
        Ok(())
    }

    /// Replaces the options and any security manager request. Nothing changes
    /// when one of the new options is rejected.
    pub fn set_java_options<I, S>(&mut self, options: I) -> LauncherResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut staged = ArgumentCollection::new();
        let mut security_manager = false;
        for option in options {
            let option = option.as_ref().trim();
            if option.is_empty() {
                continue;
            }
            if is_security_manager_request(option) {
                self.ensure_security_manager_supported(option)?;
                security_manager = true;
            } else {
                staged.add(option);
            }
        }
        self.java_options = staged;
        self.use_security_manager = security_manager;
        Ok(())
    }

    pub fn set_use_security_manager(&mut self, use_security_manager: bool) -> LauncherResult<()> {
        if use_security_manager {
            return self.request_security_manager(&format!("-D{SECURITY_MANAGER_PROPERTY}"));
        }
        self.use_security_manager = false;
        Ok(())
    }

    fn ensure_security_manager_supported(&self, option: &str) -> LauncherResult<()> {
        if self.capabilities.supports_security_manager() {
            return Ok(());
        }
        Err(LauncherError::UnsupportedOption {
            option: option.to_string(),
            major: self.capabilities.major_version(),
        })
    }

    fn request_security_manager(&mut self, option: &str) -> LauncherResult<()> {
        self.ensure_security_manager_supported(option)?;
        debug!(
            "Security manager requested for {} on Java {}",
            self.topology.name,
            self.capabilities.major_version()
        );
        self.use_security_manager = true;
        Ok(())
    }

    pub fn uses_security_manager(&self) -> bool {
        self.use_security_manager
    }

    pub fn java_options(&self) -> Vec<String> {
        self.java_options.to_ordered_list()
    }

    // ── Module options ──────────────────────────────────

    pub fn add_module_option(&mut self, option: &str) {
        let option = option.trim();
        if !option.is_empty() {
            self.module_options.append(option);
        }
    }

    pub fn module_options(&self) -> Vec<String> {
        self.module_options.to_ordered_list()
    }

    // ── Server arguments ────────────────────────────────

    pub fn add_server_argument(&mut self, argument: &str) {
        let argument = argument.trim();
        if !argument.is_empty() {
            self.server_arguments.append(argument);
        }
    }

    pub fn server_arguments_mut(&mut self) -> &mut ArgumentCollection {
        &mut self.server_arguments
    }

    pub fn server_arguments(&self) -> Vec<String> {
        self.server_arguments.to_ordered_list()
    }

    // ── Scalar settings ─────────────────────────────────

    /// `None` as interface targets the default interface (`-b=`); `None` as
    /// address clears the hint.
    pub fn set_bind_address_hint(&mut self, interface: Option<&str>, address: Option<&str>) {
        let address = address.map(str::to_string);
        match interface {
            None => self.default_bind_address = address,
            Some(interface) => match address {
                Some(address) => {
                    self.interface_bind_addresses
                        .insert(interface.to_string(), address);
                }
                None => {
                    self.interface_bind_addresses.remove(interface);
                }
            },
        }
    }

    pub fn bind_address_hint(&self, interface: Option<&str>) -> Option<&str> {
        match interface {
            None => self.default_bind_address.as_deref(),
            Some(interface) => self.interface_bind_addresses.get(interface).map(String::as_str),
        }
    }

    pub fn set_debug(&mut self, suspend: bool, port: u16) {
        self.debug = Some(DebugSettings { suspend, port });
    }

    pub fn clear_debug(&mut self) {
        self.debug = None;
    }

    pub fn set_server_configuration(&mut self, file: Option<&str>) {
        self.server_configuration = file.map(str::to_string);
    }

    pub fn server_configuration(&self) -> Option<&str> {
        self.server_configuration.as_deref()
    }

    pub fn set_admin_only(&mut self, admin_only: bool) {
        self.admin_only = admin_only;
    }

    pub fn is_admin_only(&self) -> bool {
        self.admin_only
    }

    // ── Build ───────────────────────────────────────────

    /// Flattens every category in its fixed order. `agent_jar` is attached when
    /// the topology asks for a module agent; `invocation` is the topology's
    /// fixed main-class section; `extra_server_tokens` carries tokens derived
    /// from topology-specific scalar settings.
    pub fn flatten(
        &self,
        agent_jar: Option<&std::path::Path>,
        invocation: Vec<String>,
        extra_server_tokens: Vec<String>,
    ) -> Vec<String> {
        let mut cmd = Vec::new();

        if let Some(tag) = self.topology.process_tag {
            cmd.push(tag.to_string());
        }
        if self.topology.module_agent
            && let Some(jar) = agent_jar
        {
            cmd.push(format!("-javaagent:{}", safe_path_str(jar)));
        }

        cmd.extend(self.module_options.to_ordered_list());

        cmd.extend(self.runtime_rule_tokens());
        cmd.extend(self.java_options.to_ordered_list());

        cmd.extend(invocation);

        cmd.extend(self.derived_server_tokens());
        cmd.extend(extra_server_tokens);
        cmd.extend(self.server_arguments.to_ordered_list());
        cmd
    }

    /// Module access tokens followed by the security manager token, as gated
    /// by the runtime. Topologies that spawn a second JVM reuse these for it.
    pub fn runtime_rule_tokens(&self) -> Vec<String> {
        let context = RuleContext {
            suppress_module_access: self.topology.suppress_module_access,
            security_manager_requested: self.use_security_manager,
        };
        let mut tokens = rules::evaluate(rules::MODULE_ACCESS_RULES, &self.capabilities, &context);
        tokens.extend(rules::evaluate(
            rules::SECURITY_MANAGER_RULES,
            &self.capabilities,
            &context,
        ));
        tokens
    }

    fn derived_server_tokens(&self) -> Vec<String> {
        let mut tokens = Vec::new();
        if let Some(address) = &self.default_bind_address {
            tokens.push(format!("-b={address}"));
        }
        for (interface, address) in &self.interface_bind_addresses {
            tokens.push(format!("-b{interface}={address}"));
        }
        if let Some(debug) = self.debug {
            tokens.push(debug_argument(debug.suspend, debug.port));
        }
        if let Some(file) = &self.server_configuration {
            tokens.push(format!("-c={file}"));
        }
        if self.admin_only {
            tokens.push("--admin-only".to_string());
        }
        tokens
    }

    /// Prefixes `arguments` with the runtime's launcher executable.
    pub fn with_executable(&self, arguments: Vec<String>) -> Vec<String> {
        let mut cmd = Vec::with_capacity(arguments.len() + 1);
        cmd.push(safe_path_str(self.capabilities.executable()));
        cmd.extend(arguments);
        cmd
    }
}

fn is_security_manager_request(option: &str) -> bool {
    let argument = Argument::parse(option);
    argument.is_system_property()
        && argument.key() == SECURITY_MANAGER_PROPERTY
        && argument.value().is_none()
}

/// Surface shared by every topology builder. Topology-specific setters live on
/// the builders themselves.
pub trait JvmCommandBuilder: CommandBuilder {
    fn command(&self) -> &CommandCore;
    fn command_mut(&mut self) -> &mut CommandCore;

    fn capabilities(&self) -> &Arc<RuntimeCapabilities> {
        self.command().capabilities()
    }

    /// Adds a JVM option. System properties are last-write-wins; a bare
    /// `-Djava.security.manager` fails on runtimes without a security manager.
    fn add_java_option(&mut self, option: &str) -> LauncherResult<&mut Self>
    where
        Self: Sized,
    {
        self.command_mut().add_java_option(option)?;
        Ok(self)
    }

    fn add_java_options<I, S>(&mut self, options: I) -> LauncherResult<&mut Self>
    where
        Self: Sized,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for option in options {
            self.command_mut().add_java_option(option.as_ref())?;
        }
        Ok(self)
    }

    /// Replaces every JVM option previously added.
    fn set_java_options<I, S>(&mut self, options: I) -> LauncherResult<&mut Self>
    where
        Self: Sized,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.command_mut().set_java_options(options)?;
        Ok(self)
    }

    fn set_use_security_manager(&mut self, use_security_manager: bool) -> LauncherResult<&mut Self>
    where
        Self: Sized,
    {
        self.command_mut()
            .set_use_security_manager(use_security_manager)?;
        Ok(self)
    }

    fn add_module_option(&mut self, option: &str) -> &mut Self
    where
        Self: Sized,
    {
        self.command_mut().add_module_option(option);
        self
    }

    fn add_module_options<I, S>(&mut self, options: I) -> &mut Self
    where
        Self: Sized,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for option in options {
            self.command_mut().add_module_option(option.as_ref());
        }
        self
    }

    fn add_server_argument(&mut self, argument: &str) -> &mut Self
    where
        Self: Sized,
    {
        self.command_mut().add_server_argument(argument);
        self
    }

    fn add_server_arguments<I, S>(&mut self, arguments: I) -> &mut Self
    where
        Self: Sized,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for argument in arguments {
            self.command_mut().add_server_argument(argument.as_ref());
        }
        self
    }

    fn java_options(&self) -> Vec<String> {
        self.command().java_options()
    }

    fn module_options(&self) -> Vec<String> {
        self.command().module_options()
    }

    fn server_arguments(&self) -> Vec<String> {
        self.command().server_arguments()
    }
}
