// ─── Module Launcher ───
// Layout of a module-launcher based server home and the generic builder that
// boots an arbitrary module through it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::java::RuntimeCapabilities;
use crate::core::java::paths::{absolute, safe_path_str};

use super::command::{CommandBuilder, CommandCore, JvmCommandBuilder, Topology};

pub const MODULES_JAR_NAME: &str = "jboss-modules.jar";

const MODULES_TOPOLOGY: Topology = Topology {
    name: "modules",
    process_tag: None,
    module_agent: true,
    suppress_module_access: false,
};

fn module_path_separator() -> &'static str {
    if cfg!(target_os = "windows") {
        ";"
    } else {
        ":"
    }
}

/// The server home plus the module roots handed to the module launcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleLayout {
    home: PathBuf,
    module_dirs: Vec<PathBuf>,
    use_default_module_dir: bool,
}

impl ModuleLayout {
    pub fn new(home: impl AsRef<Path>) -> Self {
        Self {
            home: absolute(home.as_ref()),
            module_dirs: Vec::new(),
            use_default_module_dir: true,
        }
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn modules_jar(&self) -> PathBuf {
        self.home.join(MODULES_JAR_NAME)
    }

    /// Adds a module root searched after the ones already registered.
    pub fn add_module_dir(&mut self, dir: impl AsRef<Path>) {
        self.module_dirs.push(absolute(dir.as_ref()));
    }

    /// Replaces every user-provided module root.
    pub fn set_module_dirs<I, P>(&mut self, dirs: I)
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.module_dirs = dirs.into_iter().map(|dir| absolute(dir.as_ref())).collect();
    }

    /// Whether `<home>/modules` is appended to the module path.
    pub fn set_use_default_module_dir(&mut self, use_default: bool) {
        self.use_default_module_dir = use_default;
    }

    pub fn module_path(&self) -> String {
        let mut dirs: Vec<String> = self.module_dirs.iter().map(|dir| safe_path_str(dir)).collect();
        if self.use_default_module_dir {
            dirs.push(safe_path_str(&self.home.join("modules")));
        }
        dirs.join(module_path_separator())
    }

    /// `-jar <modules jar> -mp <module path> <module>`.
    pub fn invocation(&self, module_name: &str) -> Vec<String> {
        vec![
            "-jar".to_string(),
            safe_path_str(&self.modules_jar()),
            "-mp".to_string(),
            self.module_path(),
            module_name.to_string(),
        ]
    }
}

/// Boots any module through the module launcher.
#[derive(Debug, Clone)]
pub struct ModulesCommandBuilder {
    core: CommandCore,
    layout: ModuleLayout,
    module_name: String,
}

impl ModulesCommandBuilder {
    /// Uses the runtime selected by `JAVA_HOME`.
    pub fn of(home: impl AsRef<Path>, module_name: &str) -> LauncherResult<Self> {
        Self::with_runtime(home, module_name, RuntimeCapabilities::current()?)
    }

    pub fn with_runtime(
        home: impl AsRef<Path>,
        module_name: &str,
        capabilities: Arc<RuntimeCapabilities>,
    ) -> LauncherResult<Self> {
        let module_name = module_name.trim();
        if module_name.is_empty() {
            return Err(LauncherError::InvalidArgument(
                "module name must not be empty".into(),
            ));
        }
        Ok(Self {
            core: CommandCore::new(capabilities, MODULES_TOPOLOGY),
            layout: ModuleLayout::new(home),
            module_name: module_name.to_string(),
        })
    }

    pub fn layout(&self) -> &ModuleLayout {
        &self.layout
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
}

impl CommandBuilder for ModulesCommandBuilder {
    fn build_arguments(&self) -> Vec<String> {
        self.core.flatten(
            Some(&self.layout.modules_jar()),
            self.layout.invocation(&self.module_name),
            Vec::new(),
        )
    }

    fn build(&self) -> Vec<String> {
        self.core.with_executable(self.build_arguments())
    }
}

impl JvmCommandBuilder for ModulesCommandBuilder {
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

    fn builder(version: &str) -> ModulesCommandBuilder {
        ModulesCommandBuilder::with_runtime(
            "/opt/server",
            "org.jboss.as.launcher.test",
            Arc::new(RuntimeCapabilities::new("/opt/jdk", version)),
        )
        .unwrap()
    }

    #[test]
    fn generic_module_invocation() {
        let mut builder = builder("17.0.2");
        builder
            .add_java_option("-Djava.net.preferIPv4Stack=true")
            .unwrap()
            .add_java_option("-Djava.net.preferIPv4Stack=false")
            .unwrap()
            .add_module_option("-javaagent:test-agent1.jar")
            .add_server_argument("--server=test");
        builder.add_java_option("-Djava.security.manager").unwrap();

        let cmd = builder.build_arguments();
        assert!(cmd.iter().any(|arg| arg.starts_with("-javaagent:") && arg.ends_with(MODULES_JAR_NAME)));
        assert!(cmd.contains(&"-javaagent:test-agent1.jar".to_string()));
        assert!(cmd.contains(&"--server=test".to_string()));
        assert!(cmd.contains(&"org.jboss.as.launcher.test".to_string()));
        assert_eq!(
            cmd.iter().filter(|arg| *arg == "-Djava.security.manager=allow").count(),
            1
        );
        assert_eq!(
            builder.java_options(),
            vec!["-Djava.net.preferIPv4Stack=false"]
        );
    }

    #[test]
    fn module_path_joins_user_dirs_before_default() {
        let mut builder = builder("21");
        builder.add_module_dir("/extra/modules");
        let expected = format!(
            "/extra/modules{}/opt/server/modules",
            module_path_separator()
        );
        assert_eq!(builder.layout().module_path(), expected);

        builder.set_module_dirs(["/other"]);
        assert!(builder.layout().module_path().starts_with("/other"));
        assert!(!builder.layout().module_path().contains("/extra/modules"));
    }

    #[test]
    fn empty_module_name_is_rejected() {
        let result = ModulesCommandBuilder::with_runtime(
            "/opt/server",
            "  ",
            Arc::new(RuntimeCapabilities::new("/opt/jdk", "17")),
        );
        assert!(matches!(result, Err(LauncherError::InvalidArgument(_))));
    }
}
