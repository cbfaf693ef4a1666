// ─── Process Launcher ───
// Spawns a built command with an environment overlay and stream redirection.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, info};

use crate::core::error::{LauncherError, LauncherResult};

use super::command::CommandBuilder;
use super::lifecycle::ProcessHandle;

/// Variables applied over the inherited environment. `None` removes the
/// variable instead of setting it empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentOverlay {
    entries: BTreeMap<String, Option<String>>,
}

impl EnvironmentOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: Option<String>) -> &mut Self {
        self.entries.insert(name.into(), value);
        self
    }

    pub fn extend<I, K>(&mut self, variables: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, Option<String>)>,
        K: Into<String>,
    {
        for (name, value) in variables {
            self.entries.insert(name.into(), value);
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&Option<String>> {
        self.entries.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn apply(&self, cmd: &mut Command) {
        for (name, value) in &self.entries {
            match value {
                Some(value) => {
                    cmd.env(name, value);
                }
                None => {
                    cmd.env_remove(name);
                }
            }
        }
    }
}

/// Where a child stream goes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OutputTarget {
    #[default]
    Inherit,
    Pipe,
    Discard,
    File(PathBuf),
}

impl OutputTarget {
    fn stdio(&self) -> LauncherResult<Stdio> {
        Ok(match self {
            OutputTarget::Inherit => Stdio::inherit(),
            OutputTarget::Pipe => Stdio::piped(),
            OutputTarget::Discard => Stdio::null(),
            OutputTarget::File(path) => Stdio::from(create_output_file(path)?),
        })
    }
}

/// Stream setup fixed at spawn time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamRedirection {
    pub output: OutputTarget,
    pub error: OutputTarget,
    /// Send stderr wherever stdout goes; `error` is ignored.
    pub merge_error_into_output: bool,
}

fn create_output_file(path: &Path) -> LauncherResult<File> {
    File::create(path).map_err(|source| LauncherError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Launches the command produced by `builder`.
pub fn launch(
    builder: &dyn CommandBuilder,
    environment: &EnvironmentOverlay,
    redirection: &StreamRedirection,
) -> LauncherResult<ProcessHandle> {
    spawn(builder.build(), environment, redirection, None)
}

fn spawn(
    command: Vec<String>,
    environment: &EnvironmentOverlay,
    redirection: &StreamRedirection,
    directory: Option<&Path>,
) -> LauncherResult<ProcessHandle> {
    let Some((program, args)) = command.split_first() else {
        return Err(LauncherError::InvalidArgument(
            "cannot launch an empty command".into(),
        ));
    };

    let mut cmd = Command::new(program);
    cmd.args(args);
    if let Some(dir) = directory {
        if !dir.is_dir() {
            return Err(LauncherError::PathNotFound {
                path: dir.to_path_buf(),
            });
        }
        cmd.current_dir(dir);
    }
    environment.apply(&mut cmd);
    cmd.stdin(Stdio::null());

    let mut merged_output = None;
    if redirection.merge_error_into_output {
        match &redirection.output {
            OutputTarget::File(path) => {
                let file = create_output_file(path)?;
                let error_file = file.try_clone().map_err(|source| LauncherError::Io {
                    path: path.clone(),
                    source,
                })?;
                cmd.stdout(file).stderr(error_file);
            }
            OutputTarget::Pipe => {
                let (reader, writer) = std::io::pipe()?;
                let error_writer = writer.try_clone()?;
                cmd.stdout(writer).stderr(error_writer);
                merged_output = Some(reader);
            }
            OutputTarget::Inherit => {
                cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
            }
            OutputTarget::Discard => {
                cmd.stdout(Stdio::null()).stderr(Stdio::null());
            }
        }
    } else {
        cmd.stdout(redirection.output.stdio()?);
        cmd.stderr(redirection.error.stdio()?);
    }

    info!("Launching {}", program);
    debug!("Command (copy/paste): {}", format_command_for_logs(&cmd));

    let child = cmd.spawn().map_err(|source| LauncherError::Launch {
        program: program.clone(),
        source,
    })?;
    // The parent's copies of the pipe writer must close so readers see EOF.
    drop(cmd);

    debug!("Spawned process {}", child.id());
    Ok(ProcessHandle::running(child, merged_output))
}

/// Fluent launch configuration around a command builder.
pub struct Launcher<'a> {
    builder: &'a dyn CommandBuilder,
    environment: EnvironmentOverlay,
    redirection: StreamRedirection,
    directory: Option<PathBuf>,
}

impl<'a> Launcher<'a> {
    pub fn of(builder: &'a dyn CommandBuilder) -> Self {
        Self {
            builder,
            environment: EnvironmentOverlay::new(),
            redirection: StreamRedirection::default(),
            directory: None,
        }
    }

    /// `None` removes the variable from the inherited environment.
    pub fn add_environment_variable(mut self, name: &str, value: Option<&str>) -> Self {
        self.environment.set(name, value.map(str::to_string));
        self
    }

    pub fn add_environment_variables<I, K, V>(mut self, variables: I) -> Self
    where
        I: IntoIterator<Item = (K, Option<V>)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.environment.extend(
            variables
                .into_iter()
                .map(|(name, value)| (name, value.map(Into::into))),
        );
        self
    }

    pub fn set_redirect_error_stream(mut self, merge: bool) -> Self {
        self.redirection.merge_error_into_output = merge;
        self
    }

    pub fn redirect_output(mut self, file: impl Into<PathBuf>) -> Self {
        self.redirection.output = OutputTarget::File(file.into());
        self
    }

    pub fn redirect_error(mut self, file: impl Into<PathBuf>) -> Self {
        self.redirection.error = OutputTarget::File(file.into());
        self
    }

    pub fn pipe_output(mut self) -> Self {
        self.redirection.output = OutputTarget::Pipe;
        self
    }

    pub fn discard_output(mut self) -> Self {
        self.redirection.output = OutputTarget::Discard;
        self
    }

    pub fn set_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.directory = Some(dir.into());
        self
    }

    pub fn environment(&self) -> &EnvironmentOverlay {
        &self.environment
    }

    pub fn redirection(&self) -> &StreamRedirection {
        &self.redirection
    }

    pub fn launch(&self) -> LauncherResult<ProcessHandle> {
        spawn(
            self.builder.build(),
            &self.environment,
            &self.redirection,
            self.directory.as_deref(),
        )
    }
}

/// Arguments whose value never reaches the logs.
const MASKED_ARGUMENTS: [&str; 1] = ["--password"];

fn format_command_for_logs(cmd: &Command) -> String {
    let program = shell_escape(&cmd.get_program().to_string_lossy());
    let args = cmd
        .get_args()
        .map(|arg| shell_escape(&mask_secret(&arg.to_string_lossy())))
        .collect::<Vec<_>>()
        .join(" ");

    if args.is_empty() {
        program
    } else {
        format!("{} {}", program, args)
    }
}

fn mask_secret(arg: &str) -> String {
    match arg.split_once('=') {
        Some((key, _)) if MASKED_ARGUMENTS.contains(&key) => format!("{key}=****"),
        _ => arg.to_string(),
    }
}

fn shell_escape(raw: &str) -> String {
    if raw.is_empty() {
        return "\"\"".to_string();
    }

    if raw.chars().all(|ch| {
        ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '/' | ':' | '\\' | '=' | ',')
    }) {
        return raw.to_string();
    }

    format!("\"{}\"", raw.replace('"', "\\\""))
}
