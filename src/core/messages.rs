// ─── Diagnostic Messages ───
// Human-readable text for every error the core reports. The active bundle is
// process-wide; callers that ship translations install their own bundle once
// at startup, before the first diagnostic is rendered.

use std::fmt::Display;
use std::path::Path;
use std::sync::OnceLock;

const CODE_PREFIX: &str = "LNCHR";

/// Provider of diagnostic strings. One method per diagnostic so bundles stay
/// exhaustive when new errors are added.
pub trait LauncherMessages: Send + Sync {
    fn installation_not_found(&self, path: &Path) -> String;
    fn unsupported_security_manager(&self, option: &str, major: u32) -> String;
    fn argument_not_found(&self, key: &str) -> String;
    fn invalid_argument(&self, detail: &str) -> String;
    fn launch_failed(&self, program: &str, cause: &dyn Display) -> String;
    fn path_io(&self, path: &Path, cause: &dyn Display) -> String;
    fn path_does_not_exist(&self, path: &Path) -> String;
}

/// Default bundle.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnglishMessages;

fn coded(id: u16, text: String) -> String {
    format!("{CODE_PREFIX}{id:04}: {text}")
}

impl LauncherMessages for EnglishMessages {
    fn installation_not_found(&self, path: &Path) -> String {
        coded(
            1,
            format!(
                "No Java installation found at {} (missing bin/java)",
                path.display()
            ),
        )
    }

    fn unsupported_security_manager(&self, option: &str, major: u32) -> String {
        coded(
            2,
            format!(
                "The security manager ({option}) is not supported on Java runtime version {major}"
            ),
        )
    }

    fn argument_not_found(&self, key: &str) -> String {
        coded(3, format!("No argument registered for key '{key}'"))
    }

    fn invalid_argument(&self, detail: &str) -> String {
        coded(4, format!("Invalid argument: {detail}"))
    }

    fn launch_failed(&self, program: &str, cause: &dyn Display) -> String {
        coded(5, format!("Failed to launch process {program}: {cause}"))
    }

    fn path_io(&self, path: &Path, cause: &dyn Display) -> String {
        coded(6, format!("IO error at {}: {cause}", path.display()))
    }

    fn path_does_not_exist(&self, path: &Path) -> String {
        coded(7, format!("Path '{}' does not exist", path.display()))
    }
}

/// Holds the active bundle. The first bundle stored, installed or defaulted on
/// first render, stays for the lifetime of the slot.
pub struct MessageSlot {
    bundle: OnceLock<Box<dyn LauncherMessages>>,
}

impl MessageSlot {
    pub const fn new() -> Self {
        Self {
            bundle: OnceLock::new(),
        }
    }

    pub fn get(&self) -> &dyn LauncherMessages {
        self.bundle.get_or_init(|| Box::new(EnglishMessages)).as_ref()
    }

    pub fn install(&self, bundle: Box<dyn LauncherMessages>) -> bool {
        self.bundle.set(bundle).is_ok()
    }
}

impl Default for MessageSlot {
    fn default() -> Self {
        Self::new()
    }
}

static ACTIVE: MessageSlot = MessageSlot::new();

/// The bundle used to render diagnostics.
pub fn messages() -> &'static dyn LauncherMessages {
    ACTIVE.get()
}

/// Replace the default bundle. Only the first call wins, and only if no
/// diagnostic has been rendered yet; returns whether the bundle was taken.
pub fn install_messages(bundle: Box<dyn LauncherMessages>) -> bool {
    ACTIVE.install(bundle)
}
