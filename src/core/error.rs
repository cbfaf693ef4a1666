use std::path::PathBuf;
use thiserror::Error;

use crate::core::messages::messages;

/// Central error type for the launcher core.
/// Every module returns `Result<T, LauncherError>`.
#[derive(Debug, Error)]
pub enum LauncherError {
    // ── Runtime discovery ───────────────────────────────
    #[error("{}", messages().installation_not_found(.path))]
    InstallationNotFound { path: PathBuf },

    // ── Command building ────────────────────────────────
    #[error("{}", messages().unsupported_security_manager(.option, u32::clone(.major)))]
    UnsupportedOption { option: String, major: u32 },

    #[error("{}", messages().argument_not_found(.0))]
    ArgumentNotFound(String),

    #[error("{}", messages().invalid_argument(.0))]
    InvalidArgument(String),

    // ── Process ─────────────────────────────────────────
    #[error("{}", messages().path_does_not_exist(.path))]
    PathNotFound { path: PathBuf },

    #[error("{}", messages().launch_failed(.program, .source))]
    Launch {
        program: String,
        source: std::io::Error,
    },

    // ── Settings ────────────────────────────────────────
    #[error("{}", messages().path_io(.path, .source))]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type LauncherResult<T> = Result<T, LauncherError>;

impl From<std::io::Error> for LauncherError {
    fn from(source: std::io::Error) -> Self {
        LauncherError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}
