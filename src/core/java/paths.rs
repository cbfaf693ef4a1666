use std::path::{Path, PathBuf};

pub(crate) fn java_exe() -> &'static str {
    if cfg!(windows) {
        "java.exe"
    } else {
        "java"
    }
}

/// Location of the `java` launcher inside an installation. macOS bundles keep
/// the real home under `Contents/Home`.
pub fn java_binary_in(home: &Path) -> PathBuf {
    let primary = home.join("bin").join(java_exe());
    if primary.exists() {
        return primary;
    }

    let mac_layout = home
        .join("Contents")
        .join("Home")
        .join("bin")
        .join(java_exe());
    if mac_layout.exists() {
        return mac_layout;
    }

    primary
}

/// `JAVA_HOME` when set, otherwise the installation owning the first `java`
/// found on `PATH`.
pub fn default_java_home() -> Option<PathBuf> {
    if let Some(home) = std::env::var_os("JAVA_HOME")
        && !home.is_empty()
    {
        return Some(PathBuf::from(home));
    }

    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(java_exe()))
        .find(|candidate| candidate.is_file())
        .and_then(|java| std::fs::canonicalize(&java).ok())
        .and_then(|java| java.parent()?.parent().map(Path::to_path_buf))
}

/// Absolute, lexically normalized form of `path` for command-line tokens.
pub fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Lossy string form used when a path becomes part of an argument.
pub fn safe_path_str(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn java_binary_defaults_to_bin_layout() {
        let home = Path::new("/nonexistent/jdk");
        assert_eq!(
            java_binary_in(home),
            home.join("bin").join(java_exe())
        );
    }

    #[test]
    fn java_binary_detects_mac_bundle() {
        let home = tempfile::tempdir().unwrap();
        let bin = home.path().join("Contents").join("Home").join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        std::fs::write(bin.join(java_exe()), b"").unwrap();
        assert_eq!(java_binary_in(home.path()), bin.join(java_exe()));
    }

    #[test]
    fn absolute_keeps_absolute_paths() {
        let path = Path::new("/opt/server/standalone.yml");
        assert_eq!(absolute(path), PathBuf::from("/opt/server/standalone.yml"));
    }

    #[test]
    fn absolute_resolves_relative_paths() {
        let resolved = absolute(Path::new("dummy.yml"));
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("dummy.yml"));
    }
}
