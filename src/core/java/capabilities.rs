use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use serde::Serialize;
use tracing::{debug, instrument};

use crate::core::error::{LauncherError, LauncherResult};

use super::paths;

const RELEASE_FILE: &str = "release";
const RELEASE_VERSION_KEYS: [&str; 2] = ["JAVA_VERSION", "VERSION"];

/// First feature release shipping the module system.
const MODULAR_SINCE: u32 = 9;
/// First release accepting `-Djava.security.manager=allow`.
const ENHANCED_SECURITY_MANAGER_SINCE: u32 = 12;
/// The security manager can no longer be enabled from this release on.
const SECURITY_MANAGER_REMOVED_IN: u32 = 24;

/// Immutable facts about a Java installation, derived once from its release
/// descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuntimeCapabilities {
    home: PathBuf,
    executable: PathBuf,
    version: String,
    major_version: u32,
    is_modular: bool,
    supports_security_manager: bool,
    supports_enhanced_security_manager: bool,
}

impl RuntimeCapabilities {
    /// Derive the capabilities from a version string. Only the launcher
    /// location is looked up on disk; the version is taken as given and the
    /// result is not cached.
    pub fn new(home: impl Into<PathBuf>, version: &str) -> Self {
        let home = home.into();
        let executable = paths::java_binary_in(&home);
        let major_version = parse_major_version(version);
        let known = major_version > 0;

        Self {
            home,
            executable,
            version: version.trim().to_string(),
            major_version,
            is_modular: major_version >= MODULAR_SINCE,
            supports_security_manager: known && major_version < SECURITY_MANAGER_REMOVED_IN,
            supports_enhanced_security_manager: major_version >= ENHANCED_SECURITY_MANAGER_SINCE
                && major_version < SECURITY_MANAGER_REMOVED_IN,
        }
    }

    /// Capabilities of the installation rooted at `home`. Resolved once per
    /// canonical path for the lifetime of the process.
    pub fn discover(home: impl AsRef<Path>) -> LauncherResult<Arc<Self>> {
        let home = home.as_ref();
        if !paths::java_binary_in(home).is_file() {
            return Err(LauncherError::InstallationNotFound {
                path: home.to_path_buf(),
            });
        }
        let resolved = std::fs::canonicalize(home).map_err(|source| LauncherError::Io {
            path: home.to_path_buf(),
            source,
        })?;

        if let Some(cached) = lock_cache().get(&resolved) {
            return Ok(Arc::clone(cached));
        }

        // Inspected outside the lock; a concurrent first caller may probe too,
        // but the first insert is what every caller gets back.
        let inspected = Arc::new(inspect(&resolved));
        let mut cache = lock_cache();
        Ok(Arc::clone(cache.entry(resolved).or_insert(inspected)))
    }

    /// Capabilities of the runtime selected by `JAVA_HOME`, falling back to the
    /// first `java` on `PATH`.
    pub fn current() -> LauncherResult<Arc<Self>> {
        let home = paths::default_java_home().ok_or_else(|| LauncherError::InstallationNotFound {
            path: PathBuf::from("JAVA_HOME"),
        })?;
        Self::discover(home)
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    /// The `java` launcher of this installation.
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn major_version(&self) -> u32 {
        self.major_version
    }

    pub fn is_modular(&self) -> bool {
        self.is_modular
    }

    pub fn supports_security_manager(&self) -> bool {
        self.supports_security_manager
    }

    pub fn supports_enhanced_security_manager(&self) -> bool {
        self.supports_enhanced_security_manager
    }
}

fn capability_cache() -> &'static Mutex<HashMap<PathBuf, Arc<RuntimeCapabilities>>> {
    static CACHE: OnceLock<Mutex<HashMap<PathBuf, Arc<RuntimeCapabilities>>>> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

fn lock_cache() -> MutexGuard<'static, HashMap<PathBuf, Arc<RuntimeCapabilities>>> {
    capability_cache()
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[instrument]
fn inspect(home: &Path) -> RuntimeCapabilities {
    let version = match read_release_version(home) {
        Some(version) => version,
        None => probe::probe_version(&paths::java_binary_in(home)).unwrap_or_default(),
    };
    let capabilities = RuntimeCapabilities::new(home, &version);
    debug!(
        "Runtime {:?}: version={:?} major={} modular={} secmgr={} enhanced_secmgr={}",
        home,
        capabilities.version,
        capabilities.major_version,
        capabilities.is_modular,
        capabilities.supports_security_manager,
        capabilities.supports_enhanced_security_manager
    );
    capabilities
}

/// Reads the version line of `<home>/release`. `None` when the file is absent
/// or carries no version key.
fn read_release_version(home: &Path) -> Option<String> {
    let content = std::fs::read_to_string(home.join(RELEASE_FILE)).ok()?;
    parse_release_version(&content)
}

fn parse_release_version(content: &str) -> Option<String> {
    let entries: HashMap<&str, &str> = content
        .lines()
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim(), value.trim()))
        .collect();

    RELEASE_VERSION_KEYS.iter().find_map(|key| {
        entries
            .get(key)
            .map(|value| value.trim_matches('"').to_string())
    })
}

/// `1.x` versions are the pre-modular line and always resolve to 8; anything
/// else is the leading integer. Unparseable input yields 0.
fn parse_major_version(version: &str) -> u32 {
    let version = version.trim();
    if version.starts_with("1.") {
        return 8;
    }
    let leading: String = version.chars().take_while(|c| c.is_ascii_digit()).collect();
    leading.parse().unwrap_or(0)
}

mod probe {
    use super::*;

    /// Runs `java -version` and returns the first quoted version string.
    #[instrument]
    pub fn probe_version(path: &Path) -> Option<String> {
        let output = Command::new(path)
            .args(["-XshowSettings:properties", "-version"])
            .output()
            .ok()?;

        let version_output = format!(
            "{}\n{}",
            String::from_utf8_lossy(&output.stderr),
            String::from_utf8_lossy(&output.stdout)
        );
        debug!(
            "Probing {:?}: {}",
            path,
            version_output.lines().next().unwrap_or("")
        );
        parse_version_string(&version_output)
    }

    pub(super) fn parse_version_string(output: &str) -> Option<String> {
        for line in output.lines() {
            if let Some(start) = line.find('"')
                && let Some(end) = line[start + 1..].find('"')
            {
                return Some(line[start + 1..start + 1 + end].to_string());
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_java_home(version: Option<&str>) -> tempfile::TempDir {
        let home = tempfile::tempdir().expect("temp java home");
        let bin = home.path().join("bin");
        std::fs::create_dir_all(&bin).expect("bin dir");
        std::fs::write(bin.join(paths::java_exe()), b"").expect("java binary");
        if let Some(version) = version {
            std::fs::write(
                home.path().join(RELEASE_FILE),
                format!("IMPLEMENTOR=\"Test\"\nJAVA_VERSION=\"{version}\"\n"),
            )
            .expect("release file");
        }
        home
    }

    #[test]
    fn test_parse_major_modern() {
        assert_eq!(parse_major_version("17.0.8"), 17);
        assert_eq!(parse_major_version("21.0.5"), 21);
        assert_eq!(parse_major_version("24"), 24);
        assert_eq!(parse_major_version("9-ea"), 9);
    }

    #[test]
    fn test_parse_major_legacy() {
        assert_eq!(parse_major_version("1.8.0_432"), 8);
        assert_eq!(parse_major_version("1.7.0"), 8);
    }

    #[test]
    fn test_parse_major_garbage() {
        assert_eq!(parse_major_version(""), 0);
        assert_eq!(parse_major_version("openjdk"), 0);
    }

    #[test]
    fn legacy_versions_are_not_modular() {
        let caps = RuntimeCapabilities::new("/opt/jdk8", "1.8.0_432");
        assert_eq!(caps.major_version(), 8);
        assert!(!caps.is_modular());
        assert!(caps.supports_security_manager());
        assert!(!caps.supports_enhanced_security_manager());
    }

    #[test]
    fn capability_tiers_follow_major_version() {
        for major in 1..=30u32 {
            let caps = RuntimeCapabilities::new("/opt/jdk", &format!("{major}.0.1"));
            assert_eq!(caps.is_modular(), major >= 9, "modular {major}");
            assert_eq!(caps.supports_security_manager(), major < 24, "secmgr {major}");
            assert_eq!(
                caps.supports_enhanced_security_manager(),
                (12..24).contains(&major),
                "enhanced {major}"
            );
        }
    }

    #[test]
    fn unknown_version_disables_everything() {
        let caps = RuntimeCapabilities::new("/opt/jdk", "");
        assert_eq!(caps.major_version(), 0);
        assert!(!caps.is_modular());
        assert!(!caps.supports_security_manager());
        assert!(!caps.supports_enhanced_security_manager());
    }

    #[test]
    fn release_file_keys() {
        assert_eq!(
            parse_release_version("JAVA_VERSION=\"21.0.5\"\nOS_NAME=\"Linux\""),
            Some("21.0.5".into())
        );
        assert_eq!(
            parse_release_version("VERSION=\"17.0.2\""),
            Some("17.0.2".into())
        );
        assert_eq!(parse_release_version("OS_NAME=\"Linux\""), None);
    }

    #[test]
    fn version_string_from_probe_output() {
        let output = "openjdk version \"21.0.5\" 2024-10-15\nOpenJDK Runtime Environment";
        assert_eq!(probe::parse_version_string(output), Some("21.0.5".into()));
    }

    #[test]
    fn discover_reads_release_descriptor() {
        let cases = [
            ("", false),
            ("9", true),
            ("9.0.1", true),
            ("10.0.2", true),
            ("11.0.1", true),
            ("21.0.5", true),
            ("23.0.3", true),
            ("24", false),
            ("25.0.1", false),
        ];
        for (version, expected) in cases {
            let home = fake_java_home(Some(version));
            let caps = RuntimeCapabilities::discover(home.path()).expect("discover");
            assert_eq!(
                caps.supports_security_manager(),
                expected,
                "version {version:?}"
            );
        }
    }

    #[test]
    fn new_resolves_launcher_on_disk_but_not_the_version() {
        let home = tempfile::tempdir().expect("temp home");
        let bin = home.path().join("Contents").join("Home").join("bin");
        std::fs::create_dir_all(&bin).expect("bundle bin");
        std::fs::write(bin.join(paths::java_exe()), b"").expect("java binary");
        std::fs::write(home.path().join(RELEASE_FILE), "JAVA_VERSION=\"25\"\n").unwrap();

        let caps = RuntimeCapabilities::new(home.path(), "17.0.2");
        assert_eq!(caps.executable(), bin.join(paths::java_exe()));
        assert_eq!(caps.major_version(), 17);
    }

    #[test]
    fn concurrent_discovery_shares_one_entry() {
        let home = fake_java_home(Some("21.0.5"));
        let path = home.path().to_path_buf();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let path = path.clone();
                std::thread::spawn(move || RuntimeCapabilities::discover(path).expect("discover"))
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for caps in &results[1..] {
            assert!(Arc::ptr_eq(&results[0], caps));
        }
        assert_eq!(results[0].major_version(), 21);
    }

    #[cfg(unix)]
    #[test]
    fn slow_version_check_does_not_block_other_installations() {
        use std::os::unix::fs::PermissionsExt;
        use std::time::{Duration, Instant};

        let slow = tempfile::tempdir().expect("slow home");
        let bin = slow.path().join("bin");
        std::fs::create_dir_all(&bin).expect("bin dir");
        let java = bin.join(paths::java_exe());
        std::fs::write(
            &java,
            "#!/bin/sh\nsleep 2\necho 'openjdk version \"17.0.2\"' 1>&2\n",
        )
        .expect("version script");
        std::fs::set_permissions(&java, std::fs::Permissions::from_mode(0o755)).unwrap();

        let slow_path = slow.path().to_path_buf();
        let checker = std::thread::spawn(move || RuntimeCapabilities::discover(slow_path));
        std::thread::sleep(Duration::from_millis(200));

        let fast = fake_java_home(Some("21.0.5"));
        let started = Instant::now();
        let caps = RuntimeCapabilities::discover(fast.path()).expect("fast discover");
        assert!(started.elapsed() < Duration::from_millis(1500));
        assert_eq!(caps.major_version(), 21);

        let checked = checker.join().unwrap().expect("slow discover");
        assert_eq!(checked.major_version(), 17);
    }

    #[test]
    fn discover_rejects_missing_launcher() {
        let home = tempfile::tempdir().expect("temp dir");
        let err = RuntimeCapabilities::discover(home.path()).unwrap_err();
        assert!(matches!(err, LauncherError::InstallationNotFound { .. }));
    }

    #[test]
    fn discover_caches_per_path() {
        let home = fake_java_home(Some("17.0.2"));
        let first = RuntimeCapabilities::discover(home.path()).expect("first");

        // The installation is assumed immutable; a rewritten descriptor is not re-read.
        std::fs::write(home.path().join(RELEASE_FILE), "JAVA_VERSION=\"25\"\n").unwrap();
        let second = RuntimeCapabilities::discover(home.path()).expect("second");

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.major_version(), 17);
    }
}
