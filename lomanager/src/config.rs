//! Configuration file.
//!
//! lomanager reads an INI file with four sections. Every key is optional;
//! a missing file gives the defaults.
//!
//! ```ini
//! [paths]
//! staging_dir = /tmp/lomanager-staging
//! kept_packages_dir = /root/lomanager-packages
//! package_cache_dir = /var/cache/apt/archives
//! log_dir = /var/log/lomanager
//!
//! [download]
//! timeout_secs = 60
//! retries = 3
//! retry_delay_secs = 5
//! verify_checksums = true
//!
//! [repository]
//! latest_libreoffice = 7.6.4.1
//! languages = fr, de, pt-BR
//!
//! [behaviour]
//! check_for_updates = true
//! ```
//!
//! The user file (`$XDG_CONFIG_HOME/lomanager/config.ini`) wins over the
//! system file (`/etc/lomanager/config.ini`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use thiserror::Error;
use tracing::debug;

use crate::inventory::Catalog;

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/lomanager/config.ini";

/// Errors raised while loading the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The file exists but could not be read or parsed.
    #[error("failed to read {}: {message}", .path.display())]
    Read { path: PathBuf, message: String },

    /// The INI text is malformed.
    #[error("invalid configuration: {0}")]
    Parse(String),

    /// A key holds a value of the wrong type.
    #[error("invalid value for [{section}] {key}: '{value}'")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
    },
}

/// `[paths]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathsSettings {
    pub staging_dir: PathBuf,
    pub kept_packages_dir: PathBuf,
    pub package_cache_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl Default for PathsSettings {
    fn default() -> Self {
        Self {
            staging_dir: std::env::temp_dir().join("lomanager-staging"),
            kept_packages_dir: dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("/root"))
                .join("lomanager-packages"),
            package_cache_dir: PathBuf::from("/var/cache/apt/archives"),
            log_dir: default_log_dir(),
        }
    }
}

/// `[download]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSettings {
    pub timeout_secs: u64,
    pub retries: u32,
    pub retry_delay_secs: u64,
    pub verify_checksums: bool,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            retries: 3,
            retry_delay_secs: 5,
            verify_checksums: true,
        }
    }
}

impl DownloadSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

/// `[behaviour]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BehaviourSettings {
    /// Run the system update check when probing the policy.
    pub check_for_updates: bool,
}

impl Default for BehaviourSettings {
    fn default() -> Self {
        Self {
            check_for_updates: true,
        }
    }
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub paths: PathsSettings,
    pub download: DownloadSettings,
    /// `[repository]`, folded straight into the catalog.
    pub repository: Catalog,
    pub behaviour: BehaviourSettings,
}

impl ConfigFile {
    /// Load the user file, else the system file, else the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let user = config_file_path();
        if user.exists() {
            return Self::load_from(&user);
        }
        let system = Path::new(SYSTEM_CONFIG_PATH);
        if system.exists() {
            return Self::load_from(system);
        }
        debug!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Load a specific file. A missing file is an error here.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        debug!(path = %path.display(), "Loading configuration");
        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    /// Parse INI text.
    pub fn load_from_str(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let reader = Reader { ini };

        let paths = &mut config.paths;
        reader.path("paths", "staging_dir", &mut paths.staging_dir);
        reader.path("paths", "kept_packages_dir", &mut paths.kept_packages_dir);
        reader.path("paths", "package_cache_dir", &mut paths.package_cache_dir);
        reader.path("paths", "log_dir", &mut paths.log_dir);

        let download = &mut config.download;
        reader.parsed("download", "timeout_secs", &mut download.timeout_secs)?;
        reader.parsed("download", "retries", &mut download.retries)?;
        reader.parsed("download", "retry_delay_secs", &mut download.retry_delay_secs)?;
        reader.boolean("download", "verify_checksums", &mut download.verify_checksums)?;

        let repo = &mut config.repository;
        reader.string("repository", "libreoffice_base_url", &mut repo.libreoffice_base_url);
        reader.string("repository", "repo_base_url", &mut repo.repo_base_url);
        reader.string("repository", "latest_libreoffice", &mut repo.latest_libreoffice);
        reader.string("repository", "latest_clipart", &mut repo.latest_clipart);
        reader.string("repository", "latest_java", &mut repo.latest_java);
        reader.string("repository", "java_package", &mut repo.java_package);
        reader.string("repository", "clipart_package", &mut repo.clipart_package);
        reader.list("repository", "languages", &mut repo.languages);
        reader.list("repository", "helppack_languages", &mut repo.helppack_languages);
        if let Some(value) = reader.get("repository", "latest_client_version") {
            repo.latest_client_version = Some(value.to_string());
        }

        reader.boolean(
            "behaviour",
            "check_for_updates",
            &mut config.behaviour.check_for_updates,
        )?;

        Ok(config)
    }
}

struct Reader<'a> {
    ini: &'a Ini,
}

impl Reader<'_> {
    fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.ini
            .get_from(Some(section), key)
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    fn string(&self, section: &str, key: &str, target: &mut String) {
        if let Some(value) = self.get(section, key) {
            *target = value.to_string();
        }
    }

    fn path(&self, section: &str, key: &str, target: &mut PathBuf) {
        if let Some(value) = self.get(section, key) {
            *target = expand_tilde(value);
        }
    }

    fn list(&self, section: &str, key: &str, target: &mut Vec<String>) {
        if let Some(value) = self.get(section, key) {
            *target = value
                .split([',', ' '])
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
    }

    fn parsed<T: std::str::FromStr>(
        &self,
        section: &str,
        key: &str,
        target: &mut T,
    ) -> Result<(), ConfigError> {
        if let Some(value) = self.get(section, key) {
            *target = value
                .parse()
                .map_err(|_| invalid(section, key, value))?;
        }
        Ok(())
    }

    fn boolean(&self, section: &str, key: &str, target: &mut bool) -> Result<(), ConfigError> {
        if let Some(value) = self.get(section, key) {
            *target = match value.to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => true,
                "false" | "no" | "off" | "0" => false,
                _ => return Err(invalid(section, key, value)),
            };
        }
        Ok(())
    }
}

fn invalid(section: &str, key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn expand_tilde(value: &str) -> PathBuf {
    match (value.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(value),
    }
}

fn default_log_dir() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::cache_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join("lomanager")
}

/// Path of the per-user configuration file.
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("/etc"))
        .join("lomanager")
        .join("config.ini")
}

/// Format a size in bytes as a human-readable string.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
