//! Session configuration.
//!
//! `AppConfig` gathers everything a [`Session`](super::Session) needs from
//! the configuration file: the procedure settings, the catalog and the
//! logging directory. Keeping the translation here means the CLI never
//! builds a `ManagerConfig` by hand.

use std::path::PathBuf;

use crate::config::ConfigFile;
use crate::inventory::Catalog;
use crate::manager::ManagerConfig;

/// Configuration of one session.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Procedure settings (directories, download behaviour).
    pub manager: ManagerConfig,

    /// What can be installed and from where.
    pub catalog: Catalog,

    /// Where log files are written.
    pub log_dir: PathBuf,

    /// Run the system update check on every refresh.
    pub check_for_updates: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_config_file(&ConfigFile::default())
    }
}

impl AppConfig {
    /// Create a config from explicit parts. The update check is on.
    pub fn new(manager: ManagerConfig, catalog: Catalog) -> Self {
        Self {
            manager,
            catalog,
            log_dir: ConfigFile::default().paths.log_dir,
            check_for_updates: true,
        }
    }

    /// Create the session config from the loaded configuration file.
    pub fn from_config_file(config: &ConfigFile) -> Self {
        let paths = &config.paths;
        let download = &config.download;
        let manager = ManagerConfig::new(paths.staging_dir.clone())
            .with_kept_packages_dir(paths.kept_packages_dir.clone())
            .with_package_cache_dir(paths.package_cache_dir.clone())
            .with_timeout(download.timeout())
            .with_retries(download.retries, download.retry_delay())
            .with_verify_checksums(download.verify_checksums);

        Self {
            manager,
            catalog: config.repository.clone(),
            log_dir: paths.log_dir.clone(),
            check_for_updates: config.behaviour.check_for_updates,
        }
    }

    /// Enable or disable the system update check.
    pub fn with_check_for_updates(mut self, check: bool) -> Self {
        self.check_for_updates = check;
        self
    }

    /// Set the log directory.
    pub fn with_log_dir(mut self, dir: PathBuf) -> Self {
        self.log_dir = dir;
        self
    }
}
