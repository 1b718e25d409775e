//! Configuration for the install/uninstall procedure.

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the install/uninstall procedure.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Directory for downloads, verified files and extracted archives.
    ///
    /// Wiped at the end of every procedure.
    pub staging_dir: PathBuf,

    /// Where downloaded packages are kept when requested, in the
    /// local-copy layout so they can be reused for a local-copy install.
    pub kept_packages_dir: PathBuf,

    /// OS package cache the Java RPMs are moved into before installing.
    pub package_cache_dir: PathBuf,

    /// Root of the filesystem the post-install fix-ups operate on.
    pub fixup_root: PathBuf,

    /// Run desktop database and icon cache refresh tools after installing.
    pub refresh_desktop_caches: bool,

    /// HTTP request timeout.
    pub timeout: Duration,

    /// Download attempts after the first one fails.
    pub retries: u32,

    /// Fixed delay between download attempts.
    pub retry_delay: Duration,

    /// Whether to verify checksums after download.
    pub verify_checksums: bool,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            staging_dir: std::env::temp_dir().join("lomanager-staging"),
            kept_packages_dir: PathBuf::from("/root/lomanager-packages"),
            package_cache_dir: PathBuf::from("/var/cache/apt/archives"),
            fixup_root: PathBuf::from("/"),
            refresh_desktop_caches: true,
            timeout: Duration::from_secs(60),
            retries: 3,
            retry_delay: Duration::from_secs(5),
            verify_checksums: true,
        }
    }
}

impl ManagerConfig {
    /// Create a new configuration with the given staging directory.
    pub fn new(staging_dir: PathBuf) -> Self {
        Self {
            staging_dir,
            ..Default::default()
        }
    }

    /// Set the kept packages directory.
    pub fn with_kept_packages_dir(mut self, path: PathBuf) -> Self {
        self.kept_packages_dir = path;
        self
    }

    /// Set the OS package cache directory.
    pub fn with_package_cache_dir(mut self, path: PathBuf) -> Self {
        self.package_cache_dir = path;
        self
    }

    /// Set the filesystem root used by the post-install fix-ups.
    pub fn with_fixup_root(mut self, path: PathBuf) -> Self {
        self.fixup_root = path;
        self
    }

    /// Enable or disable desktop cache refreshes.
    pub fn with_refresh_desktop_caches(mut self, refresh: bool) -> Self {
        self.refresh_desktop_caches = refresh;
        self
    }

    /// Set the HTTP timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry budget and the delay between attempts.
    pub fn with_retries(mut self, retries: u32, delay: Duration) -> Self {
        self.retries = retries;
        self.retry_delay = delay;
        self
    }

    /// Enable or disable checksum verification.
    pub fn with_verify_checksums(mut self, verify: bool) -> Self {
        self.verify_checksums = verify;
        self
    }

    /// Downloads land here before verification.
    pub fn download_dir(&self) -> PathBuf {
        self.staging_dir.join("downloads")
    }

    /// Verified files, keyed by family and kind below this directory.
    pub fn verified_dir(&self) -> PathBuf {
        self.staging_dir.join("verified")
    }

    /// Archives are unpacked below this directory.
    pub fn extract_dir(&self) -> PathBuf {
        self.staging_dir.join("extracted")
    }
}
