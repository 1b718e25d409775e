//! Collaborator traits for the install/uninstall procedure.
//!
//! The procedure never talks to the network, archives or the OS package
//! manager directly. Production implementations live next to these traits
//! ([`HttpDownloader`](super::HttpDownloader),
//! [`ShellExtractor`](super::ShellExtractor),
//! [`AptRpmBackend`](super::AptRpmBackend)); tests substitute fakes.

use std::path::{Path, PathBuf};

use super::error::ManagerResult;

/// Byte progress callback: `(bytes_done, bytes_total)`.
pub type ProgressCallback = Box<dyn Fn(u64, u64) + Send + Sync>;

/// Fetches remote files.
pub trait PackageDownloader: Send + Sync {
    /// Size of the remote file in bytes.
    ///
    /// Fails when the resource is unreachable, so callers can stop before
    /// downloading anything.
    fn remote_size(&self, url: &str) -> ManagerResult<u64>;

    /// Download `url` to `dest`, resuming a partial file when possible.
    ///
    /// Returns the size of the complete file.
    fn download(
        &self,
        url: &str,
        dest: &Path,
        on_progress: Option<ProgressCallback>,
    ) -> ManagerResult<u64>;

    /// Fetch a small text resource such as a checksum file.
    fn fetch_text(&self, url: &str) -> ManagerResult<String>;
}

/// Unpacks package archives.
pub trait ArchiveExtractor: Send + Sync {
    /// Extract `archive_path` into `dest_dir`, returning the number of files.
    fn extract(&self, archive_path: &Path, dest_dir: &Path) -> ManagerResult<usize>;

    /// List the entries of an archive without extracting it.
    fn list_contents(&self, archive_path: &Path) -> ManagerResult<Vec<String>>;
}

/// The OS package manager.
///
/// Implementations must simulate every transaction first and refuse to
/// commit when the simulation reports an error or no effective change.
pub trait PackageBackend: Send + Sync {
    /// Names of every installed package.
    fn list_installed(&self) -> ManagerResult<Vec<String>>;

    /// Install package files in one transaction, reporting 0-100 progress.
    fn install_files(&self, files: &[PathBuf], progress: &dyn Fn(u8)) -> ManagerResult<()>;

    /// Remove installed packages by name in one transaction.
    fn remove_packages(&self, names: &[String], progress: &dyn Fn(u8)) -> ManagerResult<()>;
}
