//! Archive extraction for Office installs.
//!
//! Upstream LibreOffice ships RPMs inside tar.gz archives. They are
//! unpacked with the system `tar`, the RPMs are collected from the
//! extracted tree, and desktop-integration sub-packages meant for other
//! distributions are dropped.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use glob::{glob, Pattern};
use tracing::debug;

use super::error::{ManagerError, ManagerResult};
use super::traits::ArchiveExtractor;

/// Sub-packages never installed from the upstream archives.
pub const UNWANTED_PACKAGE_PATTERNS: &[&str] = &[
    "*-kde-integration*",
    "*-gnome-integration*",
    "*-debian-menus*",
    "*-suse-menus*",
    "*-redhat-menus*",
    "*-mandriva-menus*",
];

/// Extractor backed by the system `tar`.
#[derive(Debug, Default)]
pub struct ShellExtractor;

impl ShellExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Run `tar` with `args` on `archive`, returning its stdout.
    fn tar(&self, archive: &Path, args: &[&OsStr]) -> ManagerResult<String> {
        let output = Command::new("tar")
            .args(args)
            .output()
            .map_err(|e| ManagerError::ExtractionFailed {
                path: archive.to_path_buf(),
                reason: format!("cannot run tar: {}", e),
            })?;

        if !output.status.success() {
            return Err(ManagerError::ExtractionFailed {
                path: archive.to_path_buf(),
                reason: format!(
                    "tar exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl ArchiveExtractor for ShellExtractor {
    fn extract(&self, archive_path: &Path, dest_dir: &Path) -> ManagerResult<usize> {
        fs::create_dir_all(dest_dir).map_err(|source| ManagerError::CreateDirFailed {
            path: dest_dir.to_path_buf(),
            source,
        })?;
        self.tar(
            archive_path,
            &[
                OsStr::new("-xzf"),
                archive_path.as_os_str(),
                OsStr::new("-C"),
                dest_dir.as_os_str(),
            ],
        )?;
        let files = count_files(dest_dir)?;
        debug!(archive = %archive_path.display(), files, "Extracted");
        Ok(files)
    }

    fn list_contents(&self, archive_path: &Path) -> ManagerResult<Vec<String>> {
        let listing = self.tar(archive_path, &[OsStr::new("-tzf"), archive_path.as_os_str()])?;
        Ok(listing.lines().map(str::to_string).collect())
    }
}

/// Regular files anywhere below `dir`. A missing `dir` holds none.
fn count_files(dir: &Path) -> ManagerResult<usize> {
    let pattern = dir.join("**").join("*");
    let entries = glob(&pattern.to_string_lossy()).map_err(|e| ManagerError::ReadFailed {
        path: dir.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, e.msg),
    })?;
    Ok(entries.flatten().filter(|p| p.is_file()).count())
}

/// Every `.rpm` below `dir`, sorted.
pub fn find_rpms(dir: &Path) -> ManagerResult<Vec<PathBuf>> {
    let pattern = dir.join("**").join("*.rpm");
    let pattern = pattern.to_string_lossy();
    let paths = glob(&pattern).map_err(|e| ManagerError::ExtractionFailed {
        path: dir.to_path_buf(),
        reason: format!("invalid search pattern: {}", e),
    })?;

    let mut rpms: Vec<PathBuf> = paths.flatten().filter(|p| p.is_file()).collect();
    rpms.sort();
    Ok(rpms)
}

/// Whether an RPM file name is one of the unwanted sub-packages.
pub fn is_unwanted_package(filename: &str) -> bool {
    UNWANTED_PACKAGE_PATTERNS
        .iter()
        .filter_map(|p| Pattern::new(p).ok())
        .any(|p| p.matches(filename))
}

/// Split RPMs into the ones to install and the unwanted ones.
pub fn filter_unwanted(rpms: Vec<PathBuf>) -> (Vec<PathBuf>, Vec<PathBuf>) {
    let (skipped, kept): (Vec<_>, Vec<_>) = rpms.into_iter().partition(|p| {
        p.file_name()
            .map(|n| is_unwanted_package(&n.to_string_lossy()))
            .unwrap_or(false)
    });
    for path in &skipped {
        debug!(path = %path.display(), "Skipping desktop integration package");
    }
    (kept, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_count_files_skips_directories() {
        let temp = TempDir::new().unwrap();
        let rpms = temp.path().join("LibreOffice_7.6.4.1_Linux_x86-64_rpm/RPMS");
        fs::create_dir_all(&rpms).unwrap();
        fs::write(rpms.join("libreoffice7.6-7.6.4.1-1.x86_64.rpm"), "a").unwrap();
        fs::write(rpms.join("libobasis7.6-core-7.6.4.1-1.x86_64.rpm"), "b").unwrap();
        fs::write(temp.path().join("readlicense_oo"), "c").unwrap();

        assert_eq!(count_files(temp.path()).unwrap(), 3);
        assert_eq!(count_files(Path::new("/nonexistent/path")).unwrap(), 0);
    }

    #[test]
    fn test_find_rpms_recurses() {
        let temp = TempDir::new().unwrap();
        let rpms = temp.path().join("LibreOffice_7.5.4.2_Linux_x86-64_rpm/RPMS");
        fs::create_dir_all(&rpms).unwrap();
        fs::write(rpms.join("libreoffice7.5-7.5.4.2-2.x86_64.rpm"), "").unwrap();
        fs::write(rpms.join("libobasis7.5-core-7.5.4.2-2.x86_64.rpm"), "").unwrap();
        fs::write(rpms.join("readme.txt"), "").unwrap();

        let found = find_rpms(temp.path()).unwrap();
        assert_eq!(found.len(), 2);
        assert!(found[0].ends_with("libobasis7.5-core-7.5.4.2-2.x86_64.rpm"));
    }

    #[test]
    fn test_filter_unwanted() {
        let rpms = vec![
            PathBuf::from("/x/libobasis7.5-kde-integration-7.5.4.2-2.x86_64.rpm"),
            PathBuf::from("/x/libreoffice7.5-7.5.4.2-2.x86_64.rpm"),
            PathBuf::from("/x/libreoffice7.5-suse-menus-7.5.4.2-2.noarch.rpm"),
            PathBuf::from("/x/libreoffice7.5-freedesktop-menus-7.5.4.2-2.noarch.rpm"),
        ];
        let (kept, skipped) = filter_unwanted(rpms);
        assert_eq!(kept.len(), 2);
        assert_eq!(skipped.len(), 2);
        assert!(kept
            .iter()
            .any(|p| p.ends_with("libreoffice7.5-freedesktop-menus-7.5.4.2-2.noarch.rpm")));
    }

    #[test]
    fn test_extract_missing_archive_fails() {
        let temp = TempDir::new().unwrap();
        let extractor = ShellExtractor::new();
        let result = extractor.extract(&temp.path().join("missing.tar.gz"), &temp.path().join("out"));
        assert!(matches!(result, Err(ManagerError::ExtractionFailed { .. })));
    }
}
