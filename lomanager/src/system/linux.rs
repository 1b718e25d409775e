//! Production [`SystemInspector`] for RPM-based distributions.

use std::collections::HashMap;
use std::ffi::CString;
use std::fs;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, warn};

use super::rpm::{
    detect_clipart, detect_java, parse_dist_upgrade_summary, parse_installed_office,
    parse_rpm_query, RpmEntry, RPM_QUERY_FORMAT,
};
use super::{SystemInspector, UpdateStatus};
use crate::package::InstalledOffice;

/// Inspector backed by `rpm`, `apt-get`, `/proc` and libc.
#[derive(Debug, Clone)]
pub struct LinuxInspector {
    proc_root: PathBuf,
}

impl Default for LinuxInspector {
    fn default() -> Self {
        Self::new()
    }
}

impl LinuxInspector {
    /// Create an inspector reading the live `/proc`.
    pub fn new() -> Self {
        Self {
            proc_root: PathBuf::from("/proc"),
        }
    }

    /// Read processes from another proc root (used by tests).
    pub fn with_proc_root(mut self, proc_root: impl Into<PathBuf>) -> Self {
        self.proc_root = proc_root.into();
        self
    }

    fn query_rpm(&self) -> Vec<RpmEntry> {
        let output = Command::new("rpm")
            .args(["-qa", "--qf", RPM_QUERY_FORMAT])
            .output();

        match output {
            Ok(out) if out.status.success() => {
                parse_rpm_query(&String::from_utf8_lossy(&out.stdout))
            }
            Ok(out) => {
                warn!(
                    status = %out.status,
                    stderr = %String::from_utf8_lossy(&out.stderr).trim(),
                    "rpm query failed"
                );
                Vec::new()
            }
            Err(e) => {
                warn!(error = %e, "Failed to run rpm");
                Vec::new()
            }
        }
    }
}

/// Nearest existing ancestor of `path` (statvfs needs an existing path).
fn existing_ancestor(path: &Path) -> &Path {
    let mut current = path;
    while !current.exists() {
        match current.parent() {
            Some(parent) => current = parent,
            None => break,
        }
    }
    current
}

impl SystemInspector for LinuxInspector {
    fn detect_installed_java(&self) -> Option<String> {
        detect_java(&self.query_rpm())
    }

    fn detect_installed_office(&self) -> Vec<InstalledOffice> {
        parse_installed_office(&self.query_rpm())
    }

    fn detect_installed_clipart(&self) -> Option<String> {
        detect_clipart(&self.query_rpm())
    }

    fn free_space(&self, path: &Path) -> io::Result<u64> {
        let target = existing_ancestor(path);
        let c_path = CString::new(target.as_os_str().as_bytes())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        // SAFETY: `c_path` is a valid NUL-terminated string and `stat` is a
        // properly sized, writable statvfs struct.
        let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
        let rc = unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) };
        if rc != 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(stat.f_bavail as u64 * stat.f_frsize as u64)
    }

    fn running_processes(&self, names: &[&str]) -> HashMap<String, Vec<u32>> {
        let mut found: HashMap<String, Vec<u32>> = HashMap::new();

        let entries = match fs::read_dir(&self.proc_root) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, path = %self.proc_root.display(), "Cannot list processes");
                return found;
            }
        };

        for entry in entries.flatten() {
            let pid = match entry.file_name().to_str().and_then(|s| s.parse::<u32>().ok()) {
                Some(pid) => pid,
                None => continue,
            };
            let comm = match fs::read_to_string(entry.path().join("comm")) {
                Ok(comm) => comm,
                Err(_) => continue,
            };
            let comm = comm.trim();
            // comm is truncated to 15 bytes by the kernel.
            if let Some(name) = names
                .iter()
                .find(|n| **n == comm || (comm.len() == 15 && n.starts_with(comm)))
            {
                found.entry(name.to_string()).or_default().push(pid);
            }
        }

        for pids in found.values_mut() {
            pids.sort_unstable();
        }
        found
    }

    fn terminate_process(&self, pid: u32) -> io::Result<()> {
        let pid = libc::pid_t::try_from(pid)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        // SAFETY: kill(2) has no memory-safety preconditions.
        let rc = unsafe { libc::kill(pid, libc::SIGTERM) };
        if rc != 0 {
            return Err(io::Error::last_os_error());
        }
        debug!(pid, "Sent SIGTERM");
        Ok(())
    }

    fn check_system_update_status(&self) -> UpdateStatus {
        match Command::new("apt-get").arg("update").output() {
            Ok(out) if out.status.success() => {}
            Ok(out) => {
                return UpdateStatus::failed(format!(
                    "apt-get update failed: {}",
                    String::from_utf8_lossy(&out.stderr).trim()
                ))
            }
            Err(e) => return UpdateStatus::failed(format!("failed to run apt-get: {}", e)),
        }

        let output = match Command::new("apt-get")
            .args(["--simulate", "dist-upgrade"])
            .output()
        {
            Ok(out) => out,
            Err(e) => return UpdateStatus::failed(format!("failed to run apt-get: {}", e)),
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        match parse_dist_upgrade_summary(&stdout) {
            Some(summary) if summary.is_noop() => UpdateStatus::updated(),
            Some(summary) => UpdateStatus::outdated(format!(
                "{} packages to upgrade, {} to install, {} to remove",
                summary.upgraded, summary.newly_installed, summary.removed
            )),
            None => UpdateStatus::failed(format!(
                "unexpected apt-get output: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )),
        }
    }
}
