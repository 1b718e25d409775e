//! OS inspection.
//!
//! The selection engine and the procedure never look at the machine
//! directly. Everything they need to know about it (installed software,
//! free disk space, running processes, update status) comes through the
//! [`SystemInspector`] trait, so tests can substitute a fake system.
//!
//! [`LinuxInspector`] is the production implementation for an RPM-based
//! distribution using apt-rpm.

mod linux;
mod rpm;

pub use linux::LinuxInspector;
pub use rpm::{
    detect_clipart, detect_java, parse_dist_upgrade_summary, parse_installed_office,
    parse_rpm_query, RpmEntry, UpgradeSummary,
};

use std::collections::HashMap;
use std::io;
use std::path::Path;

use crate::package::InstalledOffice;

/// Result of checking whether the system is fully updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateStatus {
    /// Whether the check itself could be performed.
    pub check_ok: bool,
    /// Whether no pending updates were found.
    pub is_updated: bool,
    /// Human-readable explanation.
    pub explanation: String,
}

impl UpdateStatus {
    /// A successful check that found the system up to date.
    pub fn updated() -> Self {
        Self {
            check_ok: true,
            is_updated: true,
            explanation: "System is up to date".to_string(),
        }
    }

    /// A successful check that found pending updates.
    pub fn outdated(explanation: impl Into<String>) -> Self {
        Self {
            check_ok: true,
            is_updated: false,
            explanation: explanation.into(),
        }
    }

    /// The check could not be performed.
    pub fn failed(explanation: impl Into<String>) -> Self {
        Self {
            check_ok: false,
            is_updated: false,
            explanation: explanation.into(),
        }
    }
}

/// Read-only view of the machine, plus process termination.
pub trait SystemInspector: Send + Sync {
    /// Version of the installed Java runtime, if any.
    fn detect_installed_java(&self) -> Option<String>;

    /// Every installed OpenOffice/LibreOffice suite with its language packs.
    fn detect_installed_office(&self) -> Vec<InstalledOffice>;

    /// Version of the installed Openclipart gallery, if any.
    fn detect_installed_clipart(&self) -> Option<String>;

    /// Bytes available to unprivileged writers at `path`.
    fn free_space(&self, path: &Path) -> io::Result<u64>;

    /// PIDs of running processes, keyed by the requested name.
    ///
    /// Names with no running process are absent from the map.
    fn running_processes(&self, names: &[&str]) -> HashMap<String, Vec<u32>>;

    /// Ask a process to terminate.
    fn terminate_process(&self, pid: u32) -> io::Result<()>;

    /// Whether the distribution is fully updated.
    fn check_system_update_status(&self) -> UpdateStatus;
}
