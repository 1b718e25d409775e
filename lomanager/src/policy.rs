//! Process-wide policy flags.
//!
//! The policy is computed wholesale from live system probes on every
//! inventory refresh and is read-only afterwards. The selection engine and
//! the procedure receive it by reference.

use std::cmp::Ordering;

use tracing::{info, warn};

use crate::system::SystemInspector;
use crate::version::compare_versions;

/// Package managers whose presence blocks every modification.
pub const PACKAGE_MANAGER_PROCESSES: &[&str] = &["synaptic", "apt-get", "rpm", "smart", "dnf"];

/// Office processes whose presence blocks every modification.
pub const OFFICE_PROCESSES: &[&str] = &["soffice.bin"];

/// What the live probes allow in the current session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalPolicy {
    /// Removing software is forbidden.
    pub block_removal: bool,
    /// Installing from the network is forbidden.
    pub block_network_install: bool,
    /// Installing from a local copy is forbidden.
    pub block_local_copy_install: bool,
    /// Checking for system updates is forbidden.
    pub block_checking_for_updates: bool,
    /// Human-readable explanations of every block.
    pub advisories: Vec<String>,
}

/// Inputs of [`GlobalPolicy::probe`] that are not system probes.
#[derive(Debug, Clone, Default)]
pub struct PolicyInputs<'a> {
    /// Run the (slow) system update check.
    pub check_for_updates: bool,
    /// Newest client version advertised by the catalog.
    pub latest_client_version: Option<&'a str>,
    /// Version of this client.
    pub client_version: &'a str,
}

impl GlobalPolicy {
    /// A policy that blocks nothing.
    pub fn permissive() -> Self {
        Self::default()
    }

    /// Whether every install and removal path is blocked.
    pub fn blocks_everything(&self) -> bool {
        self.block_removal && self.block_network_install && self.block_local_copy_install
    }

    /// Whether installs are blocked for the given source.
    pub fn blocks_install(&self, local_copy: bool) -> bool {
        if local_copy {
            self.block_local_copy_install
        } else {
            self.block_network_install
        }
    }

    fn block_all(&mut self, advisory: String) {
        self.block_removal = true;
        self.block_network_install = true;
        self.block_local_copy_install = true;
        self.advisories.push(advisory);
    }

    /// Compute the policy from the current state of the system.
    pub fn probe(inspector: &dyn SystemInspector, inputs: &PolicyInputs<'_>) -> Self {
        let mut policy = Self::default();

        let managers = inspector.running_processes(PACKAGE_MANAGER_PROCESSES);
        if !managers.is_empty() {
            let mut names: Vec<&str> = managers.keys().map(String::as_str).collect();
            names.sort_unstable();
            policy.block_all(format!(
                "Another package manager is running ({}). Close it and refresh.",
                names.join(", ")
            ));
            policy.block_checking_for_updates = true;
        }

        let office = inspector.running_processes(OFFICE_PROCESSES);
        if !office.is_empty() {
            policy.block_all(
                "An Office suite is running. Save your documents, close it and refresh."
                    .to_string(),
            );
        }

        if !policy.block_checking_for_updates && inputs.check_for_updates {
            let status = inspector.check_system_update_status();
            if !status.check_ok {
                policy.block_network_install = true;
                policy.block_local_copy_install = true;
                policy.advisories.push(format!(
                    "Could not check whether the system is updated: {}",
                    status.explanation
                ));
            } else if !status.is_updated {
                policy.block_network_install = true;
                policy.block_local_copy_install = true;
                policy.advisories.push(format!(
                    "The system is not fully updated ({}). Update it before installing.",
                    status.explanation
                ));
            }
        }

        if let Some(latest) = inputs.latest_client_version {
            match compare_versions(latest, inputs.client_version) {
                Ok(Ordering::Greater) => {
                    policy.block_network_install = true;
                    policy.advisories.push(format!(
                        "A newer lomanager ({}) is available. Update it before installing from the network.",
                        latest
                    ));
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "Ignoring unparsable client version"),
            }
        }

        if !policy.advisories.is_empty() {
            info!(advisories = policy.advisories.len(), "Policy restricts operations");
        }
        policy
    }
}
