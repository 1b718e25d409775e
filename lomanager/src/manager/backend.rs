//! OS package manager backend.
//!
//! Every transaction is tried with `rpm --test` first; only when the dry
//! run accepts it is the real command issued.

use std::path::PathBuf;
use std::process::{Command, Output};

use tracing::{debug, info};

use super::error::{ManagerError, ManagerResult};
use super::traits::PackageBackend;

/// Package backend driving `rpm` directly.
#[derive(Debug, Clone)]
pub struct AptRpmBackend {
    rpm: String,
}

impl Default for AptRpmBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AptRpmBackend {
    /// Create a backend using `rpm` from `PATH`.
    pub fn new() -> Self {
        Self {
            rpm: "rpm".to_string(),
        }
    }

    /// Use a different `rpm` executable.
    pub fn with_rpm_command(mut self, rpm: impl Into<String>) -> Self {
        self.rpm = rpm.into();
        self
    }

    fn run(&self, args: &[String]) -> ManagerResult<Output> {
        debug!(command = %self.rpm, ?args, "Running package manager");
        Command::new(&self.rpm)
            .args(args)
            .output()
            .map_err(|e| ManagerError::CommandFailed {
                command: self.rpm.clone(),
                reason: e.to_string(),
            })
    }

    /// Dry run then commit `args` (without `--test`).
    fn transaction(&self, args: Vec<String>, progress: &dyn Fn(u8)) -> ManagerResult<()> {
        let command = format!("{} {}", self.rpm, args[0]);

        let mut test_args = vec![args[0].clone(), "--test".to_string()];
        test_args.extend(args[1..].iter().cloned());
        let output = self.run(&test_args)?;
        if !output.status.success() {
            return Err(ManagerError::DryRunRejected {
                command,
                reason: stderr_of(&output),
            });
        }

        progress(0);
        let output = self.run(&args)?;
        if !output.status.success() {
            return Err(ManagerError::CommandFailed {
                command,
                reason: stderr_of(&output),
            });
        }
        progress(100);
        Ok(())
    }
}

fn stderr_of(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if stderr.is_empty() {
        format!("exit status {}", output.status)
    } else {
        stderr
    }
}

impl PackageBackend for AptRpmBackend {
    fn list_installed(&self) -> ManagerResult<Vec<String>> {
        let output = self.run(&["-qa".to_string(), "--qf".to_string(), "%{NAME}\\n".to_string()])?;
        if !output.status.success() {
            return Err(ManagerError::CommandFailed {
                command: format!("{} -qa", self.rpm),
                reason: stderr_of(&output),
            });
        }
        let mut names: Vec<String> = String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    fn install_files(&self, files: &[PathBuf], progress: &dyn Fn(u8)) -> ManagerResult<()> {
        if files.is_empty() {
            return Err(ManagerError::DryRunRejected {
                command: format!("{} -Uvh", self.rpm),
                reason: "nothing to install".to_string(),
            });
        }
        info!(count = files.len(), "Installing packages");
        let mut args = vec!["-Uvh".to_string()];
        args.extend(files.iter().map(|f| f.to_string_lossy().into_owned()));
        self.transaction(args, progress)
    }

    fn remove_packages(&self, names: &[String], progress: &dyn Fn(u8)) -> ManagerResult<()> {
        if names.is_empty() {
            return Err(ManagerError::DryRunRejected {
                command: format!("{} -e", self.rpm),
                reason: "nothing to remove".to_string(),
            });
        }
        info!(count = names.len(), "Removing packages");
        let mut args = vec!["-e".to_string()];
        args.extend(names.iter().cloned());
        self.transaction(args, progress)
    }
}
