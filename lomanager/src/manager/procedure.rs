//! The install/uninstall pipeline.
//!
//! A run works through a fixed list of steps. Each step either does its
//! work, is skipped (it still reports start and end so overall progress
//! keeps moving) or fails. A failure aborts the remaining steps; nothing
//! that already happened is rolled back. Clean-up always runs.
//!
//! ```text
//!  1 Preflight ──► 2 Collect ──► 3 Stop instances ──► 4 Java
//!                                                        │
//!  8 Install Clipart ◄── 7 Remove Clipart ◄── 6 Install Office ◄── 5 Remove Office
//!       │
//!       └──► 9 Persist packages ──► 10 Clean up (always)
//! ```
//!
//! Cancellation is checked between steps and between downloaded or
//! extracted files.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::package::{local_copy_dir, VirtualPackage, LIBREOFFICE_LANGS_DIR};
use crate::policy::GlobalPolicy;
use crate::system::{LinuxInspector, SystemInspector};

use super::backend::AptRpmBackend;
use super::config::ManagerConfig;
use super::download::{
    download_with_retry, verify_against_checksum_file, DownloadItem, DownloadState,
    HttpDownloader,
};
use super::error::{ManagerError, ManagerResult, ProcedureError};
use super::extractor::{filter_unwanted, find_rpms, ShellExtractor};
use super::fixups::Fixups;
use super::plan::{PackageSource, ProcedurePlan};
use super::progress::{ProgressEvent, ProgressSink};
use super::recipes::names_to_remove;
use super::traits::{ArchiveExtractor, PackageBackend, PackageDownloader};

/// Office processes stopped before touching the installation.
pub const QUICKSTARTER_PROCESSES: &[&str] = &["soffice.bin", "oosplash", "soffice"];

/// One step of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Preflight,
    CollectPackages,
    StopRunningInstances,
    InstallJava,
    RemoveOffice,
    InstallOffice,
    RemoveClipart,
    InstallClipart,
    PersistPackages,
    CleanUp,
}

impl Step {
    /// Every step in execution order.
    pub const ALL: [Step; 10] = [
        Step::Preflight,
        Step::CollectPackages,
        Step::StopRunningInstances,
        Step::InstallJava,
        Step::RemoveOffice,
        Step::InstallOffice,
        Step::RemoveClipart,
        Step::InstallClipart,
        Step::PersistPackages,
        Step::CleanUp,
    ];

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Preflight => "Checking requirements",
            Self::CollectPackages => "Collecting packages",
            Self::StopRunningInstances => "Stopping running Office instances",
            Self::InstallJava => "Installing Java",
            Self::RemoveOffice => "Removing Office",
            Self::InstallOffice => "Installing LibreOffice",
            Self::RemoveClipart => "Removing Clipart",
            Self::InstallClipart => "Installing Clipart",
            Self::PersistPackages => "Saving downloaded packages",
            Self::CleanUp => "Cleaning up",
        }
    }

    /// 1-based position in the pipeline.
    pub fn number(&self) -> usize {
        *self as usize + 1
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// How a step ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Done,
    Skipped,
}

/// What a run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcedureReport {
    pub completed: Vec<Step>,
    pub skipped: Vec<Step>,
    /// Best-effort failures that did not stop the run.
    pub warnings: Vec<String>,
}

/// The external collaborators a run needs.
#[derive(Clone)]
pub struct Collaborators {
    pub inspector: Arc<dyn SystemInspector>,
    pub downloader: Arc<dyn PackageDownloader>,
    pub extractor: Arc<dyn ArchiveExtractor>,
    pub backend: Arc<dyn PackageBackend>,
}

impl Collaborators {
    /// Production collaborators for this machine.
    pub fn system(config: &ManagerConfig) -> ManagerResult<Self> {
        Ok(Self {
            inspector: Arc::new(LinuxInspector::new()),
            downloader: Arc::new(HttpDownloader::with_timeout(config.timeout)?),
            extractor: Arc::new(ShellExtractor::new()),
            backend: Arc::new(AptRpmBackend::new()),
        })
    }
}

/// One run of the pipeline.
pub struct Procedure<'a> {
    config: &'a ManagerConfig,
    collaborators: &'a Collaborators,
    policy: &'a GlobalPolicy,
    sink: Arc<dyn ProgressSink>,
    cancel: CancellationToken,
}

impl<'a> Procedure<'a> {
    pub fn new(
        config: &'a ManagerConfig,
        collaborators: &'a Collaborators,
        policy: &'a GlobalPolicy,
        sink: Arc<dyn ProgressSink>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            collaborators,
            policy,
            sink,
            cancel,
        }
    }

    /// Execute `plan`.
    ///
    /// The error message is meant to be shown verbatim; clean-up has run
    /// whichever way the pipeline ended.
    pub fn run(&self, mut plan: ProcedurePlan) -> Result<ProcedureReport, ProcedureError> {
        info!(
            source = ?plan.source,
            downloads = plan.downloads.len(),
            remove_office = plan.remove_office.len(),
            install_office = plan.install_office.len(),
            "Starting procedure"
        );

        let mut report = ProcedureReport::default();
        let result = self.run_steps(&mut plan, &mut report);

        self.begin(Step::CleanUp);
        let outcome = self.clean_up(&mut report);
        self.finish(Step::CleanUp, outcome, &mut report);

        match &result {
            Ok(()) => info!(
                completed = report.completed.len(),
                skipped = report.skipped.len(),
                warnings = report.warnings.len(),
                "Procedure finished"
            ),
            Err(e) => warn!(error = %e, class = %e.classification(), "Procedure failed"),
        }
        result.map(|()| report)
    }

    fn run_steps(
        &self,
        plan: &mut ProcedurePlan,
        report: &mut ProcedureReport,
    ) -> Result<(), ProcedureError> {
        for step in Step::ALL {
            if step == Step::CleanUp {
                break;
            }
            if self.cancel.is_cancelled() {
                return Err(ProcedureError::Cancelled);
            }

            self.begin(step);
            let result = match step {
                Step::Preflight => self.preflight(plan),
                Step::CollectPackages => self.collect_packages(plan),
                Step::StopRunningInstances => Ok(self.stop_running_instances(plan, report)),
                Step::InstallJava => self.install_java(plan),
                Step::RemoveOffice => self.remove(step, &plan.remove_office, report),
                Step::InstallOffice => self.install_office(plan, report),
                Step::RemoveClipart => self.remove(step, &plan.remove_clipart, report),
                Step::InstallClipart => self.install_clipart(plan),
                Step::PersistPackages => self.persist_packages(plan),
                Step::CleanUp => Ok(StepOutcome::Skipped),
            };
            match result {
                Ok(outcome) => self.finish(step, outcome, report),
                Err(e) => {
                    self.fail(step);
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    fn begin(&self, step: Step) {
        info!(step = step.number(), "{}", step.label());
        self.sink.emit(ProgressEvent::Overall {
            step: step.number(),
            total: Step::ALL.len(),
            label: step.label().to_string(),
        });
        self.sink.emit(ProgressEvent::StepStarted {
            label: step.label().to_string(),
        });
    }

    fn finish(&self, step: Step, outcome: StepOutcome, report: &mut ProcedureReport) {
        let skipped = outcome == StepOutcome::Skipped;
        if skipped {
            debug!(step = step.number(), "Step skipped");
            report.skipped.push(step);
        } else {
            report.completed.push(step);
        }
        self.sink.emit(ProgressEvent::StepFinished {
            label: step.label().to_string(),
            skipped,
        });
    }

    fn fail(&self, step: Step) {
        self.sink.emit(ProgressEvent::StepFailed {
            label: step.label().to_string(),
        });
    }

    fn progress(&self, percent: u8) {
        self.sink.emit(ProgressEvent::StepProgress {
            percent,
            label: None,
        });
    }

    fn blocked(&self, what: &str) -> ProcedureError {
        if self.policy.advisories.is_empty() {
            ProcedureError::Blocked(format!("{} is currently blocked", what))
        } else {
            ProcedureError::Blocked(format!(
                "{} is currently blocked: {}",
                what,
                self.policy.advisories.join(" ")
            ))
        }
    }

    fn preflight(&self, plan: &ProcedurePlan) -> Result<StepOutcome, ProcedureError> {
        let local = plan.source.is_local_copy();
        if (plan.has_installs() || !plan.downloads.is_empty()) && self.policy.blocks_install(local)
        {
            return Err(self.blocked(if local {
                "Installing from a local copy"
            } else {
                "Installing from the network"
            }));
        }
        if plan.has_removals() && self.policy.block_removal {
            return Err(self.blocked("Removing packages"));
        }

        if plan.keep_packages && plan.source == PackageSource::Network && !plan.downloads.is_empty()
        {
            let dir = &self.config.kept_packages_dir;
            fs::create_dir_all(dir)
                .map_err(|e| ManagerError::CreateDirFailed {
                    path: dir.clone(),
                    source: e,
                })
                .map_err(|e| ProcedureError::from_step(Step::Preflight.label(), e))?;
        }
        Ok(StepOutcome::Done)
    }

    fn collect_packages(&self, plan: &mut ProcedurePlan) -> Result<StepOutcome, ProcedureError> {
        if plan.downloads.is_empty() {
            return Ok(StepOutcome::Skipped);
        }
        let step = Step::CollectPackages.label();
        let fail = |e: ManagerError| ProcedureError::from_step(step, e);
        let downloader = self.collaborators.downloader.as_ref();
        let download_dir = self.config.download_dir();

        let mut owners: Vec<VirtualPackage> = Vec::new();
        let mut items = Vec::new();
        for package in &plan.downloads {
            for component in &package.real_components {
                owners.push(package.clone());
                items.push(DownloadItem {
                    package: package.label(),
                    url: component.url.clone(),
                    checksum_url: component.checksum_url.clone(),
                    dest: download_dir.join(&component.name),
                    size: 0,
                });
            }
        }
        let mut state = DownloadState::new(items);

        // Everything must be reachable and fit before the first byte moves.
        for index in 0..state.total_items() {
            let url = state.items[index].url.clone();
            let size = downloader
                .remote_size(&url)
                .map_err(|e| ProcedureError::Resource(format!("Cannot reach {}: {}", url, e)))?;
            state.set_size(index, size);
        }
        let free = self
            .collaborators
            .inspector
            .free_space(&self.config.staging_dir)
            .map_err(|e| {
                ProcedureError::Resource(format!(
                    "Cannot determine free space in {}: {}",
                    self.config.staging_dir.display(),
                    e
                ))
            })?;
        if state.total_size > free {
            return Err(ProcedureError::Resource(format!(
                "Not enough free space in {}: {} needed, {} available",
                self.config.staging_dir.display(),
                mib(state.total_size),
                mib(free)
            )));
        }
        info!(
            files = state.total_items(),
            bytes = state.total_size,
            "Downloading packages"
        );

        fs::create_dir_all(&download_dir)
            .map_err(|e| ManagerError::CreateDirFailed {
                path: download_dir.clone(),
                source: e,
            })
            .map_err(fail)?;

        for index in 0..state.total_items() {
            if self.cancel.is_cancelled() {
                return Err(ProcedureError::Cancelled);
            }
            let item = state.items[index].clone();

            let bytes = match download_with_retry(
                downloader,
                &item.url,
                &item.dest,
                self.config.retries,
                self.config.retry_delay,
                &self.cancel,
                self.download_progress(&state, &item),
            ) {
                Ok(bytes) => bytes,
                Err(e) => {
                    state.record_failure(index);
                    return Err(fail(e));
                }
            };

            if self.config.verify_checksums {
                if let Some(checksum_url) = &item.checksum_url {
                    let contents = downloader.fetch_text(checksum_url).map_err(fail)?;
                    verify_against_checksum_file(&item.dest, checksum_url, &contents)
                        .map_err(fail)?;
                }
            }
            state.record_success(bytes);

            let owner = &owners[index];
            let verified = self
                .config
                .verified_dir()
                .join(owner.family.name())
                .join(owner.kind.as_str())
                .join(file_name(&item.dest));
            move_file(&item.dest, &verified).map_err(fail)?;
            debug!(path = %verified.display(), "Package collected");
            plan.staged.add(owner, verified);
        }

        self.progress(100);
        Ok(StepOutcome::Done)
    }

    fn download_progress(
        &self,
        state: &DownloadState,
        item: &DownloadItem,
    ) -> Arc<dyn Fn(u64, u64) + Send + Sync> {
        let snapshot = state.clone();
        let sink = Arc::clone(&self.sink);
        let label = Some(file_name(&item.dest));
        let last = AtomicU8::new(u8::MAX);
        Arc::new(move |done: u64, _total: u64| {
            let percent = snapshot.progress_percent(done);
            if last.swap(percent, Ordering::Relaxed) != percent {
                sink.emit(ProgressEvent::StepProgress {
                    percent,
                    label: label.clone(),
                });
            }
        })
    }

    fn stop_running_instances(
        &self,
        plan: &ProcedurePlan,
        report: &mut ProcedureReport,
    ) -> StepOutcome {
        if !plan.has_installs() && !plan.has_removals() {
            return StepOutcome::Skipped;
        }

        let inspector = self.collaborators.inspector.as_ref();
        let running = inspector.running_processes(QUICKSTARTER_PROCESSES);
        for (name, pids) in &running {
            for &pid in pids {
                match inspector.terminate_process(pid) {
                    Ok(()) => info!(name = %name, pid, "Stopped running instance"),
                    Err(e) => {
                        warn!(name = %name, pid, error = %e, "Could not stop running instance");
                        report
                            .warnings
                            .push(format!("Could not stop {} ({}): {}", name, pid, e));
                    }
                }
            }
        }
        self.progress(100);
        StepOutcome::Done
    }

    fn install_java(&self, plan: &ProcedurePlan) -> Result<StepOutcome, ProcedureError> {
        let Some(java) = &plan.install_java else {
            return Ok(StepOutcome::Skipped);
        };
        let step = Step::InstallJava.label();
        let fail = |e: ManagerError| ProcedureError::from_step(step, e);

        let files = plan.staged.files(java);
        if files.is_empty() {
            return Err(ProcedureError::Failed {
                step: step.to_string(),
                message: format!("no files were collected for {}", java.label()),
            });
        }

        let cache = &self.config.package_cache_dir;
        fs::create_dir_all(cache)
            .map_err(|e| ManagerError::CreateDirFailed {
                path: cache.clone(),
                source: e,
            })
            .map_err(fail)?;

        let mut cached = Vec::with_capacity(files.len());
        for file in files {
            let dest = cache.join(file_name(file));
            fs::copy(file, &dest)
                .map_err(|e| ManagerError::WriteFailed {
                    path: dest.clone(),
                    source: e,
                })
                .map_err(fail)?;
            cached.push(dest);
        }

        self.collaborators
            .backend
            .install_files(&cached, &|p| self.progress(p))
            .map_err(fail)?;
        Ok(StepOutcome::Done)
    }

    /// Remove packages through their recipes and verify they are gone.
    fn remove(
        &self,
        step: Step,
        packages: &[VirtualPackage],
        report: &mut ProcedureReport,
    ) -> Result<StepOutcome, ProcedureError> {
        if packages.is_empty() {
            return Ok(StepOutcome::Skipped);
        }
        let label = step.label();
        let backend = self.collaborators.backend.as_ref();

        let installed = backend
            .list_installed()
            .map_err(|e| ProcedureError::from_step(label, e))?;
        let names = names_to_remove(packages, &installed);
        if names.is_empty() {
            let labels: Vec<String> = packages.iter().map(VirtualPackage::label).collect();
            report.warnings.push(format!(
                "No installed package matches {}",
                labels.join(", ")
            ));
            return Ok(StepOutcome::Done);
        }
        info!(count = names.len(), "Removing packages");

        let outcome = backend.remove_packages(&names, &|p| self.progress(p));

        let remaining: Vec<String> = match backend.list_installed() {
            Ok(after) => names.iter().filter(|n| after.contains(n)).cloned().collect(),
            Err(e) => {
                return Err(match outcome {
                    Err(original) => ProcedureError::from_step(label, original),
                    Ok(()) => ProcedureError::PartialMutation {
                        step: label.to_string(),
                        message: format!("could not verify the removal: {}", e),
                    },
                })
            }
        };

        match outcome {
            Ok(()) if remaining.is_empty() => Ok(StepOutcome::Done),
            Ok(()) => Err(ProcedureError::PartialMutation {
                step: label.to_string(),
                message: format!("still installed after removal: {}", remaining.join(", ")),
            }),
            Err(e) if remaining.len() == names.len() => Err(ProcedureError::from_step(label, e)),
            Err(e) => Err(ProcedureError::PartialMutation {
                step: label.to_string(),
                message: format!("{}; still installed: {}", e, remaining.join(", ")),
            }),
        }
    }

    fn install_office(
        &self,
        plan: &ProcedurePlan,
        report: &mut ProcedureReport,
    ) -> Result<StepOutcome, ProcedureError> {
        if plan.install_office.is_empty() {
            return Ok(StepOutcome::Skipped);
        }
        let step = Step::InstallOffice.label();
        let fail = |e: ManagerError| ProcedureError::from_step(step, e);

        let archives: Vec<(&VirtualPackage, &PathBuf)> = plan
            .install_office
            .iter()
            .flat_map(|p| plan.staged.files(p).iter().map(move |f| (p, f)))
            .collect();
        if archives.is_empty() {
            return Err(ProcedureError::Failed {
                step: step.to_string(),
                message: "no archives were collected".to_string(),
            });
        }

        // Extraction is the first half of the step, the transaction the second.
        let extract_root = self.config.extract_dir();
        for (index, (package, archive)) in archives.iter().enumerate() {
            if self.cancel.is_cancelled() {
                return Err(ProcedureError::Cancelled);
            }
            let dest = extract_root.join(format!("{}_{}", package.version, package.kind));
            let files = self
                .collaborators
                .extractor
                .extract(archive, &dest)
                .map_err(fail)?;
            debug!(archive = %archive.display(), files, "Extracted");
            self.progress(((index + 1) * 50 / archives.len()) as u8);
        }

        let (rpms, skipped) = filter_unwanted(find_rpms(&extract_root).map_err(fail)?);
        if rpms.is_empty() {
            return Err(ProcedureError::Failed {
                step: step.to_string(),
                message: "the archives contain no installable packages".to_string(),
            });
        }
        info!(count = rpms.len(), skipped = skipped.len(), "Installing LibreOffice packages");

        self.collaborators
            .backend
            .install_files(&rpms, &|p| self.progress(50 + p / 2))
            .map_err(fail)?;

        let version = &plan.install_office[0].version;
        let fixups = Fixups::new(&self.config.fixup_root)
            .with_refresh_caches(self.config.refresh_desktop_caches)
            .apply(version);
        report.warnings.extend(fixups.warnings);
        Ok(StepOutcome::Done)
    }

    fn install_clipart(&self, plan: &ProcedurePlan) -> Result<StepOutcome, ProcedureError> {
        let Some(clipart) = &plan.install_clipart else {
            return Ok(StepOutcome::Skipped);
        };
        let step = Step::InstallClipart.label();
        let files = plan.staged.files(clipart);
        if files.is_empty() {
            return Err(ProcedureError::Failed {
                step: step.to_string(),
                message: format!("no files were collected for {}", clipart.label()),
            });
        }
        self.collaborators
            .backend
            .install_files(files, &|p| self.progress(p))
            .map_err(|e| ProcedureError::from_step(step, e))?;
        Ok(StepOutcome::Done)
    }

    /// Move collected files into the kept-packages directory, in the
    /// local-copy layout. Local copies already live where the user keeps
    /// them.
    fn persist_packages(&self, plan: &ProcedurePlan) -> Result<StepOutcome, ProcedureError> {
        if !plan.keep_packages || plan.source.is_local_copy() || plan.staged.is_empty() {
            return Ok(StepOutcome::Skipped);
        }
        let step = Step::PersistPackages.label();

        for entry in plan.staged.iter() {
            let sub = if entry.package.is_lang_pack() {
                LIBREOFFICE_LANGS_DIR
            } else {
                local_copy_dir(entry.package.family)
            };
            let dir = self.config.kept_packages_dir.join(sub);
            for file in &entry.files {
                move_file(file, &dir.join(file_name(file)))
                    .map_err(|e| ProcedureError::from_step(step, e))?;
            }
        }
        info!(
            dir = %self.config.kept_packages_dir.display(),
            files = plan.staged.file_count(),
            "Kept downloaded packages"
        );
        Ok(StepOutcome::Done)
    }

    fn clean_up(&self, report: &mut ProcedureReport) -> StepOutcome {
        for dir in [
            self.config.download_dir(),
            self.config.verified_dir(),
            self.config.extract_dir(),
        ] {
            if !dir.exists() {
                continue;
            }
            if let Err(e) = fs::remove_dir_all(&dir) {
                warn!(path = %dir.display(), error = %e, "Could not remove staging directory");
                report
                    .warnings
                    .push(format!("Could not remove {}: {}", dir.display(), e));
            }
        }
        // Only succeeds when empty.
        let _ = fs::remove_dir(&self.config.staging_dir);
        StepOutcome::Done
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn mib(bytes: u64) -> String {
    format!("{:.1} MiB", bytes as f64 / (1024.0 * 1024.0))
}

/// Move a file, falling back to copy and delete across filesystems.
fn move_file(source: &Path, dest: &Path) -> ManagerResult<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| ManagerError::CreateDirFailed {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    if fs::rename(source, dest).is_err() {
        fs::copy(source, dest).map_err(|e| ManagerError::WriteFailed {
            path: dest.to_path_buf(),
            source: e,
        })?;
        fs::remove_file(source).map_err(|e| ManagerError::WriteFailed {
            path: source.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_step_numbers() {
        assert_eq!(Step::Preflight.number(), 1);
        assert_eq!(Step::CleanUp.number(), Step::ALL.len());
        for (i, step) in Step::ALL.iter().enumerate() {
            assert_eq!(step.number(), i + 1);
        }
    }

    #[test]
    fn test_move_file_creates_parent() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("a.rpm");
        fs::write(&source, "x").unwrap();
        let dest = temp.path().join("kept/Java_rpms/a.rpm");

        move_file(&source, &dest).unwrap();
        assert!(!source.exists());
        assert_eq!(fs::read_to_string(dest).unwrap(), "x");
    }

    #[test]
    fn test_mib() {
        assert_eq!(mib(3 * 1024 * 1024 / 2), "1.5 MiB");
    }
}
