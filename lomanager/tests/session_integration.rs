//! Integration tests for the session and the install/uninstall procedure.
//!
//! These tests drive a [`Session`] end to end against fake collaborators:
//! - selection round trips on a realistic inventory
//! - network installs, removals and their progress events
//! - local-copy installs, including the unusable cases
//! - partial removals and cancellation
//!
//! Run with: `cargo test --test session_integration`

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use lomanager::app::{AppConfig, AppError, PackageView, Session};
use lomanager::inventory::Catalog;
use lomanager::manager::{
    ArchiveExtractor, Collaborators, ErrorClass, ManagerConfig, ManagerError, ManagerResult,
    NullSink, PackageBackend, PackageDownloader, ProcedureError, ProgressCallback, ProgressEvent,
    RecordingSink, Step,
};
use lomanager::package::{Family, InstalledOffice};
use lomanager::system::{SystemInspector, UpdateStatus};
use lomanager::task::{ProcedureRequest, ProcedureTask};

// ============================================================================
// Fake collaborators
// ============================================================================

/// What the fake machine has installed.
#[derive(Default)]
struct FakeSystem {
    java: Option<String>,
    office: Vec<InstalledOffice>,
    clipart: Option<String>,
}

impl SystemInspector for FakeSystem {
    fn detect_installed_java(&self) -> Option<String> {
        self.java.clone()
    }

    fn detect_installed_office(&self) -> Vec<InstalledOffice> {
        self.office.clone()
    }

    fn detect_installed_clipart(&self) -> Option<String> {
        self.clipart.clone()
    }

    fn free_space(&self, _path: &Path) -> io::Result<u64> {
        Ok(u64::MAX / 2)
    }

    fn running_processes(&self, _names: &[&str]) -> HashMap<String, Vec<u32>> {
        HashMap::new()
    }

    fn terminate_process(&self, _pid: u32) -> io::Result<()> {
        Ok(())
    }

    fn check_system_update_status(&self) -> UpdateStatus {
        UpdateStatus::updated()
    }
}

/// Serves a few bytes for every URL. Optionally cancels a token as soon as
/// the first file is written.
#[derive(Default)]
struct FakeDownloader {
    downloaded: Mutex<Vec<String>>,
    cancel_after_first: Option<CancellationToken>,
}

impl PackageDownloader for FakeDownloader {
    fn remote_size(&self, _url: &str) -> ManagerResult<u64> {
        Ok(8)
    }

    fn download(
        &self,
        url: &str,
        dest: &Path,
        on_progress: Option<ProgressCallback>,
    ) -> ManagerResult<u64> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| ManagerError::CreateDirFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        fs::write(dest, b"package!").map_err(|e| ManagerError::WriteFailed {
            path: dest.to_path_buf(),
            source: e,
        })?;
        if let Some(progress) = on_progress {
            progress(8, 8);
        }
        self.downloaded.lock().unwrap().push(url.to_string());
        if let Some(token) = &self.cancel_after_first {
            token.cancel();
        }
        Ok(8)
    }

    fn fetch_text(&self, url: &str) -> ManagerResult<String> {
        Err(ManagerError::DownloadFailed {
            url: url.to_string(),
            reason: "no checksum files in tests".to_string(),
        })
    }
}

/// Writes one RPM per archive, named after the archive, plus an unwanted
/// KDE integration RPM that must be filtered out.
#[derive(Default)]
struct FakeExtractor {
    extracted: Mutex<Vec<String>>,
}

impl ArchiveExtractor for FakeExtractor {
    fn extract(&self, archive_path: &Path, dest_dir: &Path) -> ManagerResult<usize> {
        let name = archive_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let rpms = dest_dir.join("RPMS");
        fs::create_dir_all(&rpms).map_err(|e| ManagerError::CreateDirFailed {
            path: rpms.clone(),
            source: e,
        })?;
        let stem = name.trim_end_matches(".tar.gz");
        for file in [
            format!("{}.x86_64.rpm", stem),
            "libreoffice7.6-kde-integration-7.6.4.1.x86_64.rpm".to_string(),
        ] {
            fs::write(rpms.join(&file), b"rpm").map_err(|e| ManagerError::WriteFailed {
                path: rpms.join(&file),
                source: e,
            })?;
        }
        self.extracted.lock().unwrap().push(name);
        Ok(2)
    }

    fn list_contents(&self, _archive_path: &Path) -> ManagerResult<Vec<String>> {
        Ok(Vec::new())
    }
}

/// Keeps an installed RPM name list. Names in `stuck` survive removal.
#[derive(Default)]
struct FakeBackend {
    installed: Mutex<Vec<String>>,
    stuck: Vec<String>,
    installed_files: Mutex<Vec<String>>,
    removed: Mutex<Vec<String>>,
}

impl FakeBackend {
    fn with_installed(names: &[&str]) -> Self {
        Self {
            installed: Mutex::new(names.iter().map(|s| s.to_string()).collect()),
            ..Default::default()
        }
    }

    fn installed_files(&self) -> Vec<String> {
        self.installed_files.lock().unwrap().clone()
    }

    fn removed(&self) -> Vec<String> {
        self.removed.lock().unwrap().clone()
    }
}

impl PackageBackend for FakeBackend {
    fn list_installed(&self) -> ManagerResult<Vec<String>> {
        Ok(self.installed.lock().unwrap().clone())
    }

    fn install_files(&self, files: &[PathBuf], progress: &dyn Fn(u8)) -> ManagerResult<()> {
        progress(0);
        let mut installed = self.installed_files.lock().unwrap();
        for file in files {
            installed.push(
                file.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            );
        }
        progress(100);
        Ok(())
    }

    fn remove_packages(&self, names: &[String], progress: &dyn Fn(u8)) -> ManagerResult<()> {
        progress(0);
        let mut installed = self.installed.lock().unwrap();
        installed.retain(|n| !names.contains(n) || self.stuck.contains(n));
        self.removed.lock().unwrap().extend(names.iter().cloned());
        progress(100);
        Ok(())
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

const LATEST: &str = "7.6.4.1";

fn catalog() -> Catalog {
    Catalog {
        latest_libreoffice: LATEST.to_string(),
        latest_clipart: "2.0".to_string(),
        languages: vec!["fr".to_string(), "de".to_string()],
        helppack_languages: vec![],
        libreoffice_base_url: "https://mirror.test/lo".to_string(),
        repo_base_url: "https://repo.test/rpms".to_string(),
        ..Default::default()
    }
}

fn app_config(temp: &TempDir) -> AppConfig {
    let root = temp.path();
    let manager = ManagerConfig::new(root.join("staging"))
        .with_kept_packages_dir(root.join("kept"))
        .with_package_cache_dir(root.join("apt-cache"))
        .with_fixup_root(root.join("fs"))
        .with_refresh_desktop_caches(false)
        .with_verify_checksums(false)
        .with_retries(0, std::time::Duration::ZERO);
    AppConfig::new(manager, catalog())
        .with_check_for_updates(false)
        .with_log_dir(root.join("logs"))
}

struct Fakes {
    downloader: Arc<FakeDownloader>,
    extractor: Arc<FakeExtractor>,
    backend: Arc<FakeBackend>,
}

fn session_with(
    temp: &TempDir,
    system: FakeSystem,
    downloader: FakeDownloader,
    backend: FakeBackend,
) -> (Session, Fakes) {
    let fakes = Fakes {
        downloader: Arc::new(downloader),
        extractor: Arc::new(FakeExtractor::default()),
        backend: Arc::new(backend),
    };
    let collaborators = Collaborators {
        inspector: Arc::new(system),
        downloader: fakes.downloader.clone(),
        extractor: fakes.extractor.clone(),
        backend: fakes.backend.clone(),
    };
    let session = Session::with_collaborators(app_config(temp), collaborators).unwrap();
    (session, fakes)
}

/// Java 2019 and LibreOffice 7.5 with French installed.
fn upgrade_system() -> FakeSystem {
    FakeSystem {
        java: Some("2019".to_string()),
        office: vec![InstalledOffice::new(Family::LibreOffice, "7.5.9.2", ["fr"])],
        clipart: None,
    }
}

fn view<'a>(packages: &'a [PackageView], label: &str) -> &'a PackageView {
    packages
        .iter()
        .find(|p| p.label == label)
        .unwrap_or_else(|| panic!("no package {}", label))
}

fn id_of(session: &Session, label: &str) -> usize {
    view(&session.packages(), label).id
}

fn write_file(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, b"archive").unwrap();
}

// ============================================================================
// Selection
// ============================================================================

#[test]
fn test_upgrade_selection_locks_old_version() {
    let temp = TempDir::new().unwrap();
    let (mut session, _) = session_with(
        &temp,
        upgrade_system(),
        FakeDownloader::default(),
        FakeBackend::default(),
    );

    let new_core = id_of(&session, "LibreOffice 7.6.4.1 core-packages");
    session.request_install(new_core, true).unwrap();

    let packages = session.packages();
    let old_core = view(&packages, "LibreOffice 7.5.9.2 core-packages");
    assert!(old_core.flags.marked_for_removal);
    assert!(!old_core.flags.remove_enabled);
    assert!(view(&packages, "LibreOffice 7.5.9.2 fr").flags.marked_for_removal);
    assert!(view(&packages, "LibreOffice 7.6.4.1 fr").flags.marked_for_install);
    assert!(!view(&packages, "LibreOffice 7.6.4.1 de").flags.marked_for_install);
    assert!(!view(&packages, "Java 2019 core-packages").flags.marked_for_install);

    let changes = session.planned_changes();
    assert_eq!(
        changes.to_install,
        vec![
            "LibreOffice 7.6.4.1 core-packages".to_string(),
            "LibreOffice 7.6.4.1 fr".to_string(),
        ]
    );
    assert_eq!(
        changes.to_remove,
        vec![
            "LibreOffice 7.5.9.2 core-packages".to_string(),
            "LibreOffice 7.5.9.2 fr".to_string(),
        ]
    );
}

#[test]
fn test_mark_unmark_round_trip_restores_flags() {
    let temp = TempDir::new().unwrap();
    let (mut session, _) = session_with(
        &temp,
        upgrade_system(),
        FakeDownloader::default(),
        FakeBackend::default(),
    );
    let before = session.packages();

    let new_core = id_of(&session, "LibreOffice 7.6.4.1 core-packages");
    session.request_install(new_core, true).unwrap();
    session.request_install(new_core, false).unwrap();

    assert_eq!(session.packages(), before);
    assert!(session.planned_changes().to_install.is_empty());
}

#[test]
fn test_fresh_system_marks_java_with_office() {
    let temp = TempDir::new().unwrap();
    let (mut session, _) = session_with(
        &temp,
        FakeSystem::default(),
        FakeDownloader::default(),
        FakeBackend::default(),
    );

    let lang = id_of(&session, "LibreOffice 7.6.4.1 de");
    session.request_install(lang, true).unwrap();

    let packages = session.packages();
    assert!(view(&packages, "LibreOffice 7.6.4.1 core-packages").flags.marked_for_install);
    assert!(view(&packages, "Java 2019 core-packages").flags.marked_for_install);
    assert!(view(&packages, "Java 2019 core-packages").flags.marked_for_download);
}

#[test]
fn test_hidden_option_is_refused() {
    let temp = TempDir::new().unwrap();
    let (mut session, _) = session_with(
        &temp,
        upgrade_system(),
        FakeDownloader::default(),
        FakeBackend::default(),
    );

    // Java is never removable.
    let java = id_of(&session, "Java 2019 core-packages");
    let err = session.request_removal(java, true).unwrap_err();
    assert!(matches!(err, AppError::NotAllowed(_)));

    let err = session.request_install(9999, true).unwrap_err();
    assert!(matches!(err, AppError::NotAllowed(_)));
}

#[test]
fn test_newer_than_catalog_blocks_session() {
    let temp = TempDir::new().unwrap();
    let system = FakeSystem {
        java: Some("2019".to_string()),
        office: vec![InstalledOffice::new(Family::LibreOffice, "7.7.0.1", Vec::<String>::new())],
        clipart: None,
    };
    let (mut session, _) = session_with(
        &temp,
        system,
        FakeDownloader::default(),
        FakeBackend::default(),
    );

    assert!(session.inventory().is_blocked());
    let core = id_of(&session, "LibreOffice 7.7.0.1 core-packages");
    assert!(matches!(
        session.request_removal(core, true),
        Err(AppError::Blocked(_))
    ));
    assert!(matches!(
        session.apply_changes(false, false, Arc::new(NullSink), CancellationToken::new()),
        Err(AppError::Blocked(_))
    ));
}

// ============================================================================
// Network procedure
// ============================================================================

#[test]
fn test_upgrade_runs_every_step_in_order() {
    let temp = TempDir::new().unwrap();
    let backend = FakeBackend::with_installed(&[
        "task-java",
        "libreoffice7.5",
        "libreoffice7.5-fr",
        "libobasis7.5-core",
        "libobasis7.5-fr",
    ]);
    let (mut session, fakes) =
        session_with(&temp, upgrade_system(), FakeDownloader::default(), backend);

    let new_core = id_of(&session, "LibreOffice 7.6.4.1 core-packages");
    session.request_install(new_core, true).unwrap();

    let sink = Arc::new(RecordingSink::new());
    let report = session
        .apply_changes(false, false, sink.clone(), CancellationToken::new())
        .unwrap();

    // Core and French archives were fetched, extracted and installed.
    assert_eq!(fakes.downloader.downloaded.lock().unwrap().len(), 2);
    assert_eq!(fakes.extractor.extracted.lock().unwrap().len(), 2);
    let installed = fakes.backend.installed_files();
    assert_eq!(installed.len(), 2);
    assert!(installed.iter().all(|f| !f.contains("kde-integration")));

    // Only the 7.5 packages went away.
    let mut removed = fakes.backend.removed();
    removed.sort();
    assert_eq!(
        removed,
        vec![
            "libobasis7.5-core",
            "libobasis7.5-fr",
            "libreoffice7.5",
            "libreoffice7.5-fr",
        ]
    );

    assert_eq!(
        report.skipped,
        vec![
            Step::InstallJava,
            Step::RemoveClipart,
            Step::InstallClipart,
            Step::PersistPackages,
        ]
    );

    // Every step reports start and end, skipped ones included.
    let events = sink.events();
    let overall: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            ProgressEvent::Overall { step, total, .. } => {
                assert_eq!(*total, Step::ALL.len());
                Some(*step)
            }
            _ => None,
        })
        .collect();
    assert_eq!(overall, (1..=Step::ALL.len()).collect::<Vec<_>>());
    let finished_skipped = events
        .iter()
        .filter(|e| matches!(e, ProgressEvent::StepFinished { skipped: true, .. }))
        .count();
    assert_eq!(finished_skipped, 4);

    // Staging is gone after the run.
    assert!(!temp.path().join("staging").exists());
    // The inventory was rebuilt, so the selection is gone.
    assert!(session.planned_changes().to_install.is_empty());
}

#[test]
fn test_kept_packages_use_local_copy_layout() {
    let temp = TempDir::new().unwrap();
    let (mut session, _) = session_with(
        &temp,
        FakeSystem::default(),
        FakeDownloader::default(),
        FakeBackend::default(),
    );

    let lang = id_of(&session, "LibreOffice 7.6.4.1 fr");
    session.request_install(lang, true).unwrap();
    let report = session
        .apply_changes(true, false, Arc::new(NullSink), CancellationToken::new())
        .unwrap();
    assert!(report.completed.contains(&Step::PersistPackages));

    let kept = temp.path().join("kept");
    assert!(kept
        .join("Java_rpms/task-java-2019-1pclos2019.noarch.rpm")
        .exists());
    assert!(kept
        .join("LibreOffice-core_tgzs/LibreOffice_7.6.4.1_Linux_x86-64_rpm.tar.gz")
        .exists());
    assert!(kept
        .join("LibreOffice-langs_tgzs/LibreOffice_7.6.4.1_Linux_x86-64_rpm_langpack_fr.tar.gz")
        .exists());
}

#[test]
fn test_empty_plan_skips_every_working_step() {
    let temp = TempDir::new().unwrap();
    let (mut session, fakes) = session_with(
        &temp,
        upgrade_system(),
        FakeDownloader::default(),
        FakeBackend::default(),
    );

    let report = session
        .apply_changes(false, false, Arc::new(NullSink), CancellationToken::new())
        .unwrap();
    assert_eq!(report.completed, vec![Step::Preflight, Step::CleanUp]);
    assert!(fakes.backend.installed_files().is_empty());
}

#[test]
fn test_partial_removal_needs_manual_intervention() {
    let temp = TempDir::new().unwrap();
    let backend = FakeBackend {
        stuck: vec!["libreoffice7.5-fr".to_string()],
        ..FakeBackend::with_installed(&["libreoffice7.5", "libreoffice7.5-fr"])
    };
    let (mut session, _) =
        session_with(&temp, upgrade_system(), FakeDownloader::default(), backend);

    let core = id_of(&session, "LibreOffice 7.5.9.2 core-packages");
    session.request_removal(core, true).unwrap();
    let sink = Arc::new(RecordingSink::new());
    let err = session
        .apply_changes(false, false, sink.clone(), CancellationToken::new())
        .unwrap_err();

    assert_eq!(err.procedure_class(), Some(ErrorClass::PartialMutation));
    assert!(err.to_string().contains("libreoffice7.5-fr"));
    assert!(err.to_string().contains("manual intervention likely required"));

    // The failing step still reports its end before clean-up runs.
    let events = sink.events();
    let started = events
        .iter()
        .filter(|e| matches!(e, ProgressEvent::StepStarted { .. }))
        .count();
    let ended = events
        .iter()
        .filter(|e| {
            matches!(
                e,
                ProgressEvent::StepFinished { .. } | ProgressEvent::StepFailed { .. }
            )
        })
        .count();
    assert_eq!(started, ended);
    let failed: Vec<&ProgressEvent> = events
        .iter()
        .filter(|e| matches!(e, ProgressEvent::StepFailed { .. }))
        .collect();
    assert_eq!(
        failed,
        vec![&ProgressEvent::StepFailed {
            label: Step::RemoveOffice.label().to_string()
        }]
    );
}

#[test]
fn test_cancellation_between_downloads() {
    let temp = TempDir::new().unwrap();
    let cancel = CancellationToken::new();
    let downloader = FakeDownloader {
        cancel_after_first: Some(cancel.clone()),
        ..Default::default()
    };
    let (mut session, fakes) =
        session_with(&temp, FakeSystem::default(), downloader, FakeBackend::default());

    let core = id_of(&session, "LibreOffice 7.6.4.1 core-packages");
    session.request_install(core, true).unwrap();
    let err = session
        .apply_changes(false, false, Arc::new(NullSink), cancel)
        .unwrap_err();

    assert!(matches!(err, AppError::Procedure(ProcedureError::Cancelled)));
    assert_eq!(fakes.downloader.downloaded.lock().unwrap().len(), 1);
    assert!(fakes.backend.installed_files().is_empty());
    assert!(!temp.path().join("staging").exists());
}

// ============================================================================
// Local copy
// ============================================================================

#[test]
fn test_local_copy_core_without_java_fails_without_mutation() {
    let temp = TempDir::new().unwrap();
    let copy = temp.path().join("copy");
    write_file(&copy.join("LibreOffice-core_tgzs/LibreOffice_7.6.4.1_Linux_x86-64_rpm.tar.gz"));

    let (mut session, fakes) = session_with(
        &temp,
        FakeSystem::default(),
        FakeDownloader::default(),
        FakeBackend::default(),
    );
    let sink = Arc::new(RecordingSink::new());
    let err = session
        .install_from_local_copy(&copy, sink.clone(), CancellationToken::new())
        .unwrap_err();

    assert_eq!(err.procedure_class(), Some(ErrorClass::Resource));
    assert!(err.to_string().contains("Java"));
    assert!(fakes.backend.installed_files().is_empty());
    assert!(fakes.backend.removed().is_empty());
    assert!(sink.events().is_empty());
}

#[test]
fn test_local_copy_skips_mismatched_language() {
    let temp = TempDir::new().unwrap();
    let copy = temp.path().join("copy");
    write_file(&copy.join("LibreOffice-core_tgzs/LibreOffice_7.6.4.1_Linux_x86-64_rpm.tar.gz"));
    write_file(&copy.join(
        "LibreOffice-langs_tgzs/LibreOffice_7.5.9.2_Linux_x86-64_rpm_langpack_de.tar.gz",
    ));

    let system = FakeSystem {
        java: Some("2019".to_string()),
        ..Default::default()
    };
    let (mut session, fakes) = session_with(
        &temp,
        system,
        FakeDownloader::default(),
        FakeBackend::default(),
    );
    let report = session
        .install_from_local_copy(&copy, Arc::new(NullSink), CancellationToken::new())
        .unwrap();

    assert_eq!(
        *fakes.extractor.extracted.lock().unwrap(),
        vec!["LibreOffice_7.6.4.1_Linux_x86-64_rpm.tar.gz".to_string()]
    );
    assert!(report.warnings.iter().any(|w| w.contains("7.5.9.2")));
    assert!(report.skipped.contains(&Step::CollectPackages));
    assert!(report.skipped.contains(&Step::PersistPackages));
    // Files stay where the user keeps them.
    assert!(copy
        .join("LibreOffice-core_tgzs/LibreOffice_7.6.4.1_Linux_x86-64_rpm.tar.gz")
        .exists());
    assert!(fakes.downloader.downloaded.lock().unwrap().is_empty());
}

#[test]
fn test_local_copy_installs_java_first() {
    let temp = TempDir::new().unwrap();
    let copy = temp.path().join("copy");
    write_file(&copy.join("Java_rpms/task-java-2019-1pclos2019.noarch.rpm"));
    write_file(&copy.join("LibreOffice-core_tgzs/LibreOffice_7.6.4.1_Linux_x86-64_rpm.tar.gz"));

    let (mut session, fakes) = session_with(
        &temp,
        FakeSystem::default(),
        FakeDownloader::default(),
        FakeBackend::default(),
    );
    let report = session
        .install_from_local_copy(&copy, Arc::new(NullSink), CancellationToken::new())
        .unwrap();

    assert!(report.completed.contains(&Step::InstallJava));
    let installed = fakes.backend.installed_files();
    assert_eq!(installed[0], "task-java-2019-1pclos2019.noarch.rpm");
    assert!(temp
        .path()
        .join("apt-cache/task-java-2019-1pclos2019.noarch.rpm")
        .exists());
}

#[test]
fn test_empty_local_copy_is_unusable() {
    let temp = TempDir::new().unwrap();
    let copy = temp.path().join("copy");
    fs::create_dir_all(&copy).unwrap();

    let (mut session, _) = session_with(
        &temp,
        upgrade_system(),
        FakeDownloader::default(),
        FakeBackend::default(),
    );
    let err = session
        .install_from_local_copy(&copy, Arc::new(NullSink), CancellationToken::new())
        .unwrap_err();
    assert_eq!(err.procedure_class(), Some(ErrorClass::Resource));
}

// ============================================================================
// Worker task
// ============================================================================

#[test]
fn test_task_streams_events_and_returns_session() {
    let temp = TempDir::new().unwrap();
    let (mut session, fakes) = session_with(
        &temp,
        FakeSystem::default(),
        FakeDownloader::default(),
        FakeBackend::default(),
    );
    let core = id_of(&session, "LibreOffice 7.6.4.1 core-packages");
    session.request_install(core, true).unwrap();

    let mut task = ProcedureTask::spawn(
        session,
        ProcedureRequest::ApplyChanges {
            keep_packages: false,
            force_java_download: false,
        },
    )
    .unwrap();

    let mut events = Vec::new();
    while let Some(event) = task.events().blocking_recv() {
        events.push(event);
    }
    let outcome = task.join().unwrap();

    let report = outcome.result.unwrap();
    assert!(report.completed.contains(&Step::InstallOffice));
    assert!(events
        .iter()
        .any(|e| matches!(e, ProgressEvent::StepStarted { label } if label == "Collecting packages")));
    // Java and the core were installed by the worker.
    assert_eq!(fakes.backend.installed_files().len(), 2);
    // The session is usable again.
    assert!(!outcome.session.packages().is_empty());
}

#[test]
fn test_task_cancelled_before_first_step() {
    let temp = TempDir::new().unwrap();
    let copy = temp.path().join("copy");
    write_file(&copy.join("Java_rpms/task-java-2019-1pclos2019.noarch.rpm"));
    write_file(&copy.join("LibreOffice-core_tgzs/LibreOffice_7.6.4.1_Linux_x86-64_rpm.tar.gz"));
    let (session, fakes) = session_with(
        &temp,
        FakeSystem::default(),
        FakeDownloader::default(),
        FakeBackend::default(),
    );

    let task = ProcedureTask::spawn(session, ProcedureRequest::LocalCopy(copy)).unwrap();
    task.cancel();
    let outcome = task.join().unwrap();

    // Either the worker saw the token before a step or it had already
    // finished; in both cases the session comes back.
    match outcome.result {
        Err(err) => assert_eq!(err.procedure_class(), Some(ErrorClass::Cancelled)),
        Ok(report) => {
            assert!(report.completed.contains(&Step::CleanUp));
            assert_eq!(fakes.backend.installed_files().len(), 2);
        }
    }
    assert!(!outcome.session.packages().is_empty());
}
