//! Install/uninstall procedure and its collaborators.
//!
//! The procedure turns a [`ProcedurePlan`] (a snapshot of the tree flags,
//! or a scanned local copy) into changes on the system. Everything that
//! touches the outside world goes through a trait so tests can run the
//! whole pipeline against fakes.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Procedure                                                    │
//! │                                                              │
//! │  ProcedurePlan ──► steps ──► ProgressSink (events)           │
//! │                      │                                       │
//! │                      ├── PackageDownloader  (HttpDownloader) │
//! │                      ├── ArchiveExtractor   (ShellExtractor) │
//! │                      ├── PackageBackend     (AptRpmBackend)  │
//! │                      ├── SystemInspector    (LinuxInspector) │
//! │                      ├── RemovalRecipe      (rpm name globs) │
//! │                      └── Fixups             (post-install)   │
//! └──────────────────────────────────────────────────────────────┘
//! ```

mod backend;
mod config;
mod download;
mod error;
mod extractor;
mod fixups;
mod local_copy;
mod plan;
mod procedure;
mod progress;
mod recipes;
mod traits;

pub use backend::AptRpmBackend;
pub use config::ManagerConfig;
pub use download::{
    calculate_file_checksum, download_with_retry, parse_checksum_file,
    verify_against_checksum_file, verify_checksum, DownloadItem, DownloadState, HttpDownloader,
};
pub use error::{ErrorClass, ManagerError, ManagerResult, ProcedureError};
pub use extractor::{
    filter_unwanted, find_rpms, is_unwanted_package, ShellExtractor, UNWANTED_PACKAGE_PATTERNS,
};
pub use fixups::{disable_update_check, normalize_categories, FixupReport, Fixups};
pub use local_copy::{plan_local_copy, scan_local_copy, LocalCopyPlan, LocalCopyScan};
pub use plan::{PackageSource, ProcedurePlan, StagedFiles, StagedPackage};
pub use procedure::{
    Collaborators, Procedure, ProcedureReport, Step, StepOutcome, QUICKSTARTER_PROCESSES,
};
pub use progress::{NullSink, ProgressEvent, ProgressSink, RecordingSink};
pub use recipes::{names_to_remove, RemovalRecipe};
pub use traits::{ArchiveExtractor, PackageBackend, PackageDownloader, ProgressCallback};
