//! Error types for the install/uninstall procedure and its collaborators.

use std::io;
use std::path::PathBuf;

/// Result type for manager operations.
pub type ManagerResult<T> = Result<T, ManagerError>;

/// Errors raised by downloads, archive handling and the OS package manager.
#[derive(Debug)]
pub enum ManagerError {
    /// Failed to read a file or directory.
    ReadFailed { path: PathBuf, source: io::Error },

    /// Failed to write a file or directory.
    WriteFailed { path: PathBuf, source: io::Error },

    /// Failed to create a directory.
    CreateDirFailed { path: PathBuf, source: io::Error },

    /// Failed to download a file.
    DownloadFailed { url: String, reason: String },

    /// Network timeout.
    Timeout { url: String, timeout_secs: u64 },

    /// Checksum verification failed.
    ChecksumMismatch {
        filename: String,
        expected: String,
        actual: String,
    },

    /// A checksum file could not be understood.
    InvalidChecksumFile { url: String, reason: String },

    /// Archive extraction failed.
    ExtractionFailed { path: PathBuf, reason: String },

    /// An external command could not be run or failed.
    CommandFailed { command: String, reason: String },

    /// The package manager's dry run refused the transaction.
    DryRunRejected { command: String, reason: String },

    /// Invalid configuration.
    InvalidConfig(String),

    /// The operation was cancelled.
    Cancelled,
}

impl std::fmt::Display for ManagerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReadFailed { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            Self::WriteFailed { path, source } => {
                write!(f, "failed to write {}: {}", path.display(), source)
            }
            Self::CreateDirFailed { path, source } => {
                write!(
                    f,
                    "failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::DownloadFailed { url, reason } => {
                write!(f, "failed to download {}: {}", url, reason)
            }
            Self::Timeout { url, timeout_secs } => {
                write!(f, "request to {} timed out after {}s", url, timeout_secs)
            }
            Self::ChecksumMismatch {
                filename,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "checksum mismatch for {}: expected {}, got {}",
                    filename, expected, actual
                )
            }
            Self::InvalidChecksumFile { url, reason } => {
                write!(f, "invalid checksum file {}: {}", url, reason)
            }
            Self::ExtractionFailed { path, reason } => {
                write!(f, "failed to extract {}: {}", path.display(), reason)
            }
            Self::CommandFailed { command, reason } => {
                write!(f, "{} failed: {}", command, reason)
            }
            Self::DryRunRejected { command, reason } => {
                write!(f, "{} dry run refused the transaction: {}", command, reason)
            }
            Self::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            Self::Cancelled => write!(f, "operation cancelled"),
        }
    }
}

impl std::error::Error for ManagerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadFailed { source, .. } => Some(source),
            Self::WriteFailed { source, .. } => Some(source),
            Self::CreateDirFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl ManagerError {
    /// Whether the failure is about a missing or bad resource (network,
    /// checksum) rather than a failed system mutation.
    pub fn is_resource_error(&self) -> bool {
        matches!(
            self,
            Self::DownloadFailed { .. }
                | Self::Timeout { .. }
                | Self::ChecksumMismatch { .. }
                | Self::InvalidChecksumFile { .. }
        )
    }
}

/// How a failed procedure left the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Refused before anything ran.
    Blocked,
    /// A resource was missing or bad (space, network, checksum).
    Resource,
    /// Some but not all of a mutation happened.
    PartialMutation,
    /// Installed software is inconsistent with the catalog.
    Consistency,
    /// Stopped on request.
    Cancelled,
    /// A step failed outright.
    Failed,
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Blocked => "blocked",
            Self::Resource => "resource unavailable",
            Self::PartialMutation => "manual intervention likely required",
            Self::Consistency => "inconsistent installation",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        };
        write!(f, "{}", text)
    }
}

/// Terminal outcome of a failed procedure.
///
/// The message is meant to be shown to the user verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProcedureError {
    /// Policy or missing options refused the procedure.
    #[error("{0}")]
    Blocked(String),

    /// Missing space, unreachable URL, bad checksum or unusable local copy.
    #[error("{0}")]
    Resource(String),

    /// A removal or install only partly happened.
    #[error("{step}: {message} (manual intervention likely required)")]
    PartialMutation { step: String, message: String },

    /// The session is in a fatal consistency state.
    #[error("{0}")]
    Consistency(String),

    /// Cancelled between steps or files.
    #[error("operation cancelled")]
    Cancelled,

    /// A step failed and left its part of the system unchanged.
    #[error("{step} failed: {message}")]
    Failed { step: String, message: String },
}

impl ProcedureError {
    /// Classification of the failure.
    pub fn classification(&self) -> ErrorClass {
        match self {
            Self::Blocked(_) => ErrorClass::Blocked,
            Self::Resource(_) => ErrorClass::Resource,
            Self::PartialMutation { .. } => ErrorClass::PartialMutation,
            Self::Consistency(_) => ErrorClass::Consistency,
            Self::Cancelled => ErrorClass::Cancelled,
            Self::Failed { .. } => ErrorClass::Failed,
        }
    }

    /// Map a collaborator error raised during `step`.
    pub fn from_step(step: &str, err: ManagerError) -> Self {
        match err {
            ManagerError::Cancelled => Self::Cancelled,
            e if e.is_resource_error() => Self::Resource(e.to_string()),
            e => Self::Failed {
                step: step.to_string(),
                message: e.to_string(),
            },
        }
    }
}
