//! CLI error type and exit codes.

use std::fmt;

use lomanager::app::AppError;
use lomanager::config::ConfigError;
use lomanager::log::LoggingError;
use lomanager::manager::ErrorClass;

/// Exit code when changes were refused.
pub const EXIT_BLOCKED: u8 = 2;
/// Exit code when a resource (space, network, local copy) was unusable.
pub const EXIT_RESOURCE: u8 = 3;
/// Exit code when the system was left half-changed.
pub const EXIT_PARTIAL: u8 = 4;
/// Exit code after Ctrl-C, as a shell would report SIGINT.
pub const EXIT_CANCELLED: u8 = 130;

/// Errors surfaced by CLI commands.
#[derive(Debug)]
pub enum CliError {
    /// The configuration file given on the command line is unusable.
    Config(ConfigError),
    /// Logging could not be set up.
    Logging(LoggingError),
    /// A session operation failed.
    App(AppError),
    /// Writing output failed.
    Output(String),
    /// The confirmation prompt could not be shown.
    Prompt(String),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::App(AppError::Blocked(_)) => EXIT_BLOCKED,
            CliError::App(AppError::Manager(e)) if e.is_resource_error() => EXIT_RESOURCE,
            CliError::App(e) => match e.procedure_class() {
                Some(ErrorClass::Blocked) | Some(ErrorClass::Consistency) => EXIT_BLOCKED,
                Some(ErrorClass::Resource) => EXIT_RESOURCE,
                Some(ErrorClass::PartialMutation) => EXIT_PARTIAL,
                Some(ErrorClass::Cancelled) => EXIT_CANCELLED,
                Some(ErrorClass::Failed) | None => 1,
            },
            _ => 1,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(e) => write!(f, "{}", e),
            CliError::Logging(e) => write!(f, "Failed to set up logging: {}", e),
            CliError::App(e) => write!(f, "{}", e),
            CliError::Output(msg) => write!(f, "Failed to write output: {}", msg),
            CliError::Prompt(msg) => write!(f, "Failed to read confirmation: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Logging(e) => Some(e),
            CliError::App(e) => Some(e),
            CliError::Output(_) | CliError::Prompt(_) => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e)
    }
}

impl From<AppError> for CliError {
    fn from(e: AppError) -> Self {
        CliError::App(e)
    }
}
