//! Session error types.

use std::fmt;

use crate::config::ConfigError;
use crate::inventory::InventoryError;
use crate::manager::{ErrorClass, ManagerError, ProcedureError};
use crate::selection::SelectionError;

/// Errors returned by [`Session`](super::Session) operations.
#[derive(Debug)]
pub enum AppError {
    /// The configuration file could not be loaded.
    Config(ConfigError),

    /// The package tree could not be built.
    Inventory(InventoryError),

    /// A selection request was rejected by the rules.
    Selection(SelectionError),

    /// The requested option is hidden or disabled for this package.
    NotAllowed(String),

    /// The session refuses every change until the next refresh.
    Blocked(String),

    /// Collaborator setup or local-copy scan failed.
    Manager(ManagerError),

    /// The install/uninstall procedure failed.
    Procedure(ProcedureError),

    /// The worker thread ended without handing the session back.
    Worker(String),
}

impl AppError {
    /// Procedure outcome class, when this error came from a run.
    pub fn procedure_class(&self) -> Option<ErrorClass> {
        match self {
            AppError::Procedure(e) => Some(e.classification()),
            _ => None,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(e) => write!(f, "Configuration error: {}", e),
            AppError::Inventory(e) => write!(f, "Could not build the package list: {}", e),
            AppError::Selection(e) => write!(f, "Selection rejected: {}", e),
            AppError::NotAllowed(msg) => write!(f, "Not allowed: {}", msg),
            AppError::Blocked(msg) => write!(f, "Changes are blocked: {}", msg),
            AppError::Manager(e) => write!(f, "{}", e),
            AppError::Procedure(e) => write!(f, "{}", e),
            AppError::Worker(msg) => write!(f, "Worker thread failed: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(e) => Some(e),
            AppError::Inventory(e) => Some(e),
            AppError::Selection(e) => Some(e),
            AppError::Manager(e) => Some(e),
            AppError::Procedure(e) => Some(e),
            AppError::NotAllowed(_) | AppError::Blocked(_) | AppError::Worker(_) => None,
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::Config(e)
    }
}

impl From<InventoryError> for AppError {
    fn from(e: InventoryError) -> Self {
        AppError::Inventory(e)
    }
}

impl From<SelectionError> for AppError {
    fn from(e: SelectionError) -> Self {
        AppError::Selection(e)
    }
}

impl From<ManagerError> for AppError {
    fn from(e: ManagerError) -> Self {
        AppError::Manager(e)
    }
}

impl From<ProcedureError> for AppError {
    fn from(e: ProcedureError) -> Self {
        AppError::Procedure(e)
    }
}
