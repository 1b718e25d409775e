//! CLI command implementations.

pub mod apply;
pub mod local_copy;
pub mod plan;
pub mod status;

use clap::Args;
use console::style;
use dialoguer::Confirm;
use lomanager::app::{AppConfig, Session};
use lomanager::changeset::PlannedChanges;
use lomanager::config::format_size;
use tracing::debug;

use crate::error::CliError;

// Package ids to mark, as listed by `lomanager status`.
#[derive(Debug, Clone, Default, Args)]
pub struct SelectionArgs {
    /// Mark package ID for install (repeatable)
    #[arg(long = "install", value_name = "ID")]
    pub install: Vec<usize>,

    /// Mark package ID for removal (repeatable)
    #[arg(long = "remove", value_name = "ID")]
    pub remove: Vec<usize>,
}

impl SelectionArgs {
    pub fn is_empty(&self) -> bool {
        self.install.is_empty() && self.remove.is_empty()
    }
}

/// Flags of `lomanager apply`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyOptions {
    pub keep_packages: bool,
    pub force_java_download: bool,
    pub assume_yes: bool,
}

/// Open a session and print why it cannot change anything, if so.
pub fn open_session(config: AppConfig) -> Result<Session, CliError> {
    let session = Session::open(config)?;
    for warning in &session.inventory().warnings {
        eprintln!("{} {}", style("Warning:").yellow(), warning);
    }
    Ok(session)
}

/// Mark every requested id, removals first.
///
/// Removals go first so that the old version of an upgrade is already
/// marked when the new core is requested.
pub fn apply_selection(session: &mut Session, selection: &SelectionArgs) -> Result<(), CliError> {
    for &id in &selection.remove {
        debug!(id, "Marking for removal");
        session.request_removal(id, true)?;
    }
    for &id in &selection.install {
        debug!(id, "Marking for install");
        session.request_install(id, true)?;
    }
    Ok(())
}

/// Print the planned changes in human-readable form.
pub fn print_plan(planned: &PlannedChanges) {
    if planned.to_install.is_empty() && planned.to_remove.is_empty() {
        println!("No changes selected.");
        return;
    }

    if !planned.to_remove.is_empty() {
        println!("{}", style("To be removed:").bold());
        for label in &planned.to_remove {
            println!("  {} {}", style("-").red(), label);
        }
    }
    if !planned.to_install.is_empty() {
        println!("{}", style("To be installed:").bold());
        for label in &planned.to_install {
            println!("  {} {}", style("+").green(), label);
        }
    }
    println!();
    println!(
        "Space needed: {}, space freed: {}",
        format_size(planned.space_to_be_used),
        format_size(planned.space_to_be_freed)
    );
}

/// Ask before changing the system, unless `assume_yes`.
pub fn confirm(prompt: &str, assume_yes: bool) -> Result<bool, CliError> {
    if assume_yes {
        return Ok(true);
    }
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| CliError::Prompt(e.to_string()))
}

/// Serialize `value` as pretty JSON on stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| CliError::Output(e.to_string()))?;
    println!("{}", text);
    Ok(())
}
