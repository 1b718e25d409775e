//! `lomanager local-copy`: install from a directory of saved packages.

use std::path::Path;

use console::style;
use lomanager::app::AppConfig;
use lomanager::task::{ProcedureRequest, ProcedureTask};

use super::{confirm, open_session};
use crate::error::CliError;
use crate::progress;

/// Run the local-copy command.
pub fn run(config: AppConfig, dir: &Path, assume_yes: bool) -> Result<(), CliError> {
    let session = open_session(config)?;

    println!(
        "Installing usable packages found in {}",
        style(dir.display()).bold()
    );
    if !confirm("Continue?", assume_yes)? {
        println!("Nothing changed.");
        return Ok(());
    }

    let task = ProcedureTask::spawn(session, ProcedureRequest::LocalCopy(dir.to_path_buf()))?;
    let outcome = progress::follow(task)?;
    let report = outcome.result?;
    progress::print_report(&report);
    Ok(())
}
