//! `lomanager apply`: mark packages and run the procedure.

use lomanager::app::AppConfig;
use lomanager::task::{ProcedureRequest, ProcedureTask};
use tracing::info;

use super::{apply_selection, confirm, open_session, print_plan, ApplyOptions, SelectionArgs};
use crate::error::CliError;
use crate::progress;

/// Run the apply command.
pub fn run(
    config: AppConfig,
    selection: &SelectionArgs,
    options: ApplyOptions,
) -> Result<(), CliError> {
    let mut session = open_session(config)?;
    apply_selection(&mut session, selection)?;

    let planned = session.planned_changes();
    print_plan(&planned);
    if planned.to_install.is_empty() && planned.to_remove.is_empty() && !options.keep_packages {
        return Ok(());
    }
    println!();

    if !confirm("Apply these changes?", options.assume_yes)? {
        println!("Nothing changed.");
        return Ok(());
    }

    info!(
        installs = planned.to_install.len(),
        removals = planned.to_remove.len(),
        "Starting procedure"
    );
    let task = ProcedureTask::spawn(
        session,
        ProcedureRequest::ApplyChanges {
            keep_packages: options.keep_packages,
            force_java_download: options.force_java_download,
        },
    )?;
    let outcome = progress::follow(task)?;
    let report = outcome.result?;
    progress::print_report(&report);
    Ok(())
}
