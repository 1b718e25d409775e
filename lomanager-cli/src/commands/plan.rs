//! `lomanager plan`: preview a selection.

use lomanager::app::AppConfig;

use super::{apply_selection, open_session, print_json, print_plan, SelectionArgs};
use crate::error::CliError;

/// Run the plan command. Nothing on the system changes.
pub fn run(config: AppConfig, selection: &SelectionArgs, json: bool) -> Result<(), CliError> {
    let mut session = open_session(config)?;
    apply_selection(&mut session, selection)?;
    let planned = session.planned_changes();

    if json {
        return print_json(&planned);
    }
    print_plan(&planned);
    Ok(())
}
