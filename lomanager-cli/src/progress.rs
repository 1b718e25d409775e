//! Terminal progress for a running procedure.
//!
//! Two bars follow the two event granularities: the overall bar counts
//! steps, the step bar shows percent within the current step.
//! Ctrl-C cancels the task; the procedure stops at the next step or file
//! boundary.

use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use lomanager::manager::{ProcedureReport, ProgressEvent};
use lomanager::task::{ProcedureTask, TaskOutcome};
use tracing::warn;

use crate::error::CliError;

/// Drive `task` to completion, rendering its events.
pub fn follow(mut task: ProcedureTask) -> Result<TaskOutcome, CliError> {
    let token = task.cancellation_token();
    if let Err(e) = ctrlc::set_handler(move || {
        eprintln!("\nCancelling, waiting for the current step to stop...");
        token.cancel();
    }) {
        warn!(error = %e, "Ctrl-C handler not installed");
    }

    let bars = Bars::new();
    while let Some(event) = task.events().blocking_recv() {
        bars.handle(event);
    }
    bars.finish();

    Ok(task.join()?)
}

struct Bars {
    _multi: MultiProgress,
    overall: ProgressBar,
    step: ProgressBar,
}

impl Bars {
    fn new() -> Self {
        let multi = MultiProgress::new();
        let overall = multi.add(ProgressBar::new(0));
        overall.set_style(
            ProgressStyle::default_bar()
                .template("{prefix:>12.bold} [{bar:30.green/dim}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("━━─"),
        );
        overall.set_prefix("Overall");

        let step = multi.add(ProgressBar::new(100));
        step.set_style(
            ProgressStyle::default_bar()
                .template("{prefix:>12.bold} [{bar:30.cyan/dim}] {pos:>3}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("━━─"),
        );
        step.set_prefix("Step");

        Self {
            _multi: multi,
            overall,
            step,
        }
    }

    fn handle(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Overall { step, total, label } => {
                self.overall.set_length(total as u64);
                self.overall.set_position(step as u64);
                self.overall.set_message(label);
            }
            ProgressEvent::StepStarted { label } => {
                self.step.set_position(0);
                self.step.set_message(label);
            }
            ProgressEvent::StepProgress { percent, label } => {
                self.step.set_position(u64::from(percent.min(100)));
                if let Some(label) = label {
                    self.step.set_message(label);
                }
            }
            ProgressEvent::StepFinished { label, skipped } => {
                self.step.set_position(100);
                if skipped {
                    self.step.println(format!("  {} {}", style("skipped").dim(), label));
                } else {
                    self.step.println(format!("  {} {}", style("done").green(), label));
                }
            }
            ProgressEvent::StepFailed { label } => {
                self.step.println(format!("  {} {}", style("failed").red(), label));
            }
        }
    }

    fn finish(&self) {
        self.step.finish_and_clear();
        self.overall.finish_and_clear();
    }
}

/// Print what a successful run did.
pub fn print_report(report: &ProcedureReport) {
    println!(
        "{} {} steps completed, {} skipped",
        style("Finished:").green().bold(),
        report.completed.len(),
        report.skipped.len()
    );
    for warning in &report.warnings {
        println!("{} {}", style("Warning:").yellow(), warning);
    }
}
