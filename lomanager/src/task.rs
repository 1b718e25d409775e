//! Running a procedure off the caller's thread.
//!
//! The session is moved into a dedicated worker thread and handed back by
//! [`ProcedureTask::join`]. While the worker holds it, no second procedure
//! can start.
//!
//! ```text
//!  caller                         worker thread
//!  ──────                         ─────────────
//!  spawn(session, request) ─────► session.apply_changes(..)
//!  events().blocking_recv() ◄──── ProgressEvent (unbounded channel)
//!  cancel() ───────────────────►  CancellationToken, checked between
//!                                  steps and between files
//!  join() ◄────────────────────── (Session, Result<ProcedureReport, _>)
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::app::{AppError, Session};
use crate::manager::{ProcedureReport, ProgressEvent, ProgressSink};

/// What the worker should run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcedureRequest {
    /// Apply the current selection.
    ApplyChanges {
        keep_packages: bool,
        force_java_download: bool,
    },
    /// Install from a local copy directory.
    LocalCopy(PathBuf),
}

/// The session handed back by the worker, with the run's result.
pub struct TaskOutcome {
    pub session: Session,
    pub result: Result<ProcedureReport, AppError>,
}

/// A procedure running on a worker thread.
pub struct ProcedureTask {
    handle: JoinHandle<TaskOutcome>,
    events: UnboundedReceiver<ProgressEvent>,
    cancel: CancellationToken,
}

impl ProcedureTask {
    /// Move `session` to a new thread and start `request` there.
    pub fn spawn(session: Session, request: ProcedureRequest) -> Result<Self, AppError> {
        let (tx, events) = mpsc::unbounded_channel::<ProgressEvent>();
        let cancel = CancellationToken::new();
        let worker_cancel = cancel.clone();

        let handle = thread::Builder::new()
            .name("lomanager-procedure".to_string())
            .spawn(move || {
                let mut session = session;
                let sink: Arc<dyn ProgressSink> = Arc::new(tx);
                debug!(?request, "Procedure worker started");
                let result = match request {
                    ProcedureRequest::ApplyChanges {
                        keep_packages,
                        force_java_download,
                    } => session.apply_changes(
                        keep_packages,
                        force_java_download,
                        sink,
                        worker_cancel,
                    ),
                    ProcedureRequest::LocalCopy(dir) => {
                        session.install_from_local_copy(&dir, sink, worker_cancel)
                    }
                };
                TaskOutcome { session, result }
            })
            .map_err(|e| AppError::Worker(e.to_string()))?;

        Ok(Self {
            handle,
            events,
            cancel,
        })
    }

    /// Progress events. The channel closes when the worker is done.
    pub fn events(&mut self) -> &mut UnboundedReceiver<ProgressEvent> {
        &mut self.events
    }

    /// Request cooperative cancellation.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A token that cancels this task, for signal handlers.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the worker and take the session back.
    pub fn join(self) -> Result<TaskOutcome, AppError> {
        self.handle
            .join()
            .map_err(|_| AppError::Worker("procedure worker panicked".to_string()))
    }
}
