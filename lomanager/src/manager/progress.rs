//! Progress events of the procedure.
//!
//! Two granularities travel through one tagged union: fine progress inside
//! a step (0-100 with an optional sub-label) and coarse progress over the
//! whole pipeline (step counter).

use std::sync::Mutex;

use tokio::sync::mpsc::UnboundedSender;

/// One progress notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Overall pipeline progress, emitted when a step begins.
    Overall {
        /// 1-based index of the current step.
        step: usize,
        /// Number of steps in the pipeline.
        total: usize,
        label: String,
    },
    /// A step started.
    StepStarted { label: String },
    /// Fine progress inside the current step.
    StepProgress { percent: u8, label: Option<String> },
    /// A step ended. Skipped steps still produce this event.
    StepFinished { label: String, skipped: bool },
    /// A step ended with an error. No further step follows except clean-up.
    StepFailed { label: String },
}

/// Receiver of progress events.
pub trait ProgressSink: Send + Sync {
    /// Deliver one event. Must not block.
    fn emit(&self, event: ProgressEvent);
}

/// Sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&self, _event: ProgressEvent) {}
}

impl ProgressSink for UnboundedSender<ProgressEvent> {
    fn emit(&self, event: ProgressEvent) {
        // The receiver going away only means nobody is watching.
        let _ = self.send(event);
    }
}

/// Sink that stores events in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingSink {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every event received so far.
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl ProgressSink for RecordingSink {
    fn emit(&self, event: ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
