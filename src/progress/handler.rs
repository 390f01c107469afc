//! Progress handler trait and events

use crate::migrate::Step;
use std::time::Duration;
use uuid::Uuid;

/// Events emitted while a migration run advances
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Run created and about to start its first step
    Started { run_id: Uuid, image_ref: String },

    StepStarted { step: Step },

    /// Precondition did not hold, step not executed
    StepSkipped { step: Step, reason: String },

    /// Step failed but the run continues
    StepWarned { step: Step, message: String },

    StepCompleted { step: Step, elapsed: Duration },

    /// Step failed and the run stops here
    StepFailed { step: Step, error: String },

    /// Run finished successfully
    Completed { total_time: Duration, warnings: usize },
}

/// Trait for handling progress events during a migration run
pub trait ProgressHandler: Send + Sync {
    /// Called when a progress event occurs
    fn on_progress(&self, event: &ProgressEvent);
}

/// No-op handler that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_progress(&self, _event: &ProgressEvent) {}
}
