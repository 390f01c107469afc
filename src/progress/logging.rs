//! Logging-based progress handler

use super::{ProgressEvent, ProgressHandler};
use tracing::{debug, error, info, warn};

/// Handler that logs progress events using tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Started { run_id, image_ref } => {
                info!(run = %run_id, image = %image_ref, "Starting migration");
            }
            ProgressEvent::StepStarted { step } => {
                info!(step = %step, "Step started");
            }
            ProgressEvent::StepSkipped { step, reason } => {
                info!(step = %step, reason = %reason, "Step skipped");
            }
            ProgressEvent::StepWarned { step, message } => {
                warn!(step = %step, "{}", message);
            }
            ProgressEvent::StepCompleted { step, elapsed } => {
                debug!(step = %step, elapsed_ms = elapsed.as_millis(), "Step complete");
            }
            ProgressEvent::StepFailed { step, error } => {
                error!(step = %step, error = %error, "Step failed");
            }
            ProgressEvent::Completed {
                total_time,
                warnings,
            } => {
                if *warnings > 0 {
                    warn!(
                        warnings,
                        total_time_ms = total_time.as_millis(),
                        "Migration complete with warnings"
                    );
                } else {
                    info!(total_time_ms = total_time.as_millis(), "Migration complete");
                }
            }
        }
    }
}
