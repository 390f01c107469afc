//! Progress reporting for the migration pipeline

mod handler;
mod logging;

pub use handler::{NoOpHandler, ProgressEvent, ProgressHandler};
pub use logging::LoggingHandler;
