//! Prompt-provider capability
//!
//! Every interactive question dockhand asks goes through [`PromptProvider`].
//! The terminal implementation blocks until the operator answers; the scripted
//! one replays canned answers so tests can drive each branch.

mod scripted;
mod terminal;

pub use scripted::{Answer, ScriptedPrompt};
pub use terminal::DialoguerPrompt;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PromptError {
    /// A question had to be asked but no terminal is attached
    #[error("Cannot ask '{question}': not running in an interactive terminal")]
    NotInteractive { question: String },

    #[error("Prompt failed: {0}")]
    Io(String),

    /// A scripted provider ran out of answers or got the wrong kind
    #[error("Unexpected prompt '{question}': {reason}")]
    Unscripted { question: String, reason: String },
}

pub trait PromptProvider {
    /// Yes/no question
    fn confirm(&self, question: &str, default: bool) -> Result<bool, PromptError>;

    /// Pick one of `items`; `None` when the operator backs out
    fn select(&self, question: &str, items: &[String]) -> Result<Option<usize>, PromptError>;

    /// Free text answer, `default` used when the operator just presses enter
    fn input(&self, question: &str, default: Option<&str>) -> Result<String, PromptError>;
}

/// Uses `fallback` when the question could not be asked for lack of a
/// terminal; every other prompt failure is returned.
pub fn answer_or<T>(answer: Result<T, PromptError>, fallback: T) -> Result<T, PromptError> {
    match answer {
        Err(PromptError::NotInteractive { question }) => {
            tracing::debug!(question = %question, "Non-interactive, using fallback answer");
            Ok(fallback)
        }
        other => other,
    }
}
