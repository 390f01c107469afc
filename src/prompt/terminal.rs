use super::{PromptError, PromptProvider};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};
use tracing::debug;

/// Terminal prompts backed by dialoguer.
///
/// Refuses to prompt when disabled or when stdin is not a TTY, so scripted
/// invocations fail fast instead of hanging.
pub struct DialoguerPrompt {
    enabled: bool,
    theme: ColorfulTheme,
}

impl DialoguerPrompt {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            theme: ColorfulTheme::default(),
        }
    }

    fn ensure_interactive(&self, question: &str) -> Result<(), PromptError> {
        if self.enabled && atty::is(atty::Stream::Stdin) {
            Ok(())
        } else {
            debug!(question, "prompt refused: non-interactive");
            Err(PromptError::NotInteractive {
                question: question.to_string(),
            })
        }
    }
}

impl PromptProvider for DialoguerPrompt {
    fn confirm(&self, question: &str, default: bool) -> Result<bool, PromptError> {
        self.ensure_interactive(question)?;
        Confirm::with_theme(&self.theme)
            .with_prompt(question)
            .default(default)
            .interact()
            .map_err(|e| PromptError::Io(e.to_string()))
    }

    fn select(&self, question: &str, items: &[String]) -> Result<Option<usize>, PromptError> {
        self.ensure_interactive(question)?;
        if items.is_empty() {
            return Ok(None);
        }
        Select::with_theme(&self.theme)
            .with_prompt(question)
            .items(items)
            .default(0)
            .interact_opt()
            .map_err(|e| PromptError::Io(e.to_string()))
    }

    fn input(&self, question: &str, default: Option<&str>) -> Result<String, PromptError> {
        self.ensure_interactive(question)?;
        let mut input = Input::<String>::with_theme(&self.theme).with_prompt(question);
        if let Some(default) = default {
            input = input.default(default.to_string());
        }
        input
            .interact_text()
            .map_err(|e| PromptError::Io(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_prompt_never_blocks() {
        let prompt = DialoguerPrompt::new(false);

        let err = prompt.confirm("Overwrite?", false).unwrap_err();
        assert!(matches!(err, PromptError::NotInteractive { .. }));
        assert!(prompt.input("Port", Some("3000")).is_err());
        assert!(prompt.select("Pick", &["a".to_string()]).is_err());
    }
}
