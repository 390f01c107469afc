use super::{PromptError, PromptProvider};
use std::collections::VecDeque;
use std::sync::Mutex;

/// One canned answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Confirm(bool),
    Select(Option<usize>),
    Input(String),
    /// Use the prompt's default (confirm default, first item, input default)
    Default,
}

/// Replays answers in order and records every question asked.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: Mutex<VecDeque<Answer>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompt {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            asked: Mutex::new(Vec::new()),
        }
    }

    /// A provider that fails on any question
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().map(|a| a.clone()).unwrap_or_default()
    }

    pub fn remaining(&self) -> usize {
        self.answers.lock().map(|a| a.len()).unwrap_or(0)
    }

    fn next(&self, question: &str) -> Result<Answer, PromptError> {
        if let Ok(mut asked) = self.asked.lock() {
            asked.push(question.to_string());
        }
        self.answers
            .lock()
            .ok()
            .and_then(|mut answers| answers.pop_front())
            .ok_or_else(|| PromptError::Unscripted {
                question: question.to_string(),
                reason: "no answers left".to_string(),
            })
    }

    fn mismatch(question: &str, expected: &str, got: &Answer) -> PromptError {
        PromptError::Unscripted {
            question: question.to_string(),
            reason: format!("expected {} answer, got {:?}", expected, got),
        }
    }
}

impl PromptProvider for ScriptedPrompt {
    fn confirm(&self, question: &str, default: bool) -> Result<bool, PromptError> {
        match self.next(question)? {
            Answer::Confirm(yes) => Ok(yes),
            Answer::Default => Ok(default),
            other => Err(Self::mismatch(question, "confirm", &other)),
        }
    }

    fn select(&self, question: &str, items: &[String]) -> Result<Option<usize>, PromptError> {
        match self.next(question)? {
            Answer::Select(Some(idx)) if idx >= items.len() => Err(PromptError::Unscripted {
                question: question.to_string(),
                reason: format!("index {} out of {} items", idx, items.len()),
            }),
            Answer::Select(choice) => Ok(choice),
            Answer::Default => Ok(if items.is_empty() { None } else { Some(0) }),
            other => Err(Self::mismatch(question, "select", &other)),
        }
    }

    fn input(&self, question: &str, default: Option<&str>) -> Result<String, PromptError> {
        match self.next(question)? {
            Answer::Input(text) => Ok(text),
            Answer::Default => Ok(default.unwrap_or_default().to_string()),
            other => Err(Self::mismatch(question, "input", &other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answers_replayed_in_order() {
        let prompt = ScriptedPrompt::new([
            Answer::Confirm(true),
            Answer::Select(Some(1)),
            Answer::Input("shop".to_string()),
        ]);
        let items = vec!["a".to_string(), "b".to_string()];

        assert!(prompt.confirm("Overwrite?", false).unwrap());
        assert_eq!(prompt.select("Container", &items).unwrap(), Some(1));
        assert_eq!(prompt.input("Database", None).unwrap(), "shop");
        assert_eq!(prompt.asked(), vec!["Overwrite?", "Container", "Database"]);
        assert_eq!(prompt.remaining(), 0);
    }

    #[test]
    fn test_default_answers() {
        let prompt = ScriptedPrompt::new([Answer::Default, Answer::Default, Answer::Default]);
        assert!(!prompt.confirm("Overwrite?", false).unwrap());
        assert_eq!(prompt.select("Pick", &["x".to_string()]).unwrap(), Some(0));
        assert_eq!(prompt.input("Port", Some("3000")).unwrap(), "3000");
    }

    #[test]
    fn test_exhausted_script_errors() {
        let prompt = ScriptedPrompt::silent();
        assert!(matches!(
            prompt.confirm("Overwrite?", true),
            Err(PromptError::Unscripted { .. })
        ));
    }

    #[test]
    fn test_wrong_answer_kind_errors() {
        let prompt = ScriptedPrompt::new([Answer::Input("yes".to_string())]);
        assert!(prompt.confirm("Overwrite?", true).is_err());
    }

    #[test]
    fn test_out_of_range_selection_errors() {
        let prompt = ScriptedPrompt::new([Answer::Select(Some(5))]);
        assert!(prompt.select("Pick", &["only".to_string()]).is_err());
    }
}
