use serde::{Deserialize, Serialize};

use super::{MAX_OPTION_TEXT, MAX_QUESTION_TEXT, RepositoryError};

/// A stored multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub text: String,
    pub options: Vec<AnswerOption>,
}

impl Question {
    /// Id of the first option marked correct, if any.
    pub fn correct_option_id(&self) -> Option<i64> {
        self.options.iter().find(|o| o.is_correct).map(|o| o.id)
    }
}

/// One stored answer option. `is_correct` never leaves the server in a quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: i64,
    pub text: String,
    pub is_correct: bool,
}

/// A question as submitted by an author, before ids are assigned.
#[derive(Debug, Clone, Deserialize)]
pub struct NewQuestion {
    pub text: String,
    #[serde(default)]
    pub options: Vec<NewOption>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewOption {
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

impl NewQuestion {
    pub(crate) fn validate(&self) -> Result<(), RepositoryError> {
        check_text("question text", &self.text, MAX_QUESTION_TEXT)?;
        for option in &self.options {
            check_text("option text", &option.text, MAX_OPTION_TEXT)?;
        }
        Ok(())
    }
}

fn check_text(what: &str, text: &str, max: usize) -> Result<(), RepositoryError> {
    if text.trim().is_empty() {
        return Err(RepositoryError::Invalid(format!("{what} must not be empty")));
    }
    let len = text.chars().count();
    if len > max {
        return Err(RepositoryError::Invalid(format!(
            "{what} is {len} characters, limit is {max}"
        )));
    }
    Ok(())
}
