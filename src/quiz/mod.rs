//! Quiz assembly and answer checking.

use rand::Rng;
use rand::seq::index;
use serde::Serialize;

use crate::database::{AnswerOption, Question};

/// Questions per quiz when the caller does not ask for a number.
pub const DEFAULT_QUIZ_SIZE: usize = 5;

/// A question as shown to a quiz taker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizQuestion {
    pub id: i64,
    pub text: String,
    pub options: Vec<QuizOption>,
}

/// An option as shown to a quiz taker, without its correctness flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizOption {
    pub id: i64,
    pub text: String,
}

impl From<&AnswerOption> for QuizOption {
    fn from(option: &AnswerOption) -> Self {
        Self {
            id: option.id,
            text: option.text.clone(),
        }
    }
}

impl From<&Question> for QuizQuestion {
    fn from(question: &Question) -> Self {
        Self {
            id: question.id,
            text: question.text.clone(),
            options: question.options.iter().map(QuizOption::from).collect(),
        }
    }
}

/// Body of a successful `GET /quiz`.
#[derive(Debug, Serialize)]
pub struct Quiz {
    pub quiz: Vec<QuizQuestion>,
}

/// Draws `min(requested, questions.len())` distinct questions uniformly at random.
pub fn sample_quiz<R>(questions: &[Question], requested: usize, rng: &mut R) -> Quiz
where
    R: Rng + ?Sized,
{
    let amount = requested.min(questions.len());
    let quiz = index::sample(rng, questions.len(), amount)
        .into_iter()
        .map(|i| QuizQuestion::from(&questions[i]))
        .collect();
    Quiz { quiz }
}

/// Outcome of checking one answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub is_correct: bool,
    pub correct_option_id: Option<i64>,
}

/// Checks `selected_option_id` against the question's correct option.
///
/// A question without a correct option reports `correct_option_id: None` and
/// every answer as wrong.
pub fn verify(question: &Question, selected_option_id: i64) -> Verdict {
    let correct_option_id = question.correct_option_id();
    Verdict {
        is_correct: correct_option_id == Some(selected_option_id),
        correct_option_id,
    }
}
