//! Question storage: the models and the repository the API reads and writes.
//!
//! The HTTP layer sees only [`QuestionRepository`]. The server runs on
//! [`SqliteQuestionRepository`]; [`InMemoryQuestionRepository`] backs tests.

use async_trait::async_trait;
use thiserror::Error;

pub mod memory;
pub mod models;
pub mod sqlite;

pub use memory::InMemoryQuestionRepository;
pub use models::{AnswerOption, NewOption, NewQuestion, Question};
pub use sqlite::SqliteQuestionRepository;

/// Longest question text the schema accepts.
pub const MAX_QUESTION_TEXT: usize = 255;
/// Longest option text the schema accepts.
pub const MAX_OPTION_TEXT: usize = 100;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("invalid question: {0}")]
    Invalid(String),

    #[error("question store unavailable: {0}")]
    Unavailable(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Source of truth for questions and their options.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Stores every question in `batch` and returns them with assigned ids.
    ///
    /// The batch is validated as a whole; nothing is stored if any item is invalid.
    async fn add_questions(&self, batch: Vec<NewQuestion>) -> RepositoryResult<Vec<Question>>;

    /// Every stored question, in insertion order.
    async fn all_questions(&self) -> RepositoryResult<Vec<Question>>;

    /// A single question by id.
    async fn question(&self, id: i64) -> RepositoryResult<Option<Question>>;
}
