use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::models::{AnswerOption, NewQuestion, Question};
use super::{QuestionRepository, RepositoryResult};

#[derive(Debug)]
struct Tables {
    questions: Vec<Question>,
    next_question_id: i64,
    next_option_id: i64,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            questions: Vec::new(),
            next_question_id: 1,
            next_option_id: 1,
        }
    }
}

/// Question repository held in process memory.
///
/// Ids behave like auto-increment columns: question ids and option ids each
/// count up from 1, and option ids are unique across all questions.
#[derive(Debug, Default)]
pub struct InMemoryQuestionRepository {
    tables: RwLock<Tables>,
}

impl InMemoryQuestionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuestionRepository for InMemoryQuestionRepository {
    async fn add_questions(&self, batch: Vec<NewQuestion>) -> RepositoryResult<Vec<Question>> {
        for question in &batch {
            question.validate()?;
        }

        let mut tables = self.tables.write().await;
        let mut stored = Vec::with_capacity(batch.len());

        for new in batch {
            let id = tables.next_question_id;
            tables.next_question_id += 1;

            let mut options = Vec::with_capacity(new.options.len());
            for option in new.options {
                options.push(AnswerOption {
                    id: tables.next_option_id,
                    text: option.text,
                    is_correct: option.is_correct,
                });
                tables.next_option_id += 1;
            }

            let question = Question {
                id,
                text: new.text,
                options,
            };
            tables.questions.push(question.clone());
            stored.push(question);
        }

        debug!(added = stored.len(), total = tables.questions.len(), "questions stored");
        Ok(stored)
    }

    async fn all_questions(&self) -> RepositoryResult<Vec<Question>> {
        Ok(self.tables.read().await.questions.clone())
    }

    async fn question(&self, id: i64) -> RepositoryResult<Option<Question>> {
        let tables = self.tables.read().await;
        Ok(tables.questions.iter().find(|q| q.id == id).cloned())
    }
}
