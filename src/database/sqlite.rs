//! Question repository on SQLite.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use super::models::{AnswerOption, NewQuestion, Question};
use super::{MAX_OPTION_TEXT, MAX_QUESTION_TEXT, QuestionRepository, RepositoryError, RepositoryResult};

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        RepositoryError::Unavailable(err.to_string())
    }
}

fn schema() -> [String; 3] {
    [
        format!(
            "CREATE TABLE IF NOT EXISTS questions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                text VARCHAR({MAX_QUESTION_TEXT}) NOT NULL
            )"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS options (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                question_id INTEGER NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
                text VARCHAR({MAX_OPTION_TEXT}) NOT NULL,
                is_correct BOOLEAN NOT NULL DEFAULT 0
            )"
        ),
        "CREATE INDEX IF NOT EXISTS idx_options_question_id ON options(question_id)".to_owned(),
    ]
}

/// Questions in a `questions` table, options in an `options` table keyed
/// back to their question.
///
/// Ids come from SQLite `AUTOINCREMENT`, so both counters start at 1 and
/// option ids are unique across questions.
#[derive(Debug, Clone)]
pub struct SqliteQuestionRepository {
    pool: SqlitePool,
}

impl SqliteQuestionRepository {
    /// Opens (creating if needed) the database at `database_url`, e.g.
    /// `sqlite:quiz.db` or `sqlite::memory:`, and ensures the schema exists.
    pub async fn connect(database_url: &str) -> RepositoryResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        // Every connection to `:memory:` is its own database, so keep exactly one alive.
        let pool_options = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = pool_options.connect_with(options).await?;

        let repository = Self::from_pool(pool).await?;
        info!(database_url, "question database ready");
        Ok(repository)
    }

    /// Wraps an existing pool, creating the tables if they are missing.
    pub async fn from_pool(pool: SqlitePool) -> RepositoryResult<Self> {
        for statement in schema() {
            sqlx::query(&statement).execute(&pool).await?;
        }
        Ok(Self { pool })
    }

    async fn options_by_question(
        &self,
        question_id: Option<i64>,
    ) -> RepositoryResult<HashMap<i64, Vec<AnswerOption>>> {
        let rows: Vec<(i64, i64, String, bool)> = match question_id {
            Some(id) => {
                sqlx::query_as(
                    "SELECT id, question_id, text, is_correct FROM options
                     WHERE question_id = ? ORDER BY id",
                )
                .bind(id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as("SELECT id, question_id, text, is_correct FROM options ORDER BY id")
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        let mut grouped: HashMap<i64, Vec<AnswerOption>> = HashMap::new();
        for (id, question_id, text, is_correct) in rows {
            grouped
                .entry(question_id)
                .or_default()
                .push(AnswerOption { id, text, is_correct });
        }
        Ok(grouped)
    }
}

#[async_trait]
impl QuestionRepository for SqliteQuestionRepository {
    async fn add_questions(&self, batch: Vec<NewQuestion>) -> RepositoryResult<Vec<Question>> {
        for question in &batch {
            question.validate()?;
        }

        let mut tx = self.pool.begin().await?;
        let mut stored = Vec::with_capacity(batch.len());

        for new in batch {
            let id = sqlx::query("INSERT INTO questions (text) VALUES (?)")
                .bind(&new.text)
                .execute(&mut *tx)
                .await?
                .last_insert_rowid();

            let mut options = Vec::with_capacity(new.options.len());
            for option in new.options {
                let option_id =
                    sqlx::query("INSERT INTO options (question_id, text, is_correct) VALUES (?, ?, ?)")
                        .bind(id)
                        .bind(&option.text)
                        .bind(option.is_correct)
                        .execute(&mut *tx)
                        .await?
                        .last_insert_rowid();
                options.push(AnswerOption {
                    id: option_id,
                    text: option.text,
                    is_correct: option.is_correct,
                });
            }

            stored.push(Question {
                id,
                text: new.text,
                options,
            });
        }

        tx.commit().await?;
        debug!(added = stored.len(), "questions stored");
        Ok(stored)
    }

    async fn all_questions(&self) -> RepositoryResult<Vec<Question>> {
        let rows: Vec<(i64, String)> = sqlx::query_as("SELECT id, text FROM questions ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        let mut options = self.options_by_question(None).await?;

        Ok(rows
            .into_iter()
            .map(|(id, text)| Question {
                id,
                text,
                options: options.remove(&id).unwrap_or_default(),
            })
            .collect())
    }

    async fn question(&self, id: i64) -> RepositoryResult<Option<Question>> {
        let row: Option<(i64, String)> = sqlx::query_as("SELECT id, text FROM questions WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        let Some((id, text)) = row else {
            return Ok(None);
        };

        let mut options = self.options_by_question(Some(id)).await?;
        Ok(Some(Question {
            id,
            text,
            options: options.remove(&id).unwrap_or_default(),
        }))
    }
}
