use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::context::Context;
use crate::database::{NewQuestion, QuestionRepository, RepositoryError};
use crate::quiz::{self, DEFAULT_QUIZ_SIZE};
use crate::{Response, StatusCode};

/// Query parameter selecting the quiz length.
pub const NUM_QUESTIONS: &str = "num_questions";

fn message(status: StatusCode, text: impl Into<String>) -> Response {
    Response::json(status, &json!({ "message": text.into() }))
}

fn repository_failure(e: &RepositoryError) -> Response {
    match e {
        RepositoryError::Invalid(reason) => message(StatusCode::BadRequest, reason.clone()),
        RepositoryError::Unavailable(_) => {
            error!(error = %e, "question repository failed");
            message(StatusCode::ServiceUnavailable, "Question store unavailable")
        }
    }
}

pub async fn index() -> Response {
    Response::new(StatusCode::Ok)
        .header("Content-Type", "text/html; charset=utf-8")
        .body("<p>Hello, World!</p>")
}

/// One question or a list of them; authors may post either.
#[derive(Deserialize)]
#[serde(untagged)]
enum QuestionBatch {
    Many(Vec<NewQuestion>),
    One(NewQuestion),
}

pub async fn add_questions(repo: Arc<dyn QuestionRepository>, ctx: Context) -> Response {
    let batch = match ctx.json::<QuestionBatch>() {
        Ok(QuestionBatch::Many(batch)) => batch,
        Ok(QuestionBatch::One(question)) => vec![question],
        Err(e) => return message(StatusCode::BadRequest, format!("Invalid request body: {e}")),
    };

    match repo.add_questions(batch).await {
        Ok(stored) => {
            info!(count = stored.len(), "questions added");
            message(StatusCode::Created, "Question added successfully")
        }
        Err(e) => repository_failure(&e),
    }
}

pub async fn generate_quiz(repo: Arc<dyn QuestionRepository>, ctx: Context) -> Response {
    let requested = match ctx.request().query_param(NUM_QUESTIONS) {
        None => DEFAULT_QUIZ_SIZE,
        Some(raw) => match raw.trim().parse::<usize>() {
            Ok(n) => n,
            Err(_) => {
                return message(
                    StatusCode::BadRequest,
                    format!("{NUM_QUESTIONS} must be a non-negative integer"),
                );
            }
        },
    };

    let questions = match repo.all_questions().await {
        Ok(questions) => questions,
        Err(e) => return repository_failure(&e),
    };
    if questions.is_empty() {
        return message(StatusCode::NotFound, "No questions available");
    }

    let quiz = quiz::sample_quiz(&questions, requested, &mut rand::thread_rng());
    Response::json(StatusCode::Ok, &quiz)
}

#[derive(Deserialize)]
struct AnswerSubmission {
    question_id: i64,
    selected_option_id: i64,
}

pub async fn verify_answer(repo: Arc<dyn QuestionRepository>, ctx: Context) -> Response {
    let submission = match ctx.json::<AnswerSubmission>() {
        Ok(submission) => submission,
        Err(e) => return message(StatusCode::BadRequest, format!("Invalid request body: {e}")),
    };

    match repo.question(submission.question_id).await {
        Ok(Some(question)) => Response::json(
            StatusCode::Ok,
            &quiz::verify(&question, submission.selected_option_id),
        ),
        Ok(None) => message(StatusCode::NotFound, "Question not found"),
        Err(e) => repository_failure(&e),
    }
}
