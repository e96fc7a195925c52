//! The quiz HTTP surface: route table and handlers.

use std::sync::Arc;

use crate::cache::{KeyRule, ViewCache, cached};
use crate::database::QuestionRepository;
use crate::middleware::{LoggerMiddleware, Pipeline};
use crate::quiz::DEFAULT_QUIZ_SIZE;
use crate::router::Router;

pub mod handlers;

/// Builds the full request pipeline.
///
/// | Method | Path         | Cached | Key                                   |
/// |--------|--------------|--------|---------------------------------------|
/// | GET    | `/`          | yes    | `view//`                              |
/// | POST   | `/questions` | no     |                                       |
/// | GET    | `/quiz`      | yes    | `view//quiz?num_questions=<n>`        |
/// | POST   | `/verify`    | no     |                                       |
pub fn app(repository: Arc<dyn QuestionRepository>, cache: ViewCache) -> Pipeline {
    let mut router = Router::new();

    router.get(
        "/",
        cached(cache.clone(), KeyRule::path_only(), |_ctx| handlers::index()),
    );

    let repo = Arc::clone(&repository);
    router.post("/questions", move |ctx| {
        handlers::add_questions(Arc::clone(&repo), ctx)
    });

    let repo = Arc::clone(&repository);
    router.get(
        "/quiz",
        cached(
            cache,
            KeyRule::path_only().integer(handlers::NUM_QUESTIONS, DEFAULT_QUIZ_SIZE as i64),
            move |ctx| handlers::generate_quiz(Arc::clone(&repo), ctx),
        ),
    );

    let repo = repository;
    router.post("/verify", move |ctx| {
        handlers::verify_answer(Arc::clone(&repo), ctx)
    });

    Pipeline::new(router).layer(LoggerMiddleware)
}
