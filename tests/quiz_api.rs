use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};

use quiz_server::api;
use quiz_server::cache::{CACHE_STATUS_HEADER, DEFAULT_TTL, MemoryStore, ViewCache};
use quiz_server::database::{InMemoryQuestionRepository, SqliteQuestionRepository};
use quiz_server::middleware::Pipeline;
use quiz_server::{Request, Response, StatusCode};

fn app() -> Pipeline {
    let cache = ViewCache::new(Arc::new(MemoryStore::new()), DEFAULT_TTL);
    api::app(Arc::new(InMemoryQuestionRepository::new()), cache)
}

fn get(target: &str) -> Request {
    let raw = format!("GET {target} HTTP/1.1\r\nHost: localhost\r\n\r\n");
    Request::parse(raw.as_bytes()).unwrap().0
}

fn post(target: &str, body: &Value) -> Request {
    let body = body.to_string();
    let raw = format!(
        "POST {target} HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
        body.len()
    );
    Request::parse(raw.as_bytes()).unwrap().0
}

fn body_json(res: &Response) -> Value {
    serde_json::from_slice(res.body_ref()).unwrap()
}

fn cache_status(res: &Response) -> Option<&str> {
    res.headers().get(CACHE_STATUS_HEADER)
}

fn question(n: usize) -> Value {
    json!({
        "text": format!("Question {n}?"),
        "options": [
            {"text": "A", "is_correct": false},
            {"text": "B", "is_correct": true},
            {"text": "C", "is_correct": false},
            {"text": "D", "is_correct": false}
        ]
    })
}

async fn seed(app: &Pipeline, count: usize) {
    let batch: Vec<Value> = (1..=count).map(question).collect();
    let res = app.handle(post("/questions", &json!(batch))).await;
    assert_eq!(res.status(), StatusCode::Created);
    assert_eq!(body_json(&res), json!({"message": "Question added successfully"}));
}

#[tokio::test(start_paused = true)]
async fn quiz_is_sampled_then_served_from_cache() {
    let app = app();
    seed(&app, 10).await;

    let first = app.handle(get("/quiz?num_questions=3")).await;
    assert_eq!(first.status(), StatusCode::Ok);
    assert_eq!(cache_status(&first), Some("Miss"));

    let quiz = body_json(&first)["quiz"].as_array().unwrap().clone();
    assert_eq!(quiz.len(), 3);
    let ids: HashSet<_> = quiz.iter().map(|q| q["id"].as_i64().unwrap()).collect();
    assert_eq!(ids.len(), 3);
    for q in &quiz {
        let options = q["options"].as_array().unwrap();
        assert_eq!(options.len(), 4);
        assert!(options.iter().all(|o| o.get("is_correct").is_none()));
    }

    let second = app.handle(get("/quiz?num_questions=3")).await;
    assert_eq!(cache_status(&second), Some("Hit"));
    assert_eq!(second.body_ref(), first.body_ref());

    tokio::time::advance(DEFAULT_TTL + Duration::from_millis(1)).await;
    let third = app.handle(get("/quiz?num_questions=3")).await;
    assert_eq!(cache_status(&third), Some("Miss"));
}

#[tokio::test(start_paused = true)]
async fn different_quiz_sizes_do_not_share_an_entry() {
    let app = app();
    seed(&app, 10).await;

    let three = app.handle(get("/quiz?num_questions=3")).await;
    let five = app.handle(get("/quiz?num_questions=5")).await;
    let default = app.handle(get("/quiz")).await;

    assert_eq!(cache_status(&three), Some("Miss"));
    assert_eq!(cache_status(&five), Some("Miss"));
    assert_eq!(cache_status(&default), Some("Hit"));
    assert_eq!(body_json(&five)["quiz"].as_array().unwrap().len(), 5);
    assert_eq!(default.body_ref(), five.body_ref());
}

#[tokio::test(start_paused = true)]
async fn oversized_request_is_capped() {
    let app = app();
    seed(&app, 2).await;

    let res = app.handle(get("/quiz?num_questions=50")).await;
    assert_eq!(res.status(), StatusCode::Ok);
    assert_eq!(body_json(&res)["quiz"].as_array().unwrap().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn empty_bank_404_is_never_cached() {
    let app = app();

    let res = app.handle(get("/quiz")).await;
    assert_eq!(res.status(), StatusCode::NotFound);
    assert_eq!(body_json(&res), json!({"message": "No questions available"}));
    assert_eq!(cache_status(&res), Some("Miss"));

    seed(&app, 1).await;

    let res = app.handle(get("/quiz")).await;
    assert_eq!(res.status(), StatusCode::Ok);
    assert_eq!(cache_status(&res), Some("Miss"));
    assert_eq!(body_json(&res)["quiz"].as_array().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn bad_quiz_sizes_are_rejected() {
    let app = app();
    seed(&app, 3).await;

    let res = app.handle(get("/quiz?num_questions=abc")).await;
    assert_eq!(res.status(), StatusCode::BadRequest);
    assert_eq!(cache_status(&res), None);

    let res = app.handle(get("/quiz?num_questions=-2")).await;
    assert_eq!(res.status(), StatusCode::BadRequest);
    let again = app.handle(get("/quiz?num_questions=-2")).await;
    assert_eq!(cache_status(&again), Some("Miss"));
}

#[tokio::test]
async fn verify_reports_correct_option() {
    let app = app();
    let res = app
        .handle(post(
            "/questions",
            &json!({
                "text": "Which is prime?",
                "options": [
                    {"text": "4", "is_correct": false},
                    {"text": "7", "is_correct": true}
                ]
            }),
        ))
        .await;
    assert_eq!(res.status(), StatusCode::Created);

    let right = app
        .handle(post("/verify", &json!({"question_id": 1, "selected_option_id": 2})))
        .await;
    assert_eq!(right.status(), StatusCode::Ok);
    assert_eq!(body_json(&right), json!({"is_correct": true, "correct_option_id": 2}));
    assert_eq!(cache_status(&right), None);

    let wrong = app
        .handle(post("/verify", &json!({"question_id": 1, "selected_option_id": 1})))
        .await;
    assert_eq!(body_json(&wrong), json!({"is_correct": false, "correct_option_id": 2}));
}

#[tokio::test]
async fn verify_unknown_question_or_bad_body() {
    let app = app();

    let res = app
        .handle(post("/verify", &json!({"question_id": 99, "selected_option_id": 1})))
        .await;
    assert_eq!(res.status(), StatusCode::NotFound);
    assert_eq!(body_json(&res), json!({"message": "Question not found"}));

    let res = app.handle(post("/verify", &json!({"question_id": 1}))).await;
    assert_eq!(res.status(), StatusCode::BadRequest);
}

#[tokio::test]
async fn invalid_questions_are_rejected() {
    let app = app();

    let res = app.handle(post("/questions", &json!({"options": []}))).await;
    assert_eq!(res.status(), StatusCode::BadRequest);

    let res = app
        .handle(post("/questions", &json!([{"text": "", "options": []}])))
        .await;
    assert_eq!(res.status(), StatusCode::BadRequest);
}

#[tokio::test(start_paused = true)]
async fn index_is_cached_html() {
    let app = app();

    let first = app.handle(get("/")).await;
    assert_eq!(first.status(), StatusCode::Ok);
    assert_eq!(first.headers().get("content-type"), Some("text/html; charset=utf-8"));
    assert_eq!(cache_status(&first), Some("Miss"));

    let second = app.handle(get("/")).await;
    assert_eq!(cache_status(&second), Some("Hit"));
    assert_eq!(second.body_ref(), b"<p>Hello, World!</p>");
}

#[tokio::test]
async fn sqlite_backed_app_serves_and_verifies() {
    let repository = SqliteQuestionRepository::connect("sqlite::memory:").await.unwrap();
    let cache = ViewCache::new(Arc::new(MemoryStore::new()), DEFAULT_TTL);
    let app = api::app(Arc::new(repository), cache);
    seed(&app, 4).await;

    let res = app.handle(get("/quiz?num_questions=%32")).await;
    assert_eq!(res.status(), StatusCode::Ok);
    assert_eq!(cache_status(&res), Some("Miss"));
    assert_eq!(body_json(&res)["quiz"].as_array().unwrap().len(), 2);

    let again = app.handle(get("/quiz?num_questions=2")).await;
    assert_eq!(cache_status(&again), Some("Hit"));

    let verdict = app
        .handle(post("/verify", &json!({"question_id": 3, "selected_option_id": 10})))
        .await;
    assert_eq!(body_json(&verdict), json!({"is_correct": true, "correct_option_id": 10}));
}

#[tokio::test]
async fn wrong_method_on_a_known_route_is_405() {
    let app = app();
    let res = app.handle(get("/verify")).await;
    assert_eq!(res.status(), StatusCode::MethodNotAllowed);
    assert_eq!(res.headers().get("allow"), Some("POST"));
}
