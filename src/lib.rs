//! # quiz-server
//!
//! A multiple-choice quiz API on a small async HTTP/1.1 stack, with a
//! read-through cache in front of its GET routes.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use quiz_server::api;
//! use quiz_server::cache::{MemoryStore, ViewCache, DEFAULT_TTL};
//! use quiz_server::database::InMemoryQuestionRepository;
//! use quiz_server::server::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cache = ViewCache::new(Arc::new(MemoryStore::new()), DEFAULT_TTL);
//!     let app = Arc::new(api::app(Arc::new(InMemoryQuestionRepository::new()), cache));
//!
//!     let server = Server::bind("127.0.0.1:5000").await?;
//!     server
//!         .run(move |req| {
//!             let app = Arc::clone(&app);
//!             async move { app.handle(req).await }
//!         })
//!         .await?;
//!     Ok(())
//! }
//! ```

// ── HTTP stack ────────────────────────────────────────────────────────────────
pub mod context;
pub mod http;
pub mod middleware;
pub mod router;
pub mod server;

// ── Quiz service ──────────────────────────────────────────────────────────────
pub mod api;
pub mod cache;
pub mod config;
pub mod database;
pub mod quiz;

// ── Convenience re-exports ────────────────────────────────────────────────────
pub use http::{Headers, Method, Request, Response, StatusCode};
pub use router::Router;
pub use server::{Server, ServerError};
