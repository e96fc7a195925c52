//! Route table: one handler per exact path and method.
//!
//! Paths are matched literally after a trailing slash is dropped, so `/quiz/`
//! reaches the `/quiz` handler. The query string never takes part in matching.
//! A known path requested with an unregistered method gets `405` with an
//! `Allow` header; an unknown path gets `404`. Both carry a JSON
//! `{"message": ...}` body like every other error the API returns.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::json;

use crate::context::Context;
use crate::{Method, Response, StatusCode};

/// Type-erased async handler stored in the route table.
pub type Handler =
    Arc<dyn Fn(Context) -> Pin<Box<dyn Future<Output = Response> + Send>> + Send + Sync + 'static>;

/// Conversion trait for async handler functions.
///
/// Any `Fn(Context) -> impl Future<Output = Response> + Send` that is also
/// `Send + Sync + 'static` implements this trait through the blanket impl below,
/// so route registration and [`cached`](crate::cache::cached) accept plain closures.
pub trait IntoHandler: Send + Sync + 'static {
    /// Call the handler with the given context, boxing the returned future.
    fn call(&self, ctx: Context) -> Pin<Box<dyn Future<Output = Response> + Send>>;
}

impl<T, F> IntoHandler for T
where
    T: Fn(Context) -> F + Send + Sync + 'static,
    F: Future<Output = Response> + Send + 'static,
{
    fn call(&self, ctx: Context) -> Pin<Box<dyn Future<Output = Response> + Send>> {
        Box::pin((self)(ctx))
    }
}

fn normalize(path: &str) -> &str {
    match path.strip_suffix('/') {
        Some(trimmed) if !trimmed.is_empty() => trimmed,
        _ => path,
    }
}

/// Maps `(path, method)` pairs to handlers.
///
/// ```rust,no_run
/// use quiz_server::{Router, Response, StatusCode};
///
/// let mut router = Router::new();
/// router.get("/quiz", |_ctx| async { Response::new(StatusCode::Ok) });
/// router.post("/verify", |_ctx| async { Response::new(StatusCode::Ok) });
/// assert_eq!(router.len(), 2);
/// ```
#[derive(Default)]
pub struct Router {
    paths: HashMap<String, HashMap<Method, Handler>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `GET path`, replacing any earlier one.
    pub fn get(&mut self, path: &str, handler: impl IntoHandler) {
        self.add_route(Method::Get, path, handler);
    }

    /// Registers `handler` for `POST path`, replacing any earlier one.
    pub fn post(&mut self, path: &str, handler: impl IntoHandler) {
        self.add_route(Method::Post, path, handler);
    }

    fn add_route(&mut self, method: Method, path: &str, handler: impl IntoHandler) {
        let handler: Handler = Arc::new(move |ctx| handler.call(ctx));
        self.paths
            .entry(normalize(path).to_owned())
            .or_default()
            .insert(method, handler);
    }

    /// Number of registered `(path, method)` pairs.
    pub fn len(&self) -> usize {
        self.paths.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Hands `ctx` to the handler registered for its path and method.
    pub async fn dispatch(&self, ctx: Context) -> Response {
        let found = self.lookup(ctx.request().method(), ctx.request().path());
        match found {
            Ok(handler) => handler(ctx).await,
            Err(response) => response,
        }
    }

    fn lookup(&self, method: &Method, path: &str) -> Result<Handler, Response> {
        let Some(methods) = self.paths.get(normalize(path)) else {
            return Err(Response::json(
                StatusCode::NotFound,
                &json!({ "message": "Not Found" }),
            ));
        };

        if let Some(handler) = methods.get(method) {
            return Ok(Arc::clone(handler));
        }

        let mut allowed: Vec<&str> = methods.keys().map(Method::as_str).collect();
        allowed.sort_unstable();
        Err(Response::json(
            StatusCode::MethodNotAllowed,
            &json!({ "message": "Method Not Allowed" }),
        )
        .header("Allow", allowed.join(", ")))
    }
}
