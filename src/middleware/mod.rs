//! Layers that run around the router for every request.
//!
//! A layer sees the [`Context`] first and the [`Response`] last, and may
//! answer on its own without calling further in.

use std::{future::Future, pin::Pin, sync::Arc};

use tokio::time::Instant;

use crate::{Request, Response, StatusCode, cache::CACHE_STATUS_HEADER, context::Context, router::Router};

/// Boxed future every layer returns.
pub type LayerFuture = Pin<Box<dyn Future<Output = Response> + Send>>;

/// A layer after type erasure, as stored in a [`Pipeline`].
pub type MiddlewareHandler = Arc<dyn Fn(Context, Next) -> LayerFuture + Send + Sync + 'static>;

/// Erases a [`Middleware`] into a [`MiddlewareHandler`].
pub fn from_middleware<M>(middleware: Arc<M>) -> MiddlewareHandler
where
    M: Middleware + 'static,
{
    Arc::new(move |ctx: Context, next: Next| middleware.handle(ctx, next))
}

/// The layers still to run for one request.
///
/// ```rust,no_run
/// use quiz_server::context::Context;
/// use quiz_server::middleware::{LayerFuture, Middleware, Next};
///
/// struct PassThrough;
///
/// impl Middleware for PassThrough {
///     fn handle(&self, ctx: Context, next: Next) -> LayerFuture {
///         Box::pin(async move { next.run(ctx).await })
///     }
/// }
/// ```
pub struct Next {
    remaining: std::vec::IntoIter<MiddlewareHandler>,
}

impl Next {
    pub fn new(chain: Vec<MiddlewareHandler>) -> Self {
        Self {
            remaining: chain.into_iter(),
        }
    }

    /// Calls the next layer. A chain that runs dry answers `500`.
    pub async fn run(mut self, ctx: Context) -> Response {
        match self.remaining.next() {
            Some(layer) => layer(ctx, self).await,
            None => Response::new(StatusCode::InternalServerError).body("no layer produced a response"),
        }
    }
}

pub trait Middleware: Send + Sync {
    fn handle(&self, ctx: Context, next: Next) -> LayerFuture;
}

/// Layers in front of a [`Router`], outermost first.
///
/// ```rust,no_run
/// use quiz_server::{Router, Response, StatusCode};
/// use quiz_server::middleware::{LoggerMiddleware, Pipeline};
///
/// let mut router = Router::new();
/// router.get("/quiz", |_ctx| async { Response::new(StatusCode::Ok) });
///
/// let pipeline = Pipeline::new(router).layer(LoggerMiddleware);
/// # let _ = pipeline;
/// ```
pub struct Pipeline {
    layers: Vec<MiddlewareHandler>,
    router: Arc<Router>,
}

impl Pipeline {
    pub fn new(router: Router) -> Self {
        Self {
            layers: Vec::new(),
            router: Arc::new(router),
        }
    }

    /// Appends `middleware` inside every layer added so far.
    #[must_use]
    pub fn layer<M>(mut self, middleware: M) -> Self
    where
        M: Middleware + 'static,
    {
        self.layers.push(from_middleware(Arc::new(middleware)));
        self
    }

    pub async fn handle(&self, request: Request) -> Response {
        let router = Arc::clone(&self.router);
        let dispatch: MiddlewareHandler = Arc::new(move |ctx: Context, _: Next| -> LayerFuture {
            let router = Arc::clone(&router);
            Box::pin(async move { router.dispatch(ctx).await })
        });

        let chain = self.layers.iter().cloned().chain(std::iter::once(dispatch)).collect();
        Next::new(chain).run(Context::new(request)).await
    }
}

/// Logs one line per request with its status, latency and cache outcome.
pub struct LoggerMiddleware;

impl Middleware for LoggerMiddleware {
    fn handle(&self, ctx: Context, next: Next) -> LayerFuture {
        Box::pin(async move {
            let started = Instant::now();
            let method = ctx.request().method().to_string();
            let path = ctx.request().path().to_owned();

            let response = next.run(ctx).await;

            let cache = response.headers().get(CACHE_STATUS_HEADER).unwrap_or("-");
            tracing::info!(
                %method,
                %path,
                status = response.status().as_u16(),
                elapsed = ?started.elapsed(),
                %cache,
                "request served"
            );
            response
        })
    }
}
