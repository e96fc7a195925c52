//! Read-through caching for GET route handlers.
//!
//! Per request: derive key, check status, then serve the cached entry or compute
//! and store, and finally stamp `x-now-cache`. A single pass, no retries.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::key::KeyRule;
use super::store::{CacheEntry, CacheStore};
use super::{CACHE_STATUS_HEADER, CacheStatus};
use crate::context::Context;
use crate::router::IntoHandler;
use crate::{Response, StatusCode};

/// A handle to the shared store plus the TTL every cached route writes with.
///
/// Cheap to clone; clones share the same store.
#[derive(Clone)]
pub struct ViewCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl ViewCache {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    /// Serves one request through the cache.
    ///
    /// The status is whatever `has` reported, even if the entry then vanished
    /// before `get` and the response had to be recomputed. A store failure at
    /// either step counts as a miss and never fails the request. Only `2xx`
    /// responses are stored.
    pub async fn serve<H>(&self, rule: &KeyRule, ctx: Context, handler: &H) -> Response
    where
        H: IntoHandler + ?Sized,
    {
        let key = match rule.derive(ctx.request()) {
            Ok(key) => key,
            Err(e) => {
                debug!(path = %ctx.request().path(), error = %e, "rejecting request before cache lookup");
                return Response::json(
                    StatusCode::BadRequest,
                    &serde_json::json!({ "message": e.to_string() }),
                );
            }
        };

        let mut status = match self.store.has(&key).await {
            Ok(true) => CacheStatus::Hit,
            Ok(false) => CacheStatus::Miss,
            Err(e) => {
                warn!(backend = self.store.name(), key = %key, error = %e, "cache check failed, treating as miss");
                CacheStatus::Miss
            }
        };

        if status == CacheStatus::Hit {
            match self.store.get(&key).await {
                Ok(Some(entry)) => {
                    debug!(key = %key, "serving cached response");
                    let mut response = entry.to_response();
                    response.set_header(CACHE_STATUS_HEADER, status.as_str());
                    return response;
                }
                Ok(None) => {
                    debug!(key = %key, "cached entry expired after check, recomputing");
                }
                Err(e) => {
                    warn!(backend = self.store.name(), key = %key, error = %e, "cache read failed, treating as miss");
                    status = CacheStatus::Miss;
                }
            }
        }

        let mut response = handler.call(ctx).await;

        if response.status().is_success() {
            let entry = CacheEntry::from_response(&response);
            if let Err(e) = self.store.put(&key, entry, self.ttl).await {
                warn!(backend = self.store.name(), key = %key, error = %e, "cache write failed");
            }
        } else {
            debug!(key = %key, status = response.status().as_u16(), "not caching unsuccessful response");
        }

        response.set_header(CACHE_STATUS_HEADER, status.as_str());
        response
    }
}

/// Wraps `handler` so every call goes through `cache` keyed by `rule`.
///
/// The result is itself a handler and registers like any other:
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use quiz_server::{Response, Router, StatusCode};
/// use quiz_server::cache::{cached, KeyRule, MemoryStore, ViewCache};
///
/// let cache = ViewCache::new(Arc::new(MemoryStore::new()), Duration::from_secs(10));
/// let mut router = Router::new();
/// router.get(
///     "/",
///     cached(cache, KeyRule::path_only(), |_ctx| async {
///         Response::new(StatusCode::Ok).body("<p>Hello, World!</p>")
///     }),
/// );
/// ```
pub fn cached<H>(cache: ViewCache, rule: KeyRule, handler: H) -> impl IntoHandler
where
    H: IntoHandler,
{
    let handler = Arc::new(handler);
    let rule = Arc::new(rule);

    move |ctx: Context| {
        let cache = cache.clone();
        let rule = Arc::clone(&rule);
        let handler = Arc::clone(&handler);
        async move { cache.serve(&rule, ctx, handler.as_ref()).await }
    }
}
