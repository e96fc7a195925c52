//! Read-through response caching for GET routes.
//!
//! ## Pieces
//!
//! - [`CacheStore`]: the shared key-value store with per-entry expiry.
//!   [`MemoryStore`] keeps entries in process; `RedisStore` (feature `redis`)
//!   shares them across processes.
//! - [`KeyRule`] / [`CacheKey`]: how a request maps to a store key.
//! - [`ViewCache`] and [`cached`]: wrap a route handler so it is served from
//!   the store when possible and stamped with [`CACHE_STATUS_HEADER`].
//!
//! The cache is an optimization only. A store that cannot be reached turns
//! every request into a computed [`CacheStatus::Miss`]; callers never see a
//! cache error.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

pub mod key;
pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;
pub mod store;
pub mod view;

pub use key::{CacheKey, KeyError, KeyRule};
pub use memory::MemoryStore;
#[cfg(feature = "redis")]
pub use self::redis::RedisStore;
pub use store::{CacheEntry, CacheStore, StoreError};
pub use view::{ViewCache, cached};

/// Response header carrying the [`CacheStatus`]. Value casing is `Hit` / `Miss`.
pub const CACHE_STATUS_HEADER: &str = "x-now-cache";

/// Time-to-live applied to every cached route.
pub const DEFAULT_TTL: Duration = Duration::from_secs(10);

/// Whether the key was present in the store when the wrapper checked.
///
/// This reflects the check, not the code path: an entry that expires between
/// the check and the read is still reported as a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "Hit",
            Self::Miss => "Miss",
        }
    }
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opens the store named by `url`.
///
/// - `memory` or `memory://`: a [`MemoryStore`] private to this process.
/// - `redis://…` or `rediss://…`: a `RedisStore`, when built with the `redis` feature.
///
/// # Errors
///
/// [`StoreError::UnsupportedBackend`] for any other scheme, or
/// [`StoreError::Unavailable`] if the backend cannot be reached at startup.
pub async fn connect(url: &str) -> Result<Arc<dyn CacheStore>, StoreError> {
    let scheme = url.split_once("://").map_or(url, |(scheme, _)| scheme);

    let store: Arc<dyn CacheStore> = match scheme {
        "memory" => Arc::new(MemoryStore::new()),
        #[cfg(feature = "redis")]
        "redis" | "rediss" => Arc::new(RedisStore::connect(url).await?),
        other => return Err(StoreError::UnsupportedBackend(other.to_owned())),
    };

    info!(backend = store.name(), "cache store ready");
    Ok(store)
}
