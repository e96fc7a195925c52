//! Cache store shared across processes through Redis.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use super::key::CacheKey;
use super::store::{CacheEntry, CacheStore, StoreError};

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

/// A [`CacheStore`] on a Redis server.
///
/// Entries are JSON-encoded and written with `SET .. EX`, so Redis owns expiry.
/// `EXISTS` answers [`has`](CacheStore::has) without touching the TTL. The
/// connection manager reconnects on its own after a dropped connection.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connects to the server at `url` (`redis://` or `rediss://`).
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn has(&self, key: &CacheKey) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let exists: bool = conn.exists(key.as_str()).await?;
        Ok(exists)
    }

    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, StoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<Vec<u8>> = conn.get(key.as_str()).await?;
        raw.map(|bytes| serde_json::from_slice(&bytes).map_err(StoreError::from))
            .transpose()
    }

    async fn put(&self, key: &CacheKey, entry: CacheEntry, ttl: Duration) -> Result<(), StoreError> {
        let payload = serde_json::to_vec(&entry)?;
        let mut conn = self.conn.clone();
        let () = conn
            .set_ex(key.as_str(), payload, ttl.as_secs().max(1))
            .await?;
        Ok(())
    }
}
