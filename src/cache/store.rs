//! The storage contract behind the view cache.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::key::CacheKey;
use crate::http::{Headers, Response, StatusCode};

/// Failures reported by a [`CacheStore`].
///
/// None of these ever reach an HTTP caller: the view cache treats every one of
/// them as a forced miss.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cache store unavailable: {0}")]
    Unavailable(String),

    #[error("cached entry could not be encoded or decoded: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("unsupported cache backend `{0}`")]
    UnsupportedBackend(String),
}

/// A previously computed response body and the metadata needed to replay it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub status: StatusCode,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CacheEntry {
    /// Captures status, headers and body of `response`.
    pub fn from_response(response: &Response) -> Self {
        Self {
            status: response.status(),
            headers: response
                .headers()
                .iter()
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect(),
            body: response.body_ref().to_vec(),
        }
    }

    /// The media type of the captured body, if one was set.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
            .map(|(_, v)| v.as_str())
    }

    /// Rebuilds a response equal to the one this entry was captured from.
    pub fn to_response(&self) -> Response {
        let headers: Headers = self.headers.iter().cloned().collect();
        Response::from_parts(self.status, headers, self.body.clone())
    }
}

/// A key-value store with per-entry expiry, shared by every request handler.
///
/// Implementations handle their own locking and must never block one caller's
/// operation on another's. Expiry is the store's job: callers pass a TTL on
/// write and never sweep.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// A short backend name for logs, e.g. `"memory"` or `"redis"`.
    fn name(&self) -> &'static str;

    /// Whether an unexpired entry exists for `key`.
    ///
    /// Must not extend or refresh the entry's expiry.
    async fn has(&self, key: &CacheKey) -> Result<bool, StoreError>;

    /// The entry for `key` if present and unexpired.
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, StoreError>;

    /// Writes or overwrites the entry for `key`, expiring `ttl` from now.
    async fn put(&self, key: &CacheKey, entry: CacheEntry, ttl: Duration) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_round_trips_response() {
        let response = Response::json(StatusCode::Ok, &serde_json::json!({"quiz": []}));
        let entry = CacheEntry::from_response(&response);
        assert_eq!(entry.content_type(), Some("application/json"));

        let replay = entry.to_response();
        assert_eq!(replay.status(), StatusCode::Ok);
        assert_eq!(replay.body_ref(), br#"{"quiz":[]}"#);
        assert_eq!(replay.headers().get("content-type"), Some("application/json"));
    }

    #[test]
    fn entry_survives_json_encoding() {
        let entry = CacheEntry {
            status: StatusCode::Ok,
            headers: vec![("Content-Type".into(), "text/html".into())],
            body: b"<p>Hello</p>".to_vec(),
        };
        let encoded = serde_json::to_vec(&entry).unwrap();
        let decoded: CacheEntry = serde_json::from_slice(&encoded).unwrap();
        assert_eq!(decoded, entry);
    }
}
