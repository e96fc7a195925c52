//! Process-local cache store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;
use tracing::debug;

use super::key::CacheKey;
use super::store::{CacheEntry, CacheStore, StoreError};

/// Writes between two full sweeps of expired slots.
pub const SWEEP_EVERY: usize = 64;

#[derive(Debug)]
struct Slot {
    entry: CacheEntry,
    expires_at: Instant,
}

impl Slot {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// An in-memory [`CacheStore`] on a sharded concurrent map.
///
/// Expiry is passive: an expired slot is dropped when a read touches it, and
/// every [`SWEEP_EVERY`]th write sweeps the rest. Time comes from [`tokio::time::Instant`], so a
/// paused test runtime controls expiry.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: DashMap<CacheKey, Slot>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of slots held, expired or not.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn sweep_expired(&self, now: Instant) {
        let before = self.slots.len();
        self.slots.retain(|_, slot| slot.is_live(now));
        let evicted = before.saturating_sub(self.slots.len());
        if evicted > 0 {
            debug!(evicted, "swept expired cache entries");
        }
    }

    // Drops the slot for `key` only if it is still expired when the shard lock is taken.
    fn evict_if_expired(&self, key: &CacheKey, now: Instant) {
        if self.slots.remove_if(key, |_, slot| !slot.is_live(now)).is_some() {
            debug!(key = %key, "expired cache entry evicted");
        }
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn has(&self, key: &CacheKey) -> Result<bool, StoreError> {
        let now = Instant::now();
        let live = self.slots.get(key).map(|slot| slot.is_live(now));
        match live {
            Some(true) => Ok(true),
            Some(false) => {
                self.evict_if_expired(key, now);
                Ok(false)
            }
            None => Ok(false),
        }
    }

    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, StoreError> {
        let now = Instant::now();
        let found = self
            .slots
            .get(key)
            .map(|slot| slot.is_live(now).then(|| slot.entry.clone()));
        match found {
            Some(Some(entry)) => Ok(Some(entry)),
            Some(None) => {
                self.evict_if_expired(key, now);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn put(&self, key: &CacheKey, entry: CacheEntry, ttl: Duration) -> Result<(), StoreError> {
        let now = Instant::now();
        if self.writes.fetch_add(1, Ordering::Relaxed) % SWEEP_EVERY == SWEEP_EVERY - 1 {
            self.sweep_expired(now);
        }
        self.slots.insert(
            key.clone(),
            Slot {
                entry,
                expires_at: now + ttl,
            },
        );
        Ok(())
    }
}
