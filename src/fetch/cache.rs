//! Single-slot in-memory cache with a fixed time-to-live.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct Slot<T> {
    value: T,
    stored_at: Instant,
    fetched_at: DateTime<Utc>,
}

/// Holds at most one value; it expires `ttl` after being stored.
/// Concurrent writers overwrite each other (last writer wins).
#[derive(Debug)]
pub struct TtlCache<T> {
    ttl: Duration,
    slot: RwLock<Option<Slot<T>>>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: RwLock::new(None),
        }
    }

    /// Fresh value and when it was fetched, if any.
    pub async fn get(&self) -> Option<(T, DateTime<Utc>)> {
        self.get_at(Instant::now()).await
    }

    pub async fn get_at(&self, now: Instant) -> Option<(T, DateTime<Utc>)> {
        let slot = self.slot.read().await;
        slot.as_ref()
            .filter(|s| now.saturating_duration_since(s.stored_at) < self.ttl)
            .map(|s| (s.value.clone(), s.fetched_at))
    }

    pub async fn put(&self, value: T) {
        self.put_at(value, Instant::now()).await;
    }

    pub async fn put_at(&self, value: T, now: Instant) {
        *self.slot.write().await = Some(Slot {
            value,
            stored_at: now,
            fetched_at: Utc::now(),
        });
    }

}
