//! # Cache Module
//!
//! The [`UsageCache`] contract shared by the in-memory and on-disk caches,
//! plus the single-slot [`MemoryCache`] used for one process lifetime.
//!
//! Both variants hand out copies. A value past its TTL is still returned,
//! with `is_stale` set.

use chrono::{DateTime, TimeDelta, Utc};
use std::sync::RwLock;
use std::time::Duration;

use crate::models::UsageSnapshot;

/// Best-effort snapshot storage keyed by workspace
pub trait UsageCache {
    /// Never fails; storage problems are logged and dropped
    fn store(&self, key: &str, snapshot: &UsageSnapshot);
    /// `None` for a miss or unreadable entry
    fn get(&self, key: &str) -> Option<UsageSnapshot>;
}

/// True when `now - stored_at` is strictly greater than `ttl`
pub fn is_expired(stored_at: DateTime<Utc>, ttl: Duration, now: DateTime<Utc>) -> bool {
    let ttl = TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX);
    now - stored_at > ttl
}

#[derive(Clone, Debug)]
struct Slot {
    snapshot: UsageSnapshot,
    stored_at: DateTime<Utc>,
}

/// Single-slot cache; the key is ignored
pub struct MemoryCache {
    slot: RwLock<Option<Slot>>,
    ttl: Duration,
}

impl MemoryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slot: RwLock::new(None),
            ttl,
        }
    }

    pub fn clear(&self) {
        if let Ok(mut slot) = self.slot.write() {
            *slot = None;
        }
    }
}

impl UsageCache for MemoryCache {
    fn store(&self, _key: &str, snapshot: &UsageSnapshot) {
        if let Ok(mut slot) = self.slot.write() {
            *slot = Some(Slot {
                snapshot: snapshot.clone(),
                stored_at: Utc::now(),
            });
        }
    }

    fn get(&self, _key: &str) -> Option<UsageSnapshot> {
        let slot = self.slot.read().ok()?;
        let entry = slot.as_ref()?;
        let mut snapshot = entry.snapshot.clone();
        snapshot.is_stale = is_expired(entry.stored_at, self.ttl, Utc::now());
        Some(snapshot)
    }
}
