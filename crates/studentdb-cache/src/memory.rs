//! In-process cache backend.
//!
//! Entries live in a [`DashMap`] keyed by cache key. Expiry is checked on
//! access: an expired entry is reported as a miss and removed on the spot, so
//! nothing is ever served past its deadline. Keys that are never read again
//! are dropped by a sweep that runs at most once per TTL, piggybacked on
//! `get` and `set`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone)]
struct CachedEntry {
    value: String,
    expires_at: Instant,
}

impl CachedEntry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Process-local TTL cache of serialized query results.
#[derive(Clone, Debug)]
pub struct MemoryCache {
    entries: Arc<DashMap<String, CachedEntry>>,
    default_ttl: Duration,
    created_at: Instant,
    /// Milliseconds after `created_at` at which the next sweep is due.
    next_sweep_ms: Arc<AtomicU64>,
}

impl MemoryCache {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            default_ttl,
            created_at: Instant::now(),
            next_sweep_ms: Arc::new(AtomicU64::new(sweep_interval_ms(default_ttl))),
        }
    }

    /// Returns the live value stored under `key`.
    pub fn get(&self, key: &str) -> Option<String> {
        self.maybe_sweep();

        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired() => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };

        if expired {
            // A concurrent put may have replaced the entry since the read above.
            self.entries.remove_if(key, |_, entry| entry.is_expired());
            debug!(cache.key = %key, "Evicted expired entry");
        }

        None
    }

    pub fn set(&self, key: &str, value: String) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    /// Stores `value`, replacing any previous entry. It expires `ttl` from now.
    pub fn set_with_ttl(&self, key: &str, value: String, ttl: Duration) {
        self.maybe_sweep();

        let entry = CachedEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.insert(key.to_string(), entry);
    }

    pub fn invalidate(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Removes every entry whose key starts with `prefix`. Returns how many were removed.
    pub fn invalidate_prefix(&self, prefix: &str) -> u64 {
        let mut removed = 0;
        self.entries.retain(|key, _| {
            if key.starts_with(prefix) {
                removed += 1;
                false
            } else {
                true
            }
        });
        removed
    }

    /// Drops every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> u64 {
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            if entry.is_expired() {
                removed += 1;
                false
            } else {
                true
            }
        });
        removed
    }

    /// Runs [`Self::purge_expired`] if a TTL period has passed since the last sweep.
    /// Only the caller that wins the exchange sweeps.
    fn maybe_sweep(&self) {
        let now_ms = self.elapsed_ms();
        let due = self.next_sweep_ms.load(Ordering::Acquire);
        if now_ms < due {
            return;
        }

        let next = now_ms.saturating_add(sweep_interval_ms(self.default_ttl));
        if self
            .next_sweep_ms
            .compare_exchange(due, next, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            let removed = self.purge_expired();
            if removed > 0 {
                debug!(cache.removed = removed, "Swept expired entries");
            }
        }
    }

    fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.created_at.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Number of stored entries, expired ones included until they are swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn sweep_interval_ms(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}
