//! # studentdb Cache
//!
//! Read-through caching of student query results.
//!
//! This crate provides:
//! - Cache configuration from environment variables
//! - Cache key generation with digested parameters
//! - An in-process backend ([`MemoryCache`]) and a Redis backend ([`RedisCache`])
//! - [`QueryCache`], the front the API uses, which never lets a backend failure
//!   fail a request
//!
//! # Example
//!
//! ```ignore
//! use studentdb_cache::{CacheConfig, QueryCache};
//!
//! let config = CacheConfig::from_env();
//! let cache = QueryCache::connect(&config).await?;
//!
//! let key = cache.keys().all();
//! if cache.get(&key).await.is_none() {
//!     cache.put(&key, "[]").await;
//! }
//! ```

pub mod config;
pub mod keys;
pub mod memory;
pub mod redis;

pub use config::{CacheBackendKind, CacheConfig};
pub use keys::{CacheKeys, digest};
pub use memory::MemoryCache;
pub use redis::{CacheError, RedisCache};

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use metrics::counter;
use tracing::{debug, warn};

#[derive(Clone, Debug)]
pub enum CacheBackend {
    Memory(MemoryCache),
    Redis(RedisCache),
}

/// Backend-agnostic cache of serialized query results.
///
/// Errors from the backend are logged and reported as a miss (on `get`) or
/// swallowed (on `put` and invalidation).
///
/// Every [`QueryCache::invalidate_students`] bumps a generation counter shared
/// by all clones. [`QueryCache::put_if_current`] uses it to refuse results
/// loaded before an invalidation.
#[derive(Clone, Debug)]
pub struct QueryCache {
    backend: CacheBackend,
    keys: CacheKeys,
    generation: Arc<AtomicU64>,
}

impl QueryCache {
    pub fn new(backend: CacheBackend, keys: CacheKeys) -> Self {
        Self {
            backend,
            keys,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// In-process cache using the configured TTL and prefix.
    pub fn memory(config: &CacheConfig) -> Self {
        Self::new(
            CacheBackend::Memory(MemoryCache::new(config.default_ttl())),
            CacheKeys::new(config.key_prefix.clone()),
        )
    }

    /// Builds the backend selected by `config.backend`.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Connection` if the Redis backend is selected and
    /// cannot be reached.
    pub async fn connect(config: &CacheConfig) -> Result<Self, CacheError> {
        match config.backend {
            CacheBackendKind::Memory => Ok(Self::memory(config)),
            CacheBackendKind::Redis => {
                let redis = RedisCache::new(&config.redis_url, config.default_ttl()).await?;
                Ok(Self::new(
                    CacheBackend::Redis(redis),
                    CacheKeys::new(config.key_prefix.clone()),
                ))
            }
        }
    }

    pub fn keys(&self) -> &CacheKeys {
        &self.keys
    }

    pub fn backend(&self) -> &CacheBackend {
        &self.backend
    }

    /// Current invalidation generation. Read it before loading a value that
    /// will be stored with [`Self::put_if_current`].
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let result = match &self.backend {
            CacheBackend::Memory(cache) => Ok(cache.get(key)),
            CacheBackend::Redis(cache) => cache.get(key).await,
        };

        match result {
            Ok(Some(value)) => {
                debug!(cache.key = %key, "Cache hit");
                counter!("cache_hits_total").increment(1);
                Some(value)
            }
            Ok(None) => {
                debug!(cache.key = %key, "Cache miss");
                counter!("cache_misses_total").increment(1);
                None
            }
            Err(e) => {
                warn!(cache.key = %key, error = %e, "Cache read failed, treating as miss");
                counter!("cache_errors_total", "operation" => "get").increment(1);
                None
            }
        }
    }

    pub async fn put(&self, key: &str, value: &str) {
        let result = match &self.backend {
            CacheBackend::Memory(cache) => {
                cache.set(key, value.to_string());
                Ok(())
            }
            CacheBackend::Redis(cache) => cache.set(key, value).await,
        };

        if let Err(e) = result {
            warn!(cache.key = %key, error = %e, "Cache write failed");
            counter!("cache_errors_total", "operation" => "put").increment(1);
        }
    }

    /// Stores `value` only if no invalidation happened since `generation` was read.
    ///
    /// The generation is checked again after the write. If an invalidation
    /// slipped in between, its eviction may have run before our write landed,
    /// so the key is evicted here instead. Returns whether the value was kept.
    pub async fn put_if_current(&self, key: &str, value: &str, generation: u64) -> bool {
        if self.generation() != generation {
            debug!(cache.key = %key, "Skipping put of a result loaded before invalidation");
            return false;
        }

        self.put(key, value).await;

        if self.generation() != generation {
            debug!(cache.key = %key, "Invalidated during put, evicting");
            self.invalidate(key).await;
            return false;
        }
        true
    }

    pub async fn invalidate(&self, key: &str) {
        let result = match &self.backend {
            CacheBackend::Memory(cache) => {
                cache.invalidate(key);
                Ok(())
            }
            CacheBackend::Redis(cache) => cache.invalidate(key).await,
        };

        if let Err(e) = result {
            warn!(cache.key = %key, error = %e, "Failed to invalidate cache key");
        }
    }

    pub async fn invalidate_prefix(&self, prefix: &str) -> u64 {
        let result = match &self.backend {
            CacheBackend::Memory(cache) => Ok(cache.invalidate_prefix(prefix)),
            CacheBackend::Redis(cache) => cache.invalidate_prefix(prefix).await,
        };

        match result {
            Ok(removed) => {
                debug!(cache.prefix = %prefix, cache.deleted = %removed, "Cache prefix invalidated");
                removed
            }
            Err(e) => {
                warn!(cache.prefix = %prefix, error = %e, "Failed to invalidate cache prefix");
                0
            }
        }
    }

    /// Evicts every cached student query.
    ///
    /// The generation is bumped before evicting, so a concurrent
    /// [`Self::put_if_current`] either sees the bump or is evicted here.
    pub async fn invalidate_students(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let prefix = self.keys.students_prefix();
        self.invalidate_prefix(&prefix).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_memory_query_cache_roundtrip() {
        let cache = QueryCache::memory(&CacheConfig::default());
        let key = cache.keys().all();

        assert_eq!(cache.get(&key).await, None);
        cache.put(&key, "[]").await;
        assert_eq!(cache.get(&key).await.as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_invalidate_students_clears_all_query_keys() {
        let cache = QueryCache::memory(&CacheConfig::default());
        let all = cache.keys().all();
        let avg = cache.keys().faculty_average("Physics");
        cache.put(&all, "[]").await;
        cache.put(&avg, "{}").await;

        assert_eq!(cache.invalidate_students().await, 2);
        assert_eq!(cache.get(&all).await, None);
        assert_eq!(cache.get(&avg).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_configured_ttl_applies() {
        let config = CacheConfig {
            default_ttl_seconds: 10,
            ..Default::default()
        };
        let cache = QueryCache::memory(&config);
        let key = cache.keys().unique_courses();
        cache.put(&key, "[\"Math\"]").await;

        tokio::time::advance(Duration::from_secs(11)).await;
        assert_eq!(cache.get(&key).await, None);
    }

    #[tokio::test]
    async fn test_put_after_invalidation_is_refused() {
        let cache = QueryCache::memory(&CacheConfig::default());
        let key = cache.keys().all();

        let generation = cache.generation();
        // A write commits and invalidates while the read is loading.
        cache.invalidate_students().await;

        assert!(!cache.put_if_current(&key, "[]", generation).await);
        assert_eq!(cache.get(&key).await, None);
    }

    #[tokio::test]
    async fn test_put_if_current_without_invalidation() {
        let cache = QueryCache::memory(&CacheConfig::default());
        let key = cache.keys().all();

        let generation = cache.generation();
        assert!(cache.put_if_current(&key, "[]", generation).await);
        assert_eq!(cache.get(&key).await.as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_generation_is_shared_between_clones() {
        let cache = QueryCache::memory(&CacheConfig::default());
        let clone = cache.clone();

        clone.invalidate_students().await;
        assert_eq!(cache.generation(), 1);
    }
}
