//! Cache configuration.
//!
//! This module provides the cache settings loaded from environment variables.

use std::env;
use std::time::Duration;

use studentdb_config::env_flag;

pub const DEFAULT_TTL_SECONDS: u64 = 60;
pub const DEFAULT_PREFIX: &str = "studentdb";
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

/// Where cached entries live.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CacheBackendKind {
    /// In-process map, lost on restart.
    #[default]
    Memory,
    Redis,
}

impl CacheBackendKind {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" | "local" => Some(Self::Memory),
            "redis" => Some(Self::Redis),
            _ => None,
        }
    }
}

/// Cache configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `CACHE_ENABLED`: consult the cache on reads (default: `true`)
/// - `CACHE_BACKEND`: `memory` or `redis` (default: `memory`)
/// - `REDIS_URL`: Redis connection URL (default: `redis://127.0.0.1:6379`)
/// - `CACHE_TTL_SECONDS`: TTL for cached query results in seconds (default: `60`)
/// - `CACHE_PREFIX`: prefix for all cache keys (default: `studentdb`)
/// - `CACHE_INVALIDATE_ON_WRITE`: evict student query results after every write (default: `false`)
#[derive(Clone, Debug)]
pub struct CacheConfig {
    pub enabled: bool,
    pub backend: CacheBackendKind,
    pub redis_url: String,

    /// Time-to-live for cached query results in seconds.
    pub default_ttl_seconds: u64,

    /// Prefix for all cache keys to avoid collisions.
    pub key_prefix: String,

    pub invalidate_on_write: bool,
}

impl CacheConfig {
    pub fn from_env() -> Self {
        let backend = match env::var("CACHE_BACKEND") {
            Ok(value) => CacheBackendKind::parse(&value).unwrap_or_else(|| {
                tracing::warn!(value = %value, "Unknown CACHE_BACKEND, using in-memory cache");
                CacheBackendKind::Memory
            }),
            Err(_) => CacheBackendKind::Memory,
        };

        Self {
            enabled: env_flag("CACHE_ENABLED", true),
            backend,
            redis_url: env::var("REDIS_URL").unwrap_or_else(|_| DEFAULT_REDIS_URL.into()),
            default_ttl_seconds: env::var("CACHE_TTL_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|ttl| *ttl > 0)
                .unwrap_or(DEFAULT_TTL_SECONDS),
            key_prefix: env::var("CACHE_PREFIX").unwrap_or_else(|_| DEFAULT_PREFIX.into()),
            invalidate_on_write: env_flag("CACHE_INVALIDATE_ON_WRITE", false),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_seconds)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: CacheBackendKind::Memory,
            redis_url: DEFAULT_REDIS_URL.into(),
            default_ttl_seconds: DEFAULT_TTL_SECONDS,
            key_prefix: DEFAULT_PREFIX.into(),
            invalidate_on_write: false,
        }
    }
}
