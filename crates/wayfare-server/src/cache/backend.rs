//! Cache backend implementation with L1 (DashMap) and L2 (Redis) tiers.

use async_trait::async_trait;
use dashmap::DashMap;
use deadpool_redis::Pool;
use redis::AsyncCommands;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{Cache, CacheError};

/// TTL applied to values promoted from Redis into the local tier.
const L1_PROMOTION_TTL: Duration = Duration::from_secs(3600);

/// A cached entry with TTL support.
///
/// The data is wrapped in `Arc` to allow cheap cloning on cache hits.
#[derive(Clone, Debug)]
pub struct CachedEntry {
    pub data: Arc<Vec<u8>>,
    pub cached_at: Instant,
    pub ttl: Duration,
}

impl CachedEntry {
    /// Create a new cached entry.
    pub fn new(data: Vec<u8>, ttl: Duration) -> Self {
        Self {
            data: Arc::new(data),
            cached_at: Instant::now(),
            ttl,
        }
    }

    /// Check if this entry has expired.
    pub fn is_expired(&self) -> bool {
        self.cached_at.elapsed() > self.ttl
    }
}

/// Two-tier cache backend: L1 (DashMap) + L2 (Redis).
///
/// ## Cache Modes
///
/// - **Local**: Single-instance mode using only DashMap
/// - **Redis**: Multi-instance mode with DashMap (L1) + Redis (L2)
///
/// Redis commands are awaited and their failures are returned to the caller.
#[derive(Clone)]
pub enum CacheBackend {
    /// Single-instance: local DashMap only
    Local(Arc<DashMap<String, CachedEntry>>),

    /// Multi-instance: Redis + local L1
    Redis {
        redis: Pool,
        local: Arc<DashMap<String, CachedEntry>>,
    },
}

impl CacheBackend {
    /// Create a new local-only cache backend.
    pub fn new_local() -> Self {
        CacheBackend::Local(Arc::new(DashMap::new()))
    }

    /// Create a new Redis-backed cache backend.
    pub fn new_redis(redis_pool: Pool) -> Self {
        CacheBackend::Redis {
            redis: redis_pool,
            local: Arc::new(DashMap::new()),
        }
    }

    /// Returns the live entry for `key` from a local map, dropping it if expired.
    fn local_get(map: &DashMap<String, CachedEntry>, key: &str) -> Option<Arc<Vec<u8>>> {
        let entry = map.get(key)?;
        if entry.is_expired() {
            drop(entry);
            map.remove(key);
            return None;
        }
        Some(Arc::clone(&entry.data))
    }

    /// Get a value from the cache.
    ///
    /// ## Lookup Order
    ///
    /// 1. Check L1 (DashMap)
    /// 2. Check L2 (Redis)
    /// 3. Return None if not found
    ///
    /// If found in L2, the value is promoted to L1.
    pub async fn get(&self, key: &str) -> Result<Option<Arc<Vec<u8>>>, CacheError> {
        match self {
            CacheBackend::Local(map) => {
                let result = Self::local_get(map, key);

                if result.is_some() {
                    crate::metrics::record_cache_hit("L1");
                } else {
                    crate::metrics::record_cache_miss();
                }

                Ok(result)
            }
            CacheBackend::Redis { redis, local } => {
                // 1. Check L1 (local DashMap)
                if let Some(data) = Self::local_get(local, key) {
                    tracing::debug!(key = %key, "cache hit (L1)");
                    crate::metrics::record_cache_hit("L1");
                    return Ok(Some(data));
                }

                // 2. Check L2 (Redis)
                let mut conn = redis.get().await.inspect_err(|e| {
                    tracing::warn!(error = %e, "Failed to get Redis connection");
                })?;
                let value = conn
                    .get::<_, Option<Vec<u8>>>(key)
                    .await
                    .inspect_err(|e| tracing::warn!(key = %key, error = %e, "Redis GET error"))?;

                match value {
                    Some(data) => {
                        tracing::debug!(key = %key, "cache hit (L2)");
                        crate::metrics::record_cache_hit("L2");

                        let entry = CachedEntry::new(data, L1_PROMOTION_TTL);
                        let data_arc = Arc::clone(&entry.data);
                        local.insert(key.to_string(), entry);

                        Ok(Some(data_arc))
                    }
                    None => {
                        tracing::debug!(key = %key, "cache miss");
                        crate::metrics::record_cache_miss();
                        Ok(None)
                    }
                }
            }
        }
    }

    /// Set a value in the cache with TTL.
    ///
    /// - **Local mode**: Write to DashMap only
    /// - **Redis mode**: Write to L2 (Redis), then L1 (DashMap) once Redis accepted it
    pub async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        match self {
            CacheBackend::Local(map) => {
                map.insert(key.to_string(), CachedEntry::new(value, ttl));
                Ok(())
            }
            CacheBackend::Redis { redis, local } => {
                let ttl_secs = ttl.as_secs().max(1);
                let mut conn = redis.get().await?;
                conn.set_ex::<_, _, ()>(key, value.as_slice(), ttl_secs)
                    .await
                    .inspect_err(|e| tracing::warn!(key = %key, error = %e, "Redis SET error"))?;

                // L1 only ever holds what L2 accepted
                local.insert(key.to_string(), CachedEntry::new(value, ttl));
                tracing::debug!(key = %key, ttl_secs = %ttl_secs, "cache set (L1+L2)");
                Ok(())
            }
        }
    }

    /// Remove a cache entry from every tier.
    pub async fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        match self {
            CacheBackend::Local(map) => {
                map.remove(key);
                tracing::debug!(key = %key, "cache invalidated (local)");
                Ok(())
            }
            CacheBackend::Redis { redis, local } => {
                local.remove(key);

                let mut conn = redis.get().await?;
                conn.del::<_, ()>(key)
                    .await
                    .inspect_err(|e| tracing::warn!(key = %key, error = %e, "Redis DEL error"))?;
                tracing::debug!(key = %key, "cache invalidated (L1+L2)");
                Ok(())
            }
        }
    }

    /// Get cache statistics (L1 only).
    pub fn stats(&self) -> CacheStats {
        match self {
            CacheBackend::Local(map) => CacheStats {
                l1_entries: map.len(),
                mode: "local",
            },
            CacheBackend::Redis { local, .. } => CacheStats {
                l1_entries: local.len(),
                mode: "redis",
            },
        }
    }

    /// Check if Redis is available (for readiness checks).
    pub async fn is_redis_available(&self) -> bool {
        match self {
            CacheBackend::Local(_) => false,
            CacheBackend::Redis { redis, .. } => redis.get().await.is_ok(),
        }
    }

    /// Get the local cache reference (for testing/internal use).
    pub fn local_cache(&self) -> &Arc<DashMap<String, CachedEntry>> {
        match self {
            CacheBackend::Local(map) => map,
            CacheBackend::Redis { local, .. } => local,
        }
    }
}

#[async_trait]
impl Cache for CacheBackend {
    async fn get(&self, key: &str) -> Result<Option<Arc<Vec<u8>>>, CacheError> {
        CacheBackend::get(self, key).await
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        CacheBackend::set(self, key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.invalidate(key).await
    }

    fn mode(&self) -> &'static str {
        self.stats().mode
    }
}

/// Cache statistics.
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub l1_entries: usize,
    pub mode: &'static str,
}
