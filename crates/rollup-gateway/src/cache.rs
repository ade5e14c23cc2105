//! TTL-aware, capacity-bounded response cache.
//!
//! Keyed by method + serialized params so structurally identical upstream
//! calls collapse to a single slot. Entries are evicted by TTL expiry or by
//! strict LRU pressure once the cache is full. Callers must never depend on
//! cache presence for correctness, only for latency: producers are idempotent
//! reads and concurrent misses for the same key may both run the producer.

use std::{
    future::Future,
    num::NonZeroUsize,
    time::{
        Duration,
        Instant,
    },
};

use lru::LruCache;
use parking_lot::Mutex;
use serde_json::Value;

use crate::error::Result;

/// Default maximum number of cached responses.
pub const DEFAULT_CACHE_CAPACITY: usize = 128;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    expires_at: Instant,
}

/// Bounded LRU cache for upstream JSON responses.
///
/// Owned explicitly by whoever constructs the transport and injected from
/// there, so tests can run against isolated instances.
#[derive(Debug)]
pub struct ResponseCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
}

impl ResponseCache {
    /// Create a cache bounded to `capacity` entries.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero; [`crate::GatewayConfig::validate`]
    /// rejects that before a cache is ever built.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).expect("cache capacity must be non-zero");
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Deterministic cache key for a JSON-RPC call.
    ///
    /// `serde_json` maps serialize with sorted keys, so two structurally
    /// identical param lists always produce the same key.
    pub fn call_key(method: &str, params: &[Value]) -> String {
        let params = serde_json::to_string(params).unwrap_or_else(|_| "[]".to_string());
        format!("{method}:{params}")
    }

    /// Return the cached value for `key`, or run `producer` and cache its
    /// result for `ttl`.
    ///
    /// A `ttl` of `None` (or zero) bypasses the cache entirely: the producer
    /// runs on every call and nothing is stored. Producer failures propagate
    /// to the caller and are never cached.
    pub async fn get_or_compute<F, Fut>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        producer: F,
    ) -> Result<Value>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        let Some(ttl) = ttl.filter(|ttl| !ttl.is_zero()) else {
            return producer().await;
        };

        if let Some(value) = self.lookup(key) {
            return Ok(value);
        }

        // The lock is never held across the producer await; two concurrent
        // misses may both reach upstream, which is an accepted inefficiency.
        let value = producer().await?;
        self.insert(key, value.clone(), ttl);
        Ok(value)
    }

    /// Number of live entries, expired ones included until they are touched.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, key: &str) -> Option<Value> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                metrics::counter!("rollup_gateway_cache_hit_total").increment(1);
                Some(entry.value.clone())
            }
            Some(_) => {
                // Past its TTL: drop the entry so it can never be served.
                entries.pop(key);
                metrics::counter!("rollup_gateway_cache_expired_total").increment(1);
                None
            }
            None => {
                metrics::counter!("rollup_gateway_cache_miss_total").increment(1);
                None
            }
        }
    }

    fn insert(&self, key: &str, value: Value, ttl: Duration) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        let mut entries = self.entries.lock();
        if let Some((evicted_key, _)) = entries.push(key.to_string(), entry) {
            if evicted_key != key {
                metrics::counter!("rollup_gateway_cache_evicted_total").increment(1);
                tracing::debug!(key = %evicted_key, "evicted least-recently-used cache entry");
            }
        }
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}
