//! Catalyst caching layer
//!
//! Services depend on the [`CachePort`] trait rather than a concrete store so
//! the backend can be chosen at startup (in-process or Redis) and replaced
//! with a fake in tests. Values cross the port as strings; [`JsonCache`]
//! layers typed (de)serialization and metrics on top of any port.

mod error;
mod keys;
mod memory;
mod metrics;
mod redis_store;

pub use error::{CacheError, CacheResult};
pub use keys::{CacheKey, CACHE_VERSION};
pub use memory::{EvictionKind, MemoryCache, MemoryCacheConfig};
pub use redis_store::RedisCache;

use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Minimal key/value contract every cache backend fulfils.
///
/// Expiry is a property of the backend instance, not of individual writes.
#[async_trait::async_trait]
pub trait CachePort: Send + Sync {
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    async fn set(&self, key: &str, value: String) -> CacheResult<()>;

    async fn invalidate(&self, key: &str) -> CacheResult<()>;

    /// Short backend label used for metrics and logs
    fn backend(&self) -> &'static str;
}

/// Typed JSON view over a [`CachePort`]
#[derive(Clone)]
pub struct JsonCache {
    port: Arc<dyn CachePort>,
}

impl JsonCache {
    pub fn new(port: Arc<dyn CachePort>) -> Self {
        Self { port }
    }

    pub fn backend(&self) -> &'static str {
        self.port.backend()
    }

    /// Get and decode a value. Undecodable entries are dropped and reported as a miss.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<T>> {
        let backend = self.port.backend();

        let raw = match self.port.get(key).await {
            Ok(raw) => raw,
            Err(e) => {
                metrics::record_lookup(backend, "error");
                return Err(e);
            }
        };

        let Some(raw) = raw else {
            debug!(key = %key, backend, "Cache miss");
            metrics::record_lookup(backend, "miss");
            return Ok(None);
        };

        match serde_json::from_str::<T>(&raw) {
            Ok(value) => {
                debug!(key = %key, backend, "Cache hit");
                metrics::record_lookup(backend, "hit");
                Ok(Some(value))
            }
            Err(e) => {
                warn!(key = %key, backend, error = %e, "Cache entry failed to decode");
                metrics::record_lookup(backend, "corrupt");
                if let Err(e) = self.port.invalidate(key).await {
                    warn!(key = %key, error = %e, "Failed to drop corrupt cache entry");
                }
                Ok(None)
            }
        }
    }

    pub async fn set<T: Serialize + Sync>(&self, key: &str, value: &T) -> CacheResult<()> {
        let raw = serde_json::to_string(value)?;
        self.port.set(key, raw).await?;
        metrics::record_write(self.port.backend());
        Ok(())
    }

    pub async fn invalidate(&self, key: &str) -> CacheResult<()> {
        self.port.invalidate(key).await?;
        metrics::record_invalidation(self.port.backend());
        Ok(())
    }
}
