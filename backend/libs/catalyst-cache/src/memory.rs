//! In-process cache backend on top of moka

use moka::future::Cache;
use moka::policy::EvictionPolicy;
use std::str::FromStr;
use std::time::Duration;

use crate::{CacheError, CachePort, CacheResult};

/// Which entries moka evicts first once capacity is reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionKind {
    Lru,
    TinyLfu,
}

impl EvictionKind {
    fn policy(&self) -> EvictionPolicy {
        match self {
            Self::Lru => EvictionPolicy::lru(),
            Self::TinyLfu => EvictionPolicy::tiny_lfu(),
        }
    }
}

impl FromStr for EvictionKind {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lru" => Ok(Self::Lru),
            "tiny_lfu" | "tinylfu" => Ok(Self::TinyLfu),
            other => Err(CacheError::Config(format!(
                "unknown eviction policy '{}', expected lru or tiny_lfu",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MemoryCacheConfig {
    pub max_capacity: u64,
    pub ttl: Duration,
    pub eviction: EvictionKind,
}

#[derive(Clone)]
pub struct MemoryCache {
    inner: Cache<String, String>,
}

impl MemoryCache {
    pub fn new(config: &MemoryCacheConfig) -> Self {
        let inner = Cache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(config.ttl)
            .eviction_policy(config.eviction.policy())
            .build();

        Self { inner }
    }
}

#[async_trait::async_trait]
impl CachePort for MemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        Ok(self.inner.get(key).await)
    }

    async fn set(&self, key: &str, value: String) -> CacheResult<()> {
        self.inner.insert(key.to_string(), value).await;
        Ok(())
    }

    async fn invalidate(&self, key: &str) -> CacheResult<()> {
        self.inner.invalidate(key).await;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
