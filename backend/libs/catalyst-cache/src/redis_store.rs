//! Redis cache backend, shared across service replicas

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;
use tracing::debug;

use crate::{CacheError, CachePort, CacheResult};

#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
    ttl_secs: u64,
}

impl RedisCache {
    pub async fn connect(url: &str, ttl: Duration) -> CacheResult<Self> {
        if ttl.as_secs() == 0 {
            return Err(CacheError::Config(
                "redis cache TTL must be at least one second".to_string(),
            ));
        }

        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;

        Ok(Self {
            conn,
            ttl_secs: ttl.as_secs(),
        })
    }
}

#[async_trait::async_trait]
impl CachePort for RedisCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String) -> CacheResult<()> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, value, self.ttl_secs).await?;
        debug!(key = %key, ttl = self.ttl_secs, "Cache set");
        Ok(())
    }

    async fn invalidate(&self, key: &str) -> CacheResult<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
