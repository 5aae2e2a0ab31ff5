use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

use super::CacheStore;
use crate::error::CacheError;

/// Redis-backed cache. Each command is bounded by `op_timeout` so a stalled
/// server shows up as a `CacheError::Timeout` instead of a hung request.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
    op_timeout: Duration,
}

impl fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCache")
            .field("connection", &"ConnectionManager")
            .field("op_timeout", &self.op_timeout)
            .finish()
    }
}

impl RedisCache {
    pub async fn connect(redis_url: &str, op_timeout: Duration) -> Result<Self, CacheError> {
        info!("Connecting to Redis cache");

        let client = redis::Client::open(redis_url)
            .map_err(|e| CacheError::Connection(format!("invalid Redis URL: {e}")))?;

        let conn = tokio::time::timeout(op_timeout * 4, ConnectionManager::new(client))
            .await
            .map_err(|_| CacheError::Timeout)??;

        info!("Successfully connected to Redis cache");
        Ok(Self { conn, op_timeout })
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        debug!("Cache GET: {}", key);
        let mut conn = self.conn.clone();

        let value = tokio::time::timeout(self.op_timeout, conn.get::<_, Option<String>>(key))
            .await
            .map_err(|_| CacheError::Timeout)??;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        debug!("Cache SET: {} (TTL: {:?})", key, ttl);
        let mut conn = self.conn.clone();

        tokio::time::timeout(
            self.op_timeout,
            conn.set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1)),
        )
        .await
        .map_err(|_| CacheError::Timeout)??;
        Ok(())
    }
}
