//! Redis backend.

use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};

use super::backend::{CacheBackend, CacheBackendError};

#[derive(Clone)]
pub struct RedisBackend {
    conn: ConnectionManager,
}

impl RedisBackend {
    pub async fn connect(url: &str) -> Result<Self, CacheBackendError> {
        let client = Client::open(url).map_err(CacheBackendError::unavailable)?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(CacheBackendError::unavailable)?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheBackendError> {
        let mut conn = self.conn.clone();
        conn.get(key)
            .await
            .map_err(|err| CacheBackendError::command("GET", err))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheBackendError> {
        let mut conn = self.conn.clone();
        // SETEX rejects a zero expiry.
        let seconds = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, value, seconds)
            .await
            .map_err(|err| CacheBackendError::command("SETEX", err))
    }

    async fn delete(&self, key: &str) -> Result<(), CacheBackendError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key)
            .await
            .map_err(|err| CacheBackendError::command("DEL", err))
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<usize, CacheBackendError> {
        let mut conn = self.conn.clone();
        let keys: Vec<String> = conn
            .keys(pattern)
            .await
            .map_err(|err| CacheBackendError::command("KEYS", err))?;

        if keys.is_empty() {
            return Ok(0);
        }

        let deleted: i64 = conn
            .del(&keys)
            .await
            .map_err(|err| CacheBackendError::command("DEL", err))?;
        Ok(usize::try_from(deleted).unwrap_or(0))
    }
}
