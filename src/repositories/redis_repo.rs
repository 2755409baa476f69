//! Redis connection used for the connectivity check.

use crate::error::AppError;
use redis::AsyncCommands;
use std::sync::Arc;
use tracing::debug;

pub const HEALTH_KEY: &str = "test_key";
pub const HEALTH_VALUE: &str = "Hello from Redis!";

/// Redis-backed repository. Opening does not connect; commands connect lazily.
#[derive(Clone)]
pub struct RedisRepository {
    client: Arc<redis::Client>,
}

impl RedisRepository {
    /// Create repository from Redis URL.
    pub fn new(redis_url: &str) -> Result<Self, AppError> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// Get a multiplexed connection for commands.
    pub async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, AppError> {
        let conn = self.client.get_multiplexed_async_connection().await?;
        Ok(conn)
    }

    /// SET then GET the same key; returns what GET saw.
    pub async fn round_trip(&self, key: &str, value: &str) -> Result<Option<String>, AppError> {
        let mut conn = self.connection().await?;
        conn.set::<_, _, ()>(key, value).await?;
        let read: Option<String> = conn.get(key).await?;
        debug!(key = %key, found = read.is_some(), "redis round trip");
        Ok(read)
    }

    /// Round trip of the fixed health key.
    pub async fn health_check(&self) -> Result<Option<String>, AppError> {
        self.round_trip(HEALTH_KEY, HEALTH_VALUE).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_does_not_connect() {
        assert!(RedisRepository::new("redis://127.0.0.1:1/").is_ok());
    }

    #[test]
    fn bad_url_rejected() {
        assert!(RedisRepository::new("not a url").is_err());
    }

    #[tokio::test]
    async fn round_trip_against_live_redis() {
        let url = match std::env::var("TEST_REDIS_URL") {
            Ok(u) => u,
            Err(_) => return,
        };
        let repo = RedisRepository::new(&url).unwrap();
        let value = repo.health_check().await.unwrap();
        assert_eq!(value.as_deref(), Some(HEALTH_VALUE));
    }
}
