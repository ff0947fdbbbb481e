//! Key-value backend adapter (Redis).

use anyhow::Result;
use async_trait::async_trait;
use redis::{AsyncCommands, IntoConnectionInfo};

use crate::config::BackendSettings;

/// The handful of backend commands the counters need.
///
/// Every call is a single round trip and every call can fail; callers decide
/// what an error degrades to.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Health check - verify backend connectivity.
    async fn ping(&self) -> Result<bool>;

    /// Read an integer value.
    async fn get(&self, key: &str) -> Result<Option<i64>>;

    /// Write an integer value, optionally expiring after `ttl_secs`.
    async fn set(&self, key: &str, value: i64, ttl_secs: Option<u64>) -> Result<()>;

    /// Atomically add `delta`, returning the new value.
    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64>;

    /// Atomically add one, returning the new value.
    async fn incr(&self, key: &str) -> Result<i64>;

    /// Whether the key currently exists.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Set a key's time to live.
    async fn expire(&self, key: &str, ttl_secs: u64) -> Result<()>;

    /// Insert or re-score a sorted set member.
    async fn zadd(&self, key: &str, member: &str, score: f64) -> Result<()>;

    /// Remove sorted set members with `min <= score <= max`, returning how many went.
    async fn zrembyscore(&self, key: &str, min: f64, max: f64) -> Result<u64>;

    /// Number of members in a sorted set.
    async fn zcard(&self, key: &str) -> Result<u64>;
}

/// Redis implementation of KvStore.
#[derive(Clone)]
pub struct RedisKvStore {
    client: redis::Client,
}

impl RedisKvStore {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    /// Build a client from the configured URL, authenticating with the token.
    pub fn open(settings: &BackendSettings) -> Result<Self> {
        let mut info = settings.url.as_str().into_connection_info()?;
        info.redis.password = Some(settings.token.clone());

        Ok(Self::new(redis::Client::open(info)?))
    }
}

#[async_trait]
impl KvStore for RedisKvStore {
    async fn ping(&self) -> Result<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let result: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(result == "PONG")
    }

    async fn get(&self, key: &str) -> Result<Option<i64>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let value: Option<i64> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: i64, ttl_secs: Option<u64>) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        match ttl_secs {
            Some(ttl) => {
                let _: () = conn.set_ex(key, value, ttl).await?;
            }
            None => {
                let _: () = conn.set(key, value).await?;
            }
        }
        Ok(())
    }

    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let value: i64 = redis::cmd("INCRBY")
            .arg(key)
            .arg(delta)
            .query_async(&mut conn)
            .await?;
        Ok(value)
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let value: i64 = redis::cmd("INCR").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let exists: bool = conn.exists(key).await?;
        Ok(exists)
    }

    async fn expire(&self, key: &str, ttl_secs: u64) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let _: () = conn.expire(key, ttl_secs as i64).await?;
        Ok(())
    }

    async fn zadd(&self, key: &str, member: &str, score: f64) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let _: () = conn.zadd(key, member, score).await?;
        Ok(())
    }

    async fn zrembyscore(&self, key: &str, min: f64, max: f64) -> Result<u64> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let removed: u64 = conn.zrembyscore(key, min, max).await?;
        Ok(removed)
    }

    async fn zcard(&self, key: &str) -> Result<u64> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let count: u64 = conn.zcard(key).await?;
        Ok(count)
    }
}
