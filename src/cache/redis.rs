//! Redis Tier Module
//!
//! Network-backed [`Cache`] over a Redis connection manager. Values are the
//! same JSON bytes the in-process store holds.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tracing::info;

use crate::cache::{Cache, KeyTtl};
use crate::error::{CacheError, Result};

/// Upper bound on establishing the initial connection.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::backend(err)
    }
}

// Redis rejects a zero PX, so sub-millisecond TTLs round up
fn millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

// == Redis Cache ==
/// Redis-backed [`Cache`].
///
/// A nil reply is the only way Redis reports a miss; it is decoded into
/// `Option::None` here and surfaced as [`CacheError::KeyNotFound`]. Every other
/// driver error is passed through as [`CacheError::Backend`].
pub struct RedisCache {
    conn: ConnectionManager,
    closed: AtomicBool,
}

impl RedisCache {
    /// Connects to `url` (e.g. `redis://127.0.0.1:6379/0`) and pings it.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = Client::open(url)?;
        let handshake = async {
            let cache = Self {
                conn: ConnectionManager::new(client).await?,
                closed: AtomicBool::new(false),
            };
            cache.ping().await?;
            Ok::<_, CacheError>(cache)
        };
        let cache = tokio::time::timeout(CONNECT_TIMEOUT, handshake)
            .await
            .map_err(|_| CacheError::backend("timed out connecting to redis"))??;

        info!("Connected to redis");
        Ok(cache)
    }

    fn connection(&self) -> Result<ConnectionManager> {
        if self.closed.load(Ordering::Acquire) {
            return Err(CacheError::Closed);
        }
        Ok(self.conn.clone())
    }
}

impl fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCache")
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get_bytes(&self, key: &str) -> Result<Vec<u8>> {
        let mut conn = self.connection()?;
        let value: Option<Vec<u8>> = conn.get(key).await?;
        value.ok_or_else(|| CacheError::KeyNotFound(key.to_string()))
    }

    async fn set_bytes(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        let mut conn = self.connection()?;
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if !ttl.is_zero() {
            cmd.arg("PX").arg(millis(ttl));
        }
        let _: () = cmd.query_async(&mut conn).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.connection()?;
        let _: () = conn.del(key).await?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection()?;
        Ok(conn.exists(key).await?)
    }

    async fn mget_bytes(&self, keys: &[String]) -> Result<HashMap<String, Vec<u8>>> {
        if keys.is_empty() {
            return Ok(HashMap::new());
        }

        let mut conn = self.connection()?;
        let values: Vec<Option<Vec<u8>>> =
            redis::cmd("MGET").arg(keys).query_async(&mut conn).await?;

        Ok(keys
            .iter()
            .zip(values)
            .filter_map(|(key, value)| value.map(|v| (key.clone(), v)))
            .collect())
    }

    async fn mset_bytes(&self, items: HashMap<String, Vec<u8>>, ttl: Duration) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }

        let mut conn = self.connection()?;
        let mut pipe = redis::pipe();
        for (key, value) in &items {
            pipe.cmd("SET").arg(key).arg(value);
            if !ttl.is_zero() {
                pipe.arg("PX").arg(millis(ttl));
            }
            pipe.ignore();
        }
        let _: () = pipe.query_async(&mut conn).await?;
        Ok(())
    }

    async fn mdelete(&self, keys: &[String]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }

        let mut conn = self.connection()?;
        let _: () = conn.del(keys).await?;
        Ok(())
    }

    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64> {
        let mut conn = self.connection()?;
        Ok(conn.incr(key, delta).await?)
    }

    async fn decr_by(&self, key: &str, delta: i64) -> Result<i64> {
        let mut conn = self.connection()?;
        Ok(conn.decr(key, delta).await?)
    }

    async fn set_nx_bytes(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<bool> {
        let mut conn = self.connection()?;
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value).arg("NX");
        if !ttl.is_zero() {
            cmd.arg("PX").arg(millis(ttl));
        }
        let reply: Option<String> = cmd.query_async(&mut conn).await?;
        Ok(reply.is_some())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.connection()?;
        // PEXPIRE 0 deletes the key, matching the zero-ttl rule of the other tiers
        let ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        let _: () = redis::cmd("PEXPIRE")
            .arg(key)
            .arg(ms)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn ttl(&self, key: &str) -> Result<KeyTtl> {
        let mut conn = self.connection()?;
        let ms: i64 = redis::cmd("PTTL").arg(key).query_async(&mut conn).await?;
        Ok(KeyTtl::from_millis(ms))
    }

    async fn close(&self) -> Result<()> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            info!("Redis cache closed");
        }
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.connection()?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
