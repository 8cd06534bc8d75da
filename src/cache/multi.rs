//! Multi-Level Orchestrator Module
//!
//! Chains cache tiers into a hierarchy: reads probe from the nearest level
//! down and promote deep hits, writes fan out to every level.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::cache::stats::{LevelCounters, MultiLevelStats};
use crate::cache::{Cache, KeyTtl, MemoryCache};
use crate::error::{CacheError, Result};

// == Multi-Level Cache ==
/// A [`Cache`] composed of an ordered list of levels, index 0 nearest.
///
/// The level list is fixed at construction. One level is the authority: it
/// alone answers counters and TTL queries and decides `set_nx`. Unless a
/// level is marked with [`MultiLevelBuilder::authoritative_level`], the last
/// level is the authority.
///
/// Cross-level operations are best-effort and not atomic: a fan-out write can
/// land on some levels and fail on others, in which case the last level
/// error is returned.
pub struct MultiLevelCache {
    levels: Vec<Arc<dyn Cache>>,
    authority: Option<usize>,
    counters: LevelCounters,
}

impl MultiLevelCache {
    // == Constructors ==
    /// Creates an orchestrator whose last level is the authority.
    pub fn new(levels: Vec<Arc<dyn Cache>>) -> Self {
        let authority = levels.len().checked_sub(1);
        Self::from_parts(levels, authority)
    }

    /// Starts a builder for marking an authoritative level explicitly.
    pub fn builder() -> MultiLevelBuilder {
        MultiLevelBuilder::default()
    }

    /// An in-process L1 with the default sweep interval in front of `remote`.
    ///
    /// Must be called inside a tokio runtime.
    pub fn with_memory_front(remote: Arc<dyn Cache>) -> Self {
        let front: Arc<dyn Cache> = Arc::new(MemoryCache::new());
        Self::new(vec![front, remote])
    }

    fn from_parts(levels: Vec<Arc<dyn Cache>>, authority: Option<usize>) -> Self {
        let counters = LevelCounters::new(levels.len());
        Self {
            levels,
            authority,
            counters,
        }
    }

    // == Introspection ==
    /// The configured levels, nearest first.
    pub fn levels(&self) -> &[Arc<dyn Cache>] {
        &self.levels
    }

    /// Index of the authoritative level, None when no levels are configured.
    pub fn authority(&self) -> Option<usize> {
        self.authority
    }

    /// Returns current orchestrator statistics.
    pub fn stats(&self) -> MultiLevelStats {
        self.counters.snapshot()
    }

    fn authoritative(&self) -> Option<(usize, &Arc<dyn Cache>)> {
        self.authority
            .and_then(|index| self.levels.get(index).map(|level| (index, level)))
    }

    // == Backfill ==
    /// Copies a value found at `hit_level` into every nearer level, using the
    /// hit level's remaining TTL. Skipped when that TTL is not positive.
    async fn backfill(&self, key: &str, value: &[u8], hit_level: usize) {
        let ttl = match self.levels[hit_level].ttl(key).await {
            Ok(ttl) => ttl,
            Err(e) => {
                debug!(key, level = hit_level, error = %e, "TTL lookup failed, skipping backfill");
                return;
            }
        };

        let Some(ttl) = ttl.remaining() else {
            debug!(key, level = hit_level, "No positive TTL on hit level, skipping backfill");
            return;
        };

        for (index, level) in self.levels[..hit_level].iter().enumerate() {
            match level.set_bytes(key, value.to_vec(), ttl).await {
                Ok(()) => {
                    self.counters.record_backfill();
                    let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
                    debug!(key, level = index, ttl_ms, "Backfilled");
                }
                Err(e) => {
                    self.counters.record_backfill_failure();
                    warn!(key, level = index, error = %e, "Backfill failed");
                }
            }
        }
    }

    // == Fan-Out ==
    /// Applies `op` to every level, continuing past failures, and returns the
    /// last error encountered.
    async fn fan_out<'a, F, Fut>(&'a self, name: &'static str, op: F) -> Result<()>
    where
        F: Fn(&'a dyn Cache) -> Fut + Send,
        Fut: Future<Output = Result<()>> + Send,
    {
        let mut last_err = None;
        for (index, level) in self.levels.iter().enumerate() {
            if let Err(e) = op(level.as_ref()).await {
                self.counters.record_fanout_failure();
                warn!(op = name, level = index, error = %e, "Fan-out failed on level");
                last_err = Some(e);
            }
        }
        last_err.map_or(Ok(()), Err)
    }
}

impl fmt::Debug for MultiLevelCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiLevelCache")
            .field("levels", &self.levels.len())
            .field("authority", &self.authority)
            .finish()
    }
}

#[async_trait]
impl Cache for MultiLevelCache {
    async fn get_bytes(&self, key: &str) -> Result<Vec<u8>> {
        for (index, level) in self.levels.iter().enumerate() {
            match level.get_bytes(key).await {
                Ok(value) => {
                    self.counters.record_hit(index);
                    debug!(key, level = index, "Cache hit");
                    if index > 0 {
                        self.backfill(key, &value, index).await;
                    }
                    return Ok(value);
                }
                Err(e) if e.is_not_found() => {}
                Err(e) => {
                    warn!(key, level = index, error = %e, "Level read failed, trying next level");
                }
            }
        }

        self.counters.record_miss();
        debug!(key, "Cache miss on every level");
        Err(CacheError::KeyNotFound(key.to_string()))
    }

    async fn set_bytes(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        self.fan_out("set", |level| level.set_bytes(key, value.clone(), ttl))
            .await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.fan_out("delete", |level| level.delete(key)).await
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        for (index, level) in self.levels.iter().enumerate() {
            match level.exists(key).await {
                Ok(true) => return Ok(true),
                Ok(false) => {}
                Err(e) => {
                    warn!(key, level = index, error = %e, "Level exists check failed");
                }
            }
        }
        Ok(false)
    }

    async fn mget_bytes(&self, keys: &[String]) -> Result<HashMap<String, Vec<u8>>> {
        let mut result = HashMap::with_capacity(keys.len());
        let mut remaining = keys.to_vec();

        for (index, level) in self.levels.iter().enumerate() {
            if remaining.is_empty() {
                break;
            }

            let mut found = match level.mget_bytes(&remaining).await {
                Ok(found) => found,
                Err(e) => {
                    warn!(level = index, error = %e, "Level batch read failed, trying next level");
                    continue;
                }
            };

            remaining.retain(|key| match found.remove(key) {
                Some(value) => {
                    result.insert(key.clone(), value);
                    false
                }
                None => true,
            });
        }

        Ok(result)
    }

    async fn mset_bytes(&self, items: HashMap<String, Vec<u8>>, ttl: Duration) -> Result<()> {
        self.fan_out("mset", |level| level.mset_bytes(items.clone(), ttl))
            .await
    }

    async fn mdelete(&self, keys: &[String]) -> Result<()> {
        self.fan_out("mdelete", |level| level.mdelete(keys)).await
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        match self.authoritative() {
            Some((_, level)) => level.incr(key).await,
            None => Ok(0),
        }
    }

    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64> {
        match self.authoritative() {
            Some((_, level)) => level.incr_by(key, delta).await,
            None => Ok(0),
        }
    }

    async fn decr(&self, key: &str) -> Result<i64> {
        match self.authoritative() {
            Some((_, level)) => level.decr(key).await,
            None => Ok(0),
        }
    }

    async fn decr_by(&self, key: &str, delta: i64) -> Result<i64> {
        match self.authoritative() {
            Some((_, level)) => level.decr_by(key, delta).await,
            None => Ok(0),
        }
    }

    async fn set_nx_bytes(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<bool> {
        let Some((authority, level)) = self.authoritative() else {
            return Ok(false);
        };

        let created = level.set_nx_bytes(key, value.clone(), ttl).await?;
        if !created {
            return Ok(false);
        }

        for (index, level) in self.levels.iter().enumerate() {
            if index == authority {
                continue;
            }
            if let Err(e) = level.set_bytes(key, value.clone(), ttl).await {
                self.counters.record_backfill_failure();
                warn!(key, level = index, error = %e, "Set-nx replication failed");
            }
        }
        Ok(true)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<()> {
        self.fan_out("expire", |level| level.expire(key, ttl)).await
    }

    async fn ttl(&self, key: &str) -> Result<KeyTtl> {
        match self.authoritative() {
            Some((_, level)) => level.ttl(key).await,
            None => Ok(KeyTtl::Missing),
        }
    }

    async fn close(&self) -> Result<()> {
        self.fan_out("close", |level| level.close()).await
    }

    async fn ping(&self) -> Result<()> {
        for level in &self.levels {
            level.ping().await?;
        }
        Ok(())
    }
}

// == Builder ==
/// Builder for [`MultiLevelCache`].
#[derive(Default)]
pub struct MultiLevelBuilder {
    levels: Vec<Arc<dyn Cache>>,
    authority: Option<usize>,
    authority_marks: usize,
}

impl MultiLevelBuilder {
    /// Appends a level behind the ones added so far.
    pub fn level(mut self, cache: Arc<dyn Cache>) -> Self {
        self.levels.push(cache);
        self
    }

    /// Appends a level and marks it as the authority.
    pub fn authoritative_level(mut self, cache: Arc<dyn Cache>) -> Self {
        self.authority = Some(self.levels.len());
        self.authority_marks += 1;
        self.levels.push(cache);
        self
    }

    /// Builds the orchestrator.
    ///
    /// # Errors
    /// `InvalidConfig` if more than one level was marked authoritative.
    pub fn build(self) -> Result<MultiLevelCache> {
        if self.authority_marks > 1 {
            return Err(CacheError::InvalidConfig(format!(
                "expected at most one authoritative level, got {}",
                self.authority_marks
            )));
        }

        let authority = self.authority.or(self.levels.len().checked_sub(1));
        Ok(MultiLevelCache::from_parts(self.levels, authority))
    }
}
