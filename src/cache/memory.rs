//! In-Process Store Module
//!
//! A concurrent map of keys to JSON-encoded values with per-key expiration,
//! lazy expiry on read and a background sweep.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::cache::codec::{decode, encode};
use crate::cache::stats::{CacheStats, StoreCounters};
use crate::cache::ttl::deadline_from;
use crate::cache::{Cache, CacheEntry, KeyTtl};
use crate::error::{CacheError, Result};
use crate::tasks::{spawn_sweeper, Sweeper};

/// Default interval between expiry sweeps.
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

pub(crate) type Entries = Arc<RwLock<HashMap<String, CacheEntry>>>;

/// Removes every entry expired at `now`, returning how many were dropped.
pub(crate) fn purge_expired(entries: &mut HashMap<String, CacheEntry>, now: Instant) -> usize {
    let before = entries.len();
    entries.retain(|_, entry| !entry.is_expired_at(now));
    before - entries.len()
}

// == Memory Cache ==
/// In-process [`Cache`] backed by one reader/writer lock over a `HashMap`.
///
/// All operations serialize through the lock, which makes operations on the
/// same key linearizable. Expired entries are invisible to reads whether or
/// not the sweep has removed them yet.
///
/// Construction spawns the sweep task, so it must happen inside a tokio
/// runtime. [`Cache::close`] stops and joins the task; every later operation
/// fails with [`CacheError::Closed`].
#[derive(Debug)]
pub struct MemoryCache {
    entries: Entries,
    counters: Arc<StoreCounters>,
    closed: AtomicBool,
    sweeper: Mutex<Option<Sweeper>>,
}

impl MemoryCache {
    // == Constructors ==
    /// Creates a store sweeping every [`DEFAULT_CLEANUP_INTERVAL`].
    pub fn new() -> Self {
        Self::start(DEFAULT_CLEANUP_INTERVAL)
    }

    /// Creates a store with a custom sweep interval.
    ///
    /// # Errors
    /// `InvalidConfig` if `interval` is zero.
    pub fn with_cleanup_interval(interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(CacheError::InvalidConfig(
                "cleanup interval must be greater than zero".to_string(),
            ));
        }
        Ok(Self::start(interval))
    }

    fn start(interval: Duration) -> Self {
        let entries: Entries = Arc::new(RwLock::new(HashMap::new()));
        let counters = Arc::new(StoreCounters::default());
        let sweeper = spawn_sweeper(entries.clone(), counters.clone(), interval);

        Self {
            entries,
            counters,
            closed: AtomicBool::new(false),
            sweeper: Mutex::new(Some(sweeper)),
        }
    }

    // == Introspection ==
    /// Entries physically held, including expired ones not yet swept.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns true if no entries are held.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Returns current store statistics.
    pub async fn stats(&self) -> CacheStats {
        let total = self.entries.read().await.len();
        self.counters.snapshot(total)
    }

    /// True once [`Cache::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    // Checked while holding the lock so close and other operations are ordered.
    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            Err(CacheError::Closed)
        } else {
            Ok(())
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get_bytes(&self, key: &str) -> Result<Vec<u8>> {
        let entries = self.entries.read().await;
        self.ensure_open()?;

        match entries.get(key) {
            Some(entry) if !entry.is_expired() => {
                self.counters.record_hits(1);
                Ok(entry.value.clone())
            }
            _ => {
                self.counters.record_misses(1);
                Err(CacheError::KeyNotFound(key.to_string()))
            }
        }
    }

    async fn set_bytes(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        let mut entries = self.entries.write().await;
        self.ensure_open()?;

        entries.insert(key.to_string(), CacheEntry::new(value, ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        self.ensure_open()?;

        entries.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let entries = self.entries.read().await;
        self.ensure_open()?;

        Ok(entries.get(key).is_some_and(|entry| !entry.is_expired()))
    }

    async fn mget_bytes(&self, keys: &[String]) -> Result<HashMap<String, Vec<u8>>> {
        let entries = self.entries.read().await;
        self.ensure_open()?;

        let now = Instant::now();
        let found: HashMap<String, Vec<u8>> = keys
            .iter()
            .filter_map(|key| {
                entries
                    .get(key)
                    .filter(|entry| !entry.is_expired_at(now))
                    .map(|entry| (key.clone(), entry.value.clone()))
            })
            .collect();

        self.counters.record_hits(found.len() as u64);
        self.counters
            .record_misses(keys.len().saturating_sub(found.len()) as u64);
        Ok(found)
    }

    async fn mset_bytes(&self, items: HashMap<String, Vec<u8>>, ttl: Duration) -> Result<()> {
        let mut entries = self.entries.write().await;
        self.ensure_open()?;

        for (key, value) in items {
            entries.insert(key, CacheEntry::new(value, ttl));
        }
        Ok(())
    }

    async fn mdelete(&self, keys: &[String]) -> Result<()> {
        let mut entries = self.entries.write().await;
        self.ensure_open()?;

        for key in keys {
            entries.remove(key);
        }
        Ok(())
    }

    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64> {
        let mut entries = self.entries.write().await;
        self.ensure_open()?;

        let now = Instant::now();
        let (current, expires_at) = match entries.get(key) {
            Some(entry) if !entry.is_expired_at(now) => {
                let current = decode::<i64>(&entry.value)
                    .map_err(|_| CacheError::NotAnInteger(key.to_string()))?;
                (current, entry.expires_at)
            }
            _ => (0, None),
        };

        let next = current
            .checked_add(delta)
            .ok_or_else(|| CacheError::Overflow(key.to_string()))?;

        // The increment keeps whatever expiry the live entry already had
        entries.insert(
            key.to_string(),
            CacheEntry {
                value: encode(&next)?,
                expires_at,
            },
        );
        Ok(next)
    }

    async fn set_nx_bytes(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<bool> {
        let mut entries = self.entries.write().await;
        self.ensure_open()?;

        if entries.get(key).is_some_and(|entry| !entry.is_expired()) {
            return Ok(false);
        }

        entries.insert(key.to_string(), CacheEntry::new(value, ttl));
        Ok(true)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<()> {
        let mut entries = self.entries.write().await;
        self.ensure_open()?;

        let now = Instant::now();
        let live = entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired_at(now));
        if !live {
            return Ok(());
        }

        if ttl.is_zero() {
            entries.remove(key);
        } else if let Some(entry) = entries.get_mut(key) {
            entry.expires_at = deadline_from(now, ttl);
        }
        Ok(())
    }

    async fn ttl(&self, key: &str) -> Result<KeyTtl> {
        let entries = self.entries.read().await;
        self.ensure_open()?;

        let now = Instant::now();
        Ok(entries
            .get(key)
            .map_or(KeyTtl::Missing, |entry| entry.ttl_at(now)))
    }

    async fn close(&self) -> Result<()> {
        let sweeper = self.sweeper.lock().await.take();
        if let Some(sweeper) = sweeper {
            sweeper.stop().await;
        }

        let mut entries = self.entries.write().await;
        if self.closed.swap(true, Ordering::AcqRel) {
            debug!("Memory cache already closed");
            return Ok(());
        }
        let dropped = entries.len();
        entries.clear();

        info!(dropped, "Memory cache closed");
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        self.ensure_open()
    }
}
