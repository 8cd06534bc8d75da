//! Cache Contract Module
//!
//! The interface every tier implements: the in-process store, the network
//! tier and the multi-level orchestrator itself.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::cache::codec::{decode, encode};
use crate::cache::KeyTtl;
use crate::error::{CacheError, Result};

// == Cache Trait ==
/// Uniform cache contract over JSON-encoded values.
///
/// The trait is object safe so tiers can be stored as `Arc<dyn Cache>`; typed
/// access lives in [`CacheExt`]. A `ttl` of [`Duration::ZERO`] means "no
/// expiration" for every write.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Returns the encoded value, or `KeyNotFound` if absent or expired.
    async fn get_bytes(&self, key: &str) -> Result<Vec<u8>>;

    /// Stores an encoded value, overwriting unconditionally.
    async fn set_bytes(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()>;

    /// Removes a key. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// True only if the key is present and unexpired.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Returns the subset of `keys` that were found.
    async fn mget_bytes(&self, keys: &[String]) -> Result<HashMap<String, Vec<u8>>>;

    /// Batch analogue of [`Cache::set_bytes`].
    async fn mset_bytes(&self, items: HashMap<String, Vec<u8>>, ttl: Duration) -> Result<()>;

    /// Batch analogue of [`Cache::delete`].
    async fn mdelete(&self, keys: &[String]) -> Result<()>;

    /// Adds `delta` to the counter at `key`; a missing key counts as zero.
    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64>;

    async fn incr(&self, key: &str) -> Result<i64> {
        self.incr_by(key, 1).await
    }

    async fn decr_by(&self, key: &str, delta: i64) -> Result<i64> {
        let delta = delta
            .checked_neg()
            .ok_or_else(|| CacheError::Overflow(key.to_string()))?;
        self.incr_by(key, delta).await
    }

    async fn decr(&self, key: &str) -> Result<i64> {
        self.decr_by(key, 1).await
    }

    /// Stores the value only if the key is absent or expired.
    ///
    /// Returns true iff this call created the entry.
    async fn set_nx_bytes(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<bool>;

    /// Rewrites the expiration of an existing key; a missing key is a no-op.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<()>;

    /// Remaining lifetime of a key.
    async fn ttl(&self, key: &str) -> Result<KeyTtl>;

    /// Releases resources held by the tier.
    async fn close(&self) -> Result<()>;

    /// Liveness check.
    async fn ping(&self) -> Result<()>;
}

// == Typed Extension ==
/// Typed access on top of any [`Cache`], encoding values as JSON.
#[async_trait]
pub trait CacheExt: Cache {
    /// Reads and decodes the value at `key`.
    async fn get<T>(&self, key: &str) -> Result<T>
    where
        T: DeserializeOwned + Send,
    {
        let bytes = self.get_bytes(key).await?;
        decode(&bytes)
    }

    /// Encodes and stores `value` at `key`.
    async fn set<T>(&self, key: &str, value: &T, ttl: Duration) -> Result<()>
    where
        T: Serialize + Sync + ?Sized,
    {
        let bytes = encode(value)?;
        self.set_bytes(key, bytes, ttl).await
    }

    /// Encodes and stores `value` only if `key` is absent or expired.
    async fn set_nx<T>(&self, key: &str, value: &T, ttl: Duration) -> Result<bool>
    where
        T: Serialize + Sync + ?Sized,
    {
        let bytes = encode(value)?;
        self.set_nx_bytes(key, bytes, ttl).await
    }

    /// Reads and decodes every found key. A value that fails to decode fails
    /// the whole call with a serialization error.
    async fn mget<T>(&self, keys: &[String]) -> Result<HashMap<String, T>>
    where
        T: DeserializeOwned + Send,
    {
        let found = self.mget_bytes(keys).await?;
        found
            .into_iter()
            .map(|(key, bytes)| decode(&bytes).map(|value| (key, value)))
            .collect()
    }

    /// Encodes every item before writing any of them.
    async fn mset<T>(&self, items: &HashMap<String, T>, ttl: Duration) -> Result<()>
    where
        T: Serialize + Sync,
    {
        let encoded = items
            .iter()
            .map(|(key, value)| encode(value).map(|bytes| (key.clone(), bytes)))
            .collect::<Result<HashMap<_, _>>>()?;
        self.mset_bytes(encoded, ttl).await
    }
}

impl<C: Cache + ?Sized> CacheExt for C {}
