//! Cache Module
//!
//! The uniform cache contract and its implementations: an in-process TTL
//! store, a multi-level orchestrator and (feature `redis`) a Redis tier.

pub mod codec;
mod contract;
mod entry;
pub(crate) mod memory;
mod multi;
pub(crate) mod stats;
mod ttl;

#[cfg(feature = "redis")]
mod redis;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use contract::{Cache, CacheExt};
pub use entry::CacheEntry;
pub use memory::{MemoryCache, DEFAULT_CLEANUP_INTERVAL};
pub use multi::{MultiLevelBuilder, MultiLevelCache};
pub use stats::{CacheStats, MultiLevelStats};
pub use ttl::{KeyTtl, TTL_MISSING, TTL_PERSISTENT};

#[cfg(feature = "redis")]
pub use self::redis::{RedisCache, CONNECT_TIMEOUT};
