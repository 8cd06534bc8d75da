//! Tiered Cache - a uniform cache contract with tiered implementations
//!
//! Provides an in-process store with TTL expiration and a multi-level cache
//! that chains stores (e.g. in-process L1 in front of Redis L2) with
//! read-through backfill and fan-out writes.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
mod tasks;

pub use api::AppState;
pub use cache::{Cache, CacheExt, KeyTtl, MemoryCache, MultiLevelCache};
pub use config::Config;
pub use error::{is_not_found, CacheError, Result};
