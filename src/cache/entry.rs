//! Cache Entry Module
//!
//! Defines the structure for individual in-process entries with expiration support.

use std::time::Duration;

use tokio::time::Instant;

use crate::cache::ttl::{deadline_after, KeyTtl};

// == Cache Entry ==
/// A single entry of the in-process store.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// JSON-encoded value
    pub value: Vec<u8>,
    /// Absolute expiration deadline, None = no expiration
    pub expires_at: Option<Instant>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry; a zero `ttl` means the entry never expires.
    pub fn new(value: Vec<u8>, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: deadline_after(ttl),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// An entry is expired once `now` reaches the deadline, so after the full
    /// TTL has elapsed it is immediately gone.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }

    /// Checks if the entry has expired at the current time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    // == Time To Live ==
    /// Remaining lifetime in TTL-query form.
    pub fn ttl_at(&self, now: Instant) -> KeyTtl {
        match self.expires_at {
            None => KeyTtl::Persistent,
            Some(expires) if now >= expires => KeyTtl::Missing,
            Some(expires) => KeyTtl::Remaining(expires - now),
        }
    }
}
