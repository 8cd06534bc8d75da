//! TTL Query Module
//!
//! Result type of a TTL query, including the reserved `-1`/`-2` sentinels.

use std::time::Duration;

use tokio::time::Instant;

/// Sentinel reported for a key that exists without an expiration.
pub const TTL_PERSISTENT: i64 = -1;

/// Sentinel reported for a key that does not exist or has expired.
pub const TTL_MISSING: i64 = -2;

// == Key TTL ==
/// Remaining lifetime of a key as reported by a TTL query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTtl {
    /// Key exists and never expires (`-1`)
    Persistent,
    /// Key does not exist or has expired (`-2`)
    Missing,
    /// Key expires after the given duration
    Remaining(Duration),
}

impl KeyTtl {
    /// Returns the remaining duration when one is set and still positive.
    pub fn remaining(&self) -> Option<Duration> {
        match self {
            KeyTtl::Remaining(d) if !d.is_zero() => Some(*d),
            _ => None,
        }
    }

    /// Seconds left, or the `-1`/`-2` sentinel.
    pub fn as_secs(&self) -> i64 {
        match self {
            KeyTtl::Persistent => TTL_PERSISTENT,
            KeyTtl::Missing => TTL_MISSING,
            KeyTtl::Remaining(d) => i64::try_from(d.as_secs()).unwrap_or(i64::MAX),
        }
    }

    /// Milliseconds left, or the `-1`/`-2` sentinel.
    pub fn as_millis(&self) -> i64 {
        match self {
            KeyTtl::Persistent => TTL_PERSISTENT,
            KeyTtl::Missing => TTL_MISSING,
            KeyTtl::Remaining(d) => i64::try_from(d.as_millis()).unwrap_or(i64::MAX),
        }
    }

    /// Parses a millisecond reply in sentinel form, as returned by `PTTL`.
    ///
    /// Any other negative value is treated as missing.
    pub fn from_millis(millis: i64) -> Self {
        match millis {
            TTL_PERSISTENT => KeyTtl::Persistent,
            m if m < 0 => KeyTtl::Missing,
            m => KeyTtl::Remaining(Duration::from_millis(m as u64)),
        }
    }
}

// == Utility Functions ==
/// Converts a write TTL into an absolute deadline; zero means no expiration.
pub(crate) fn deadline_after(ttl: Duration) -> Option<Instant> {
    deadline_from(Instant::now(), ttl)
}

/// Deadline `ttl` after `now`. A TTL too large for the clock never expires.
pub(crate) fn deadline_from(now: Instant, ttl: Duration) -> Option<Instant> {
    if ttl.is_zero() {
        None
    } else {
        now.checked_add(ttl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels() {
        assert_eq!(KeyTtl::Persistent.as_secs(), -1);
        assert_eq!(KeyTtl::Missing.as_secs(), -2);
        assert_eq!(KeyTtl::Persistent.as_millis(), -1);
        assert_eq!(KeyTtl::Missing.as_millis(), -2);
    }

    #[test]
    fn test_remaining_rendering() {
        let ttl = KeyTtl::Remaining(Duration::from_millis(61_500));
        assert_eq!(ttl.as_secs(), 61);
        assert_eq!(ttl.as_millis(), 61_500);
        assert_eq!(ttl.remaining(), Some(Duration::from_millis(61_500)));
    }

    #[test]
    fn test_remaining_excludes_sentinels_and_zero() {
        assert_eq!(KeyTtl::Persistent.remaining(), None);
        assert_eq!(KeyTtl::Missing.remaining(), None);
        assert_eq!(KeyTtl::Remaining(Duration::ZERO).remaining(), None);
    }

    #[test]
    fn test_from_millis() {
        assert_eq!(KeyTtl::from_millis(-1), KeyTtl::Persistent);
        assert_eq!(KeyTtl::from_millis(-2), KeyTtl::Missing);
        assert_eq!(
            KeyTtl::from_millis(1500),
            KeyTtl::Remaining(Duration::from_millis(1500))
        );
    }

    #[test]
    fn test_deadline_after_zero_is_none() {
        assert!(deadline_after(Duration::ZERO).is_none());
        assert!(deadline_after(Duration::from_secs(1)).is_some());
    }

    #[test]
    fn test_deadline_beyond_clock_never_expires() {
        assert!(deadline_after(Duration::MAX).is_none());
        assert!(deadline_after(Duration::from_secs(u64::MAX)).is_none());
    }
}
