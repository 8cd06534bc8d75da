//! Request DTOs for the cache API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;
use serde_json::Value;

/// Maximum accepted key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Request body for PUT /set and PUT /setnx
///
/// # Fields
/// - `key`: The cache key to store the value under
/// - `value`: Any JSON value
/// - `ttl`: Optional TTL in seconds (uses the configured default if absent, 0 = never expires)
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The cache key
    pub key: String,
    /// The value to store
    pub value: Value,
    /// Optional TTL in seconds
    #[serde(default)]
    pub ttl: Option<u64>,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        validate_key(&self.key)
    }
}

/// Request body for POST /incr/:key and POST /decr/:key
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CounterRequest {
    /// Step size, defaults to 1
    #[serde(default)]
    pub by: Option<i64>,
}

impl CounterRequest {
    /// Effective step size.
    pub fn step(&self) -> i64 {
        self.by.unwrap_or(1)
    }
}

/// Returns an error message for keys the API refuses.
pub fn validate_key(key: &str) -> Option<String> {
    if key.is_empty() {
        return Some("Key cannot be empty".to_string());
    }
    if key.len() > MAX_KEY_LENGTH {
        return Some(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        ));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_request_deserialize() {
        let json = r#"{"key": "test", "value": "hello"}"#;
        let req: SetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.key, "test");
        assert_eq!(req.value, Value::from("hello"));
        assert!(req.ttl.is_none());
    }

    #[test]
    fn test_set_request_structured_value_with_ttl() {
        let json = r#"{"key": "user:1", "value": {"name": "alice", "age": 30}, "ttl": 60}"#;
        let req: SetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.ttl, Some(60));
        assert_eq!(req.value["name"], "alice");
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("").is_some());
        assert!(validate_key(&"x".repeat(MAX_KEY_LENGTH + 1)).is_some());
        assert!(validate_key("valid_key").is_none());
    }

    #[test]
    fn test_counter_request_default_step() {
        let req: CounterRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.step(), 1);

        let req: CounterRequest = serde_json::from_str(r#"{"by": -3}"#).unwrap();
        assert_eq!(req.step(), -3);
    }
}
