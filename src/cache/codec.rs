//! Value codec shared by every tier: values travel between tiers as JSON bytes.

use serde::{de::DeserializeOwned, Serialize};

use crate::error::Result;

/// Encodes a value into the JSON bytes stored by a tier.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

/// Decodes JSON bytes read from a tier.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;

    #[test]
    fn test_integer_encoding_matches_counter_format() {
        // Counters are stored as plain decimal text, same as Redis INCRBY
        assert_eq!(encode(&42i64).unwrap(), b"42".to_vec());
        assert_eq!(decode::<i64>(b"-7").unwrap(), -7);
    }

    #[test]
    fn test_decode_mismatch_is_serialization_error() {
        let bytes = encode("text").unwrap();
        let result = decode::<i64>(&bytes);
        assert!(matches!(result, Err(CacheError::Serialization(_))));
    }
}
