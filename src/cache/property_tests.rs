//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the store contract over generated operation
//! sequences. Each case drives the async API on a fresh runtime.

use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{Cache, CacheExt, MemoryCache, MultiLevelCache};

// == Strategies ==
/// Generates valid cache keys
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_]{1,64}"
}

/// Generates plain string values
fn valid_value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,256}"
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: String },
    Get { key: String },
    Delete { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (valid_key_strategy(), valid_value_strategy())
            .prop_map(|(key, value)| CacheOp::Set { key, value }),
        valid_key_strategy().prop_map(|key| CacheOp::Get { key }),
        valid_key_strategy().prop_map(|key| CacheOp::Delete { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // Any storable value reads back equal to what was written
    #[test]
    fn prop_round_trip(key in valid_key_strategy(), value in valid_value_strategy(), n in any::<i64>()) {
        tokio_test::block_on(async {
            let cache = MemoryCache::new();
            cache.set(&key, &value, Duration::ZERO).await.unwrap();
            let got: String = cache.get(&key).await.unwrap();
            prop_assert_eq!(got, value);

            let numeric = format!("{}:n", key);
            cache.set(&numeric, &n, Duration::ZERO).await.unwrap();
            let got: i64 = cache.get(&numeric).await.unwrap();
            prop_assert_eq!(got, n);
            Ok::<(), TestCaseError>(())
        })?;
    }

    // The last write to a key wins
    #[test]
    fn prop_overwrite_last_wins(key in valid_key_strategy(), values in prop::collection::vec(valid_value_strategy(), 1..10)) {
        tokio_test::block_on(async {
            let cache = MemoryCache::new();
            for value in &values {
                cache.set(&key, value, Duration::ZERO).await.unwrap();
            }
            let got: String = cache.get(&key).await.unwrap();
            prop_assert_eq!(Some(&got), values.last());
            Ok::<(), TestCaseError>(())
        })?;
    }

    // The store agrees with a HashMap model, and the counters track every read
    #[test]
    fn prop_matches_model(ops in prop::collection::vec(cache_op_strategy(), 1..50)) {
        tokio_test::block_on(async {
            let cache = MemoryCache::new();
            let mut model: HashMap<String, String> = HashMap::new();
            let mut expected_hits = 0u64;
            let mut expected_misses = 0u64;

            for op in ops {
                match op {
                    CacheOp::Set { key, value } => {
                        cache.set(&key, &value, Duration::ZERO).await.unwrap();
                        model.insert(key, value);
                    }
                    CacheOp::Get { key } => {
                        let got = cache.get::<String>(&key).await;
                        match model.get(&key) {
                            Some(expected) => {
                                expected_hits += 1;
                                let got = got.ok();
                                prop_assert_eq!(got.as_ref(), Some(expected));
                            }
                            None => {
                                expected_misses += 1;
                                prop_assert!(got.is_err_and(|err| err.is_not_found()));
                            }
                        }
                    }
                    CacheOp::Delete { key } => {
                        cache.delete(&key).await.unwrap();
                        model.remove(&key);
                    }
                }
            }

            let stats = cache.stats().await;
            prop_assert_eq!(stats.hits, expected_hits);
            prop_assert_eq!(stats.misses, expected_misses);
            prop_assert_eq!(stats.total_entries, model.len());
            Ok::<(), TestCaseError>(())
        })?;
    }

    // A run of increments lands on their sum
    #[test]
    fn prop_counter_arithmetic(key in valid_key_strategy(), deltas in prop::collection::vec(-1_000i64..1_000, 1..30)) {
        tokio_test::block_on(async {
            let cache = MemoryCache::new();
            let mut last = 0;
            for delta in &deltas {
                last = cache.incr_by(&key, *delta).await.unwrap();
            }
            prop_assert_eq!(last, deltas.iter().sum::<i64>());

            let after = cache.decr_by(&key, last).await.unwrap();
            prop_assert_eq!(after, 0);
            Ok::<(), TestCaseError>(())
        })?;
    }

    // Of any number of set_nx calls on one key, only the first creates it
    #[test]
    fn prop_set_nx_exclusive(key in valid_key_strategy(), values in prop::collection::vec(valid_value_strategy(), 1..10)) {
        tokio_test::block_on(async {
            let cache = MemoryCache::new();
            let mut created = 0;
            for value in &values {
                if cache.set_nx(&key, value, Duration::ZERO).await.unwrap() {
                    created += 1;
                }
            }
            prop_assert_eq!(created, 1);
            let got: String = cache.get(&key).await.unwrap();
            prop_assert_eq!(&got, &values[0]);
            Ok::<(), TestCaseError>(())
        })?;
    }

    // After a read through the orchestrator, every level holds the value
    #[test]
    fn prop_read_through_backfills(key in valid_key_strategy(), value in valid_value_strategy()) {
        tokio_test::block_on(async {
            let l1 = Arc::new(MemoryCache::new());
            let l2 = Arc::new(MemoryCache::new());
            let multi = MultiLevelCache::new(vec![l1.clone(), l2.clone()]);

            l2.set(&key, &value, Duration::from_secs(60)).await.unwrap();
            let got: String = multi.get(&key).await.unwrap();
            prop_assert_eq!(&got, &value);

            let promoted: String = l1.get(&key).await.unwrap();
            prop_assert_eq!(&promoted, &value);
            Ok::<(), TestCaseError>(())
        })?;
    }
}
