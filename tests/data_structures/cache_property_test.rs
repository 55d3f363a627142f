/*!
 * Cache Property Tests
 * Random operation sequences checked against a simple FIFO model
 */

use ai_os_sync::core::data_structures::{BoundedCache, CacheConfig};
use proptest::prelude::*;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
enum Op {
    Put(u8, u16),
    Get(u8),
    Remove(u8),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..16, any::<u16>()).prop_map(|(k, v)| Op::Put(k, v)),
        (0u8..16).prop_map(Op::Get),
        (0u8..16).prop_map(Op::Remove),
    ]
}

/// Insertion-ordered reference model
struct Model {
    capacity: usize,
    entries: VecDeque<(u8, u16)>,
}

impl Model {
    fn put(&mut self, key: u8, value: u16) {
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
            return;
        }
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back((key, value));
    }

    fn get(&self, key: u8) -> Option<u16> {
        self.entries.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }

    fn remove(&mut self, key: u8) -> Option<u16> {
        let index = self.entries.iter().position(|(k, _)| *k == key)?;
        self.entries.remove(index).map(|(_, v)| v)
    }
}

proptest! {
    #[test]
    fn fifo_cache_matches_model(
        capacity in 1usize..8,
        ops in proptest::collection::vec(op_strategy(), 0..200),
    ) {
        let cache = BoundedCache::with_config(CacheConfig::fifo(capacity));
        let mut model = Model { capacity, entries: VecDeque::new() };
        let mut lookups = 0u64;

        for op in ops {
            match op {
                Op::Put(k, v) => {
                    cache.put(k, v);
                    model.put(k, v);
                }
                Op::Get(k) => {
                    lookups += 1;
                    prop_assert_eq!(cache.get(&k), model.get(k));
                }
                Op::Remove(k) => {
                    prop_assert_eq!(cache.remove(&k), model.remove(k));
                }
            }
            prop_assert!(cache.size() <= capacity);
            prop_assert_eq!(cache.size(), model.entries.len());
        }

        let stats = cache.stats();
        prop_assert_eq!(stats.hits + stats.misses, lookups);
    }

    #[test]
    fn lru_cache_never_exceeds_capacity(
        capacity in 1usize..8,
        ops in proptest::collection::vec(op_strategy(), 0..200),
    ) {
        let cache = BoundedCache::with_config(CacheConfig::lru(capacity));
        for op in ops {
            match op {
                Op::Put(k, v) => {
                    cache.put(k, v);
                    prop_assert_eq!(cache.get(&k), Some(v));
                }
                Op::Get(k) => {
                    cache.get(&k);
                }
                Op::Remove(k) => {
                    cache.remove(&k);
                    prop_assert!(!cache.contains_key(&k));
                }
            }
            prop_assert!(cache.size() <= capacity);
        }
    }
}
