/*!
 * Bounded Cache Tests
 * Eviction, accounting, and concurrent access
 */

use ai_os_sync::core::data_structures::{BoundedCache, CacheConfig, EvictionPolicy};
use pretty_assertions::assert_eq;
use parking_lot::Mutex;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn test_capacity_plus_one_evicts_exactly_one() {
    for config in [CacheConfig::fifo(4), CacheConfig::lru(4)] {
        let cache = BoundedCache::with_config(config);
        for key in 0..5u32 {
            cache.put(key, format!("v{key}"));
        }

        assert_eq!(cache.size(), 4, "policy {}", config.policy);
        let missing = (0..5u32).filter(|k| cache.get(k).is_none()).count();
        assert_eq!(missing, 1, "policy {}", config.policy);
        assert_eq!(cache.stats().evictions, 1);
    }
}

#[test]
fn test_fifo_victim_is_first_inserted() {
    let cache = BoundedCache::new(2);
    cache.put("first", 1);
    cache.put("second", 2);
    cache.put("first", 10); // overwrite keeps insertion position
    cache.put("third", 3);

    assert_eq!(cache.get(&"first"), None);
    assert_eq!(cache.get(&"second"), Some(2));
    assert_eq!(cache.get(&"third"), Some(3));
    assert_eq!(cache.policy(), EvictionPolicy::Fifo);
}

#[test]
fn test_lru_overwrite_counts_as_use() {
    let cache = BoundedCache::with_config(CacheConfig::lru(2));
    cache.put("a", 1);
    cache.put("b", 2);
    cache.put("a", 3);
    cache.put("c", 4);

    assert!(cache.contains_key(&"a"));
    assert!(!cache.contains_key(&"b"));
}

#[test]
fn test_miss_and_hit_accounting() {
    let cache = BoundedCache::new(3);
    cache.put(1, 1);

    assert_eq!(cache.get(&2), None);
    let stats = cache.stats();
    assert_eq!((stats.hits, stats.misses), (0, 1));

    assert_eq!(cache.get(&1), Some(1));
    let stats = cache.stats();
    assert_eq!((stats.hits, stats.misses), (1, 1));

    // contains_key is not a lookup for accounting purposes
    assert!(cache.contains_key(&1));
    assert_eq!(cache.stats().hits, 1);
}

#[test]
fn test_concurrent_hits_exact() {
    const THREADS: usize = 16;
    let cache = Arc::new(BoundedCache::new(4));
    cache.put("hit", 7u8);
    let start = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let cache = cache.clone();
            let start = start.clone();
            thread::spawn(move || {
                start.wait();
                cache.get(&"hit")
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), Some(7));
    }

    let stats = cache.stats();
    assert_eq!(stats.hits, THREADS as u64);
    assert_eq!(stats.misses, 0);
}

#[test]
fn test_readers_and_writer_keep_bound() {
    let cache = Arc::new(BoundedCache::new(5));
    cache.put(0u64, 0u64);
    cache.put(1, 1);

    let readers: Vec<_> = (0..5)
        .map(|_| {
            let cache = cache.clone();
            thread::spawn(move || {
                for i in 0..1000u64 {
                    cache.get(&(i % 4));
                }
            })
        })
        .collect();

    let writer = {
        let cache = cache.clone();
        thread::spawn(move || {
            for key in 2..1002u64 {
                cache.put(key, key);
                assert!(cache.size() <= 5);
            }
        })
    };

    for reader in readers {
        reader.join().unwrap();
    }
    writer.join().unwrap();

    let stats = cache.stats();
    assert!(stats.size <= 5);
    assert_eq!(stats.hits + stats.misses, 5000);
    assert_eq!(stats.evictions, 1000 - 3);
}

/// Key whose hashing records the order keys reach the cache's map
#[derive(Clone)]
struct AdmissionKey {
    name: &'static str,
    admitted: Arc<Mutex<Vec<&'static str>>>,
}

impl PartialEq for AdmissionKey {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for AdmissionKey {}

impl Hash for AdmissionKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let mut admitted = self.admitted.lock();
        if !admitted.contains(&self.name) {
            admitted.push(self.name);
        }
        self.name.hash(state);
    }
}

#[test]
fn test_fifo_racing_puts_evict_first_admitted() {
    for _ in 0..500 {
        let admitted = Arc::new(Mutex::new(Vec::new()));
        let key = |name| AdmissionKey {
            name,
            admitted: admitted.clone(),
        };
        let cache = BoundedCache::new(2);
        let start = Barrier::new(2);

        thread::scope(|s| {
            for name in ["a", "b"] {
                let (cache, start, key) = (&cache, &start, key(name));
                s.spawn(move || {
                    start.wait();
                    cache.put(key, name);
                });
            }
        });

        let first = admitted.lock()[0];
        let second = if first == "a" { "b" } else { "a" };
        cache.put(key("c"), "c");

        assert!(!cache.contains_key(&key(first)), "{first} was admitted first");
        assert!(cache.contains_key(&key(second)));
    }
}

#[test]
fn test_stats_serialize() {
    let cache = BoundedCache::new(2);
    cache.put(1, 1);
    cache.get(&1);

    let json = serde_json::to_value(cache.stats()).unwrap();
    assert_eq!(json["hits"], 1);
    assert_eq!(json["capacity"], 2);
    assert_eq!(json["hit_rate"], 100.0);
}
