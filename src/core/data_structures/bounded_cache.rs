/*!
 * Bounded Cache
 * Fixed-capacity key/value cache on the writer-preferring reader/writer lock
 */

use super::config::{CacheConfig, EvictionPolicy};
use crate::core::sync::ReaderWriterLock;
use ahash::RandomState;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::Hash;
use std::mem;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};

struct Slot<V> {
    value: V,
    /// Insertion stamp, key into `Entries::order`
    inserted: u64,
    /// Last read or write, only consulted under LRU
    touched: AtomicU64,
}

struct Entries<K, V> {
    map: HashMap<K, Slot<V>, RandomState>,
    order: BTreeMap<u64, K>,
}

impl<K: Hash + Eq + Clone, V> Entries<K, V> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            map: HashMap::with_capacity_and_hasher(capacity, RandomState::new()),
            order: BTreeMap::new(),
        }
    }

    fn victim(&self, policy: EvictionPolicy) -> Option<K> {
        match policy {
            EvictionPolicy::Fifo => self.order.values().next().cloned(),
            EvictionPolicy::Lru => self
                .map
                .iter()
                .min_by_key(|(_, slot)| slot.touched.load(Ordering::Relaxed))
                .map(|(key, _)| key.clone()),
        }
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let slot = self.map.remove(key)?;
        self.order.remove(&slot.inserted);
        Some(slot.value)
    }
}

/// Hit/miss counters, mutated under shared access so kept outside the lock
///
/// Cache-line aligned: every `get` bumps one of these.
#[repr(C, align(64))]
#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    clock: AtomicU64,
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    /// Percentage of lookups that hit (0.0 - 100.0)
    pub hit_rate: f64,
}

/// Thread-safe cache holding at most `capacity` entries
///
/// Lookups take shared access and may run concurrently; inserts, removals
/// and clears take exclusive access. When a new key arrives at capacity,
/// one entry is evicted according to the configured [`EvictionPolicy`].
///
/// # Performance
///
/// - `get`: shared lock + one relaxed atomic increment
/// - `put` at capacity: O(log n) under FIFO, O(n) scan under LRU
///
/// # Example
///
/// ```
/// use ai_os_sync::core::data_structures::BoundedCache;
///
/// let cache = BoundedCache::new(2);
/// cache.put("a", 1);
/// cache.put("b", 2);
/// cache.put("c", 3); // evicts "a"
///
/// assert_eq!(cache.get(&"a"), None);
/// assert_eq!(cache.get(&"c"), Some(3));
/// assert_eq!(cache.size(), 2);
/// ```
pub struct BoundedCache<K, V> {
    entries: ReaderWriterLock<Entries<K, V>>,
    counters: Counters,
    capacity: usize,
    policy: EvictionPolicy,
}

impl<K, V> BoundedCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Insertion-ordered cache
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        Self::with_config(CacheConfig::fifo(capacity))
    }

    /// # Panics
    ///
    /// Panics if `config.capacity` is zero.
    pub fn with_config(config: CacheConfig) -> Self {
        assert!(config.capacity > 0, "Cache capacity must be non-zero");

        Self {
            entries: ReaderWriterLock::new(Entries::with_capacity(config.capacity)),
            counters: Counters::default(),
            capacity: config.capacity,
            policy: config.policy,
        }
    }

    #[inline]
    fn tick(&self) -> u64 {
        self.counters.clock.fetch_add(1, Ordering::Relaxed)
    }

    /// Look up `key`, counting a hit or a miss
    pub fn get(&self, key: &K) -> Option<V> {
        let entries = self.entries.read();

        if let Some(slot) = entries.map.get(key) {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            if self.policy == EvictionPolicy::Lru {
                slot.touched.store(self.tick(), Ordering::Relaxed);
            }
            return Some(slot.value.clone());
        }

        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Insert or overwrite; returns the replaced value
    ///
    /// A new key arriving at capacity evicts one entry first.
    pub fn put(&self, key: K, value: V) -> Option<V> {
        let mut guard = self.entries.write();
        // stamped under the lock so stamps follow admission order
        let stamp = self.tick();
        let entries = &mut *guard;

        if let Some(slot) = entries.map.get_mut(&key) {
            *slot.touched.get_mut() = stamp;
            return Some(mem::replace(&mut slot.value, value));
        }

        if entries.map.len() >= self.capacity {
            if let Some(victim) = entries.victim(self.policy) {
                entries.remove(&victim);
                self.counters.evictions.fetch_add(1, Ordering::Relaxed);
                trace!(policy = %self.policy, capacity = self.capacity, "Evicted cache entry");
            }
        }

        entries.order.insert(stamp, key.clone());
        entries.map.insert(
            key,
            Slot {
                value,
                inserted: stamp,
                touched: AtomicU64::new(stamp),
            },
        );
        None
    }

    /// Remove `key`, returning its value
    pub fn remove(&self, key: &K) -> Option<V> {
        self.entries.write().remove(key)
    }

    /// Presence check that leaves hit/miss counters alone
    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.read().map.contains_key(key)
    }

    /// Current number of entries
    pub fn size(&self) -> usize {
        self.entries.read().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Drop every entry; counters keep their values
    pub fn clear(&self) {
        let mut entries = self.entries.write();
        let removed = entries.map.len();
        entries.map.clear();
        entries.order.clear();
        drop(entries);
        debug!(removed, "Cache cleared");
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let hits = self.counters.hits.load(Ordering::Relaxed);
        let misses = self.counters.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        CacheStats {
            size: self.size(),
            capacity: self.capacity,
            hits,
            misses,
            evictions: self.counters.evictions.load(Ordering::Relaxed),
            hit_rate,
        }
    }
}

impl<K, V> fmt::Debug for BoundedCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedCache")
            .field("capacity", &self.capacity)
            .field("policy", &self.policy)
            .field("hits", &self.counters.hits.load(Ordering::Relaxed))
            .field("misses", &self.counters.misses.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
