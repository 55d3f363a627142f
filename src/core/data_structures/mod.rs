/*!
 * Data Structures
 *
 * Thread-safe containers built on the synchronization primitives:
 * - Bounded cache on the writer-preferring reader/writer lock
 * - Growable array on `parking_lot::RwLock`
 *
 * # Use Cases
 *
 * - **Bounded cache**: Read-heavy lookups with a hard size limit
 * - **Concurrent array**: Append-mostly logs read by snapshot
 */

mod bounded_cache;
mod concurrent_array;
mod config;

pub use bounded_cache::{BoundedCache, CacheStats};
pub use concurrent_array::ConcurrentArray;
pub use config::{CacheConfig, EvictionPolicy};
