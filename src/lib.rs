/*!
 * AI-OS Sync Library
 * Hand-built blocking synchronization primitives and the containers on top
 *
 * - [`ReaderWriterLock`]: writer-preferring reader/writer lock with scoped guards
 * - [`UpgradeableLock`]: single holder escalates read -> write -> read
 * - [`BoundedCache`]: capacity-bounded cache with atomic hit/miss counters
 * - [`ConcurrentArray`]: growable array on a native shared lock
 */

pub mod core;
pub mod monitoring;
pub mod workload;

// Re-exports
pub use crate::core::data_structures::{
    BoundedCache, CacheConfig, CacheStats, ConcurrentArray, EvictionPolicy,
};
pub use crate::core::errors::{SyncError, SyncResult};
pub use crate::core::sync::{
    ReadGuard, ReaderWriterLock, UpgradeToken, UpgradeableLock, WriteGuard,
};
pub use monitoring::init_tracing;
pub use workload::{WorkloadConfig, WorkloadError, WorkloadReport};
