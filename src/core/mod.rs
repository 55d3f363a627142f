/*!
 * Core Module
 * Synchronization primitives, containers, and error handling
 */

pub mod data_structures;
pub mod errors;
pub mod sync;

// Re-export for convenience
pub use data_structures::{BoundedCache, CacheConfig, CacheStats, ConcurrentArray, EvictionPolicy};
pub use errors::*;
pub use sync::{
    LockState, LockStats, ReadGuard, ReaderWriterLock, UpgradeState, UpgradeToken,
    UpgradeableLock, WriteGuard,
};
