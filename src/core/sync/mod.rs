/*!
 * Synchronization Primitives
 *
 * Hand-built blocking locks for preemptive OS threads:
 * - Writer-preferring reader/writer lock with scoped guards
 * - Upgradeable lock whose single holder escalates read -> write -> read
 *
 * # Architecture
 *
 * Each lock keeps its admission counters behind a `parking_lot::Mutex` and
 * parks waiters on `parking_lot::Condvar`s. All state is per instance; there
 * is no registry of locks.
 *
 * # Blocking
 *
 * Only `lock_read`, `lock_write`, `lock_upgradeable` and `upgrade_to_write`
 * (and the guard constructors built on them) ever suspend the caller. There
 * are no timeouts; `try_*` variants return immediately instead.
 */

mod guard;
mod rwlock;
mod stats;
mod upgradeable;

pub use guard::{ReadGuard, WriteGuard};
pub use rwlock::ReaderWriterLock;
pub use stats::{LockState, LockStats, UpgradeState};
pub use upgradeable::{
    ExclusiveGuard, SharedGuard, UpgradableGuard, UpgradeToken, UpgradeableLock, UpgradedGuard,
};
