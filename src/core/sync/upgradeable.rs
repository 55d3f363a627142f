/*!
 * Upgradeable Reader/Writer Lock
 *
 * One designated holder can read alongside other readers, escalate to
 * exclusive access once they drain, and step back down to reading, all
 * without releasing the lock between phases.
 *
 * # State Machine
 *
 * ```text
 * Idle -> Reading -> Upgrading -> Writing -> Reading -> Idle
 *            \______________________________________/
 *                     (release without upgrading)
 * ```
 *
 * Upgrade rights are represented by an [`UpgradeToken`]. The token is tied
 * to the lock instance and to one upgrade session, it cannot be cloned, and
 * it cannot leave the thread that acquired it. Presenting a token from a
 * different lock or from an earlier session is rejected with
 * [`SyncError::InvalidOperation`] and leaves the lock untouched.
 */

use super::stats::{LockStats, UpgradeState};
use crate::core::errors::{SyncError, SyncResult};
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::cell::UnsafeCell;
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ops::{Deref, DerefMut};

#[derive(Default)]
struct UpgradeInner {
    readers: usize,
    writers_waiting: usize,
    writer: bool,
    upgrader: bool,
    holder: Option<u64>,
    next_ticket: u64,
    stats: LockStats,
}

impl UpgradeInner {
    #[inline]
    fn admits_reader(&self) -> bool {
        !self.writer && !self.upgrader && self.writers_waiting == 0
    }

    #[inline]
    fn admits_upgrader(&self) -> bool {
        !self.writer && !self.upgrader
    }

    #[inline]
    fn admits_writer(&self) -> bool {
        self.readers == 0 && !self.writer && !self.upgrader
    }
}

/// Proof of upgrade rights on one [`UpgradeableLock`]
///
/// Returned by [`UpgradeableLock::lock_upgradeable`]. Neither `Clone` nor
/// `Send`: only the acquiring thread can present it.
#[must_use = "upgrade rights stay held until the token is passed to unlock_upgradeable or unlock_write"]
pub struct UpgradeToken<'a> {
    owner: usize,
    ticket: u64,
    _marker: PhantomData<(&'a (), *const ())>,
}

impl UpgradeToken<'_> {
    /// Session number of this token, unique per lock
    #[inline]
    pub fn ticket(&self) -> u64 {
        self.ticket
    }
}

impl fmt::Debug for UpgradeToken<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpgradeToken")
            .field("ticket", &self.ticket)
            .finish_non_exhaustive()
    }
}

/// Reader/writer lock with a single upgradeable reader
///
/// Plain readers follow the same writer-preferring gate as
/// [`ReaderWriterLock`](super::ReaderWriterLock) and are additionally held
/// back while an upgrade holder exists. The holder counts as one of the
/// readers until it escalates.
///
/// # Deadlock
///
/// [`upgrade_to_write`](Self::upgrade_to_write) waits for every other reader
/// to leave. A thread that holds a plain read lock on the same instance and
/// then upgrades will wait on itself forever.
pub struct UpgradeableLock<T = ()> {
    state: Mutex<UpgradeInner>,
    admission: Condvar,
    drained: Condvar,
    data: UnsafeCell<T>,
}

// SAFETY: shared references to `data` exist only while the holder is counted
// in `readers`; a unique reference only while `writer` is set.
unsafe impl<T: Send> Send for UpgradeableLock<T> {}
unsafe impl<T: Send + Sync> Sync for UpgradeableLock<T> {}

impl<T> UpgradeableLock<T> {
    pub fn new(value: T) -> Self {
        Self {
            state: Mutex::new(UpgradeInner::default()),
            admission: Condvar::new(),
            drained: Condvar::new(),
            data: UnsafeCell::new(value),
        }
    }

    #[inline]
    fn identity(&self) -> usize {
        self as *const Self as usize
    }

    /// Block until plain read access is admitted
    pub fn lock_read(&self) {
        let mut state = self.state.lock();
        let contended = !state.admits_reader();
        while !state.admits_reader() {
            self.admission.wait(&mut state);
        }
        state.readers += 1;
        state.stats.record_read(contended);
    }

    pub fn try_lock_read(&self) -> bool {
        let mut state = self.state.lock();
        if !state.admits_reader() {
            return false;
        }
        state.readers += 1;
        state.stats.record_read(false);
        true
    }

    /// Release one plain read acquisition
    ///
    /// # Safety
    ///
    /// The caller must hold an unreleased plain read acquisition from
    /// [`lock_read`](Self::lock_read) or [`try_lock_read`](Self::try_lock_read)
    /// that no [`SharedGuard`] relies on.
    pub unsafe fn unlock_read(&self) {
        let mut state = self.state.lock();
        debug_assert!(state.readers > 0, "unlock_read without matching lock_read");
        state.readers = state.readers.saturating_sub(1);
        self.notify_release(&state);
    }

    /// Block until upgrade rights are free, then take them
    ///
    /// Admitted while plain readers are active; excludes writers and any
    /// other upgrade holder.
    pub fn lock_upgradeable(&self) -> UpgradeToken<'_> {
        let mut state = self.state.lock();
        let contended = !state.admits_upgrader();
        while !state.admits_upgrader() {
            self.admission.wait(&mut state);
        }
        self.grant_upgradable(&mut state, contended)
    }

    pub fn try_lock_upgradeable(&self) -> Option<UpgradeToken<'_>> {
        let mut state = self.state.lock();
        if !state.admits_upgrader() {
            return None;
        }
        Some(self.grant_upgradable(&mut state, false))
    }

    /// Give up upgrade rights from the reading phase
    pub fn unlock_upgradeable(&self, token: &UpgradeToken<'_>) -> SyncResult<()> {
        let mut state = self.state.lock();
        self.check_holder(&state, token, "unlock_upgradeable")?;
        if state.writer {
            return Err(SyncError::invalid_operation(
                "unlock_upgradeable: holder is writing; downgrade_to_read or unlock_write first",
            ));
        }
        self.release_upgradable(&mut state);
        Ok(())
    }

    /// Escalate the upgrade holder to exclusive access
    ///
    /// Removes the holder from the reader count and blocks until every
    /// other reader has left. New readers and writers stay out throughout.
    ///
    /// A holder that also owns a plain read lock on the same instance
    /// never sees the readers drain and deadlocks here.
    pub fn upgrade_to_write(&self, token: &UpgradeToken<'_>) -> SyncResult<()> {
        let mut state = self.state.lock();
        self.check_holder(&state, token, "upgrade_to_write")?;
        if state.writer {
            return Err(SyncError::invalid_operation(
                "upgrade_to_write: holder already has write access",
            ));
        }
        self.escalate(&mut state);
        Ok(())
    }

    /// Step the upgrade holder back from writing to reading
    pub fn downgrade_to_read(&self, token: &UpgradeToken<'_>) -> SyncResult<()> {
        let mut state = self.state.lock();
        self.check_holder(&state, token, "downgrade_to_read")?;
        if !state.writer {
            return Err(SyncError::invalid_operation(
                "downgrade_to_read: holder does not have write access",
            ));
        }
        self.deescalate(&mut state);
        Ok(())
    }

    /// End the exclusive phase without returning to read mode
    ///
    /// Also ends the upgrade session; the token is stale afterwards.
    pub fn unlock_write(&self, token: &UpgradeToken<'_>) -> SyncResult<()> {
        let mut state = self.state.lock();
        self.check_holder(&state, token, "unlock_write")?;
        if !state.writer {
            return Err(SyncError::invalid_operation(
                "unlock_write: holder does not have write access",
            ));
        }
        self.release_upgraded(&mut state);
        Ok(())
    }

    /// Plain shared access, released on drop
    pub fn read(&self) -> SharedGuard<'_, T> {
        self.lock_read();
        SharedGuard { lock: self }
    }

    pub fn try_read(&self) -> Option<SharedGuard<'_, T>> {
        self.try_lock_read().then(|| SharedGuard { lock: self })
    }

    /// Plain exclusive access without upgrade rights, released on drop
    pub fn write(&self) -> ExclusiveGuard<'_, T> {
        let mut state = self.state.lock();
        state.writers_waiting += 1;
        let contended = !state.admits_writer();
        while !state.admits_writer() {
            self.admission.wait(&mut state);
        }
        state.writers_waiting -= 1;
        state.writer = true;
        state.stats.record_write(contended);
        ExclusiveGuard { lock: self }
    }

    /// Upgrade rights as a guard
    ///
    /// Dropping the guard releases the rights; [`UpgradableGuard::upgrade`]
    /// escalates without releasing.
    pub fn upgradable_read(&self) -> UpgradableGuard<'_, T> {
        let token = self.lock_upgradeable();
        mem::forget(token);
        UpgradableGuard { lock: self }
    }

    /// Snapshot of the admission state
    pub fn state(&self) -> UpgradeState {
        let state = self.state.lock();
        UpgradeState {
            readers: state.readers,
            writers_waiting: state.writers_waiting,
            writer: state.writer,
            upgrader: state.upgrader,
        }
    }

    pub fn stats(&self) -> LockStats {
        self.state.lock().stats
    }

    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }

    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }

    fn check_holder(
        &self,
        state: &UpgradeInner,
        token: &UpgradeToken<'_>,
        op: &'static str,
    ) -> SyncResult<()> {
        if token.owner != self.identity() {
            return Err(SyncError::invalid_operation(format!(
                "{op}: token was issued by a different lock"
            )));
        }
        if state.holder != Some(token.ticket) {
            return Err(SyncError::invalid_operation(format!(
                "{op}: token {} does not hold upgrade rights",
                token.ticket
            )));
        }
        Ok(())
    }

    fn grant_upgradable(&self, state: &mut UpgradeInner, contended: bool) -> UpgradeToken<'_> {
        let ticket = state.next_ticket;
        state.next_ticket += 1;
        state.upgrader = true;
        state.holder = Some(ticket);
        state.readers += 1;
        state.stats.upgradable_acquisitions += 1;
        if contended {
            state.stats.read_contentions += 1;
        }
        UpgradeToken {
            owner: self.identity(),
            ticket,
            _marker: PhantomData,
        }
    }

    fn escalate(&self, state: &mut MutexGuard<'_, UpgradeInner>) {
        state.readers -= 1;
        while state.readers > 0 {
            self.drained.wait(state);
        }
        state.writer = true;
        state.stats.upgrades += 1;
    }

    fn deescalate(&self, state: &mut UpgradeInner) {
        state.writer = false;
        state.readers += 1;
        state.stats.downgrades += 1;
        self.admission.notify_all();
    }

    fn release_upgradable(&self, state: &mut UpgradeInner) {
        state.upgrader = false;
        state.holder = None;
        state.readers -= 1;
        // readers parked on the upgrader gate can enter even if others remain
        self.admission.notify_all();
    }

    fn release_upgraded(&self, state: &mut UpgradeInner) {
        state.writer = false;
        state.upgrader = false;
        state.holder = None;
        self.admission.notify_all();
    }

    fn release_exclusive(&self) {
        let mut state = self.state.lock();
        debug_assert!(state.writer && !state.upgrader);
        state.writer = false;
        self.admission.notify_all();
    }

    fn notify_release(&self, state: &UpgradeInner) {
        if state.readers == 0 {
            if state.upgrader {
                self.drained.notify_one();
            }
            self.admission.notify_all();
        }
    }
}

impl<T: Default> Default for UpgradeableLock<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> fmt::Debug for UpgradeableLock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("UpgradeableLock")
            .field("readers", &state.readers)
            .field("writer", &state.writer)
            .field("upgrader", &state.upgrader)
            .finish_non_exhaustive()
    }
}

/// Plain shared access to an [`UpgradeableLock`]
#[must_use = "if unused the read lock is released immediately"]
pub struct SharedGuard<'a, T> {
    lock: &'a UpgradeableLock<T>,
}

impl<T> Deref for SharedGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: counted as a reader, so no writer is active
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> Drop for SharedGuard<'_, T> {
    fn drop(&mut self) {
        // SAFETY: the guard owns one plain read acquisition
        unsafe { self.lock.unlock_read() }
    }
}

/// Plain exclusive access to an [`UpgradeableLock`]
#[must_use = "if unused the write lock is released immediately"]
pub struct ExclusiveGuard<'a, T> {
    lock: &'a UpgradeableLock<T>,
}

impl<T> Deref for ExclusiveGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: exclusive access is held
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> DerefMut for ExclusiveGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: exclusive access is held and `&mut self` prevents aliasing
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T> Drop for ExclusiveGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.release_exclusive();
    }
}

/// Upgrade rights in the reading phase
#[must_use = "if unused the upgrade rights are released immediately"]
pub struct UpgradableGuard<'a, T> {
    lock: &'a UpgradeableLock<T>,
}

impl<'a, T> UpgradableGuard<'a, T> {
    /// Escalate to exclusive access, waiting for other readers to leave
    pub fn upgrade(self) -> UpgradedGuard<'a, T> {
        let lock = self.lock;
        mem::forget(self);
        let mut state = lock.state.lock();
        lock.escalate(&mut state);
        drop(state);
        UpgradedGuard { lock }
    }
}

impl<T> Deref for UpgradableGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: the holder is counted as a reader
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> Drop for UpgradableGuard<'_, T> {
    fn drop(&mut self) {
        let mut state = self.lock.state.lock();
        self.lock.release_upgradable(&mut state);
    }
}

/// Upgrade holder in the writing phase
#[must_use = "if unused the write lock is released immediately"]
pub struct UpgradedGuard<'a, T> {
    lock: &'a UpgradeableLock<T>,
}

impl<'a, T> UpgradedGuard<'a, T> {
    /// Return to the reading phase, keeping upgrade rights
    pub fn downgrade(self) -> UpgradableGuard<'a, T> {
        let lock = self.lock;
        mem::forget(self);
        let mut state = lock.state.lock();
        lock.deescalate(&mut state);
        drop(state);
        UpgradableGuard { lock }
    }
}

impl<T> Deref for UpgradedGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: exclusive access is held
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> DerefMut for UpgradedGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: exclusive access is held and `&mut self` prevents aliasing
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T> Drop for UpgradedGuard<'_, T> {
    fn drop(&mut self) {
        let mut state = self.lock.state.lock();
        self.lock.release_upgraded(&mut state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::{Duration, Instant};

    fn wait_until<F: Fn() -> bool>(cond: F) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !cond() {
            assert!(Instant::now() < deadline, "condition not reached in time");
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_full_cycle_returns_to_idle() {
        let lock = UpgradeableLock::new(());

        let token = lock.lock_upgradeable();
        assert_eq!(lock.state().readers, 1);
        assert!(lock.state().upgrader);

        lock.upgrade_to_write(&token).unwrap();
        let state = lock.state();
        assert!(state.writer);
        assert_eq!(state.readers, 0);

        lock.downgrade_to_read(&token).unwrap();
        let state = lock.state();
        assert!(!state.writer);
        assert_eq!(state.readers, 1);

        lock.unlock_upgradeable(&token).unwrap();
        assert!(lock.state().is_idle());

        let stats = lock.stats();
        assert_eq!(stats.upgrades, 1);
        assert_eq!(stats.downgrades, 1);
    }

    #[test]
    fn test_stale_token_rejected_without_state_change() {
        let lock = UpgradeableLock::new(());

        let stale = lock.lock_upgradeable();
        lock.unlock_upgradeable(&stale).unwrap();

        let current = lock.lock_upgradeable();
        let before = lock.state();

        let err = lock.upgrade_to_write(&stale).unwrap_err();
        assert!(matches!(err, SyncError::InvalidOperation(_)));
        assert_eq!(lock.state(), before);

        lock.unlock_upgradeable(&current).unwrap();
    }

    #[test]
    fn test_foreign_token_rejected() {
        let a = UpgradeableLock::new(());
        let b = UpgradeableLock::new(());

        let token_a = a.lock_upgradeable();
        let token_b = b.lock_upgradeable();

        assert!(b.upgrade_to_write(&token_a).is_err());
        assert!(a.unlock_upgradeable(&token_b).is_err());
        assert!(!b.state().writer);

        a.unlock_upgradeable(&token_a).unwrap();
        b.unlock_upgradeable(&token_b).unwrap();
    }

    #[test]
    fn test_phase_errors() {
        let lock = UpgradeableLock::new(());
        let token = lock.lock_upgradeable();

        assert!(lock.downgrade_to_read(&token).is_err());
        assert!(lock.unlock_write(&token).is_err());

        lock.upgrade_to_write(&token).unwrap();
        assert!(lock.upgrade_to_write(&token).is_err());
        assert!(lock.unlock_upgradeable(&token).is_err());

        lock.unlock_write(&token).unwrap();
        assert!(lock.state().is_idle());
    }

    #[test]
    fn test_upgrader_blocks_new_readers() {
        let lock = UpgradeableLock::new(0);
        let token = lock.lock_upgradeable();

        assert!(lock.try_read().is_none());
        assert!(lock.try_lock_upgradeable().is_none());

        lock.unlock_upgradeable(&token).unwrap();
        assert!(lock.try_read().is_some());
    }

    #[test]
    fn test_upgrade_waits_for_readers_to_drain() {
        let lock = UpgradeableLock::new(0u32);

        thread::scope(|s| {
            let reader = lock.read();

            let upgrader = s.spawn(|| {
                let guard = lock.upgradable_read();
                let mut writer = guard.upgrade();
                *writer += 1;
            });

            wait_until(|| {
                let state = lock.state();
                state.upgrader && state.readers == 1
            });
            assert!(!lock.state().writer);
            assert_eq!(*reader, 0);

            drop(reader);
            upgrader.join().unwrap();
        });

        assert_eq!(*lock.read(), 1);
        assert!(lock.state().is_idle());
    }

    #[test]
    fn test_guard_downgrade_keeps_rights() {
        let lock = UpgradeableLock::new(vec![1]);

        let guard = lock.upgradable_read();
        let mut writer = guard.upgrade();
        writer.push(2);
        let guard = writer.downgrade();

        assert_eq!(*guard, vec![1, 2]);
        let state = lock.state();
        assert!(state.upgrader);
        assert_eq!(state.readers, 1);
        assert!(lock.try_read().is_none());

        drop(guard);
        assert!(lock.state().is_idle());
    }

    #[test]
    fn test_plain_writer_excludes_upgrader() {
        let lock = UpgradeableLock::new(0);
        let mut writer = lock.write();
        *writer = 9;
        assert!(lock.try_lock_upgradeable().is_none());
        drop(writer);

        let guard = lock.upgradable_read();
        assert_eq!(*guard, 9);
    }
}
