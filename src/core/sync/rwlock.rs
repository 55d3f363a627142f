/*!
 * Writer-Preferring Reader/Writer Lock
 *
 * Many concurrent readers or one exclusive writer, never both. Once a writer
 * is queued, newly arriving readers wait behind it so a steady stream of
 * readers cannot starve writers.
 */

use super::guard::{ReadGuard, WriteGuard};
use super::stats::{LockState, LockStats};
use parking_lot::{Condvar, Mutex};
use std::cell::UnsafeCell;
use std::fmt;

/// Admission bookkeeping, guarded by the internal mutex
#[derive(Default)]
struct RwState {
    readers_active: usize,
    writers_waiting: usize,
    writer_active: bool,
    stats: LockStats,
}

impl RwState {
    #[inline]
    fn admits_reader(&self) -> bool {
        !self.writer_active && self.writers_waiting == 0
    }

    #[inline]
    fn admits_writer(&self) -> bool {
        self.readers_active == 0 && !self.writer_active
    }
}

/// Writer-preferring reader/writer lock protecting a value of type `T`
///
/// Built from a `parking_lot::Mutex` over the admission counters and two
/// condition variables: one readers park on, one writers park on.
///
/// # Admission
///
/// - Reader: `!writer_active && writers_waiting == 0`
/// - Writer: `readers_active == 0 && !writer_active`
///
/// Writers are not admitted in strict FIFO order, but a queued writer always
/// goes ahead of readers that arrive after it.
///
/// # Example
///
/// ```
/// use ai_os_sync::core::sync::ReaderWriterLock;
///
/// let lock = ReaderWriterLock::new(vec![1, 2, 3]);
/// {
///     let a = lock.read();
///     let b = lock.read();
///     assert_eq!(a.len(), b.len());
/// }
/// lock.write().push(4);
/// assert_eq!(lock.with_read(|v| v.len()), 4);
/// ```
pub struct ReaderWriterLock<T = ()> {
    state: Mutex<RwState>,
    readers: Condvar,
    writers: Condvar,
    data: UnsafeCell<T>,
}

// SAFETY: access to `data` is serialized by the admission protocol: shared
// references only while readers_active > 0, a unique reference only while
// writer_active, and the two never overlap.
unsafe impl<T: Send> Send for ReaderWriterLock<T> {}
unsafe impl<T: Send + Sync> Sync for ReaderWriterLock<T> {}

impl<T> ReaderWriterLock<T> {
    /// Create an unlocked lock around `value`
    pub fn new(value: T) -> Self {
        Self {
            state: Mutex::new(RwState::default()),
            readers: Condvar::new(),
            writers: Condvar::new(),
            data: UnsafeCell::new(value),
        }
    }

    /// Block until read access is admitted
    ///
    /// Prefer [`read`](Self::read), which releases automatically. A raw
    /// acquisition must be paired with exactly one [`unlock_read`](Self::unlock_read).
    pub fn lock_read(&self) {
        let mut state = self.state.lock();
        let contended = !state.admits_reader();
        while !state.admits_reader() {
            self.readers.wait(&mut state);
        }
        state.readers_active += 1;
        state.stats.record_read(contended);
    }

    /// Acquire read access only if it is immediately available
    pub fn try_lock_read(&self) -> bool {
        let mut state = self.state.lock();
        if !state.admits_reader() {
            return false;
        }
        state.readers_active += 1;
        state.stats.record_read(false);
        true
    }

    /// Release one read acquisition
    ///
    /// # Safety
    ///
    /// The caller must hold a read acquisition obtained from
    /// [`lock_read`](Self::lock_read) or [`try_lock_read`](Self::try_lock_read)
    /// that has not been released, and no [`ReadGuard`] may be relying on it.
    pub unsafe fn unlock_read(&self) {
        let mut state = self.state.lock();
        debug_assert!(state.readers_active > 0, "unlock_read without matching lock_read");
        state.readers_active = state.readers_active.saturating_sub(1);
        if state.readers_active == 0 && state.writers_waiting > 0 {
            self.writers.notify_one();
        }
    }

    /// Block until exclusive access is admitted
    ///
    /// Registers as a waiting writer first, which closes the gate on new
    /// readers until this writer has been admitted.
    pub fn lock_write(&self) {
        let mut state = self.state.lock();
        state.writers_waiting += 1;
        let contended = !state.admits_writer();
        while !state.admits_writer() {
            self.writers.wait(&mut state);
        }
        state.writers_waiting -= 1;
        state.writer_active = true;
        state.stats.record_write(contended);
    }

    /// Acquire exclusive access only if it is immediately available
    ///
    /// Never barges ahead of a writer that is already queued.
    pub fn try_lock_write(&self) -> bool {
        let mut state = self.state.lock();
        if !state.admits_writer() || state.writers_waiting > 0 {
            return false;
        }
        state.writer_active = true;
        state.stats.record_write(false);
        true
    }

    /// Release exclusive access
    ///
    /// Wakes every parked reader, then one parked writer. Readers re-check
    /// the gate, so a queued writer still goes first.
    ///
    /// # Safety
    ///
    /// The caller must hold exclusive access obtained from
    /// [`lock_write`](Self::lock_write) or [`try_lock_write`](Self::try_lock_write)
    /// that has not been released, and no [`WriteGuard`] may be relying on it.
    pub unsafe fn unlock_write(&self) {
        let mut state = self.state.lock();
        debug_assert!(state.writer_active, "unlock_write without matching lock_write");
        state.writer_active = false;
        self.readers.notify_all();
        self.writers.notify_one();
    }

    /// Acquire shared access, released when the guard drops
    pub fn read(&self) -> ReadGuard<'_, T> {
        self.lock_read();
        // SAFETY: read access was just acquired and is owned by the guard
        unsafe { ReadGuard::new(self) }
    }

    /// Non-blocking [`read`](Self::read)
    pub fn try_read(&self) -> Option<ReadGuard<'_, T>> {
        if self.try_lock_read() {
            // SAFETY: read access was just acquired and is owned by the guard
            Some(unsafe { ReadGuard::new(self) })
        } else {
            None
        }
    }

    /// Acquire exclusive access, released when the guard drops
    pub fn write(&self) -> WriteGuard<'_, T> {
        self.lock_write();
        // SAFETY: exclusive access was just acquired and is owned by the guard
        unsafe { WriteGuard::new(self) }
    }

    /// Non-blocking [`write`](Self::write)
    pub fn try_write(&self) -> Option<WriteGuard<'_, T>> {
        if self.try_lock_write() {
            // SAFETY: exclusive access was just acquired and is owned by the guard
            Some(unsafe { WriteGuard::new(self) })
        } else {
            None
        }
    }

    /// Run `f` with shared access
    ///
    /// The lock is released on every exit path, including a panic in `f`.
    pub fn with_read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        let guard = self.read();
        f(&guard)
    }

    /// Run `f` with exclusive access
    ///
    /// The lock is released on every exit path, including a panic in `f`.
    pub fn with_write<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        let mut guard = self.write();
        f(&mut guard)
    }

    /// Snapshot of the admission counters
    pub fn state(&self) -> LockState {
        let state = self.state.lock();
        LockState {
            readers_active: state.readers_active,
            writers_waiting: state.writers_waiting,
            writer_active: state.writer_active,
        }
    }

    /// Snapshot of the acquisition counters
    pub fn stats(&self) -> LockStats {
        self.state.lock().stats
    }

    /// Mutable access without locking; the borrow proves exclusivity
    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }

    /// Consume the lock and return the protected value
    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }

    #[inline]
    pub(crate) fn data_ptr(&self) -> *mut T {
        self.data.get()
    }
}

impl<T: Default> Default for ReaderWriterLock<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> From<T> for ReaderWriterLock<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T> fmt::Debug for ReaderWriterLock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("ReaderWriterLock")
            .field("readers_active", &state.readers_active)
            .field("writers_waiting", &state.writers_waiting)
            .field("writer_active", &state.writer_active)
            .finish_non_exhaustive()
    }
}
