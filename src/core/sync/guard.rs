/*!
 * Scoped Lock Guards
 *
 * RAII guards over [`ReaderWriterLock`]: acquisition happens before the
 * guard exists, release happens in `Drop`. Moving a guard moves the hold,
 * so a lock can never be released twice.
 */

use super::rwlock::ReaderWriterLock;
use std::fmt;
use std::ops::{Deref, DerefMut};

/// Shared access to a [`ReaderWriterLock`], released on drop
#[must_use = "if unused the read lock is released immediately"]
pub struct ReadGuard<'a, T> {
    lock: &'a ReaderWriterLock<T>,
}

impl<'a, T> ReadGuard<'a, T> {
    /// # Safety
    ///
    /// The caller must have acquired read access on `lock` and hand
    /// ownership of that acquisition to the guard.
    pub(crate) unsafe fn new(lock: &'a ReaderWriterLock<T>) -> Self {
        Self { lock }
    }

    /// Release before the end of scope
    #[inline]
    pub fn unlock(self) {
        drop(self);
    }

    /// The lock this guard holds
    #[inline]
    pub fn lock(&self) -> &'a ReaderWriterLock<T> {
        self.lock
    }
}

impl<T> Deref for ReadGuard<'_, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        // SAFETY: read access is held, so no writer can alias the value
        unsafe { &*self.lock.data_ptr() }
    }
}

impl<T> Drop for ReadGuard<'_, T> {
    fn drop(&mut self) {
        // SAFETY: the guard owns exactly one read acquisition
        unsafe { self.lock.unlock_read() }
    }
}

impl<T: fmt::Debug> fmt::Debug for ReadGuard<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ReadGuard").field(&**self).finish()
    }
}

/// Exclusive access to a [`ReaderWriterLock`], released on drop
#[must_use = "if unused the write lock is released immediately"]
pub struct WriteGuard<'a, T> {
    lock: &'a ReaderWriterLock<T>,
}

impl<'a, T> WriteGuard<'a, T> {
    /// # Safety
    ///
    /// The caller must have acquired exclusive access on `lock` and hand
    /// ownership of that acquisition to the guard.
    pub(crate) unsafe fn new(lock: &'a ReaderWriterLock<T>) -> Self {
        Self { lock }
    }

    /// Release before the end of scope
    #[inline]
    pub fn unlock(self) {
        drop(self);
    }

    /// The lock this guard holds
    #[inline]
    pub fn lock(&self) -> &'a ReaderWriterLock<T> {
        self.lock
    }
}

impl<T> Deref for WriteGuard<'_, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        // SAFETY: exclusive access is held
        unsafe { &*self.lock.data_ptr() }
    }
}

impl<T> DerefMut for WriteGuard<'_, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: exclusive access is held and `&mut self` prevents aliasing
        unsafe { &mut *self.lock.data_ptr() }
    }
}

impl<T> Drop for WriteGuard<'_, T> {
    fn drop(&mut self) {
        // SAFETY: the guard owns the single write acquisition
        unsafe { self.lock.unlock_write() }
    }
}

impl<T: fmt::Debug> fmt::Debug for WriteGuard<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WriteGuard").field(&**self).finish()
    }
}
