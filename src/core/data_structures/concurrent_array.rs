/*!
 * Concurrent Array
 * Growable, index-addressable sequence on a native shared/exclusive lock
 */

use crate::core::errors::{SyncError, SyncResult};
use parking_lot::RwLock;
use std::fmt;

/// Thread-safe growable array
///
/// Reads share a `parking_lot::RwLock`; appends, updates and clears take
/// it exclusively. Unlike [`BoundedCache`](super::BoundedCache) this does
/// not use the hand-built lock: it shows the same discipline on the
/// platform primitive.
///
/// Long consumer-side iteration should go through [`snapshot`](Self::snapshot)
/// so writers are not held off while the caller walks the elements.
pub struct ConcurrentArray<T> {
    items: RwLock<Vec<T>>,
}

impl<T> ConcurrentArray<T> {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(Vec::new()),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: RwLock::new(Vec::with_capacity(capacity)),
        }
    }

    pub fn size(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Append, returning the index the value landed at
    pub fn push_back(&self, value: T) -> usize {
        let mut items = self.items.write();
        items.push(value);
        items.len() - 1
    }

    /// Append every value from `iter` under a single exclusive acquisition
    pub fn extend<I>(&self, iter: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.items.write().extend(iter);
    }

    /// Replace the element at `index`, returning the previous value
    pub fn update(&self, index: usize, value: T) -> SyncResult<T> {
        let mut items = self.items.write();
        let len = items.len();
        let slot = items
            .get_mut(index)
            .ok_or_else(|| SyncError::out_of_range(index, len))?;
        Ok(std::mem::replace(slot, value))
    }

    pub fn clear(&self) {
        self.items.write().clear();
    }

    /// Run `f` over the elements while holding shared access
    pub fn with_read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&[T]) -> R,
    {
        let items = self.items.read();
        f(&items)
    }
}

impl<T: Clone> ConcurrentArray<T> {
    /// Copy of the element at `index`
    pub fn get(&self, index: usize) -> SyncResult<T> {
        let items = self.items.read();
        items
            .get(index)
            .cloned()
            .ok_or_else(|| SyncError::out_of_range(index, items.len()))
    }

    /// Independent copy of the whole array at one instant
    pub fn snapshot(&self) -> Vec<T> {
        self.items.read().clone()
    }
}

impl<T: PartialEq> ConcurrentArray<T> {
    pub fn contains(&self, value: &T) -> bool {
        self.items.read().contains(value)
    }
}

impl<T> Default for ConcurrentArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<Vec<T>> for ConcurrentArray<T> {
    fn from(items: Vec<T>) -> Self {
        Self {
            items: RwLock::new(items),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ConcurrentArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.read().iter()).finish()
    }
}
