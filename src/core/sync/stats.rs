/*!
 * Lock Statistics
 *
 * Acquisition and contention counters kept inside each lock's internal
 * state, plus point-in-time snapshots of the admission state.
 */

use serde::Serialize;

/// Acquisition counters for a single lock instance
///
/// Updated while the lock's internal mutex is held, so a snapshot is always
/// self-consistent. An acquisition is *contended* when the caller had to
/// block at least once before being admitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LockStats {
    pub read_acquisitions: u64,
    pub read_contentions: u64,
    pub write_acquisitions: u64,
    pub write_contentions: u64,
    pub upgradable_acquisitions: u64,
    pub upgrades: u64,
    pub downgrades: u64,
}

impl LockStats {
    /// Fraction of all acquisitions that had to wait (0.0 - 1.0)
    pub fn contention_rate(&self) -> f64 {
        let total =
            self.read_acquisitions + self.write_acquisitions + self.upgradable_acquisitions;
        if total == 0 {
            return 0.0;
        }
        (self.read_contentions + self.write_contentions) as f64 / total as f64
    }

    #[inline]
    pub(crate) fn record_read(&mut self, contended: bool) {
        self.read_acquisitions += 1;
        if contended {
            self.read_contentions += 1;
        }
    }

    #[inline]
    pub(crate) fn record_write(&mut self, contended: bool) {
        self.write_acquisitions += 1;
        if contended {
            self.write_contentions += 1;
        }
    }
}

/// Admission state of a [`ReaderWriterLock`](super::ReaderWriterLock)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LockState {
    pub readers_active: usize,
    pub writers_waiting: usize,
    pub writer_active: bool,
}

impl LockState {
    /// No reader, writer, or queued writer
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.readers_active == 0 && self.writers_waiting == 0 && !self.writer_active
    }
}

/// Admission state of an [`UpgradeableLock`](super::UpgradeableLock)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpgradeState {
    pub readers: usize,
    pub writers_waiting: usize,
    pub writer: bool,
    pub upgrader: bool,
}

impl UpgradeState {
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.readers == 0 && self.writers_waiting == 0 && !self.writer && !self.upgrader
    }
}
