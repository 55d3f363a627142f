/*!
 * Workload Configuration
 *
 * Defaults reproduce the reference scenario: five readers doing 1000
 * lookups each against a capacity-5 cache seeded with two keys, while one
 * writer inserts 1000 fresh keys.
 */

use super::WorkloadError;
use crate::core::data_structures::{CacheConfig, EvictionPolicy};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Shape of a stress run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadConfig {
    /// Reader threads calling `get`
    pub readers: usize,
    pub reads_per_reader: usize,
    /// Fresh keys the single writer inserts
    pub writes: usize,
    /// Keys present before any thread starts
    pub seed_keys: usize,
    /// Upgrade cycles the auditor thread attempts
    pub audit_rounds: usize,
    pub cache: CacheConfig,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            readers: 5,
            reads_per_reader: 1000,
            writes: 1000,
            seed_keys: 2,
            audit_rounds: 100,
            cache: CacheConfig::fifo(5),
        }
    }
}

impl WorkloadConfig {
    /// Defaults overridden by environment variables
    ///
    /// - SYNC_READERS, SYNC_READS_PER_READER, SYNC_WRITES, SYNC_SEED_KEYS,
    ///   SYNC_AUDIT_ROUNDS, SYNC_CAPACITY: unsigned integers
    /// - SYNC_POLICY: `fifo` or `lru`
    pub fn from_env() -> Result<Self, WorkloadError> {
        let defaults = Self::default();

        let config = Self {
            readers: env_or("SYNC_READERS", defaults.readers)?,
            reads_per_reader: env_or("SYNC_READS_PER_READER", defaults.reads_per_reader)?,
            writes: env_or("SYNC_WRITES", defaults.writes)?,
            seed_keys: env_or("SYNC_SEED_KEYS", defaults.seed_keys)?,
            audit_rounds: env_or("SYNC_AUDIT_ROUNDS", defaults.audit_rounds)?,
            cache: CacheConfig {
                capacity: env_or("SYNC_CAPACITY", defaults.cache.capacity)?,
                policy: env_or::<EvictionPolicy>("SYNC_POLICY", defaults.cache.policy)?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject shapes the runner cannot execute
    pub fn validate(&self) -> Result<(), WorkloadError> {
        if self.cache.capacity == 0 {
            return Err(WorkloadError::InvalidConfig(
                "cache capacity must be non-zero".into(),
            ));
        }
        if self.seed_keys > self.cache.capacity {
            return Err(WorkloadError::InvalidConfig(format!(
                "seed_keys ({}) exceeds cache capacity ({})",
                self.seed_keys, self.cache.capacity
            )));
        }
        Ok(())
    }

    /// Total `get` calls the readers will make
    #[inline]
    pub fn total_reads(&self) -> u64 {
        (self.readers as u64) * (self.reads_per_reader as u64)
    }
}

fn env_or<T>(var: &'static str, default: T) -> Result<T, WorkloadError>
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(var) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| WorkloadError::InvalidEnv {
            var,
            value: raw.clone(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}
