/*!
 * Cache Configuration
 *
 * Capacity and eviction policy for [`BoundedCache`](super::BoundedCache)
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which entry a full cache gives up to make room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvictionPolicy {
    /// Oldest insertion goes first; overwriting a key keeps its position
    #[default]
    Fifo,
    /// Least recently read or written goes first
    Lru,
}

impl fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fifo => f.write_str("fifo"),
            Self::Lru => f.write_str("lru"),
        }
    }
}

impl FromStr for EvictionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fifo" => Ok(Self::Fifo),
            "lru" => Ok(Self::Lru),
            other => Err(format!("unknown eviction policy '{other}' (expected fifo or lru)")),
        }
    }
}

/// Cache construction parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of entries, must be non-zero
    pub capacity: usize,
    pub policy: EvictionPolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 128,
            policy: EvictionPolicy::Fifo,
        }
    }
}

impl CacheConfig {
    /// Insertion-ordered cache of the given size
    pub const fn fifo(capacity: usize) -> Self {
        Self {
            capacity,
            policy: EvictionPolicy::Fifo,
        }
    }

    /// Recency-ordered cache of the given size
    pub const fn lru(capacity: usize) -> Self {
        Self {
            capacity,
            policy: EvictionPolicy::Lru,
        }
    }
}
