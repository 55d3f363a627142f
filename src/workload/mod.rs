/*!
 * Stress Workload
 *
 * Drives every primitive from several OS threads at once: readers hammer
 * a [`BoundedCache`](crate::core::data_structures::BoundedCache), one writer
 * inserts fresh keys and logs them to a
 * [`ConcurrentArray`](crate::core::data_structures::ConcurrentArray), and an
 * auditor cycles an [`UpgradeableLock`](crate::core::sync::UpgradeableLock)
 * through read, upgrade and downgrade.
 */

mod config;
mod runner;

pub use config::WorkloadConfig;
pub use runner::{run, WorkloadReport};

use crate::core::errors::SyncError;
use miette::Diagnostic;
use thiserror::Error;

/// Workload configuration and execution errors
#[derive(Error, Debug, Diagnostic)]
pub enum WorkloadError {
    #[error("Invalid value '{value}' for {var}: {reason}")]
    #[diagnostic(
        code(workload::invalid_env),
        help("Unset the variable to use the default, or supply a valid value.")
    )]
    InvalidEnv {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid workload configuration: {0}")]
    #[diagnostic(code(workload::invalid_config))]
    InvalidConfig(String),

    #[error("Worker thread '{0}' panicked")]
    #[diagnostic(
        code(workload::worker_panicked),
        help("A worker panicked while running; see the log for its message.")
    )]
    WorkerPanicked(String),

    #[error("Invariant violated after run: {0}")]
    #[diagnostic(code(workload::invariant_violated))]
    InvariantViolated(String),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Lock(#[from] SyncError),
}
