/*!
 * Error Types
 * Synchronization and container errors with thiserror, miette, and serde support
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by the locks and containers
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum SyncError {
    #[error("Index {index} out of range for length {len}")]
    #[diagnostic(
        code(sync::index_out_of_range),
        help("Indexed access requires index < size(). Check the length before indexing.")
    )]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid operation: {0}")]
    #[diagnostic(
        code(sync::invalid_operation),
        help("Only the current upgrade holder may change upgrade state. Do not retry blindly.")
    )]
    InvalidOperation(String),
}

impl SyncError {
    #[inline]
    pub(crate) fn out_of_range(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }

    #[inline]
    pub(crate) fn invalid_operation(msg: impl Into<String>) -> Self {
        Self::InvalidOperation(msg.into())
    }
}

/// Result type for lock and container operations
pub type SyncResult<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_error_serialization() {
        let error = SyncError::out_of_range(7, 3);
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"error_type\":\"index_out_of_range\""));

        let deserialized: SyncError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, deserialized);
    }

    #[test]
    fn test_sync_error_display() {
        let error = SyncError::out_of_range(4, 2);
        assert_eq!(error.to_string(), "Index 4 out of range for length 2");

        let error = SyncError::invalid_operation("stale token");
        assert_eq!(error.to_string(), "Invalid operation: stale token");
    }

    #[test]
    fn test_sync_error_diagnostic_code() {
        let error = SyncError::invalid_operation("not the holder");
        let code = error.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("sync::invalid_operation"));
    }
}
