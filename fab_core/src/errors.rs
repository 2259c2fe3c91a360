//! # Error Types
//!
//! Structured error types for fab_core. The measurement engine itself never
//! fails (missing dimensions degrade to a sentinel cut sheet, see
//! [`crate::formula`]); these errors cover the shell around it — order files,
//! locking, and worksheet rendering.
//!
//! ## Example
//!
//! ```rust
//! use fab_core::errors::FabError;
//!
//! let err = FabError::unknown_status("done?");
//! assert_eq!(err.error_code(), "UNKNOWN_STATUS");
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for fab_core operations
pub type FabResult<T> = Result<T, FabError>;

/// Structured error type for order-store and rendering operations.
///
/// Each variant carries enough context for a caller to report the problem
/// without re-deriving it from strings.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum FabError {
    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// Order file is locked by another user/process
    #[error("File locked: '{path}' is locked by {locked_by} since {locked_at}")]
    FileLocked {
        path: String,
        locked_by: String,
        locked_at: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Order file schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },

    /// A status string did not name a known order status
    #[error("Unknown order status: '{value}'")]
    UnknownStatus { value: String },

    /// A line item id was not found in the order
    #[error("Line item not found: {id}")]
    ItemNotFound { id: String },

    /// Worksheet PDF rendering failed
    #[error("Worksheet rendering failed: {reason}")]
    RenderError { reason: String },
}

impl FabError {
    /// Create a FileError
    pub fn file_error(
        operation: impl Into<String>,
        path: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        FabError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileLocked error
    pub fn file_locked(
        path: impl Into<String>,
        locked_by: impl Into<String>,
        locked_at: impl Into<String>,
    ) -> Self {
        FabError::FileLocked {
            path: path.into(),
            locked_by: locked_by.into(),
            locked_at: locked_at.into(),
        }
    }

    /// Create an UnknownStatus error
    pub fn unknown_status(value: impl Into<String>) -> Self {
        FabError::UnknownStatus {
            value: value.into(),
        }
    }

    /// Create an ItemNotFound error
    pub fn item_not_found(id: impl Into<String>) -> Self {
        FabError::ItemNotFound { id: id.into() }
    }

    /// Create a RenderError
    pub fn render_error(reason: impl Into<String>) -> Self {
        FabError::RenderError {
            reason: reason.into(),
        }
    }

    /// Check if this is a recoverable error (e.g., can retry later)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, FabError::FileLocked { .. })
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            FabError::FileError { .. } => "FILE_ERROR",
            FabError::FileLocked { .. } => "FILE_LOCKED",
            FabError::SerializationError { .. } => "SERIALIZATION_ERROR",
            FabError::VersionMismatch { .. } => "VERSION_MISMATCH",
            FabError::UnknownStatus { .. } => "UNKNOWN_STATUS",
            FabError::ItemNotFound { .. } => "ITEM_NOT_FOUND",
            FabError::RenderError { .. } => "RENDER_ERROR",
        }
    }
}
