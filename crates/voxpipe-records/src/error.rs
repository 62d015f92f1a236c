//! Record-store error types.

use thiserror::Error;

/// Result type for record-store operations.
pub type RecordStoreResult<T> = Result<T, RecordStoreError>;

/// Errors that can occur talking to the record store.
#[derive(Debug, Error)]
pub enum RecordStoreError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RecordStoreError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn not_found(record_id: impl Into<String>) -> Self {
        Self::NotFound(record_id.into())
    }

    pub fn request_failed(msg: impl Into<String>) -> Self {
        Self::RequestFailed(msg.into())
    }

    /// True when the record simply does not exist, as opposed to the store
    /// being unreachable or rejecting the request.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RecordStoreError::NotFound(_))
    }
}
