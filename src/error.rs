//! Error types for block and tile transfers
//!
//! Every fallible operation in the crate returns [`FetchResult`]. Remote
//! failures are carried verbatim; invariant violations indicate a logic defect
//! in span or partition bookkeeping rather than an environment problem.

use thiserror::Error;

/// Result type for block transfer operations
pub type FetchResult<T> = Result<T, FetchError>;

/// Errors that can occur while moving blocks between a process and the store
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Body {body_id} not found in '{instance}', no blocks could be retrieved")]
    NotFound { body_id: u64, instance: String },

    #[error("Remote {operation} on '{instance}' failed: {message}")]
    RemoteCall {
        operation: String,
        instance: String,
        message: String,
    },

    #[error("Invariant violated: {message}")]
    InvariantViolation { message: String },

    #[error("Invalid configuration for '{field}': {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("Failed to parse configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Worker pool error: {message}")]
    WorkerPool { message: String },
}

impl FetchError {
    /// True for errors raised by the remote collaborator
    pub fn is_remote(&self) -> bool {
        matches!(self, FetchError::RemoteCall { .. })
    }
}

/// Create a remote call error
pub fn remote_call_failed(
    operation: &str,
    instance: &str,
    error: impl std::fmt::Display,
) -> FetchError {
    FetchError::RemoteCall {
        operation: operation.to_string(),
        instance: instance.to_string(),
        message: error.to_string(),
    }
}

/// Create a body not found error
pub fn body_not_found(body_id: u64, instance: &str) -> FetchError {
    FetchError::NotFound {
        body_id,
        instance: instance.to_string(),
    }
}

/// Create an invariant violation error
pub fn invariant_violation(message: impl Into<String>) -> FetchError {
    FetchError::InvariantViolation {
        message: message.into(),
    }
}

/// Create an invalid configuration error
pub fn invalid_config(field: &str, reason: impl Into<String>) -> FetchError {
    FetchError::InvalidConfig {
        field: field.to_string(),
        reason: reason.into(),
    }
}
