//! Queue error types.

use thiserror::Error;

/// Result type for queue operations.
pub type QueueResult<T> = Result<T, QueueError>;

/// Errors that can occur during queue operations.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Failed to receive messages: {0}")]
    ReceiveFailed(String),

    #[error("Failed to delete message: {0}")]
    DeleteFailed(String),

    #[error("Queue configuration error: {0}")]
    ConfigError(String),
}

impl QueueError {
    pub fn receive_failed(msg: impl Into<String>) -> Self {
        Self::ReceiveFailed(msg.into())
    }

    pub fn delete_failed(msg: impl Into<String>) -> Self {
        Self::DeleteFailed(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
