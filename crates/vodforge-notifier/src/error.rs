//! Notifier error types.

use thiserror::Error;

/// Result type for metadata sync operations.
pub type NotifierResult<T> = Result<T, NotifierError>;

/// Errors that can occur while syncing video metadata.
#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("Notifier request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Notifier returned status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Notifier configuration error: {0}")]
    ConfigError(String),
}

impl NotifierError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
