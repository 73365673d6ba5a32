//! Worker error types.

use thiserror::Error;

use vodforge_models::DescriptorError;
use vodforge_queue::QueueError;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Malformed job descriptor: {0}")]
    Descriptor(#[from] DescriptorError),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Transcode failed: {0}")]
    TranscodeFailed(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Status sync failed after successful publish: {0}")]
    StatusSyncFailed(String),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn download_failed(msg: impl Into<String>) -> Self {
        Self::DownloadFailed(msg.into())
    }

    pub fn transcode_failed(msg: impl Into<String>) -> Self {
        Self::TranscodeFailed(msg.into())
    }

    pub fn upload_failed(msg: impl Into<String>) -> Self {
        Self::UploadFailed(msg.into())
    }

    /// Whether the queue message should be left for redelivery.
    ///
    /// Only failures before the source is local qualify: nothing has been
    /// recorded against the video record yet beyond UPLOADED, and a retry
    /// from scratch is meaningful. Later failures record FAILED and the
    /// message is acknowledged.
    pub fn leaves_message_for_redelivery(&self) -> bool {
        matches!(self, WorkerError::DownloadFailed(_) | WorkerError::Io(_))
    }
}
