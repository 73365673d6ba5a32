//! Video record status state machine.

use serde::{Deserialize, Serialize};

/// Processing status of a video record.
///
/// The record-keeping service stores this as a string; the wire form is
/// the SCREAMING_SNAKE_CASE variant name. The set is closed: any other
/// value is rejected at the serde boundary instead of being carried as a
/// free-form string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VideoStatus {
    /// Upload URL issued, source object not yet stored
    Preupload,
    /// Source object landed in storage, job picked up
    Uploaded,
    /// Encoder is running
    Processing,
    /// Rendition set published
    Ready,
    /// Pipeline failed after pickup
    Failed,
}

impl VideoStatus {
    /// Get the wire representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Preupload => "PREUPLOAD",
            VideoStatus::Uploaded => "UPLOADED",
            VideoStatus::Processing => "PROCESSING",
            VideoStatus::Ready => "READY",
            VideoStatus::Failed => "FAILED",
        }
    }

    /// Check if this is a terminal state (no more transitions expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, VideoStatus::Ready | VideoStatus::Failed)
    }
}

impl std::fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for VideoStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PREUPLOAD" => Ok(VideoStatus::Preupload),
            "UPLOADED" => Ok(VideoStatus::Uploaded),
            "PROCESSING" => Ok(VideoStatus::Processing),
            "READY" => Ok(VideoStatus::Ready),
            "FAILED" => Ok(VideoStatus::Failed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Error returned when parsing a status string outside the closed set.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown video status: {0}")]
pub struct UnknownStatus(pub String);
