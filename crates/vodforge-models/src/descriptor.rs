//! Job descriptor parsed from a storage event record.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event::EventRecord;

/// Errors raised while deriving a job descriptor from an event payload.
#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("event contains no records")]
    EmptyEvent,

    #[error("object key {0:?} has fewer than 2 path segments")]
    MalformedKey(String),

    #[error("invalid event payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

/// Identification of one storage object to process.
///
/// Immutable once constructed. `owner_id` and `video_id` are the first two
/// `/`-separated segments of the object key; a key with fewer segments is
/// unusable and the job must fail before any download or status call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDescriptor {
    /// Bucket holding the source object
    pub bucket: String,
    /// Full object key of the source
    pub key: String,
    /// Source object size in bytes
    pub size: i64,
    /// Owning user identifier (first key segment)
    pub owner_id: String,
    /// Video identifier (second key segment)
    pub video_id: String,
}

impl JobDescriptor {
    /// Build a descriptor from one storage event record.
    pub fn from_record(record: &EventRecord) -> Result<Self, DescriptorError> {
        Self::new(
            &record.s3.bucket.name,
            &record.s3.object.key,
            record.s3.object.size,
        )
    }

    /// Build a descriptor from raw bucket/key/size values.
    pub fn new(bucket: &str, key: &str, size: i64) -> Result<Self, DescriptorError> {
        let mut segments = key.split('/');
        let owner_id = segments.next().filter(|s| !s.is_empty());
        let video_id = segments.next().filter(|s| !s.is_empty());

        match (owner_id, video_id) {
            (Some(owner_id), Some(video_id)) => Ok(Self {
                bucket: bucket.to_string(),
                key: key.to_string(),
                size,
                owner_id: owner_id.to_string(),
                video_id: video_id.to_string(),
            }),
            _ => Err(DescriptorError::MalformedKey(key.to_string())),
        }
    }

    /// Target prefix for uploaded renditions.
    ///
    /// Keyed deterministically by owner/video so duplicate deliveries
    /// overwrite the same output paths.
    pub fn rendition_prefix(&self) -> String {
        format!("{}/{}", self.owner_id, self.video_id)
    }

    /// Human-readable title derived from the source file name, when the
    /// key carries one.
    pub fn title(&self) -> Option<String> {
        let file_name = self.key.rsplit('/').next()?;
        let stem = file_name.rsplit_once('.').map(|(s, _)| s).unwrap_or(file_name);
        if stem.is_empty() {
            None
        } else {
            Some(stem.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::StorageEvent;

    #[test]
    fn test_descriptor_from_well_formed_key() {
        let d = JobDescriptor::new("media", "u1/v42/source.mp4", 104857600).unwrap();
        assert_eq!(d.owner_id, "u1");
        assert_eq!(d.video_id, "v42");
        assert_eq!(d.rendition_prefix(), "u1/v42");
        assert_eq!(d.title().as_deref(), Some("source"));
    }

    #[test]
    fn test_descriptor_key_without_file_suffix() {
        let d = JobDescriptor::new("media", "u1/v42", 10).unwrap();
        assert_eq!(d.owner_id, "u1");
        assert_eq!(d.video_id, "v42");
        assert_eq!(d.title().as_deref(), Some("v42"));
    }

    #[test]
    fn test_malformed_single_segment_key_rejected() {
        let err = JobDescriptor::new("media", "malformed", 10).unwrap_err();
        assert!(matches!(err, DescriptorError::MalformedKey(_)));
    }

    #[test]
    fn test_empty_segments_rejected() {
        assert!(JobDescriptor::new("media", "/v42/a.mp4", 10).is_err());
        assert!(JobDescriptor::new("media", "u1//a.mp4", 10).is_err());
        assert!(JobDescriptor::new("media", "", 10).is_err());
    }

    #[test]
    fn test_descriptor_from_event_record() {
        let event = StorageEvent::from_json(
            r#"{"Records":[{"s3":{"bucket":{"name":"media"},"object":{"key":"u9/v7/in.mov","size":42}}}]}"#,
        )
        .unwrap();
        let d = JobDescriptor::from_record(&event.records[0]).unwrap();
        assert_eq!(d.bucket, "media");
        assert_eq!(d.size, 42);
        assert_eq!(d.rendition_prefix(), "u9/v7");
    }
}
