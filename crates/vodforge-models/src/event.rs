//! Storage event notification payload.
//!
//! Mirrors the S3 event notification shape delivered through the work
//! queue when an object lands in the upload bucket. Only the fields the
//! pipeline consumes are modeled.

use serde::{Deserialize, Serialize};

/// A storage event notification, possibly carrying multiple records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<EventRecord>,
}

/// One object-created record within a storage event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub s3: S3Entity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Entity {
    pub bucket: BucketEntity,
    pub object: ObjectEntity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketEntity {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectEntity {
    pub key: String,
    #[serde(default)]
    pub size: i64,
}

impl StorageEvent {
    /// Parse an event from a raw queue message body.
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "Records": [
            {
                "s3": {
                    "bucket": { "name": "media" },
                    "object": { "key": "u1/v42/source.mp4", "size": 104857600 }
                }
            }
        ]
    }"#;

    #[test]
    fn test_parse_event() {
        let event = StorageEvent::from_json(SAMPLE).unwrap();
        assert_eq!(event.records.len(), 1);
        let record = &event.records[0];
        assert_eq!(record.s3.bucket.name, "media");
        assert_eq!(record.s3.object.key, "u1/v42/source.mp4");
        assert_eq!(record.s3.object.size, 104857600);
    }

    #[test]
    fn test_empty_records() {
        let event = StorageEvent::from_json("{}").unwrap();
        assert!(event.records.is_empty());
    }
}
