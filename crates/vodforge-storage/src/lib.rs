//! S3 object store client for the vodforge pipeline.
//!
//! Downloads a single source object by bucket/key and uploads a directory
//! tree of rendition files preserving relative paths.

pub mod client;
pub mod error;

pub use client::{ObjectStoreClient, StorageConfig};
pub use error::{StorageError, StorageResult};
