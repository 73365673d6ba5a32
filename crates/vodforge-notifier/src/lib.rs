//! Metadata sync client for the vodforge pipeline.
//!
//! Pushes status/title/duration updates for a video identifier to the
//! record-keeping service over an authenticated PATCH endpoint.

pub mod client;
pub mod error;

pub use client::{MetadataUpdate, NotifierClient, NotifierConfig};
pub use error::{NotifierError, NotifierResult};
