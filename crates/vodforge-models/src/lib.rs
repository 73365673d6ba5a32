//! Shared data models for the vodforge pipeline.
//!
//! This crate provides:
//! - The video status state machine type
//! - Storage event payload types
//! - The job descriptor parsed from a storage event

pub mod descriptor;
pub mod event;
pub mod status;

pub use descriptor::{DescriptorError, JobDescriptor};
pub use event::StorageEvent;
pub use status::VideoStatus;
