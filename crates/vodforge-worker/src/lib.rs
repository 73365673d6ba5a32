//! Adaptive-bitrate transcoding worker.
//!
//! This crate provides:
//! - The per-job transcode pipeline (download, encode, upload, status sync)
//! - The queue consumer loop with graceful shutdown
//! - Per-job workspace management
//! - Worker configuration and binary bootstrap helpers

pub mod config;
pub mod consumer;
pub mod error;
pub mod pipeline;
pub mod telemetry;
pub mod workspace;

pub use config::WorkerConfig;
pub use consumer::ConsumerLoop;
pub use error::{WorkerError, WorkerResult};
pub use pipeline::{Encoder, ObjectStore, StatusSink, TranscodePipeline};
pub use workspace::Workspace;
