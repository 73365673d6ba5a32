//! FFmpeg CLI wrapper for the vodforge pipeline.
//!
//! This crate provides:
//! - The fixed quality ladder
//! - HLS/DASH packaging command construction
//! - Subprocess execution with captured encoder output
//! - Source probing and thumbnail extraction

pub mod error;
pub mod ladder;
pub mod package;
pub mod probe;
pub mod thumbnail;
pub mod transcoder;

pub use error::{MediaError, MediaResult};
pub use ladder::{default_ladder, QualityLevel};
pub use package::PackagingFormat;
pub use probe::{probe_video, VideoInfo};
pub use thumbnail::generate_thumbnail;
pub use transcoder::Transcoder;
