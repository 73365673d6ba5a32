//! Worker configuration.

use std::path::PathBuf;

use tracing::warn;
use vodforge_media::PackagingFormat;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Root directory for per-job workspaces
    pub work_dir: PathBuf,
    /// Distribution format for the rendition set
    pub format: PackagingFormat,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("/tmp/vodforge"),
            format: PackagingFormat::Hls,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let format = match std::env::var("TRANSCODE_FORMAT") {
            Ok(raw) => PackagingFormat::parse(&raw).unwrap_or_else(|| {
                warn!("Unknown TRANSCODE_FORMAT {:?}, falling back to hls", raw);
                PackagingFormat::Hls
            }),
            Err(_) => PackagingFormat::Hls,
        };

        Self {
            work_dir: std::env::var("WORKER_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/tmp/vodforge")),
            format,
        }
    }
}
