//! FFmpeg subprocess execution.

use std::path::Path;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::debug;

use crate::error::{MediaError, MediaResult};
use crate::ladder::{default_ladder, QualityLevel};
use crate::package::{build_package_args, PackagingFormat};

/// Encoder invoker producing one adaptive-bitrate rendition set per call.
#[derive(Debug, Clone)]
pub struct Transcoder {
    format: PackagingFormat,
    ladder: Vec<QualityLevel>,
}

impl Transcoder {
    /// Create a transcoder for the given format with the default ladder.
    pub fn new(format: PackagingFormat) -> Self {
        Self {
            format,
            ladder: default_ladder(),
        }
    }

    /// Override the quality ladder.
    pub fn with_ladder(mut self, ladder: Vec<QualityLevel>) -> Self {
        self.ladder = ladder;
        self
    }

    /// The configured distribution format.
    pub fn format(&self) -> PackagingFormat {
        self.format
    }

    /// Transcode one input file into a rendition set under `output_dir`.
    ///
    /// All encoder output is logged line by line at debug level; it is not
    /// parsed. Success requires a zero exit status and the master manifest
    /// present under the output directory.
    pub async fn transcode(&self, input: &Path, output_dir: &Path) -> MediaResult<()> {
        which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

        if !input.exists() {
            return Err(MediaError::FileNotFound(input.to_path_buf()));
        }
        tokio::fs::create_dir_all(output_dir).await?;
        if matches!(self.format, PackagingFormat::Hls) {
            // HLS writes into per-variant subdirectories.
            for i in 0..self.ladder.len() {
                tokio::fs::create_dir_all(output_dir.join(i.to_string())).await?;
            }
        }

        let args = build_package_args(self.format, &self.ladder, input, output_dir);
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| MediaError::ffmpeg_failed(format!("spawn failed: {}", e), None))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let stdout_task = tokio::spawn(log_lines(stdout, "stdout"));
        let stderr_task = tokio::spawn(log_lines(stderr, "stderr"));

        let status = child.wait().await?;

        let _ = stdout_task.await;
        let _ = stderr_task.await;

        if !status.success() {
            return Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                status.code(),
            ));
        }

        // A zero exit with no manifest is still a failed encode; partial
        // output must never be uploaded as complete.
        let manifest = output_dir.join(self.format.manifest_name());
        if !manifest.exists() {
            return Err(MediaError::ManifestMissing(manifest));
        }

        Ok(())
    }
}

/// Drain one encoder output stream into the job log.
async fn log_lines<R>(stream: Option<R>, name: &'static str)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let Some(stream) = stream else { return };
    let mut lines = BufReader::new(stream).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if line.is_empty() {
            continue;
        }
        debug!(stream = name, "ffmpeg: {}", line);
    }
}
