//! Thumbnail extraction.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;

use crate::error::{MediaError, MediaResult};

/// Extract a single scaled frame from the source as a JPEG thumbnail.
pub async fn generate_thumbnail(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    timestamp: &str,
) -> MediaResult<()> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

    let output_path = output.as_ref();
    if let Some(parent) = output_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let result = Command::new("ffmpeg")
        .arg("-y")
        .arg("-ss")
        .arg(timestamp)
        .arg("-i")
        .arg(input.as_ref())
        .args(["-vframes", "1", "-vf", "scale=640:360", "-q:v", "2"])
        .arg(output_path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await?;

    if !result.success() {
        return Err(MediaError::ffmpeg_failed(
            "thumbnail extraction failed",
            result.code(),
        ));
    }

    Ok(())
}
