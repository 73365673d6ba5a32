//! FFprobe source inspection.

use std::path::Path;
use std::process::Stdio;

use serde::Deserialize;
use tokio::process::Command;

use crate::error::{MediaError, MediaResult};

/// Source video information relevant to the status record.
#[derive(Debug, Clone)]
pub struct VideoInfo {
    /// Duration in whole seconds
    pub duration_sec: i32,
    /// Width in pixels, when a video stream is present
    pub width: Option<u32>,
    /// Height in pixels, when a video stream is present
    pub height: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    width: Option<u32>,
    height: Option<u32>,
}

/// Probe a video file for duration and dimensions.
pub async fn probe_video(path: impl AsRef<Path>) -> MediaResult<VideoInfo> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: "FFprobe exited with non-zero status".to_string(),
            stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
        });
    }

    let probe: FfprobeOutput = serde_json::from_slice(&output.stdout)?;

    let duration_sec = probe
        .format
        .duration
        .as_deref()
        .and_then(|d| d.parse::<f64>().ok())
        .map(|d| d.round() as i32)
        .ok_or_else(|| MediaError::InvalidVideo("no duration reported".to_string()))?;

    let video_stream = probe.streams.iter().find(|s| s.codec_type == "video");

    Ok(VideoInfo {
        duration_sec,
        width: video_stream.and_then(|s| s.width),
        height: video_stream.and_then(|s| s.height),
    })
}
