//! Fixed quality ladder for adaptive-bitrate output.

/// One rung of the quality ladder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityLevel {
    /// Human-readable rung name
    pub name: &'static str,
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Target video bitrate, ffmpeg notation
    pub video_bitrate: &'static str,
    /// Companion audio bitrate, ffmpeg notation
    pub audio_bitrate: &'static str,
}

impl QualityLevel {
    /// Scale expression for this rung.
    pub fn scale_expr(&self) -> String {
        format!("{}:{}", self.width, self.height)
    }
}

/// The default four-rung ladder.
pub fn default_ladder() -> Vec<QualityLevel> {
    vec![
        QualityLevel {
            name: "1080p",
            width: 1920,
            height: 1080,
            video_bitrate: "5000k",
            audio_bitrate: "192k",
        },
        QualityLevel {
            name: "720p",
            width: 1280,
            height: 720,
            video_bitrate: "3000k",
            audio_bitrate: "128k",
        },
        QualityLevel {
            name: "480p",
            width: 854,
            height: 480,
            video_bitrate: "1500k",
            audio_bitrate: "128k",
        },
        QualityLevel {
            name: "360p",
            width: 640,
            height: 360,
            video_bitrate: "800k",
            audio_bitrate: "96k",
        },
    ]
}
