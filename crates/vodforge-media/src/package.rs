//! FFmpeg argument construction for adaptive-bitrate packaging.
//!
//! One fixed invocation splits the decoded video into one scaled copy per
//! ladder rung and emits either an HLS (segmented transport stream) or a
//! DASH (fragmented container) layout. Keyframes are pinned to a closed
//! GOP every 48 frames with scene-cut detection disabled so segment
//! boundaries line up across renditions.

use std::path::Path;

use crate::ladder::QualityLevel;

/// Distribution format for the rendition set. A deployment-level choice,
/// not a per-job one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackagingFormat {
    Hls,
    Dash,
}

impl PackagingFormat {
    /// Parse from a configuration string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "hls" => Some(PackagingFormat::Hls),
            "dash" => Some(PackagingFormat::Dash),
            _ => None,
        }
    }

    /// Name of the master manifest this format emits.
    pub fn manifest_name(&self) -> &'static str {
        match self {
            PackagingFormat::Hls => "master.m3u8",
            PackagingFormat::Dash => "manifest.mpd",
        }
    }
}

impl std::fmt::Display for PackagingFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PackagingFormat::Hls => write!(f, "hls"),
            PackagingFormat::Dash => write!(f, "dash"),
        }
    }
}

/// Build the full ffmpeg argument list (without the leading program name).
pub fn build_package_args(
    format: PackagingFormat,
    ladder: &[QualityLevel],
    input: &Path,
    output_dir: &Path,
) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-y".into(),
        "-i".into(),
        input.to_string_lossy().into_owned(),
        "-filter_complex".into(),
        split_scale_graph(ladder),
    ];

    match format {
        PackagingFormat::Hls => {
            // One video/audio pair per variant so every rung carries a
            // companion audio track.
            for (i, _) in ladder.iter().enumerate() {
                args.push("-map".into());
                args.push(format!("[s{}]", i));
                args.push("-map".into());
                args.push("a:0?".into());
            }
            push_shared_video_args(&mut args, ladder);
            args.push("-c:a".into());
            args.push("aac".into());
            for (i, level) in ladder.iter().enumerate() {
                args.push(format!("-b:a:{}", i));
                args.push(level.audio_bitrate.into());
            }

            args.extend(
                [
                    "-f",
                    "hls",
                    "-hls_time",
                    "6",
                    "-hls_playlist_type",
                    "vod",
                    "-hls_flags",
                    "independent_segments",
                    "-hls_segment_type",
                    "mpegts",
                    "-hls_list_size",
                    "0",
                    "-master_pl_name",
                    "master.m3u8",
                ]
                .map(String::from),
            );

            let stream_map = ladder
                .iter()
                .enumerate()
                .map(|(i, _)| format!("v:{},a:{}", i, i))
                .collect::<Vec<_>>()
                .join(" ");
            args.push("-var_stream_map".into());
            args.push(stream_map);

            args.push("-hls_segment_filename".into());
            args.push(
                output_dir
                    .join("%v")
                    .join("segment_%03d.ts")
                    .to_string_lossy()
                    .into_owned(),
            );
            args.push(
                output_dir
                    .join("%v")
                    .join("playlist.m3u8")
                    .to_string_lossy()
                    .into_owned(),
            );
        }
        PackagingFormat::Dash => {
            for (i, _) in ladder.iter().enumerate() {
                args.push("-map".into());
                args.push(format!("[s{}]", i));
            }
            args.push("-map".into());
            args.push("a:0?".into());

            push_shared_video_args(&mut args, ladder);

            args.extend(["-c:a", "aac", "-b:a", "128k"].map(String::from));

            args.extend(
                [
                    "-use_timeline",
                    "1",
                    "-use_template",
                    "1",
                    "-window_size",
                    "5",
                    "-seg_duration",
                    "6",
                    "-adaptation_sets",
                    "id=0,streams=v id=1,streams=a",
                    "-f",
                    "dash",
                ]
                .map(String::from),
            );
            args.push(output_dir.join("manifest.mpd").to_string_lossy().into_owned());
        }
    }

    args
}

/// Split the decoded video into one scaled copy per rung.
fn split_scale_graph(ladder: &[QualityLevel]) -> String {
    let outputs: String = (0..ladder.len()).map(|i| format!("[v{}]", i)).collect();
    let mut graph = format!("[0:v]split={}{}", ladder.len(), outputs);
    for (i, level) in ladder.iter().enumerate() {
        graph.push_str(&format!(
            ";[v{}]scale={}:flags=fast_bilinear[s{}]",
            i,
            level.scale_expr(),
            i
        ));
    }
    graph
}

/// Codec, GOP, and per-rung bitrate arguments shared by both formats.
fn push_shared_video_args(args: &mut Vec<String>, ladder: &[QualityLevel]) {
    args.extend(
        [
            "-c:v",
            "libx264",
            "-preset",
            "veryfast",
            "-profile:v",
            "high",
            "-level:v",
            "4.1",
            "-g",
            "48",
            "-keyint_min",
            "48",
            "-sc_threshold",
            "0",
        ]
        .map(String::from),
    );
    for (i, level) in ladder.iter().enumerate() {
        args.push(format!("-b:v:{}", i));
        args.push(level.video_bitrate.into());
    }
}
