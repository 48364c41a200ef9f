//! Media probing via ffprobe.

use std::path::Path;
use std::process::Command;

use serde::Deserialize;

use reelkit_common::error::{ReelError, ReelResult};
use reelkit_timeline_model::asset::MediaAsset;

/// Reads stream metadata of a media file.
pub trait MediaProber: Send + Sync {
    /// Describe a video file. Unreadable files fail with `AssetDecode`.
    fn probe_video(&self, path: &Path) -> ReelResult<MediaAsset>;

    /// Describe an audio file.
    fn probe_audio(&self, path: &Path) -> ReelResult<MediaAsset>;

    /// Backend name.
    fn name(&self) -> &str;
}

/// Prober backed by the `ffprobe` binary.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    binary: String,
}

impl Default for FfprobeProber {
    fn default() -> Self {
        Self {
            binary: "ffprobe".to_string(),
        }
    }
}

impl FfprobeProber {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn is_available(&self) -> bool {
        command_exists(&self.binary)
    }

    fn run(&self, path: &Path) -> ReelResult<String> {
        if !path.exists() {
            return Err(ReelError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let output = Command::new(&self.binary)
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .output()
            .map_err(|e| {
                ReelError::unsupported(format!("Failed to run {}: {e}", self.binary))
            })?;

        if !output.status.success() {
            return Err(ReelError::asset_decode(
                path,
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        String::from_utf8(output.stdout)
            .map_err(|e| ReelError::asset_decode(path, format!("non-UTF-8 probe output: {e}")))
    }
}

impl MediaProber for FfprobeProber {
    fn probe_video(&self, path: &Path) -> ReelResult<MediaAsset> {
        let json = self.run(path)?;
        let report = parse_probe_output(path, &json)?;
        report.into_video(path)
    }

    fn probe_audio(&self, path: &Path) -> ReelResult<MediaAsset> {
        let json = self.run(path)?;
        let report = parse_probe_output(path, &json)?;
        report.into_audio(path)
    }

    fn name(&self) -> &str {
        &self.binary
    }
}

/// Stream facts extracted from ffprobe output.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeReport {
    pub width: u32,
    pub height: u32,
    pub duration_secs: Option<f64>,
    pub fps: f64,
    pub has_video: bool,
    pub has_audio: bool,
}

impl ProbeReport {
    fn into_video(self, path: &Path) -> ReelResult<MediaAsset> {
        if !self.has_video || self.width == 0 || self.height == 0 {
            return Err(ReelError::asset_decode(path, "no decodable video stream"));
        }
        let duration = self.checked_duration(path)?;
        let mut asset = MediaAsset::video(path, self.width, self.height, duration, self.fps);
        asset.has_audio = self.has_audio;
        Ok(asset)
    }

    fn into_audio(self, path: &Path) -> ReelResult<MediaAsset> {
        if !self.has_audio {
            return Err(ReelError::asset_decode(path, "no audio stream"));
        }
        let duration = self.checked_duration(path)?;
        Ok(MediaAsset::audio(path, duration))
    }

    fn checked_duration(&self, path: &Path) -> ReelResult<f64> {
        match self.duration_secs {
            Some(d) if d.is_finite() && d > 0.0 => Ok(d),
            Some(d) => Err(ReelError::asset_decode(path, format!("unusable duration {d}s"))),
            None => Err(ReelError::asset_decode(path, "unknown duration")),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    #[serde(default)]
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    #[serde(default)]
    codec_type: Option<String>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    avg_frame_rate: Option<String>,
    #[serde(default)]
    r_frame_rate: Option<String>,
    #[serde(default)]
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    #[serde(default)]
    duration: Option<String>,
}

/// Parse `ffprobe -print_format json -show_format -show_streams` output.
pub fn parse_probe_output(path: &Path, json: &str) -> ReelResult<ProbeReport> {
    let output: FfprobeOutput = serde_json::from_str(json)
        .map_err(|e| ReelError::asset_decode(path, format!("invalid probe output: {e}")))?;

    let video = output
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"));
    let has_audio = output
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    let container_duration = output
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .and_then(|d| d.parse::<f64>().ok());
    let stream_duration = output
        .streams
        .iter()
        .filter_map(|s| s.duration.as_deref())
        .find_map(|d| d.parse::<f64>().ok());

    let fps = video
        .and_then(|v| {
            v.avg_frame_rate
                .as_deref()
                .and_then(parse_frame_rate)
                .or_else(|| v.r_frame_rate.as_deref().and_then(parse_frame_rate))
        })
        .unwrap_or(0.0);

    Ok(ProbeReport {
        width: video.and_then(|v| v.width).unwrap_or(0),
        height: video.and_then(|v| v.height).unwrap_or(0),
        duration_secs: container_duration.or(stream_duration),
        fps,
        has_video: video.is_some(),
        has_audio,
    })
}

/// Parse an ffprobe rate such as `30000/1001` or `25`.
pub fn parse_frame_rate(raw: &str) -> Option<f64> {
    let rate = match raw.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => raw.trim().parse().ok()?,
    };
    (rate.is_finite() && rate > 0.0).then_some(rate)
}

/// Whether `binary` resolves on `PATH`.
pub fn command_exists(binary: &str) -> bool {
    Command::new("sh")
        .arg("-c")
        .arg(format!("command -v {binary} >/dev/null 2>&1"))
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}
