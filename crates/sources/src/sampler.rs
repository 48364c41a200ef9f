//! Single-frame decoding via ffmpeg.

use std::process::Command;

use reelkit_timeline_model::asset::{FrameSampler, MediaAsset, SampleError, VideoFrame};

/// Decodes one RGB24 frame per call by seeking with `ffmpeg -ss`.
#[derive(Debug, Clone)]
pub struct FfmpegFrameSampler {
    binary: String,
}

impl Default for FfmpegFrameSampler {
    fn default() -> Self {
        Self {
            binary: "ffmpeg".to_string(),
        }
    }
}

impl FfmpegFrameSampler {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn args(asset: &MediaAsset, time_secs: f64) -> Vec<String> {
        vec![
            "-v".into(),
            "error".into(),
            "-ss".into(),
            format!("{:.6}", time_secs.max(0.0)),
            "-i".into(),
            asset.path.display().to_string(),
            "-frames:v".into(),
            "1".into(),
            "-f".into(),
            "rawvideo".into(),
            "-pix_fmt".into(),
            "rgb24".into(),
            "pipe:1".into(),
        ]
    }
}

impl FrameSampler for FfmpegFrameSampler {
    fn sample(&self, asset: &MediaAsset, time_secs: f64) -> Result<VideoFrame, SampleError> {
        let fail = |message: String| SampleError {
            path: asset.path.clone(),
            time_secs,
            message,
        };
        if !asset.path.exists() {
            return Err(fail("file not found".to_string()));
        }

        let output = Command::new(&self.binary)
            .args(Self::args(asset, time_secs))
            .output()
            .map_err(|e| fail(format!("failed to run {}: {e}", self.binary)))?;
        if !output.status.success() {
            return Err(fail(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        frame_from_raw(asset, output.stdout).map_err(fail)
    }
}

/// Wrap raw RGB24 bytes for an asset's native size.
pub fn frame_from_raw(asset: &MediaAsset, mut bytes: Vec<u8>) -> Result<VideoFrame, String> {
    let expected = asset.width as usize * asset.height as usize * 3;
    if expected == 0 {
        return Err(format!("degenerate size {}x{}", asset.width, asset.height));
    }
    if bytes.len() < expected {
        return Err(format!(
            "decoded {} bytes, expected {expected} for {}x{}",
            bytes.len(),
            asset.width,
            asset.height
        ));
    }
    bytes.truncate(expected);
    VideoFrame::from_raw(asset.width, asset.height, bytes)
        .ok_or_else(|| "frame buffer size mismatch".to_string())
}
