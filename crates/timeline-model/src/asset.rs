//! Media asset handles and decoded frames.

use std::path::{Path, PathBuf};

use image::{ImageBuffer, Rgb, RgbImage};
use serde::{Deserialize, Serialize};

/// Kind of media an asset holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
}

/// An immutable handle over a decoded media source.
///
/// Assets are read-only after load. Compositions share them through
/// `Arc<MediaAsset>` and never write to them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaAsset {
    /// Location of the source file.
    pub path: PathBuf,

    /// Video or audio.
    pub kind: MediaKind,

    /// Frame width in pixels (0 for audio).
    pub width: u32,

    /// Frame height in pixels (0 for audio).
    pub height: u32,

    /// Native duration in seconds.
    pub duration_secs: f64,

    /// Native frame rate (0 for audio).
    pub fps: f64,

    /// Whether the source carries an audio stream.
    #[serde(default)]
    pub has_audio: bool,
}

impl MediaAsset {
    /// Describe a video source.
    pub fn video(
        path: impl Into<PathBuf>,
        width: u32,
        height: u32,
        duration_secs: f64,
        fps: f64,
    ) -> Self {
        Self {
            path: path.into(),
            kind: MediaKind::Video,
            width,
            height,
            duration_secs,
            fps,
            has_audio: false,
        }
    }

    /// Describe an audio-only source.
    pub fn audio(path: impl Into<PathBuf>, duration_secs: f64) -> Self {
        Self {
            path: path.into(),
            kind: MediaKind::Audio,
            width: 0,
            height: 0,
            duration_secs,
            fps: 0.0,
            has_audio: true,
        }
    }

    /// File name for logs.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Width / height, or `None` for degenerate or audio assets.
    pub fn aspect_ratio(&self) -> Option<f64> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        Some(self.width as f64 / self.height as f64)
    }

    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A decoded RGB24 frame.
pub type VideoFrame = RgbImage;

/// A frame filled with one color.
pub fn solid_frame(width: u32, height: u32, rgb: [u8; 3]) -> VideoFrame {
    ImageBuffer::from_pixel(width, height, Rgb(rgb))
}

/// Failure to sample a frame from an asset.
#[derive(Debug, thiserror::Error)]
#[error("Cannot sample {path} at {time_secs:.3}s: {message}")]
pub struct SampleError {
    pub path: PathBuf,
    pub time_secs: f64,
    pub message: String,
}

/// Sample-accessor capability: given a source time, returns a decoded frame.
///
/// Implementations must be safe to share across concurrent compositions.
pub trait FrameSampler: Send + Sync {
    fn sample(&self, asset: &MediaAsset, time_secs: f64) -> Result<VideoFrame, SampleError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_ratio() {
        let asset = MediaAsset::video("a.mp4", 1920, 1080, 10.0, 30.0);
        assert!((asset.aspect_ratio().unwrap() - 16.0 / 9.0).abs() < 1e-9);
        assert!(MediaAsset::audio("n.wav", 3.0).aspect_ratio().is_none());
    }

    #[test]
    fn test_name_uses_file_name() {
        let asset = MediaAsset::video("/footage/beach.mov", 10, 10, 1.0, 24.0);
        assert_eq!(asset.name(), "beach.mov");
    }

    #[test]
    fn test_solid_frame() {
        let mut frame = solid_frame(4, 3, [10, 20, 30]);
        assert_eq!(frame.as_raw().len(), 36);
        frame.put_pixel(3, 2, Rgb([1, 2, 3]));
        assert_eq!(frame.get_pixel(3, 2).0, [1, 2, 3]);
        assert_eq!(frame.get_pixel(0, 0).0, [10, 20, 30]);
    }
}
