//! Subtitle sidecars built from a timeline's text fragments.
//!
//! Cue timing is taken verbatim from the fragments, so the subtitles
//! follow the on-screen text exactly.

use std::fmt::Write;
use std::path::{Path, PathBuf};

use reelkit_common::error::ReelResult;
use reelkit_timeline_model::text::TextFragment;

/// Sidecar format, chosen from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleFormat {
    Srt,
    Vtt,
}

impl SubtitleFormat {
    /// `.vtt` selects WebVTT; anything else is SRT.
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("vtt") => Self::Vtt,
            _ => Self::Srt,
        }
    }

    fn millis_separator(self) -> char {
        match self {
            Self::Srt => ',',
            Self::Vtt => '.',
        }
    }

    fn timestamp(self, secs: f64) -> String {
        let total_ms = (secs.max(0.0) * 1000.0).round() as u64;
        format!(
            "{:02}:{:02}:{:02}{}{:03}",
            total_ms / 3_600_000,
            (total_ms / 60_000) % 60,
            (total_ms / 1000) % 60,
            self.millis_separator(),
            total_ms % 1000
        )
    }

    /// Render every fragment as one cue.
    pub fn render(self, fragments: &[TextFragment]) -> String {
        let mut out = String::new();
        if self == Self::Vtt {
            out.push_str("WEBVTT\n\n");
        }
        for (n, fragment) in fragments.iter().enumerate() {
            if self == Self::Srt {
                let _ = writeln!(out, "{}", n + 1);
            }
            let _ = write!(
                out,
                "{} --> {}\n{}\n\n",
                self.timestamp(fragment.display_start_secs),
                self.timestamp(fragment.display_end_secs),
                fragment.text
            );
        }
        out
    }
}

pub fn generate_srt(fragments: &[TextFragment]) -> String {
    SubtitleFormat::Srt.render(fragments)
}

pub fn generate_vtt(fragments: &[TextFragment]) -> String {
    SubtitleFormat::Vtt.render(fragments)
}

/// Sidecar path next to an exported video (`reel.mp4` -> `reel.srt`).
pub fn sidecar_path(video_path: &Path, extension: &str) -> PathBuf {
    video_path.with_extension(extension)
}

/// Write the fragments to `path` in the format its extension names.
pub fn save_subtitles(fragments: &[TextFragment], path: &Path) -> ReelResult<()> {
    let format = SubtitleFormat::for_path(path);
    std::fs::write(path, format.render(fragments))?;
    tracing::debug!(path = %path.display(), cues = fragments.len(), ?format, "Wrote subtitles");
    Ok(())
}
