//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ReelError, ReelResult};

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Folder scanned for source footage.
    pub footage_dir: PathBuf,

    /// Directory where rendered videos and summaries are written.
    pub output_dir: PathBuf,

    /// Background video defaults.
    pub background: BackgroundDefaults,

    /// Reel defaults.
    pub reel: ReelDefaults,

    /// Which content items a batch picks.
    pub content: ContentDefaults,

    /// Narration synthesizer settings.
    pub narration: NarrationDefaults,

    /// Export encoder settings.
    pub export: ExportDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Default background composition parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundDefaults {
    /// Total background duration in seconds.
    pub duration_secs: f64,

    /// Number of source clips to use (`None` = derived from duration).
    pub clip_count: Option<usize>,

    /// Aesthetic effect preset: subtle | cinematic | warm | cool.
    pub effect: String,

    /// Transition style: crossfade | slide | zoom.
    pub transition: String,

    /// Requested transition duration in seconds.
    pub transition_secs: f64,

    /// Fade-in applied to the very first clip.
    pub opening_fade_secs: f64,

    /// Fade-out applied to the last clip after truncation.
    pub terminal_fade_secs: f64,

    /// Output width in pixels.
    pub width: u32,

    /// Output height in pixels.
    pub height: u32,
}

/// Default reel composition parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReelDefaults {
    /// Hard cap on the reel duration in seconds.
    pub max_duration_secs: f64,

    /// Words per on-screen text fragment.
    pub words_per_chunk: usize,

    /// Narration text is truncated to this many words.
    pub max_words: usize,

    /// Reading rate used when no narration audio is available.
    pub words_per_minute: f64,

    /// Text style preset: modern | elegant | bold | minimal | vibrant.
    pub text_style: String,

    /// Text animation: fade | slide | zoom.
    pub animation: String,

    /// Font files tried in order for styled text.
    pub font_candidates: Vec<PathBuf>,

    /// What to do when none of the font candidates exist:
    /// plain-outlined | require-styled.
    pub font_fallback: String,
}

/// Content selection for batches.
///
/// Items whose estimated reading time falls outside
/// `[min_reading_secs, max_reading_secs]` are skipped; the rest are ranked
/// by score, then by closeness to `target_reading_secs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentDefaults {
    pub min_reading_secs: f64,
    pub max_reading_secs: f64,
    pub target_reading_secs: f64,
}

/// Narration synthesizer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrationDefaults {
    /// Whether narration should be synthesized at all.
    pub enabled: bool,

    /// Program to run. Empty disables synthesis.
    pub program: String,

    /// Arguments with `{text_file}`, `{output}`, `{voice}`, `{lang}` and
    /// `{speed}` placeholders.
    pub args: Vec<String>,

    /// Voice identifier.
    pub voice: String,

    /// Language code understood by the synthesizer.
    pub lang: String,

    /// Speaking speed multiplier.
    pub speed: f64,
}

/// Export encoder settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportDefaults {
    /// Output frame rate.
    pub fps: u32,

    /// Video codec passed to ffmpeg.
    pub video_codec: String,

    /// Constant rate factor.
    pub crf: u32,

    /// Encoder preset.
    pub preset: String,

    /// Audio bitrate in kbps.
    pub audio_bitrate_kbps: u32,

    /// Maximum number of simultaneous encodes in a batch.
    pub max_concurrent: usize,

    /// Per-export deadline in seconds (`None` = unbounded).
    pub deadline_secs: Option<u64>,

    /// Write an `.srt` file next to every exported reel.
    pub write_subtitles: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "reelkit=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            footage_dir: PathBuf::from("StockVideos"),
            output_dir: PathBuf::from("output"),
            background: BackgroundDefaults::default(),
            reel: ReelDefaults::default(),
            content: ContentDefaults::default(),
            narration: NarrationDefaults::default(),
            export: ExportDefaults::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for BackgroundDefaults {
    fn default() -> Self {
        Self {
            duration_secs: 60.0,
            clip_count: None,
            effect: "cinematic".to_string(),
            transition: "crossfade".to_string(),
            transition_secs: 1.5,
            opening_fade_secs: 0.5,
            terminal_fade_secs: 0.5,
            width: 1080,
            height: 1920,
        }
    }
}

impl Default for ReelDefaults {
    fn default() -> Self {
        Self {
            max_duration_secs: 90.0,
            words_per_chunk: 8,
            max_words: 200,
            words_per_minute: 150.0,
            text_style: "modern".to_string(),
            animation: "fade".to_string(),
            font_candidates: vec![
                PathBuf::from("/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf"),
                PathBuf::from("/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"),
                PathBuf::from("/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf"),
                PathBuf::from("/System/Library/Fonts/Helvetica.ttc"),
                PathBuf::from("C:/Windows/Fonts/arialbd.ttf"),
            ],
            font_fallback: "plain-outlined".to_string(),
        }
    }
}

impl Default for ContentDefaults {
    fn default() -> Self {
        Self {
            min_reading_secs: 30.0,
            max_reading_secs: 180.0,
            target_reading_secs: 90.0,
        }
    }
}

impl Default for NarrationDefaults {
    fn default() -> Self {
        Self {
            enabled: true,
            program: "kokoro".to_string(),
            args: vec![
                "--text-file".to_string(),
                "{text_file}".to_string(),
                "--voice".to_string(),
                "{voice}".to_string(),
                "--lang".to_string(),
                "{lang}".to_string(),
                "--speed".to_string(),
                "{speed}".to_string(),
                "--output".to_string(),
                "{output}".to_string(),
            ],
            voice: "af_heart".to_string(),
            lang: "a".to_string(),
            speed: 1.0,
        }
    }
}

impl Default for ExportDefaults {
    fn default() -> Self {
        Self {
            fps: 30,
            video_codec: "libx264".to_string(),
            crf: 23,
            preset: "medium".to_string(),
            audio_bitrate_kbps: 192,
            max_concurrent: 2,
            deadline_secs: None,
            write_subtitles: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Load config from an explicit file.
    pub fn load_from(path: impl AsRef<Path>) -> ReelResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ReelError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| ReelError::config(format!("{}: {e}", path.display())))
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        self.save_to(config_file_path())
    }

    /// Save config to an explicit file.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), std::io::Error> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("reelkit").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_pipeline_presets() {
        let config = AppConfig::default();
        assert_eq!(config.background.width, 1080);
        assert_eq!(config.background.height, 1920);
        assert_eq!(config.background.transition, "crossfade");
        assert!((config.background.transition_secs - 1.5).abs() < 1e-9);
        assert_eq!(config.reel.words_per_chunk, 8);
        assert!((config.reel.max_duration_secs - 90.0).abs() < 1e-9);
        assert_eq!(config.export.fps, 30);
        assert!((config.content.min_reading_secs - 30.0).abs() < 1e-9);
        assert!((config.content.max_reading_secs - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = AppConfig::default();
        config.reel.words_per_minute = 200.0;
        config.export.max_concurrent = 4;
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert!((loaded.reel.words_per_minute - 200.0).abs() < 1e-9);
        assert_eq!(loaded.export.max_concurrent, 4);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "reel": { "words_per_chunk": 5 } }"#).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.reel.words_per_chunk, 5);
        assert_eq!(loaded.reel.max_words, 200);
        assert_eq!(loaded.background.effect, "cinematic");
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ReelError::Config { .. }));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = AppConfig::load_from("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ReelError::FileNotFound { .. }));
    }
}
