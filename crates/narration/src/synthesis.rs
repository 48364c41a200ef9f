//! Narration synthesis through an external text-to-speech command.
//!
//! The synthesizer writes the narration text to a file, runs the configured
//! command, and measures the produced audio. Any failure is reported so the
//! caller can fall back to the reading-time estimate.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use reelkit_common::config::NarrationDefaults;
use reelkit_common::error::{ReelError, ReelResult};
use reelkit_sources::probe::MediaProber;
use reelkit_timeline_model::timeline::NarrationTrack;

/// Voices shipped with Kokoro.
pub const KOKORO_VOICES: &[(&str, &str)] = &[
    ("af_heart", "American Female - Heart"),
    ("af_bella", "American Female - Bella"),
    ("af_sarah", "American Female - Sarah"),
    ("af_nicole", "American Female - Nicole"),
    ("am_adam", "American Male - Adam"),
    ("am_michael", "American Male - Michael"),
    ("bf_emma", "British Female - Emma"),
    ("bf_isabella", "British Female - Isabella"),
    ("bm_lewis", "British Male - Lewis"),
    ("bm_george", "British Male - George"),
];

/// Voice selection for one synthesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceParams {
    /// Voice identifier (e.g., "af_heart").
    pub voice: String,

    /// Language code understood by the engine (e.g., "a" for American English).
    pub lang: String,

    /// Speech rate multiplier.
    pub speed: f64,
}

impl Default for VoiceParams {
    fn default() -> Self {
        Self {
            voice: "af_heart".to_string(),
            lang: "a".to_string(),
            speed: 1.0,
        }
    }
}

impl From<&NarrationDefaults> for VoiceParams {
    fn from(config: &NarrationDefaults) -> Self {
        Self {
            voice: config.voice.clone(),
            lang: config.lang.clone(),
            speed: config.speed,
        }
    }
}

/// Turns text into a narration track with a measured duration.
pub trait NarrationSynthesizer: Send + Sync {
    /// Synthesize `text` into `output`.
    fn synthesize(&self, text: &str, params: &VoiceParams, output: &Path)
        -> ReelResult<NarrationTrack>;

    /// Backend name.
    fn name(&self) -> &str;
}

/// Synthesizer that shells out to a TTS program.
///
/// Arguments may contain the placeholders `{text_file}`, `{output}`,
/// `{voice}`, `{lang}`, and `{speed}`.
pub struct CommandSynthesizer {
    program: String,
    args: Vec<String>,
    prober: Arc<dyn MediaProber>,
}

impl CommandSynthesizer {
    pub fn new(program: impl Into<String>, args: Vec<String>, prober: Arc<dyn MediaProber>) -> Self {
        Self {
            program: program.into(),
            args,
            prober,
        }
    }

    pub fn from_config(config: &NarrationDefaults, prober: Arc<dyn MediaProber>) -> Self {
        Self::new(config.program.clone(), config.args.clone(), prober)
    }

    /// Expand the argument template.
    pub fn render_args(&self, text_file: &Path, output: &Path, params: &VoiceParams) -> Vec<String> {
        let text_file = text_file.display().to_string();
        let output = output.display().to_string();
        let speed = params.speed.to_string();
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{text_file}", &text_file)
                    .replace("{output}", &output)
                    .replace("{voice}", &params.voice)
                    .replace("{lang}", &params.lang)
                    .replace("{speed}", &speed)
            })
            .collect()
    }
}

impl NarrationSynthesizer for CommandSynthesizer {
    fn synthesize(
        &self,
        text: &str,
        params: &VoiceParams,
        output: &Path,
    ) -> ReelResult<NarrationTrack> {
        if text.trim().is_empty() {
            return Err(ReelError::empty_content("nothing to narrate"));
        }
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let text_file = text_file_for(output);
        std::fs::write(&text_file, text)?;
        let args = self.render_args(&text_file, output, params);

        tracing::info!(
            program = %self.program,
            voice = %params.voice,
            lang = %params.lang,
            speed = params.speed,
            output = %output.display(),
            "Synthesizing narration"
        );
        let started = std::time::Instant::now();
        let result = Command::new(&self.program).args(&args).output();
        if let Err(err) = std::fs::remove_file(&text_file) {
            tracing::debug!(error = %err, path = %text_file.display(), "Failed to remove narration text file");
        }

        let result = result
            .map_err(|e| ReelError::synthesis(format!("Failed to start {}: {e}", self.program)))?;
        if !result.status.success() {
            return Err(ReelError::synthesis(format!(
                "{} exited with {}: {}",
                self.program,
                result.status,
                String::from_utf8_lossy(&result.stderr).trim()
            )));
        }
        if !output.exists() {
            return Err(ReelError::synthesis(format!(
                "{} produced no audio at {}",
                self.program,
                output.display()
            )));
        }

        let asset = self
            .prober
            .probe_audio(output)
            .map_err(|e| ReelError::synthesis(format!("Cannot measure narration: {e}")))?;

        tracing::info!(
            duration_secs = asset.duration_secs,
            elapsed_ms = started.elapsed().as_millis(),
            "Narration synthesized"
        );

        Ok(NarrationTrack {
            asset: Arc::new(asset),
            voice: Some(params.voice.clone()),
        })
    }

    fn name(&self) -> &str {
        &self.program
    }
}

fn text_file_for(output: &Path) -> PathBuf {
    output.with_extension("txt")
}

/// Synthesize if a synthesizer is configured; on failure log and return
/// `None` so the duration resolver falls back to the reading estimate.
pub fn synthesize_or_skip(
    synthesizer: Option<&dyn NarrationSynthesizer>,
    text: &str,
    params: &VoiceParams,
    output: &Path,
) -> Option<NarrationTrack> {
    let synthesizer = synthesizer?;
    match synthesizer.synthesize(text, params, output) {
        Ok(track) => Some(track),
        Err(err) => {
            tracing::warn!(
                synthesizer = synthesizer.name(),
                error = %err,
                "Narration unavailable; using reading-time estimate"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelkit_timeline_model::asset::MediaAsset;

    /// Duration is one second per word of the produced file.
    struct WordCountProber;

    impl MediaProber for WordCountProber {
        fn probe_video(&self, path: &Path) -> ReelResult<MediaAsset> {
            Err(ReelError::asset_decode(path, "not video"))
        }

        fn probe_audio(&self, path: &Path) -> ReelResult<MediaAsset> {
            let body = std::fs::read_to_string(path)?;
            Ok(MediaAsset::audio(path, body.split_whitespace().count() as f64))
        }

        fn name(&self) -> &str {
            "words"
        }
    }

    fn copy_synth() -> CommandSynthesizer {
        CommandSynthesizer::new(
            "sh",
            vec!["-c".into(), "cp \"$0\" \"$1\"".into(), "{text_file}".into(), "{output}".into()],
            Arc::new(WordCountProber),
        )
    }

    #[test]
    fn test_render_args_expands_placeholders() {
        let synth = CommandSynthesizer::from_config(&NarrationDefaults::default(), Arc::new(WordCountProber));
        let params = VoiceParams {
            voice: "bm_george".into(),
            lang: "b".into(),
            speed: 1.25,
        };
        let args = synth.render_args(Path::new("/tmp/t.txt"), Path::new("/tmp/o.wav"), &params);
        assert!(args.contains(&"/tmp/t.txt".to_string()));
        assert!(args.contains(&"/tmp/o.wav".to_string()));
        assert!(args.contains(&"bm_george".to_string()));
        assert!(args.contains(&"b".to_string()));
        assert!(args.contains(&"1.25".to_string()));
        assert!(!args.iter().any(|a| a.contains('{')));
    }

    #[test]
    fn test_command_output_is_measured() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("voice.wav");
        let track = copy_synth()
            .synthesize("four words right here", &VoiceParams::default(), &output)
            .unwrap();
        assert_eq!(track.duration(), 4.0);
        assert_eq!(track.voice.as_deref(), Some("af_heart"));
        assert!(!text_file_for(&output).exists());
    }

    #[test]
    fn test_failure_falls_back_to_none() {
        let dir = tempfile::tempdir().unwrap();
        let failing = CommandSynthesizer::new("sh", vec!["-c".into(), "exit 3".into()], Arc::new(WordCountProber));
        let output = dir.path().join("voice.wav");
        assert!(matches!(
            failing.synthesize("hello", &VoiceParams::default(), &output),
            Err(ReelError::Synthesis { .. })
        ));
        assert!(synthesize_or_skip(Some(&failing), "hello", &VoiceParams::default(), &output).is_none());
        assert!(synthesize_or_skip(None, "hello", &VoiceParams::default(), &output).is_none());
    }

    #[test]
    fn test_missing_program_is_synthesis_error() {
        let dir = tempfile::tempdir().unwrap();
        let synth = CommandSynthesizer::new("reelkit-no-such-tts", vec![], Arc::new(WordCountProber));
        assert!(matches!(
            synth.synthesize("hello", &VoiceParams::default(), &dir.path().join("v.wav")),
            Err(ReelError::Synthesis { .. })
        ));
    }

    #[test]
    fn test_voice_catalogue() {
        assert_eq!(KOKORO_VOICES.len(), 10);
        assert!(KOKORO_VOICES.iter().any(|(id, _)| *id == "af_heart"));
    }
}
