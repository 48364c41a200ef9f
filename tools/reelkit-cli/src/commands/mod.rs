//! Subcommand implementations and the helpers they share.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use reelkit_common::config::AppConfig;
use reelkit_narration::synthesis::{synthesize_or_skip, CommandSynthesizer, VoiceParams};
use reelkit_processing_core::aspect::TargetFrame;
use reelkit_processing_core::background::background_from_asset;
use reelkit_render_engine::export::{CancelFlag, ExportProgress, ProgressCallback};
use reelkit_sources::probe::MediaProber;
use reelkit_timeline_model::timeline::{NarrationTrack, Timeline};

pub mod background;
pub mod batch;
pub mod check;
pub mod init;
pub mod inspect;
pub mod preview;
pub mod reel;
pub mod voices;

/// Load a background from a saved timeline (`.json`) or a rendered video.
pub fn load_background(path: &Path, prober: &dyn MediaProber, target: TargetFrame) -> anyhow::Result<Timeline> {
    let is_timeline = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let timeline = if is_timeline {
        Timeline::load_json(path)
            .map_err(|e| anyhow::anyhow!("Failed to load background timeline: {e}"))?
    } else {
        let asset = prober.probe_video(path)?;
        background_from_asset(Arc::new(asset), target)?
    };
    tracing::info!(
        path = %path.display(),
        duration_secs = timeline.total_duration_secs,
        clips = timeline.clips.len(),
        "Background loaded"
    );
    Ok(timeline)
}

/// Synthesize narration into `audio_path` unless disabled.
pub fn narrate(
    config: &AppConfig,
    prober: Arc<dyn MediaProber>,
    text: &str,
    audio_path: &Path,
    disabled: bool,
) -> Option<NarrationTrack> {
    if disabled || !config.narration.enabled || config.narration.program.is_empty() {
        return None;
    }
    let synthesizer = CommandSynthesizer::from_config(&config.narration, prober);
    let params = VoiceParams::from(&config.narration);
    synthesize_or_skip(Some(&synthesizer), text, &params, audio_path)
}

/// [`narrate`] on the blocking pool; synthesis shells out and waits.
pub async fn narrate_blocking(
    config: Arc<AppConfig>,
    prober: Arc<dyn MediaProber>,
    text: String,
    audio_path: PathBuf,
    disabled: bool,
) -> Option<NarrationTrack> {
    tokio::task::spawn_blocking(move || narrate(&config, prober, &text, &audio_path, disabled))
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Narration task failed");
            None
        })
}

/// Cancel flag that trips on Ctrl-C.
pub fn cancel_on_ctrl_c() -> CancelFlag {
    let flag = CancelFlag::new();
    let trip = flag.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nInterrupt received, stopping export...");
            trip.cancel();
        }
    });
    flag
}

pub fn progress_printer() -> ProgressCallback {
    Box::new(|p: ExportProgress| {
        print!(
            "\r  Progress: {:.1}% ({}/{} frames, ETA: {:.0}s)  ",
            p.progress * 100.0,
            p.frames_rendered,
            p.total_frames,
            p.eta_secs,
        );
    })
}

/// Local timestamp used in output file names.
pub fn timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// File-name-safe form of a title: at most 30 characters of letters,
/// digits, spaces, `-` and `_`, with spaces turned into underscores.
pub fn safe_title(title: &str) -> String {
    let kept: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '-' || *c == '_')
        .take(30)
        .collect();
    let trimmed = kept.trim().replace(' ', "_");
    if trimmed.is_empty() {
        "untitled".to_string()
    } else {
        trimmed
    }
}

/// `<video stem>.timeline.json` next to the video.
pub fn timeline_path(video: &Path) -> PathBuf {
    video.with_extension("timeline.json")
}

pub fn seed_or_random(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(rand::random)
}
