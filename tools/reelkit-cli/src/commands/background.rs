//! Compose and render a background video.

use std::path::PathBuf;
use std::sync::Arc;

use reelkit_common::config::AppConfig;
use reelkit_processing_core::background::build_background_timeline;
use reelkit_render_engine::export::{export_timeline, ExportJob};
use reelkit_sources::footage::load_footage;
use reelkit_sources::probe::FfprobeProber;

use super::{cancel_on_ctrl_c, progress_printer, seed_or_random, timeline_path, timestamp};
use crate::settings::{background_config, export_deadline, export_settings};

pub struct BackgroundArgs {
    pub footage: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub duration: Option<f64>,
    pub clips: Option<usize>,
    pub effect: Option<String>,
    pub transition: Option<String>,
    pub seed: Option<u64>,
    pub timeline_only: bool,
}

pub async fn run(config: &AppConfig, args: BackgroundArgs) -> anyhow::Result<()> {
    let mut defaults = config.background.clone();
    if let Some(duration) = args.duration {
        defaults.duration_secs = duration;
    }
    if args.clips.is_some() {
        defaults.clip_count = args.clips;
    }
    if let Some(effect) = args.effect {
        defaults.effect = effect;
    }
    if let Some(transition) = args.transition {
        defaults.transition = transition;
    }
    let background = background_config(&defaults)?;

    let footage_dir = args.footage.unwrap_or_else(|| config.footage_dir.clone());
    let seed = seed_or_random(args.seed);
    println!("Composing background from: {}", footage_dir.display());

    let prober = FfprobeProber::default();
    let assets = load_footage(&footage_dir, &prober)?;
    let timeline = build_background_timeline(&assets, &background, seed)?;

    let output_path = args.output.unwrap_or_else(|| {
        config
            .output_dir
            .join(format!("background_{}.mp4", timestamp()))
    });
    let json_path = timeline_path(&output_path);
    timeline
        .save_json(&json_path)
        .map_err(|e| anyhow::anyhow!("Failed to save timeline: {e}"))?;

    println!("  Footage: {} usable files", assets.len());
    println!("  Clips: {}", timeline.clips.len());
    println!("  Duration: {:.1}s", timeline.total_duration_secs);
    println!("  Effect: {}", background.effect);
    println!(
        "  Transition: {} ({:.1}s)",
        background.transition.style, background.transition.duration_secs
    );
    println!("  Seed: {seed}");
    println!("  Timeline: {}", json_path.display());

    if args.timeline_only {
        return Ok(());
    }

    println!("  Output: {}", output_path.display());
    let job = ExportJob::new(Arc::new(timeline), output_path)
        .with_settings(export_settings(config))
        .with_deadline(export_deadline(config));

    match export_timeline(job, Some(progress_printer()), cancel_on_ctrl_c()).await {
        Ok(report) => {
            println!(
                "\nBackground complete: {} ({:.1}s to render)",
                report.output_path.display(),
                report.elapsed_secs
            );
            Ok(())
        }
        Err(e) => {
            println!("\nExport failed: {e}");
            Err(e.into())
        }
    }
}
