//! Render one background frame of a saved timeline to an image.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use reelkit_common::config::AppConfig;
use reelkit_render_engine::compositor::{compose_frame, frame_plan, render_frame};
use reelkit_sources::sampler::FfmpegFrameSampler;
use reelkit_timeline_model::timeline::Timeline;

pub struct PreviewArgs {
    pub timeline: PathBuf,
    pub at_secs: f64,
    pub output: Option<PathBuf>,
}

/// `<output_dir>/<timeline stem>_<ms>ms.png`
fn default_output(output_dir: &Path, timeline: &Path, at_secs: f64) -> PathBuf {
    let stem = timeline
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.trim_end_matches(".json").trim_end_matches(".timeline"))
        .filter(|n| !n.is_empty())
        .unwrap_or("preview");
    let millis = (at_secs.max(0.0) * 1000.0).round() as u64;
    output_dir.join(format!("{stem}_{millis}ms.png"))
}

pub async fn run(config: &AppConfig, args: PreviewArgs) -> anyhow::Result<()> {
    let timeline = Timeline::load_json(&args.timeline)
        .map_err(|e| anyhow::anyhow!("Failed to load timeline {}: {e}", args.timeline.display()))?;
    let output = args
        .output
        .unwrap_or_else(|| default_output(&config.output_dir, &args.timeline, args.at_secs));
    let at_secs = args.at_secs;

    let composition = compose_frame(&timeline, 0, at_secs);
    let planned = frame_plan(&timeline, config.export.fps).len();
    println!(
        "Frame at {at_secs:.2}s of {:.2}s ({planned} frames at {} fps)",
        timeline.total_duration_secs, config.export.fps
    );
    for layer in &composition.layers {
        let clip = &timeline.clips[layer.clip_index];
        println!(
            "  clip #{} {} @ {:.2}s (opacity {:.2}, scale {:.3})",
            layer.clip_index,
            clip.asset.name(),
            layer.source_time_secs,
            layer.opacity,
            layer.scale
        );
    }
    if let Some(text) = &composition.text {
        println!(
            "  text: \"{}\" (opacity {:.2})",
            timeline.fragments()[text.fragment_index].text,
            text.opacity
        );
    }

    let timeline = Arc::new(timeline);
    let frame = tokio::task::spawn_blocking(move || {
        render_frame(&timeline, at_secs, &FfmpegFrameSampler::default())
    })
    .await??;

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    frame.save(&output)?;
    println!("Preview written: {}", output.display());
    Ok(())
}
