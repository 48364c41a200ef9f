//! Build and export a single reel.

use std::path::PathBuf;
use std::sync::Arc;

use reelkit_common::config::AppConfig;
use reelkit_processing_core::aspect::TargetFrame;
use reelkit_processing_core::reel::build_reel_timeline;
use reelkit_render_engine::export::{export_timeline, ExportJob};
use reelkit_sources::content::{load_content, prepare_narration_text};
use reelkit_sources::probe::{FfprobeProber, MediaProber};

use super::{
    cancel_on_ctrl_c, load_background, narrate_blocking, progress_printer, safe_title, seed_or_random,
    timeline_path, timestamp,
};
use crate::settings::{export_deadline, export_settings, reel_config};

pub struct ReelArgs {
    pub background: PathBuf,
    pub content: PathBuf,
    pub index: usize,
    pub output: Option<PathBuf>,
    pub style: Option<String>,
    pub animation: Option<String>,
    pub no_narration: bool,
    pub seed: Option<u64>,
}

pub async fn run(config: &AppConfig, args: ReelArgs) -> anyhow::Result<()> {
    let mut defaults = config.reel.clone();
    if let Some(style) = args.style {
        defaults.text_style = style;
    }
    if let Some(animation) = args.animation {
        defaults.animation = animation;
    }
    let reel = reel_config(&defaults)?;

    let items = load_content(&args.content)?;
    let item = items.get(args.index).ok_or_else(|| {
        anyhow::anyhow!(
            "Content index {} out of range ({} items)",
            args.index,
            items.len()
        )
    })?;

    let prober: Arc<dyn MediaProber> = Arc::new(FfprobeProber::default());
    let target = TargetFrame::new(config.background.width, config.background.height);
    let background = load_background(&args.background, prober.as_ref(), target)?;

    let output_path = args.output.unwrap_or_else(|| {
        config.output_dir.join(format!(
            "reel_{}_{}.mp4",
            safe_title(&item.title),
            timestamp()
        ))
    });
    let seed = seed_or_random(args.seed);

    println!("Building reel: {}", item.title);
    let text = prepare_narration_text(item, reel.max_words);
    let narration = narrate_blocking(
        Arc::new(config.clone()),
        Arc::clone(&prober),
        text,
        output_path.with_extension("wav"),
        args.no_narration,
    )
    .await;
    let timeline = build_reel_timeline(&background, item, narration, &reel, seed)?;

    let json_path = timeline_path(&output_path);
    timeline
        .save_json(&json_path)
        .map_err(|e| anyhow::anyhow!("Failed to save timeline: {e}"))?;

    println!("  Duration: {:.1}s", timeline.total_duration_secs);
    println!(
        "  Narration: {}",
        if timeline.narration.is_some() {
            "synthesized"
        } else {
            "none (reading-time estimate)"
        }
    );
    println!("  Text fragments: {}", timeline.fragments().len());
    println!("  Seed: {seed}");
    println!("  Timeline: {}", json_path.display());
    println!("  Output: {}", output_path.display());

    let job = ExportJob::new(Arc::new(timeline), output_path)
        .with_settings(export_settings(config))
        .with_deadline(export_deadline(config))
        .with_subtitles(config.export.write_subtitles);

    match export_timeline(job, Some(progress_printer()), cancel_on_ctrl_c()).await {
        Ok(report) => {
            println!("\nReel complete: {}", report.output_path.display());
            if let Some(srt) = report.subtitles_path {
                println!("  Subtitles: {}", srt.display());
            }
            Ok(())
        }
        Err(e) => {
            println!("\nExport failed: {e}");
            Err(e.into())
        }
    }
}
