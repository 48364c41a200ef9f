//! Build and export reels for many content items.
//!
//! Narration runs item by item, composition runs in parallel, and exports
//! share a bounded pool. Every item succeeds or fails on its own; the run
//! ends with a JSON session summary in the output directory.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use reelkit_common::config::AppConfig;
use reelkit_processing_core::aspect::TargetFrame;
use reelkit_processing_core::reel::{build_reel_batch, ReelRequest};
use reelkit_render_engine::export::{export_batch, ExportJob};
use reelkit_sources::content::{
    load_content, prepare_narration_text, select_content, ContentSelection,
};
use reelkit_sources::probe::{FfprobeProber, MediaProber};

use super::{
    cancel_on_ctrl_c, load_background, narrate_blocking, safe_title, seed_or_random, timestamp,
};
use crate::settings::{export_deadline, export_settings, reel_config};

pub struct BatchArgs {
    pub background: PathBuf,
    pub content: PathBuf,
    pub count: Option<usize>,
    pub output_dir: Option<PathBuf>,
    pub no_narration: bool,
    pub seed: Option<u64>,
    pub min_reading_secs: Option<f64>,
    pub max_reading_secs: Option<f64>,
    /// Keep every item in file order instead of selecting by reading time.
    pub all: bool,
}

fn selection(config: &AppConfig, args: &BatchArgs) -> ContentSelection {
    let mut selection = ContentSelection::from_config(&config.content, config.reel.words_per_minute);
    if let Some(min) = args.min_reading_secs {
        selection.min_reading_secs = min;
    }
    if let Some(max) = args.max_reading_secs {
        selection.max_reading_secs = max;
    }
    selection
}

#[derive(Debug, Serialize)]
struct SessionSummary {
    started_at: String,
    finished_at: String,
    background: PathBuf,
    content: PathBuf,
    seed: u64,
    created: Vec<CreatedReel>,
    failed: Vec<FailedReel>,
}

#[derive(Debug, Serialize)]
struct CreatedReel {
    title: String,
    output: PathBuf,
    duration_secs: f64,
    narrated: bool,
    subtitles: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct FailedReel {
    title: String,
    reason: String,
}

pub async fn run(config: &AppConfig, args: BatchArgs) -> anyhow::Result<()> {
    let started_at = chrono::Local::now();
    let stamp = timestamp();
    let reel = reel_config(&config.reel)?;
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| config.output_dir.clone());
    std::fs::create_dir_all(&output_dir)?;

    let mut items = load_content(&args.content)?;
    if !args.all {
        let selection = selection(config, &args);
        items = select_content(items, &selection)?;
    }
    if let Some(count) = args.count {
        items.truncate(count);
    }
    let prober: Arc<dyn MediaProber> = Arc::new(FfprobeProber::default());
    let target = TargetFrame::new(config.background.width, config.background.height);
    let background = load_background(&args.background, prober.as_ref(), target)?;
    let base_seed = seed_or_random(args.seed);

    println!("Building {} reels into {}", items.len(), output_dir.display());

    let outputs: Vec<PathBuf> = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            output_dir.join(format!(
                "reel_{:02}_{}_{}.mp4",
                i + 1,
                safe_title(&item.title),
                stamp
            ))
        })
        .collect();

    let shared_config = Arc::new(config.clone());
    let mut requests = Vec::with_capacity(items.len());
    for (i, (item, output)) in items.iter().zip(&outputs).enumerate() {
        println!("  [{}/{}] Narrating: {}", i + 1, items.len(), item.title);
        let narration = narrate_blocking(
            Arc::clone(&shared_config),
            Arc::clone(&prober),
            prepare_narration_text(item, reel.max_words),
            output.with_extension("wav"),
            args.no_narration,
        )
        .await;
        requests.push(ReelRequest {
            item: item.clone(),
            narration,
            seed: base_seed.wrapping_add(i as u64),
        });
    }

    let timelines = build_reel_batch(&background, &requests, &reel);

    let mut failed = Vec::new();
    let mut jobs = Vec::new();
    let mut titles = Vec::new();
    for ((request, output), timeline) in requests.iter().zip(&outputs).zip(timelines) {
        match timeline {
            Ok(timeline) => {
                jobs.push(
                    ExportJob::new(Arc::new(timeline), output.clone())
                        .with_settings(export_settings(config))
                        .with_deadline(export_deadline(config))
                        .with_subtitles(config.export.write_subtitles),
                );
                titles.push(request.item.title.clone());
            }
            Err(err) if err.is_item_scoped() => {
                tracing::warn!(title = %request.item.title, error = %err, "Reel composition failed");
                failed.push(FailedReel {
                    title: request.item.title.clone(),
                    reason: err.to_string(),
                });
            }
            Err(err) => return Err(err.into()),
        }
    }

    println!("Exporting {} reels ({} at a time)", jobs.len(), config.export.max_concurrent.max(1));
    let narrated: Vec<bool> = jobs.iter().map(|job| job.timeline.narration.is_some()).collect();
    let results = export_batch(jobs, config.export.max_concurrent, cancel_on_ctrl_c()).await;

    let mut created = Vec::new();
    for ((result, title), narrated) in results.into_iter().zip(titles).zip(narrated) {
        match result.result {
            Ok(report) => {
                println!("  [OK] {}", report.output_path.display());
                created.push(CreatedReel {
                    title,
                    output: report.output_path,
                    duration_secs: report.duration_secs,
                    narrated,
                    subtitles: report.subtitles_path,
                });
            }
            Err(err) => {
                println!("  [FAIL] {title}: {err}");
                failed.push(FailedReel {
                    title,
                    reason: err.to_string(),
                });
            }
        }
    }

    let summary = SessionSummary {
        started_at: started_at.to_rfc3339(),
        finished_at: chrono::Local::now().to_rfc3339(),
        background: args.background,
        content: args.content,
        seed: base_seed,
        created,
        failed,
    };
    let summary_path = output_dir.join(format!("session_summary_{stamp}.json"));
    std::fs::write(&summary_path, serde_json::to_string_pretty(&summary)?)?;

    println!();
    println!(
        "Created {} reels, {} failed. Summary: {}",
        summary.created.len(),
        summary.failed.len(),
        summary_path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> BatchArgs {
        BatchArgs {
            background: PathBuf::from("bg.json"),
            content: PathBuf::from("content.json"),
            count: None,
            output_dir: None,
            no_narration: true,
            seed: Some(1),
            min_reading_secs: None,
            max_reading_secs: Some(60.0),
            all: false,
        }
    }

    #[test]
    fn test_selection_overrides_config_window() {
        let mut config = AppConfig::default();
        config.reel.words_per_minute = 200.0;
        let selection = selection(&config, &args());
        assert_eq!(selection.min_reading_secs, config.content.min_reading_secs);
        assert_eq!(selection.max_reading_secs, 60.0);
        assert_eq!(selection.words_per_minute, 200.0);
    }
}
