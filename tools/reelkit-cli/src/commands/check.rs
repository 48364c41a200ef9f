//! Report which external tools and assets are available.

use reelkit_common::config::{config_file_path, AppConfig};
use reelkit_sources::probe::command_exists;
use reelkit_timeline_model::text::FontChoice;

use crate::settings::reel_config;

fn status(ok: bool) -> &'static str {
    if ok {
        "OK"
    } else {
        "MISSING"
    }
}

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    let config_path = config_file_path();
    println!(
        "Config: {} ({})",
        config_path.display(),
        if config_path.exists() { "found" } else { "defaults" }
    );

    let ffmpeg = command_exists("ffmpeg");
    let ffprobe = command_exists("ffprobe");
    println!("  ffmpeg:  {}", status(ffmpeg));
    println!("  ffprobe: {}", status(ffprobe));

    let narration = &config.narration;
    if !narration.enabled || narration.program.is_empty() {
        println!("  narration: disabled");
    } else {
        println!(
            "  narration ({}): {}",
            narration.program,
            status(command_exists(&narration.program))
        );
    }

    match reel_config(&config.reel) {
        Ok(reel) => match reel.font {
            FontChoice::Styled { path } => println!("  font: {}", path.display()),
            FontChoice::PlainOutlined => println!("  font: none found, using plain outlined text"),
        },
        Err(e) => println!("  font: {e}"),
    }

    println!("  footage dir: {}", config.footage_dir.display());
    println!("  output dir:  {}", config.output_dir.display());

    if !(ffmpeg && ffprobe) {
        anyhow::bail!("ffmpeg and ffprobe are required for rendering");
    }
    Ok(())
}
