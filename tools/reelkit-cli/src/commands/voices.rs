//! List the known narration voices.

use reelkit_common::config::AppConfig;
use reelkit_narration::synthesis::KOKORO_VOICES;

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("Available voices:");
    for (id, label) in KOKORO_VOICES {
        let marker = if *id == config.narration.voice { "*" } else { " " };
        println!("  {marker} {id:<12} {label}");
    }
    println!();
    println!("Set narration.voice in the config to change the default.");
    Ok(())
}
