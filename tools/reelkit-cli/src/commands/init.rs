//! Write a default configuration file.

use std::path::{Path, PathBuf};

use reelkit_common::config::{config_file_path, AppConfig};

/// Write the default config to `path`. An existing file is kept unless
/// `force` is set.
fn write_default(path: &Path, force: bool) -> anyhow::Result<AppConfig> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        );
    }
    let config = AppConfig::default();
    config
        .save_to(path)
        .map_err(|e| anyhow::anyhow!("Failed to write config {}: {e}", path.display()))?;
    Ok(config)
}

pub fn run(path: Option<PathBuf>, force: bool) -> anyhow::Result<()> {
    let path = path.unwrap_or_else(config_file_path);
    let config = write_default(&path, force)?;

    println!("Config written: {}", path.display());
    println!("  Footage folder: {}", config.footage_dir.display());
    println!("  Output folder:  {}", config.output_dir.display());
    println!(
        "  Background: {}x{}, {:.0}s, {} effect",
        config.background.width,
        config.background.height,
        config.background.duration_secs,
        config.background.effect
    );
    println!("  Narration: {} (voice {})", config.narration.program, config.narration.voice);
    println!();
    println!("Put background videos in the footage folder, then run `reelkit background`.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_loadable_defaults_and_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reelkit").join("config.json");

        write_default(&path, false).unwrap();
        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.export.fps, AppConfig::default().export.fps);

        assert!(write_default(&path, false).is_err());
        write_default(&path, true).unwrap();
    }
}
