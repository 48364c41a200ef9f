//! Translate the string-valued application config into typed settings.

use std::str::FromStr;
use std::time::Duration;

use reelkit_common::config::{AppConfig, BackgroundDefaults, ReelDefaults};
use reelkit_common::error::{ReelError, ReelResult};
use reelkit_processing_core::aspect::TargetFrame;
use reelkit_processing_core::background::BackgroundConfig;
use reelkit_processing_core::reel::ReelConfig;
use reelkit_render_engine::export::ExportSettings;
use reelkit_render_engine::fonts::resolve_font;
use reelkit_timeline_model::effects::EffectPreset;
use reelkit_timeline_model::text::{FontFallback, TextAnimationKind, TextStylePreset};
use reelkit_timeline_model::transition::{TransitionRequest, TransitionStyle};

/// Parse an enumerated config value, naming the field on failure.
pub fn parse_setting<T>(field: &str, value: &str) -> ReelResult<T>
where
    T: FromStr<Err = String>,
{
    value
        .parse()
        .map_err(|e: String| ReelError::config(format!("{field}: {e}")))
}

pub fn background_config(defaults: &BackgroundDefaults) -> ReelResult<BackgroundConfig> {
    let effect: EffectPreset = parse_setting("background.effect", &defaults.effect)?;
    let style: TransitionStyle = parse_setting("background.transition", &defaults.transition)?;
    if defaults.width == 0 || defaults.height == 0 {
        return Err(ReelError::config(format!(
            "background size {}x{} is degenerate",
            defaults.width, defaults.height
        )));
    }
    Ok(BackgroundConfig {
        duration_secs: defaults.duration_secs,
        clip_count: defaults.clip_count,
        effect,
        transition: TransitionRequest::new(style, defaults.transition_secs),
        opening_fade_secs: defaults.opening_fade_secs,
        terminal_fade_secs: defaults.terminal_fade_secs,
        target: TargetFrame::new(defaults.width, defaults.height),
    })
}

/// Reel settings with the font already resolved.
pub fn reel_config(defaults: &ReelDefaults) -> ReelResult<ReelConfig> {
    let preset: TextStylePreset = parse_setting("reel.text_style", &defaults.text_style)?;
    let animation: TextAnimationKind = parse_setting("reel.animation", &defaults.animation)?;
    let fallback: FontFallback = parse_setting("reel.font_fallback", &defaults.font_fallback)?;
    let font = resolve_font(&defaults.font_candidates, fallback)?;

    Ok(ReelConfig {
        max_duration_secs: defaults.max_duration_secs,
        words_per_chunk: defaults.words_per_chunk,
        max_words: defaults.max_words,
        words_per_minute: defaults.words_per_minute,
        text_style: preset.style(),
        animation,
        font,
        ..ReelConfig::default()
    })
}

pub fn export_settings(config: &AppConfig) -> ExportSettings {
    ExportSettings::from(&config.export)
}

pub fn export_deadline(config: &AppConfig) -> Option<Duration> {
    config.export.deadline_secs.map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelkit_timeline_model::text::FontChoice;

    #[test]
    fn test_defaults_translate() {
        let config = AppConfig::default();
        let background = background_config(&config.background).unwrap();
        assert_eq!(background, BackgroundConfig::default());

        let mut reel_defaults = config.reel.clone();
        reel_defaults.font_candidates.clear();
        let reel = reel_config(&reel_defaults).unwrap();
        assert_eq!(reel.font, FontChoice::PlainOutlined);
        assert_eq!(reel.text_style, TextStylePreset::Modern.style());
        assert_eq!(reel.words_per_chunk, 8);
    }

    #[test]
    fn test_unknown_values_are_config_errors() {
        let mut defaults = AppConfig::default().background;
        defaults.effect = "sepia".into();
        assert!(matches!(
            background_config(&defaults),
            Err(ReelError::Config { .. })
        ));

        let mut reel = AppConfig::default().reel;
        reel.font_candidates.clear();
        reel.font_fallback = "require-styled".into();
        assert!(matches!(reel_config(&reel), Err(ReelError::Config { .. })));
    }
}
