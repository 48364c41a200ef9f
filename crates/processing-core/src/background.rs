//! Background timeline assembly.
//!
//! Plans a sequence of trimmed segments from the footage pool and hands
//! them to the composer. Planning is deterministic for a given seed.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use reelkit_common::error::{ReelError, ReelResult};
use reelkit_timeline_model::asset::MediaAsset;
use reelkit_timeline_model::clip::Clip;
use reelkit_timeline_model::effects::EffectPreset;
use reelkit_timeline_model::timeline::Timeline;
use reelkit_timeline_model::transition::{TransitionRequest, TransitionStyle};
use reelkit_timeline_model::TIME_EPSILON;

use crate::aspect::{crop, TargetFrame};
use crate::blender::LayoutCursor;
use crate::composer::{compose, ComposeConfig, ComposeRequest};
use crate::selector::select_segment;

/// Upper bound on planned segments, reached only with pathological footage.
const MAX_PLANNED_SEGMENTS: usize = 10_000;

/// Configuration for background assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundConfig {
    /// Requested background length.
    pub duration_secs: f64,

    /// Number of distinct segments. `None` picks `max(3, duration / 10)`.
    /// Always bounded by the number of usable assets.
    pub clip_count: Option<usize>,

    /// Look applied to every clip.
    pub effect: EffectPreset,

    /// Transition between consecutive clips.
    pub transition: TransitionRequest,

    /// Fade-in of the first clip.
    pub opening_fade_secs: f64,

    /// Fade-out of the last clip.
    pub terminal_fade_secs: f64,

    /// Output frame size.
    pub target: TargetFrame,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            duration_secs: 60.0,
            clip_count: None,
            effect: EffectPreset::Cinematic,
            transition: TransitionRequest::new(TransitionStyle::Crossfade, 1.5),
            opening_fade_secs: 0.5,
            terminal_fade_secs: 0.5,
            target: TargetFrame::VERTICAL_HD,
        }
    }
}

impl BackgroundConfig {
    /// Number of segments to plan for `available` usable assets.
    pub fn planned_clip_count(&self, available: usize) -> usize {
        let auto = ((self.duration_secs / 10.0) as usize).max(3);
        self.clip_count.unwrap_or(auto).min(available).max(1)
    }

    /// Segment length that makes `n` segments cover the duration after
    /// overlap subtraction.
    pub fn segment_secs(&self, n: usize) -> f64 {
        let overlap = self.transition.duration_secs.max(0.0) * self.transition.style.overlap_factor();
        (self.duration_secs + (n as f64 - 1.0) * overlap) / n as f64
    }

    fn compose_config(&self) -> ComposeConfig {
        ComposeConfig {
            width: self.target.width,
            height: self.target.height,
            opening_fade_secs: self.opening_fade_secs,
            terminal_fade_secs: self.terminal_fade_secs,
            ..Default::default()
        }
    }
}

/// Build a background timeline from the footage pool with a seeded RNG.
pub fn build_background_timeline(
    assets: &[Arc<MediaAsset>],
    config: &BackgroundConfig,
    seed: u64,
) -> ReelResult<Timeline> {
    let mut rng = StdRng::seed_from_u64(seed);
    build_background_timeline_with_rng(assets, config, &mut rng)
}

/// Build a background timeline drawing randomness from `rng`.
pub fn build_background_timeline_with_rng<R: Rng + ?Sized>(
    assets: &[Arc<MediaAsset>],
    config: &BackgroundConfig,
    rng: &mut R,
) -> ReelResult<Timeline> {
    let total = config.duration_secs;
    if !(total.is_finite() && total > 0.0) {
        return Err(ReelError::invalid_input(format!(
            "background duration must be positive, got {total}"
        )));
    }

    let mut pool: Vec<Arc<MediaAsset>> = assets
        .iter()
        .filter(|asset| {
            let usable = asset.is_video()
                && asset.aspect_ratio().is_some()
                && asset.duration_secs.is_finite()
                && asset.duration_secs > 0.0;
            if !usable {
                tracing::warn!(asset = %asset.name(), "Skipping unusable footage");
            }
            usable
        })
        .cloned()
        .collect();
    if pool.is_empty() {
        return Err(ReelError::no_assets("background footage"));
    }
    pool.shuffle(rng);

    let n = config.planned_clip_count(pool.len());
    let segment_secs = config.segment_secs(n);
    let filters = config.effect.filters();

    tracing::info!(
        assets = pool.len(),
        clips = n,
        segment_secs,
        total_secs = total,
        effect = %config.effect,
        transition = %config.transition.style,
        "Planning background"
    );

    let mut segments: Vec<Clip> = Vec::with_capacity(n);
    let mut cursor = LayoutCursor::default();
    while cursor.end_secs() < total - TIME_EPSILON {
        if segments.len() >= MAX_PLANNED_SEGMENTS {
            return Err(ReelError::invalid_input(format!(
                "footage cannot cover {total}s of background"
            )));
        }
        let asset = Arc::clone(&pool[segments.len() % pool.len()]);
        let view = crop(&asset, config.target)?;
        let mut clip = select_segment(asset, segment_secs, None, rng)?;
        clip.crop = Some(view);
        clip.filters = filters.clone();

        if segments.len() == n {
            tracing::debug!("Footage shorter than planned; cycling assets");
        }
        cursor.push(clip.duration(), config.transition);
        segments.push(clip);
    }

    let transitions = vec![config.transition; segments.len() - 1];
    let request = ComposeRequest {
        segments,
        transitions,
        fragments: vec![],
        narration: None,
        total_duration_secs: total,
    };
    let timeline = compose(&request, &config.compose_config())?;

    tracing::info!(
        clips = timeline.clips.len(),
        total_secs = timeline.total_duration_secs,
        "Background timeline composed"
    );
    Ok(timeline)
}

/// Wrap an already-rendered background video as a single-clip timeline.
///
/// Effects and fades are assumed to be baked into the video, so only the
/// aspect crop is applied.
pub fn background_from_asset(
    asset: Arc<MediaAsset>,
    target: TargetFrame,
) -> ReelResult<Timeline> {
    let duration = asset.duration_secs;
    if !(duration.is_finite() && duration > 0.0) {
        return Err(ReelError::asset_decode(
            asset.path.clone(),
            format!("unusable duration {duration}s"),
        ));
    }
    let view = crop(&asset, target)?;
    let mut clip = Clip::new(asset, 0.0, duration)
        .map_err(|e| ReelError::invalid_input(e.to_string()))?;
    clip.crop = Some(view);

    let request = ComposeRequest {
        segments: vec![clip],
        transitions: vec![],
        fragments: vec![],
        narration: None,
        total_duration_secs: duration,
    };
    let config = ComposeConfig {
        width: target.width,
        height: target.height,
        opening_fade_secs: 0.0,
        terminal_fade_secs: 0.0,
        ..Default::default()
    };
    compose(&request, &config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn footage(durations: &[f64]) -> Vec<Arc<MediaAsset>> {
        durations
            .iter()
            .enumerate()
            .map(|(i, &d)| Arc::new(MediaAsset::video(format!("clip{i}.mp4"), 1920, 1080, d, 30.0)))
            .collect()
    }

    #[test]
    fn test_clip_count_rules() {
        let config = BackgroundConfig::default();
        assert_eq!(config.planned_clip_count(10), 6);
        assert_eq!(config.planned_clip_count(2), 2);

        let short = BackgroundConfig {
            duration_secs: 15.0,
            ..Default::default()
        };
        assert_eq!(short.planned_clip_count(10), 3);

        let fixed = BackgroundConfig {
            clip_count: Some(5),
            ..Default::default()
        };
        assert_eq!(fixed.planned_clip_count(10), 5);
        assert_eq!(fixed.planned_clip_count(0), 1);
    }

    #[test]
    fn test_segment_length_accounts_for_overlap() {
        let config = BackgroundConfig {
            duration_secs: 40.0,
            ..Default::default()
        };
        let len = config.segment_secs(3);
        assert!((3.0 * len - 2.0 * 1.5 - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_clips_are_cropped_and_filtered() {
        let timeline =
            build_background_timeline(&footage(&[60.0, 60.0, 60.0]), &BackgroundConfig::default(), 3)
                .unwrap();
        assert_eq!((timeline.width, timeline.height), (1080, 1920));
        for clip in &timeline.clips {
            assert_eq!(clip.crop.unwrap().output_size(), (1080, 1920));
            assert_eq!(clip.filters, EffectPreset::Cinematic.filters());
        }
        assert_eq!(timeline.clips[0].fade_in_secs, 0.5);
        assert_eq!(timeline.clips.last().unwrap().fade_out_secs, 0.5);
    }

    #[test]
    fn test_short_footage_is_cycled() {
        let timeline =
            build_background_timeline(&footage(&[4.0, 5.0]), &BackgroundConfig::default(), 11)
                .unwrap();
        assert!(timeline.clips.len() > 2);
        assert!((timeline.clips.last().unwrap().layer_end() - 60.0).abs() < 1e-6);
    }

    #[test]
    fn test_unusable_assets_are_skipped() {
        let mut assets = footage(&[30.0, 0.0]);
        assets.push(Arc::new(MediaAsset::audio("voice.wav", 30.0)));
        let config = BackgroundConfig {
            duration_secs: 20.0,
            ..Default::default()
        };
        let timeline = build_background_timeline(&assets, &config, 5).unwrap();
        assert!(timeline.clips.iter().all(|c| c.asset.name() == "clip0.mp4"));

        assert!(matches!(
            build_background_timeline(&footage(&[0.0]), &config, 5),
            Err(ReelError::NoAssetsFound { .. })
        ));
        assert!(matches!(
            build_background_timeline(&[], &config, 5),
            Err(ReelError::NoAssetsFound { .. })
        ));
    }

    #[test]
    fn test_rendered_background_wraps_single_clip() {
        let asset = Arc::new(MediaAsset::video("bg.mp4", 1080, 1920, 45.0, 30.0));
        let timeline = background_from_asset(asset, TargetFrame::VERTICAL_HD).unwrap();
        assert_eq!(timeline.clips.len(), 1);
        assert_eq!(timeline.total_duration_secs, 45.0);
        assert_eq!(timeline.clips[0].fade_out_secs, 0.0);
        assert!(timeline.clips[0].filters.is_empty());
    }
}
