//! Timeline composition.
//!
//! # Algorithm
//!
//! 1. **Layout** background clips back to back, each starting where the
//!    previous one ends minus the overlap of the transition between them.
//! 2. **Truncate** at the total duration: the first clip reaching the end
//!    is trimmed (never dropped), later clips are discarded, and a short
//!    terminal fade is applied.
//! 3. **Distribute** text fragments evenly over `[0, total)` with
//!    per-fragment animation.
//! 4. **Attach** narration unclipped.
//! 5. **Validate** every structural invariant. A violation is a bug in
//!    steps 1-4 and aborts the composition.
//!
//! The composer is stateless: one call produces one immutable timeline.

use rayon::prelude::*;

use reelkit_common::error::{ReelError, ReelResult};
use reelkit_timeline_model::clip::Clip;
use reelkit_timeline_model::text::{
    FontChoice, SlideIn, TextAnimation, TextAnimationKind, TextFragment, TextStyle, ZoomGrowth,
};
use reelkit_timeline_model::timeline::{NarrationTrack, TextLayer, Timeline};
use reelkit_timeline_model::transition::{TransitionRequest, TransitionSpec};
use reelkit_timeline_model::TIME_EPSILON;

use crate::blender::blend;

/// Fade-in on the first text fragment and fade-out on the last one.
pub const TEXT_EDGE_FADE_SECS: f64 = 0.5;

/// Fade-out on interior text fragments.
pub const TEXT_INTERIOR_FADE_SECS: f64 = 0.3;

/// Duration of the slide-in text animation.
pub const TEXT_SLIDE_SECS: f64 = 0.5;

/// Starting offset of the slide-in text animation, in output pixels.
pub const TEXT_SLIDE_OFFSET_PX: f64 = 200.0;

/// Growth rate of the zoom text animation (scale units per second).
pub const TEXT_ZOOM_RATE: f64 = 0.05;

/// Cap of the zoom text animation.
pub const TEXT_ZOOM_MAX: f64 = 1.05;

/// Presentation settings shared by every composition of one kind.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposeConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Fade-in on the first clip. Zero disables.
    pub opening_fade_secs: f64,
    /// Fade-out on the final clip. Clamped to the clip's length.
    pub terminal_fade_secs: f64,
    pub text_animation: TextAnimationKind,
    pub text_style: TextStyle,
    pub font: FontChoice,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
            opening_fade_secs: 0.0,
            terminal_fade_secs: 0.5,
            text_animation: TextAnimationKind::Fade,
            text_style: TextStyle::default(),
            font: FontChoice::PlainOutlined,
        }
    }
}

/// Already-resolved inputs of one composition.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposeRequest {
    /// Trimmed background segments in order. Placements and curves are
    /// ignored; crop and filters are kept.
    pub segments: Vec<Clip>,
    /// `transitions[i]` joins `segments[i]` and `segments[i + 1]`.
    pub transitions: Vec<TransitionRequest>,
    /// Text chunks in reading order. Empty means no overlay.
    pub fragments: Vec<String>,
    pub narration: Option<NarrationTrack>,
    pub total_duration_secs: f64,
}

/// Compose one timeline.
pub fn compose(request: &ComposeRequest, config: &ComposeConfig) -> ReelResult<Timeline> {
    let total = request.total_duration_secs;
    if !(total.is_finite() && total > 0.0) {
        return Err(ReelError::invalid_input(format!(
            "total duration must be positive, got {total}"
        )));
    }
    if request.segments.is_empty() {
        return Err(ReelError::no_assets("composition segments"));
    }
    if request.transitions.len() + 1 != request.segments.len() {
        return Err(ReelError::invalid_input(format!(
            "{} segments need {} transitions, got {}",
            request.segments.len(),
            request.segments.len() - 1,
            request.transitions.len()
        )));
    }
    for segment in &request.segments {
        segment
            .check_trim()
            .map_err(|e| ReelError::invalid_input(e.to_string()))?;
    }

    let (mut clips, mut transitions) = lay_out(&request.segments, &request.transitions);
    truncate(&mut clips, &mut transitions, total, config.terminal_fade_secs)?;

    if config.opening_fade_secs > 0.0 {
        let first = &mut clips[0];
        first.fade_in_secs = config.opening_fade_secs.min(first.duration());
    }

    let fragments = distribute_fragments(&request.fragments, total, config.text_animation);

    let timeline = Timeline {
        width: config.width,
        height: config.height,
        total_duration_secs: total,
        clips,
        transitions,
        text: TextLayer {
            style: config.text_style.clone(),
            font: config.font.clone(),
            fragments,
        },
        narration: request.narration.clone(),
    };

    if let Err(violation) = timeline.validate() {
        tracing::error!(
            error = %violation,
            total_secs = total,
            clips = timeline.clips.len(),
            "Composed timeline violates its invariants"
        );
        return Err(ReelError::invariant(violation.to_string()));
    }

    tracing::debug!(
        clips = timeline.clips.len(),
        transitions = timeline.transitions.len(),
        fragments = timeline.text.fragments.len(),
        total_secs = total,
        narrated = timeline.narration.is_some(),
        "Timeline composed"
    );

    Ok(timeline)
}

/// Compose independent timelines on worker threads.
///
/// Each result belongs to its own request; one failure never affects the
/// others.
pub fn compose_batch(
    requests: &[ComposeRequest],
    config: &ComposeConfig,
) -> Vec<ReelResult<Timeline>> {
    requests
        .par_iter()
        .map(|request| compose(request, config))
        .collect()
}

/// Step 1: sequential placement with blended transitions.
fn lay_out(
    segments: &[Clip],
    requests: &[TransitionRequest],
) -> (Vec<Clip>, Vec<TransitionSpec>) {
    let mut clips: Vec<Clip> = segments
        .iter()
        .cloned()
        .map(|clip| clip.without_curves())
        .collect();
    let mut transitions = Vec::with_capacity(requests.len());

    clips[0].layer_start_secs = 0.0;
    for (i, request) in requests.iter().enumerate() {
        let pair = blend(&clips[i], &clips[i + 1], *request);
        let start = pair.outgoing.layer_end() - pair.overlap_secs;
        clips[i] = pair.outgoing;
        clips[i + 1] = pair.incoming.placed_at(start);
        transitions.push(TransitionSpec {
            from_clip: i,
            to_clip: i + 1,
            style: request.style,
            requested_secs: request.duration_secs,
            overlap_secs: pair.overlap_secs,
        });
    }

    (clips, transitions)
}

/// Step 2: cut the layout at `total`.
fn truncate(
    clips: &mut Vec<Clip>,
    transitions: &mut Vec<TransitionSpec>,
    total: f64,
    terminal_fade_secs: f64,
) -> ReelResult<()> {
    let Some(last) = clips
        .iter()
        .position(|clip| clip.layer_end() >= total - TIME_EPSILON)
    else {
        let end = clips.last().map(Clip::layer_end).unwrap_or(0.0);
        return Err(ReelError::invariant(format!(
            "background ends at {end}s, short of total duration {total}s"
        )));
    };

    if last + 1 < clips.len() {
        tracing::trace!(
            kept = last + 1,
            dropped = clips.len() - last - 1,
            "Dropping clips past total duration"
        );
    }
    clips.truncate(last + 1);
    transitions.truncate(last);

    let clip = &mut clips[last];
    // The curves toward a dropped successor no longer apply.
    clip.fade_out_secs = 0.0;
    clip.scale_ramp = None;
    clip.trim_to(total);
    clip.fade_out_secs = terminal_fade_secs.max(0.0).min(clip.duration());

    Ok(())
}

/// Step 3: even fragment windows. The last window ends exactly at `total`.
pub fn distribute_fragments(
    chunks: &[String],
    total: f64,
    kind: TextAnimationKind,
) -> Vec<TextFragment> {
    let count = chunks.len();
    let boundary = |i: usize| {
        if i == count {
            total
        } else {
            total * i as f64 / count as f64
        }
    };

    chunks
        .iter()
        .enumerate()
        .map(|(index, text)| {
            let start = boundary(index);
            let end = boundary(index + 1);
            TextFragment {
                index,
                text: text.clone(),
                display_start_secs: start,
                display_end_secs: end,
                animation: fragment_animation(kind, index, count, end - start),
            }
        })
        .collect()
}

fn fragment_animation(
    kind: TextAnimationKind,
    index: usize,
    count: usize,
    length_secs: f64,
) -> TextAnimation {
    match kind {
        TextAnimationKind::Fade => {
            let first = index == 0;
            let last = index + 1 == count;
            let fade_in = if first { TEXT_EDGE_FADE_SECS } else { 0.0 };
            let fade_out = if last {
                TEXT_EDGE_FADE_SECS
            } else {
                TEXT_INTERIOR_FADE_SECS
            };
            TextAnimation {
                fade_in_secs: fade_in.min(length_secs),
                fade_out_secs: fade_out.min(length_secs),
                ..Default::default()
            }
        }
        TextAnimationKind::Slide => TextAnimation {
            slide: Some(SlideIn {
                duration_secs: TEXT_SLIDE_SECS.min(length_secs),
                offset_px: TEXT_SLIDE_OFFSET_PX,
            }),
            ..Default::default()
        },
        TextAnimationKind::Zoom => TextAnimation {
            zoom: Some(ZoomGrowth {
                rate_per_sec: TEXT_ZOOM_RATE,
                max_scale: TEXT_ZOOM_MAX,
            }),
            ..Default::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelkit_timeline_model::asset::MediaAsset;
    use reelkit_timeline_model::transition::TransitionStyle;
    use std::sync::Arc;

    fn segment(duration: f64, in_secs: f64, out_secs: f64) -> Clip {
        let asset = Arc::new(MediaAsset::video("s.mp4", 1920, 1080, duration, 30.0));
        Clip::new(asset, in_secs, out_secs).unwrap()
    }

    fn crossfade(secs: f64) -> TransitionRequest {
        TransitionRequest::new(TransitionStyle::Crossfade, secs)
    }

    fn request(segments: Vec<Clip>, overlap: f64, total: f64) -> ComposeRequest {
        let transitions = vec![crossfade(overlap); segments.len().saturating_sub(1)];
        ComposeRequest {
            segments,
            transitions,
            fragments: vec![],
            narration: None,
            total_duration_secs: total,
        }
    }

    #[test]
    fn test_placement_subtracts_overlap() {
        let req = request(
            vec![segment(30.0, 0.0, 10.0), segment(30.0, 5.0, 15.0), segment(30.0, 0.0, 10.0)],
            2.0,
            26.0,
        );
        let timeline = compose(&req, &ComposeConfig::default()).unwrap();
        assert_eq!(timeline.clips.len(), 3);
        assert_eq!(timeline.clips[1].layer_start_secs, 8.0);
        assert_eq!(timeline.clips[2].layer_start_secs, 16.0);
        assert!(timeline
            .transitions
            .iter()
            .all(|t| t.overlap_secs == 2.0));
    }

    #[test]
    fn test_last_clip_is_trimmed_not_dropped() {
        let req = request(vec![segment(30.0, 0.0, 10.0), segment(30.0, 0.0, 10.0)], 1.0, 14.0);
        let timeline = compose(&req, &ComposeConfig::default()).unwrap();
        let last = timeline.clips.last().unwrap();
        assert_eq!(timeline.clips.len(), 2);
        assert!((last.layer_end() - 14.0).abs() < 1e-9);
        assert!((last.duration() - 5.0).abs() < 1e-9);
        assert_eq!(last.fade_out_secs, 0.5);
    }

    #[test]
    fn test_clips_past_total_are_dropped() {
        let req = request(
            vec![segment(30.0, 0.0, 10.0), segment(30.0, 0.0, 10.0), segment(30.0, 0.0, 10.0)],
            1.0,
            12.0,
        );
        let timeline = compose(&req, &ComposeConfig::default()).unwrap();
        assert_eq!(timeline.clips.len(), 2);
        assert_eq!(timeline.transitions.len(), 1);
        timeline.validate().unwrap();
    }

    #[test]
    fn test_terminal_fade_clamps_to_short_clip() {
        let req = request(vec![segment(30.0, 0.0, 10.0), segment(30.0, 0.0, 10.0)], 0.0, 10.3);
        let timeline = compose(&req, &ComposeConfig::default()).unwrap();
        let last = timeline.clips.last().unwrap();
        assert!((last.duration() - 0.3).abs() < 1e-9);
        assert!((last.fade_out_secs - last.duration()).abs() < 1e-12);
    }

    #[test]
    fn test_underrun_is_invariant_violation() {
        let req = request(vec![segment(30.0, 0.0, 10.0)], 1.0, 12.0);
        assert!(matches!(
            compose(&req, &ComposeConfig::default()),
            Err(ReelError::InvariantViolation { .. })
        ));
    }

    #[test]
    fn test_malformed_requests_are_rejected() {
        let mut req = request(vec![segment(30.0, 0.0, 10.0), segment(30.0, 0.0, 10.0)], 1.0, 12.0);
        req.transitions.clear();
        assert!(matches!(
            compose(&req, &ComposeConfig::default()),
            Err(ReelError::InvalidInput { .. })
        ));

        let req = request(vec![], 1.0, 12.0);
        assert!(matches!(
            compose(&req, &ComposeConfig::default()),
            Err(ReelError::NoAssetsFound { .. })
        ));

        let req = request(vec![segment(30.0, 0.0, 10.0)], 1.0, 0.0);
        assert!(compose(&req, &ComposeConfig::default()).is_err());
    }

    #[test]
    fn test_opening_fade_and_narration() {
        let mut req = request(vec![segment(30.0, 0.0, 20.0)], 1.0, 12.0);
        req.narration = Some(NarrationTrack::new(Arc::new(MediaAsset::audio("n.wav", 15.0))));
        let config = ComposeConfig {
            opening_fade_secs: 0.5,
            ..Default::default()
        };
        let timeline = compose(&req, &config).unwrap();
        assert_eq!(timeline.clips[0].fade_in_secs, 0.5);
        // Narration is attached unclipped.
        assert_eq!(timeline.narration.unwrap().duration(), 15.0);
    }

    #[test]
    fn test_fragments_cover_total_exactly() {
        let chunks: Vec<String> = (0..7).map(|i| format!("chunk {i}")).collect();
        let fragments = distribute_fragments(&chunks, 41.3, TextAnimationKind::Fade);
        assert_eq!(fragments.len(), 7);
        assert_eq!(fragments[0].display_start_secs, 0.0);
        assert_eq!(fragments[6].display_end_secs, 41.3);
        for pair in fragments.windows(2) {
            assert_eq!(pair[0].display_end_secs, pair[1].display_start_secs);
        }
        assert_eq!(fragments[0].animation.fade_in_secs, TEXT_EDGE_FADE_SECS);
        assert_eq!(fragments[3].animation.fade_in_secs, 0.0);
        assert_eq!(fragments[3].animation.fade_out_secs, TEXT_INTERIOR_FADE_SECS);
        assert_eq!(fragments[6].animation.fade_out_secs, TEXT_EDGE_FADE_SECS);
    }

    #[test]
    fn test_fragment_animation_kinds() {
        let chunks = vec!["a".to_string(), "b".to_string()];
        let slide = distribute_fragments(&chunks, 10.0, TextAnimationKind::Slide);
        assert_eq!(slide[1].animation.slide.unwrap().offset_px, TEXT_SLIDE_OFFSET_PX);
        let zoom = distribute_fragments(&chunks, 10.0, TextAnimationKind::Zoom);
        assert!((zoom[0].animation.scale_at(100.0) - TEXT_ZOOM_MAX).abs() < 1e-12);
        assert!(distribute_fragments(&[], 10.0, TextAnimationKind::Fade).is_empty());
    }

    #[test]
    fn test_batch_keeps_failures_per_item() {
        let good = request(vec![segment(30.0, 0.0, 20.0)], 1.0, 12.0);
        let bad = request(vec![segment(30.0, 0.0, 5.0)], 1.0, 12.0);
        let results = compose_batch(&[good.clone(), bad, good], &ComposeConfig::default());
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!(results[2].is_ok());
    }
}
