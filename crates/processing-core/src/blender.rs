//! Transition blending between adjacent clips.
//!
//! Blending only touches fade and scale curves; trim windows are never
//! modified. The overlap is the requested duration scaled by the style
//! (slide hands off at half duration, cut has none) and clamped to what
//! both clips can spare.

use reelkit_timeline_model::clip::Clip;
use reelkit_timeline_model::effects::ScaleRamp;
use reelkit_timeline_model::transition::{
    TransitionRequest, TransitionStyle, ZOOM_TRANSITION_SCALE,
};

/// Two clips after blending and the overlap they now share.
#[derive(Debug, Clone, PartialEq)]
pub struct BlendedPair {
    pub outgoing: Clip,
    pub incoming: Clip,
    pub overlap_secs: f64,
}

/// Part of `clip` not already spoken for by its incoming overlap.
pub fn remaining_after_fade_in(clip: &Clip) -> f64 {
    (clip.duration() - clip.fade_in_secs).max(0.0)
}

/// Overlap for `request`, clamped to the outgoing clip's remaining length
/// and the incoming clip's full length. Never negative.
pub fn effective_overlap(
    outgoing_remaining_secs: f64,
    incoming_secs: f64,
    request: TransitionRequest,
) -> f64 {
    let wanted = request.duration_secs * request.style.overlap_factor();
    if !(wanted > 0.0) {
        return 0.0;
    }
    wanted
        .min(outgoing_remaining_secs)
        .min(incoming_secs)
        .max(0.0)
}

/// Running end of a sequential layout, tracking the same overlaps that
/// [`blend`] will produce. Planners use it to know when enough footage
/// has been selected.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutCursor {
    end_secs: f64,
    last_remaining_secs: Option<f64>,
    clips: usize,
}

impl LayoutCursor {
    /// Append a clip of `clip_secs`. `request` joins it to the previous
    /// clip and is ignored for the first one. Returns the overlap.
    pub fn push(&mut self, clip_secs: f64, request: TransitionRequest) -> f64 {
        let overlap = match self.last_remaining_secs {
            Some(remaining) => effective_overlap(remaining, clip_secs, request),
            None => 0.0,
        };
        self.end_secs += clip_secs - overlap;
        self.last_remaining_secs = Some((clip_secs - overlap).max(0.0));
        self.clips += 1;
        overlap
    }

    pub fn end_secs(&self) -> f64 {
        self.end_secs
    }

    pub fn clip_count(&self) -> usize {
        self.clips
    }
}

/// Blend `outgoing` into `incoming`.
pub fn blend(outgoing: &Clip, incoming: &Clip, request: TransitionRequest) -> BlendedPair {
    let overlap = effective_overlap(
        remaining_after_fade_in(outgoing),
        incoming.duration(),
        request,
    );

    let mut outgoing = outgoing.clone();
    let mut incoming = incoming.clone();

    outgoing.fade_out_secs = overlap;
    incoming.fade_in_secs = overlap;

    outgoing.scale_ramp = match request.style {
        TransitionStyle::Zoom if overlap > 0.0 => {
            let length = outgoing.duration();
            Some(ScaleRamp {
                start_secs: length - overlap,
                end_secs: length,
                from: 1.0,
                to: ZOOM_TRANSITION_SCALE,
            })
        }
        _ => None,
    };

    BlendedPair {
        outgoing,
        incoming,
        overlap_secs: overlap,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelkit_timeline_model::asset::MediaAsset;
    use std::sync::Arc;

    fn clip(length: f64) -> Clip {
        let asset = Arc::new(MediaAsset::video("a.mp4", 1920, 1080, 100.0, 30.0));
        Clip::new(asset, 10.0, 10.0 + length).unwrap()
    }

    #[test]
    fn test_crossfade_sets_both_fades() {
        let pair = blend(
            &clip(10.0),
            &clip(8.0),
            TransitionRequest::new(TransitionStyle::Crossfade, 1.5),
        );
        assert_eq!(pair.overlap_secs, 1.5);
        assert_eq!(pair.outgoing.fade_out_secs, 1.5);
        assert_eq!(pair.incoming.fade_in_secs, 1.5);
        assert!(pair.outgoing.scale_ramp.is_none());
    }

    #[test]
    fn test_slide_halves_overlap() {
        let pair = blend(
            &clip(10.0),
            &clip(8.0),
            TransitionRequest::new(TransitionStyle::Slide, 1.5),
        );
        assert_eq!(pair.overlap_secs, 0.75);
        assert_eq!(pair.incoming.fade_in_secs, 0.75);
    }

    #[test]
    fn test_zoom_ramps_outgoing_over_fade_window() {
        let pair = blend(
            &clip(10.0),
            &clip(8.0),
            TransitionRequest::new(TransitionStyle::Zoom, 2.0),
        );
        let ramp = pair.outgoing.scale_ramp.unwrap();
        assert_eq!(ramp.start_secs, 8.0);
        assert_eq!(ramp.end_secs, 10.0);
        assert_eq!(ramp.factor_at(8.0), 1.0);
        assert!((ramp.factor_at(10.0) - ZOOM_TRANSITION_SCALE).abs() < 1e-12);
        assert!(pair.incoming.scale_ramp.is_none());
    }

    #[test]
    fn test_overlap_clamps_to_shorter_clip() {
        let pair = blend(
            &clip(10.0),
            &clip(0.8),
            TransitionRequest::new(TransitionStyle::Crossfade, 1.5),
        );
        assert!((pair.overlap_secs - 0.8).abs() < 1e-12);

        let mut consumed = clip(2.0);
        consumed.fade_in_secs = 1.5;
        let pair = blend(
            &consumed,
            &clip(5.0),
            TransitionRequest::new(TransitionStyle::Crossfade, 1.5),
        );
        assert!((pair.overlap_secs - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_cut_has_no_overlap() {
        let pair = blend(&clip(10.0), &clip(8.0), TransitionRequest::cut());
        assert_eq!(pair.overlap_secs, 0.0);
        assert_eq!(pair.outgoing.fade_out_secs, 0.0);
    }

    #[test]
    fn test_layout_cursor_matches_overlap_subtraction() {
        let request = TransitionRequest::new(TransitionStyle::Crossfade, 1.5);
        let mut cursor = LayoutCursor::default();
        assert_eq!(cursor.push(10.0, request), 0.0);
        assert_eq!(cursor.push(10.0, request), 1.5);
        assert_eq!(cursor.push(10.0, request), 1.5);
        assert_eq!(cursor.end_secs(), 27.0);
        assert_eq!(cursor.clip_count(), 3);

        // A clip shorter than the requested overlap is fully consumed.
        let mut cursor = LayoutCursor::default();
        cursor.push(10.0, request);
        assert_eq!(cursor.push(1.0, request), 1.0);
        assert_eq!(cursor.push(5.0, request), 0.0);
        assert_eq!(cursor.end_secs(), 15.0);
    }

    #[test]
    fn test_trim_windows_untouched() {
        let a = clip(10.0);
        let b = clip(8.0);
        let pair = blend(&a, &b, TransitionRequest::new(TransitionStyle::Zoom, 3.0));
        assert_eq!((pair.outgoing.in_secs, pair.outgoing.out_secs), (a.in_secs, a.out_secs));
        assert_eq!((pair.incoming.in_secs, pair.incoming.out_secs), (b.in_secs, b.out_secs));
    }
}
