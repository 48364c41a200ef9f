//! Frame compositor: evaluates a timeline at a single instant.
//!
//! The export backend hands the same decisions to ffmpeg as a filter
//! graph; this module computes them directly so previews and tests can
//! inspect what a frame will contain.

use image::imageops::{self, FilterType};
use image::Pixel;

use reelkit_common::error::{ReelError, ReelResult};
use reelkit_processing_core::aspect::{crop_dimensions, TargetFrame};
use reelkit_timeline_model::asset::{FrameSampler, VideoFrame};
use reelkit_timeline_model::effects::apply_filters;
use reelkit_timeline_model::timeline::Timeline;

/// A single frame's composition instructions.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameComposition {
    /// Frame number.
    pub frame_index: u64,

    /// Time in seconds.
    pub time_secs: f64,

    /// Visible clips, bottom to top.
    pub layers: Vec<ClipLayer>,

    /// Text fragment on screen, if any.
    pub text: Option<TextOverlay>,
}

/// One visible clip in a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipLayer {
    /// Index into `Timeline::clips`.
    pub clip_index: usize,
    /// Time in the clip's source asset.
    pub source_time_secs: f64,
    /// Combined fade multiplier in [0, 1].
    pub opacity: f64,
    /// Zoom factor about the frame center.
    pub scale: f64,
}

/// Text rendering instruction for a single frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextOverlay {
    /// Index into the timeline's fragments.
    pub fragment_index: usize,
    pub opacity: f64,
    /// Downward offset from the resting position in output pixels.
    pub y_offset_px: f64,
    pub scale: f64,
}

/// Composition of the frame at `time_secs`.
pub fn compose_frame(timeline: &Timeline, frame_index: u64, time_secs: f64) -> FrameComposition {
    let layers = timeline
        .clips_at(time_secs)
        .map(|(clip_index, clip)| ClipLayer {
            clip_index,
            source_time_secs: clip.source_time(time_secs),
            opacity: clip.opacity_at(time_secs),
            scale: clip.scale_at(time_secs),
        })
        .collect();

    let text = timeline
        .fragments()
        .iter()
        .enumerate()
        .find(|(_, fragment)| fragment.is_active(time_secs))
        .map(|(fragment_index, fragment)| {
            let local = time_secs - fragment.display_start_secs;
            TextOverlay {
                fragment_index,
                opacity: fragment.opacity_at(time_secs),
                y_offset_px: fragment.animation.y_offset_at(local),
                scale: fragment.animation.scale_at(local),
            }
        });

    FrameComposition {
        frame_index,
        time_secs,
        layers,
        text,
    }
}

/// Compute the composition for each frame of the export.
pub fn frame_plan(timeline: &Timeline, fps: u32) -> Vec<FrameComposition> {
    let fps = fps.max(1);
    let total_frames = (timeline.total_duration_secs * fps as f64).ceil().max(0.0) as u64;
    (0..total_frames)
        .map(|frame| compose_frame(timeline, frame, frame as f64 / fps as f64))
        .collect()
}

/// Render the background of the frame at `time_secs` into RGB pixels.
///
/// Each visible clip is sampled, cropped and resampled to the output
/// size, run through its filters, zoomed, and blended over the layers
/// below it by its fade opacity. Text is left to the export backend.
pub fn render_frame(
    timeline: &Timeline,
    time_secs: f64,
    sampler: &dyn FrameSampler,
) -> ReelResult<VideoFrame> {
    if !(time_secs >= 0.0 && time_secs < timeline.total_duration_secs) {
        return Err(ReelError::invalid_input(format!(
            "frame time {time_secs}s outside timeline of {}s",
            timeline.total_duration_secs
        )));
    }

    let target = TargetFrame::new(timeline.width, timeline.height);
    let mut canvas = VideoFrame::new(timeline.width, timeline.height);

    for layer in compose_frame(timeline, 0, time_secs).layers {
        if layer.opacity <= 0.0 {
            continue;
        }
        let clip = &timeline.clips[layer.clip_index];
        let source = sampler
            .sample(&clip.asset, layer.source_time_secs)
            .map_err(|e| ReelError::asset_decode(e.path, e.message))?;

        let view = match clip.crop {
            Some(view) => view,
            None => crop_dimensions(source.width(), source.height(), target)?,
        };
        let mut image = view.apply(&source);
        apply_filters(&clip.filters, &mut image);
        if (layer.scale - 1.0).abs() > f64::EPSILON {
            image = zoom_center(&image, layer.scale);
        }
        blend_over(&mut canvas, &image, layer.opacity);
    }

    Ok(canvas)
}

/// Magnify about the center, keeping the frame size.
fn zoom_center(frame: &VideoFrame, scale: f64) -> VideoFrame {
    let (width, height) = frame.dimensions();
    if width == 0 || height == 0 || scale <= 0.0 {
        return VideoFrame::new(width, height);
    }
    let crop_w = ((width as f64 / scale).round() as u32).clamp(1, width);
    let crop_h = ((height as f64 / scale).round() as u32).clamp(1, height);
    let window = imageops::crop_imm(
        frame,
        (width - crop_w) / 2,
        (height - crop_h) / 2,
        crop_w,
        crop_h,
    )
    .to_image();
    imageops::resize(&window, width, height, FilterType::Triangle)
}

fn blend_over(canvas: &mut VideoFrame, layer: &VideoFrame, opacity: f64) {
    let alpha = opacity.clamp(0.0, 1.0);
    for (dst, src) in canvas.pixels_mut().zip(layer.pixels()) {
        dst.apply2(src, |d, s| (d as f64 * (1.0 - alpha) + s as f64 * alpha).round() as u8);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use reelkit_processing_core::composer::{compose, ComposeConfig, ComposeRequest};
    use reelkit_timeline_model::asset::{solid_frame, MediaAsset, SampleError};
    use reelkit_timeline_model::clip::Clip;
    use reelkit_timeline_model::effects::EffectPreset;
    use reelkit_timeline_model::text::TextAnimationKind;
    use reelkit_timeline_model::transition::{TransitionRequest, TransitionStyle};

    /// Solid frames: red for "red.mp4", blue for anything else.
    struct SolidSampler;

    impl FrameSampler for SolidSampler {
        fn sample(&self, asset: &MediaAsset, _time_secs: f64) -> Result<VideoFrame, SampleError> {
            let rgb = if asset.name() == "red.mp4" {
                [200, 0, 0]
            } else {
                [0, 0, 200]
            };
            Ok(solid_frame(asset.width, asset.height, rgb))
        }
    }

    struct BrokenSampler;

    impl FrameSampler for BrokenSampler {
        fn sample(&self, asset: &MediaAsset, time_secs: f64) -> Result<VideoFrame, SampleError> {
            Err(SampleError {
                path: asset.path.clone(),
                time_secs,
                message: "truncated".into(),
            })
        }
    }

    fn segment(name: &str, secs: f64) -> Clip {
        let asset = Arc::new(MediaAsset::video(name, 32, 18, 60.0, 30.0));
        Clip::new(asset, 0.0, secs).unwrap()
    }

    fn small_config() -> ComposeConfig {
        ComposeConfig {
            width: 9,
            height: 16,
            terminal_fade_secs: 0.0,
            text_animation: TextAnimationKind::Slide,
            ..ComposeConfig::default()
        }
    }

    fn two_clip_timeline(style: TransitionStyle) -> Timeline {
        compose(
            &ComposeRequest {
                segments: vec![segment("red.mp4", 4.0), segment("blue.mp4", 4.0)],
                transitions: vec![TransitionRequest::new(style, 2.0)],
                fragments: vec!["first words".into(), "second words".into()],
                narration: None,
                total_duration_secs: 6.0,
            },
            &small_config(),
        )
        .unwrap()
    }

    #[test]
    fn test_frame_plan_covers_every_frame() {
        let timeline = two_clip_timeline(TransitionStyle::Crossfade);
        let plan = frame_plan(&timeline, 10);
        assert_eq!(plan.len(), 60);
        assert!(plan.iter().all(|frame| !frame.layers.is_empty()));
        assert!(plan.iter().all(|frame| frame.text.is_some()));

        let mid = &plan[30];
        assert_eq!(mid.layers.len(), 2);
        assert!((mid.layers[0].opacity - 0.5).abs() < 1e-9);
        assert!((mid.layers[1].opacity - 0.5).abs() < 1e-9);
        assert!((mid.layers[1].source_time_secs - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_text_overlay_slides_in() {
        let timeline = two_clip_timeline(TransitionStyle::Crossfade);
        let start = compose_frame(&timeline, 0, 0.0).text.unwrap();
        assert_eq!(start.fragment_index, 0);
        assert!(start.y_offset_px > 0.0);

        let later = compose_frame(&timeline, 0, 4.0).text.unwrap();
        assert_eq!(later.fragment_index, 1);
        assert_eq!(later.y_offset_px, 0.0);
    }

    #[test]
    fn test_crossfade_mixes_pixels() {
        let timeline = two_clip_timeline(TransitionStyle::Crossfade);
        let frame = render_frame(&timeline, 1.0, &SolidSampler).unwrap();
        assert_eq!(frame.dimensions(), (9, 16));
        assert_eq!(frame.get_pixel(4, 8).0, [200, 0, 0]);

        let mid = render_frame(&timeline, 3.0, &SolidSampler).unwrap();
        let [r, _, b] = mid.get_pixel(4, 8).0;
        assert!(r > 0 && b > 0);

        let end = render_frame(&timeline, 5.5, &SolidSampler).unwrap();
        assert_eq!(end.get_pixel(4, 8).0, [0, 0, 200]);
    }

    #[test]
    fn test_filters_are_applied_per_frame() {
        let mut timeline = two_clip_timeline(TransitionStyle::Cut);
        timeline.clips[0].filters = EffectPreset::Warm.filters();
        let frame = render_frame(&timeline, 0.5, &SolidSampler).unwrap();
        assert_eq!(frame.get_pixel(4, 8).0, [220, 0, 0]);
    }

    #[test]
    fn test_out_of_range_and_decode_errors() {
        let timeline = two_clip_timeline(TransitionStyle::Cut);
        assert!(matches!(
            render_frame(&timeline, 6.0, &SolidSampler),
            Err(ReelError::InvalidInput { .. })
        ));
        assert!(matches!(
            render_frame(&timeline, 1.0, &BrokenSampler),
            Err(ReelError::AssetDecode { .. })
        ));
    }

    #[test]
    fn test_zoom_magnifies_center() {
        let mut frame = VideoFrame::new(20, 20);
        for y in 5..15 {
            for x in 5..15 {
                frame.put_pixel(x, y, image::Rgb([255, 255, 255]));
            }
        }
        let zoomed = zoom_center(&frame, 2.0);
        assert_eq!(zoomed.dimensions(), (20, 20));
        assert_eq!(zoomed.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(zoomed.get_pixel(19, 19).0, [255, 255, 255]);

        let unchanged = zoom_center(&frame, 1.0);
        assert_eq!(unchanged.get_pixel(0, 0).0, [0, 0, 0]);
    }

    #[test]
    fn test_blend_over_mixes_by_opacity() {
        let mut canvas = solid_frame(2, 2, [0, 0, 0]);
        blend_over(&mut canvas, &solid_frame(2, 2, [200, 100, 50]), 0.5);
        assert_eq!(canvas.get_pixel(1, 1).0, [100, 50, 25]);
    }
}
