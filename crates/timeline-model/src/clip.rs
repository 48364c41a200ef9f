//! Clips: trimmed, placed references to media assets.

use std::sync::Arc;

use image::imageops::{self, FilterType};
use serde::{Deserialize, Serialize};

use crate::asset::{MediaAsset, VideoFrame};
use crate::effects::{fade_in_gain, fade_out_gain, FrameFilter, ScaleRamp};
use crate::error::ModelError;
use crate::TIME_EPSILON;

/// A center-crop window in source pixels plus the exact output size it is
/// resampled to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CroppedView {
    /// Left edge of the crop window (source pixels).
    pub x: u32,
    /// Top edge of the crop window (source pixels).
    pub y: u32,
    /// Crop window width (source pixels).
    pub width: u32,
    /// Crop window height (source pixels).
    pub height: u32,
    /// Resampled output width.
    pub output_width: u32,
    /// Resampled output height.
    pub output_height: u32,
}

impl CroppedView {
    /// Output dimensions after resampling.
    pub fn output_size(&self) -> (u32, u32) {
        (self.output_width, self.output_height)
    }

    /// Crop a decoded source frame and resample it to the output size.
    ///
    /// The window is clamped to the source; an empty source or window
    /// yields a black frame.
    pub fn apply(&self, source: &VideoFrame) -> VideoFrame {
        let cropped = imageops::crop_imm(source, self.x, self.y, self.width, self.height).to_image();
        if cropped.width() == 0 || cropped.height() == 0 {
            return VideoFrame::new(self.output_width, self.output_height);
        }
        imageops::resize(
            &cropped,
            self.output_width,
            self.output_height,
            FilterType::Triangle,
        )
    }
}

/// A media asset reference with a trim window `[in, out)` and a placement
/// on the output timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    /// Source asset (shared, read-only).
    pub asset: Arc<MediaAsset>,

    /// Trim window start in source time.
    pub in_secs: f64,

    /// Trim window end in source time (exclusive).
    pub out_secs: f64,

    /// Position of the clip's first frame on the output timeline.
    pub layer_start_secs: f64,

    /// Aspect normalization applied before any filter.
    #[serde(default)]
    pub crop: Option<CroppedView>,

    /// Frame filters applied lazily at render time, in order.
    #[serde(default)]
    pub filters: Vec<FrameFilter>,

    /// Linear fade-in over the first seconds of the clip.
    #[serde(default)]
    pub fade_in_secs: f64,

    /// Linear fade-out over the last seconds of the clip.
    #[serde(default)]
    pub fade_out_secs: f64,

    /// Scale animation, composed before the fade.
    #[serde(default)]
    pub scale_ramp: Option<ScaleRamp>,
}

impl Clip {
    /// Create an unplaced clip over `[in_secs, out_secs)` of `asset`.
    pub fn new(asset: Arc<MediaAsset>, in_secs: f64, out_secs: f64) -> Result<Self, ModelError> {
        let clip = Self {
            asset,
            in_secs,
            out_secs,
            layer_start_secs: 0.0,
            crop: None,
            filters: vec![],
            fade_in_secs: 0.0,
            fade_out_secs: 0.0,
            scale_ramp: None,
        };
        clip.check_trim()?;
        Ok(clip)
    }

    /// Check `0 <= in < out <= asset.duration` and `layer_start >= 0`.
    pub fn check_trim(&self) -> Result<(), ModelError> {
        let valid = self.in_secs.is_finite()
            && self.out_secs.is_finite()
            && self.in_secs >= 0.0
            && self.in_secs < self.out_secs
            && self.out_secs <= self.asset.duration_secs + TIME_EPSILON;
        if !valid {
            return Err(ModelError::InvalidTrim {
                path: self.asset.path.clone(),
                in_secs: self.in_secs,
                out_secs: self.out_secs,
                duration_secs: self.asset.duration_secs,
            });
        }
        if !(self.layer_start_secs >= 0.0) {
            return Err(ModelError::NegativePlacement {
                path: self.asset.path.clone(),
                start_secs: self.layer_start_secs,
            });
        }
        Ok(())
    }

    /// Length of the trim window.
    pub fn duration(&self) -> f64 {
        self.out_secs - self.in_secs
    }

    /// Timeline position just past the clip's last frame.
    pub fn layer_end(&self) -> f64 {
        self.layer_start_secs + self.duration()
    }

    /// Whether the clip is placed over timeline time `t`.
    pub fn covers(&self, t: f64) -> bool {
        t >= self.layer_start_secs && t < self.layer_end()
    }

    /// Convert a timeline time into a clip-local time.
    pub fn local_time(&self, t: f64) -> f64 {
        t - self.layer_start_secs
    }

    /// Convert a timeline time into a source time.
    pub fn source_time(&self, t: f64) -> f64 {
        self.in_secs + self.local_time(t)
    }

    /// Visibility at timeline time `t`, combining both fades. Zero outside
    /// the placement.
    pub fn opacity_at(&self, t: f64) -> f64 {
        if !self.covers(t) {
            return 0.0;
        }
        let local = self.local_time(t);
        fade_in_gain(local, self.fade_in_secs)
            * fade_out_gain(local, self.duration(), self.fade_out_secs)
    }

    /// Scale factor at timeline time `t`.
    pub fn scale_at(&self, t: f64) -> f64 {
        self.scale_ramp
            .map(|ramp| ramp.factor_at(self.local_time(t)))
            .unwrap_or(1.0)
    }

    /// Place the clip on the timeline.
    pub fn placed_at(mut self, start_secs: f64) -> Self {
        self.layer_start_secs = start_secs;
        self
    }

    /// Drop fade and scale curves, keeping trim, crop, and filters.
    pub fn without_curves(mut self) -> Self {
        self.fade_in_secs = 0.0;
        self.fade_out_secs = 0.0;
        self.scale_ramp = None;
        self
    }

    /// Shorten the trim window so the clip ends exactly at `end_secs` on
    /// the timeline. Curves reaching past the new end are clamped.
    pub fn trim_to(&mut self, end_secs: f64) {
        let length = (end_secs - self.layer_start_secs).min(self.duration());
        self.out_secs = self.in_secs + length;
        self.fade_in_secs = self.fade_in_secs.min(length);
        self.fade_out_secs = self.fade_out_secs.min(length);
        if let Some(ramp) = self.scale_ramp.as_mut() {
            ramp.end_secs = ramp.end_secs.min(length);
            ramp.start_secs = ramp.start_secs.min(ramp.end_secs);
        }
    }
}
