//! Aspect normalization.
//!
//! Every source is center-cropped to the output aspect ratio and then
//! resampled to the exact output pixel size. There is no saliency
//! detection: the crop window is always centered.

use reelkit_common::error::{ReelError, ReelResult};
use reelkit_timeline_model::asset::MediaAsset;
use reelkit_timeline_model::clip::CroppedView;

/// Output frame size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetFrame {
    pub width: u32,
    pub height: u32,
}

impl TargetFrame {
    /// 1080x1920, the 9:16 vertical format.
    pub const VERTICAL_HD: TargetFrame = TargetFrame {
        width: 1080,
        height: 1920,
    };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

/// Compute the center crop of `asset` for `target`.
pub fn crop(asset: &MediaAsset, target: TargetFrame) -> ReelResult<CroppedView> {
    crop_dimensions(asset.width, asset.height, target).map_err(|e| match e {
        ReelError::InvalidInput { message } => {
            ReelError::invalid_input(format!("{}: {message}", asset.name()))
        }
        other => other,
    })
}

/// Center crop for a `width` x `height` source.
pub fn crop_dimensions(width: u32, height: u32, target: TargetFrame) -> ReelResult<CroppedView> {
    if width == 0 || height == 0 {
        return Err(ReelError::invalid_input(format!(
            "cannot crop degenerate {width}x{height} source"
        )));
    }
    if target.width == 0 || target.height == 0 {
        return Err(ReelError::invalid_input(format!(
            "cannot crop to degenerate {}x{} target",
            target.width, target.height
        )));
    }

    // Compare w/h against tw/th without floating point.
    let (w, h) = (width as u64, height as u64);
    let (tw, th) = (target.width as u64, target.height as u64);

    let (x, y, crop_w, crop_h) = if w * th > h * tw {
        // Too wide: keep full height, crop columns around the center.
        let crop_w = ((h * tw) / th).clamp(1, w);
        ((w - crop_w) / 2, 0, crop_w, h)
    } else {
        // Too tall or exact: keep full width, crop rows around the center.
        let crop_h = ((w * th) / tw).clamp(1, h);
        (0, (h - crop_h) / 2, w, crop_h)
    };

    Ok(CroppedView {
        x: x as u32,
        y: y as u32,
        width: crop_w as u32,
        height: crop_h as u32,
        output_width: target.width,
        output_height: target.height,
    })
}
