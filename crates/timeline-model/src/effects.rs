//! Per-frame effects and animation curves.
//!
//! Frame filters are pure per-frame transforms. Clips carry them as an
//! ordered list and the renderer applies them lazily, frame by frame, so
//! no decoded buffers are held by the composer.

use std::fmt;
use std::str::FromStr;

use image::Pixel;
use serde::{Deserialize, Serialize};

use crate::asset::VideoFrame;

/// A pure per-frame pixel transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FrameFilter {
    /// Multiply every channel by `factor`, saturating at 255.
    ColorScale { factor: f64 },

    /// Darken towards the corners. The multiplier at normalized distance
    /// `d` from the center is `1 - d * strength`, clamped to `[floor, 1]`.
    Vignette { strength: f64, floor: f64 },
}

impl FrameFilter {
    /// Apply the filter in place.
    pub fn apply(&self, frame: &mut VideoFrame) {
        match *self {
            FrameFilter::ColorScale { factor } => {
                for pixel in frame.pixels_mut() {
                    pixel.apply(|c| scale_channel(c, factor));
                }
            }
            FrameFilter::Vignette { strength, floor } => {
                let cx = frame.width() as f64 / 2.0;
                let cy = frame.height() as f64 / 2.0;
                let max_dist = cx.hypot(cy).max(f64::EPSILON);
                for (x, y, pixel) in frame.enumerate_pixels_mut() {
                    let d = (x as f64 - cx).hypot(y as f64 - cy) / max_dist;
                    let mask = (1.0 - d * strength).clamp(floor, 1.0);
                    pixel.apply(|c| scale_channel(c, mask));
                }
            }
        }
    }
}

fn scale_channel(value: u8, factor: f64) -> u8 {
    (value as f64 * factor).round().clamp(0.0, 255.0) as u8
}

/// Apply an ordered filter list.
pub fn apply_filters(filters: &[FrameFilter], frame: &mut VideoFrame) {
    for filter in filters {
        filter.apply(frame);
    }
}

/// Named aesthetic looks for background footage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EffectPreset {
    Subtle,
    #[default]
    Cinematic,
    Warm,
    Cool,
}

impl EffectPreset {
    /// The ordered frame filters for this look.
    pub fn filters(self) -> Vec<FrameFilter> {
        match self {
            EffectPreset::Subtle => vec![],
            EffectPreset::Cinematic => vec![
                FrameFilter::ColorScale { factor: 0.9 },
                FrameFilter::Vignette {
                    strength: 0.3,
                    floor: 0.7,
                },
            ],
            EffectPreset::Warm => vec![FrameFilter::ColorScale { factor: 1.1 }],
            EffectPreset::Cool => vec![FrameFilter::ColorScale { factor: 0.8 }],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EffectPreset::Subtle => "subtle",
            EffectPreset::Cinematic => "cinematic",
            EffectPreset::Warm => "warm",
            EffectPreset::Cool => "cool",
        }
    }
}

impl fmt::Display for EffectPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EffectPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "subtle" => Ok(Self::Subtle),
            "cinematic" => Ok(Self::Cinematic),
            "warm" => Ok(Self::Warm),
            "cool" => Ok(Self::Cool),
            other => Err(format!(
                "Unknown effect: {other}. Use: subtle, cinematic, warm, cool"
            )),
        }
    }
}

/// A monotonic scale ramp over a clip-local window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleRamp {
    /// Clip-local start of the ramp.
    pub start_secs: f64,
    /// Clip-local end of the ramp.
    pub end_secs: f64,
    /// Scale before the ramp.
    pub from: f64,
    /// Scale after the ramp.
    pub to: f64,
}

impl ScaleRamp {
    /// Scale factor at a clip-local time.
    pub fn factor_at(&self, local_secs: f64) -> f64 {
        let span = self.end_secs - self.start_secs;
        if span <= 0.0 {
            return if local_secs >= self.end_secs {
                self.to
            } else {
                self.from
            };
        }
        let t = ((local_secs - self.start_secs) / span).clamp(0.0, 1.0);
        self.from + (self.to - self.from) * t
    }
}

/// Linear fade-in multiplier at `local` seconds for a fade of `duration`.
pub fn fade_in_gain(local_secs: f64, duration_secs: f64) -> f64 {
    if duration_secs <= 0.0 {
        return 1.0;
    }
    (local_secs / duration_secs).clamp(0.0, 1.0)
}

/// Linear fade-out multiplier at `local` seconds for a fade of `duration`
/// ending at `length`.
pub fn fade_out_gain(local_secs: f64, length_secs: f64, duration_secs: f64) -> f64 {
    if duration_secs <= 0.0 {
        return 1.0;
    }
    ((length_secs - local_secs) / duration_secs).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::solid_frame;

    #[test]
    fn test_color_scale_saturates() {
        let mut frame = solid_frame(2, 2, [100, 200, 250]);
        FrameFilter::ColorScale { factor: 1.1 }.apply(&mut frame);
        assert_eq!(frame.get_pixel(0, 0).0, [110, 220, 255]);
    }

    #[test]
    fn test_vignette_keeps_center_and_darkens_corners() {
        let mut frame = solid_frame(101, 101, [200, 200, 200]);
        FrameFilter::Vignette {
            strength: 0.3,
            floor: 0.7,
        }
        .apply(&mut frame);

        let center = frame.get_pixel(50, 50)[0];
        let corner = frame.get_pixel(0, 0)[0];
        assert!(center >= 199);
        assert!(corner < center);
        assert!(corner >= 140, "floor of 0.7 bounds darkening, got {corner}");
    }

    #[test]
    fn test_presets() {
        assert!(EffectPreset::Subtle.filters().is_empty());
        assert_eq!(EffectPreset::Cinematic.filters().len(), 2);
        assert_eq!("WARM".parse::<EffectPreset>().unwrap(), EffectPreset::Warm);
        assert!("sepia".parse::<EffectPreset>().is_err());
    }

    #[test]
    fn test_scale_ramp_is_monotonic() {
        let ramp = ScaleRamp {
            start_secs: 8.0,
            end_secs: 10.0,
            from: 1.0,
            to: 1.1,
        };
        assert_eq!(ramp.factor_at(0.0), 1.0);
        assert!((ramp.factor_at(9.0) - 1.05).abs() < 1e-9);
        assert!((ramp.factor_at(12.0) - 1.1).abs() < 1e-9);

        let mut prev = 0.0;
        for i in 0..=100 {
            let f = ramp.factor_at(i as f64 * 0.12);
            assert!(f >= prev);
            prev = f;
        }
    }

    #[test]
    fn test_fade_gains() {
        assert_eq!(fade_in_gain(0.0, 1.0), 0.0);
        assert!((fade_in_gain(0.25, 1.0) - 0.25).abs() < 1e-9);
        assert_eq!(fade_in_gain(5.0, 0.0), 1.0);
        assert!((fade_out_gain(9.5, 10.0, 1.0) - 0.5).abs() < 1e-9);
        assert_eq!(fade_out_gain(2.0, 10.0, 1.0), 1.0);
    }
}
