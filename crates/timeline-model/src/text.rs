//! On-screen text: fragments, styles, animations, and font selection.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::effects::{fade_in_gain, fade_out_gain};

/// Configured animation family for text fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TextAnimationKind {
    #[default]
    Fade,
    Slide,
    Zoom,
}

impl TextAnimationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TextAnimationKind::Fade => "fade",
            TextAnimationKind::Slide => "slide",
            TextAnimationKind::Zoom => "zoom",
        }
    }
}

impl fmt::Display for TextAnimationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TextAnimationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fade" => Ok(Self::Fade),
            "slide" => Ok(Self::Slide),
            "zoom" => Ok(Self::Zoom),
            other => Err(format!("Unknown animation: {other}. Use: fade, slide, zoom")),
        }
    }
}

/// Rise into place from below.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlideIn {
    pub duration_secs: f64,
    /// Starting vertical offset in output pixels.
    pub offset_px: f64,
}

/// Slow growth, capped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomGrowth {
    pub rate_per_sec: f64,
    pub max_scale: f64,
}

/// Concrete animation curves of a single fragment (fragment-local time).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TextAnimation {
    #[serde(default)]
    pub fade_in_secs: f64,
    #[serde(default)]
    pub fade_out_secs: f64,
    #[serde(default)]
    pub slide: Option<SlideIn>,
    #[serde(default)]
    pub zoom: Option<ZoomGrowth>,
}

impl TextAnimation {
    pub fn opacity_at(&self, local_secs: f64, length_secs: f64) -> f64 {
        fade_in_gain(local_secs, self.fade_in_secs)
            * fade_out_gain(local_secs, length_secs, self.fade_out_secs)
    }

    /// Downward offset from the resting position in output pixels.
    pub fn y_offset_at(&self, local_secs: f64) -> f64 {
        match self.slide {
            Some(slide) if slide.duration_secs > 0.0 && local_secs < slide.duration_secs => {
                (1.0 - local_secs / slide.duration_secs) * slide.offset_px
            }
            _ => 0.0,
        }
    }

    pub fn scale_at(&self, local_secs: f64) -> f64 {
        match self.zoom {
            Some(zoom) => (1.0 + local_secs.max(0.0) * zoom.rate_per_sec).min(zoom.max_scale),
            None => 1.0,
        }
    }
}

/// Visual style of overlay text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub font_size: u32,
    pub color: [u8; 3],
    pub stroke_color: [u8; 3],
    pub stroke_width: u32,
    /// Opacity of the dark backdrop box behind the text.
    pub backdrop_opacity: f64,
}

impl Default for TextStyle {
    fn default() -> Self {
        TextStylePreset::Modern.style()
    }
}

/// Named text styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TextStylePreset {
    #[default]
    Modern,
    Elegant,
    Bold,
    Minimal,
    Vibrant,
}

impl TextStylePreset {
    pub fn style(self) -> TextStyle {
        let (font_size, color, stroke_color, stroke_width, backdrop_opacity) = match self {
            TextStylePreset::Modern => (60, [255, 255, 255], [0, 0, 0], 3, 0.7),
            TextStylePreset::Elegant => (55, [255, 255, 255], [25, 25, 112], 2, 0.6),
            TextStylePreset::Bold => (70, [255, 255, 0], [0, 0, 0], 4, 0.8),
            TextStylePreset::Minimal => (50, [255, 255, 255], [128, 128, 128], 1, 0.5),
            TextStylePreset::Vibrant => (65, [255, 215, 0], [139, 69, 19], 3, 0.7),
        };
        TextStyle {
            font_size,
            color,
            stroke_color,
            stroke_width,
            backdrop_opacity,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TextStylePreset::Modern => "modern",
            TextStylePreset::Elegant => "elegant",
            TextStylePreset::Bold => "bold",
            TextStylePreset::Minimal => "minimal",
            TextStylePreset::Vibrant => "vibrant",
        }
    }
}

impl FromStr for TextStylePreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "modern" => Ok(Self::Modern),
            "elegant" => Ok(Self::Elegant),
            "bold" => Ok(Self::Bold),
            "minimal" => Ok(Self::Minimal),
            "vibrant" => Ok(Self::Vibrant),
            other => Err(format!(
                "Unknown text style: {other}. Use: modern, elegant, bold, minimal, vibrant"
            )),
        }
    }
}

/// Behaviour when no styled font file is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum FontFallback {
    /// Render with the renderer's built-in font and an outline.
    #[default]
    PlainOutlined,
    /// Refuse to render without a styled font.
    RequireStyled,
}

impl FromStr for FontFallback {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "plain-outlined" | "plain_outlined" => Ok(Self::PlainOutlined),
            "require-styled" | "require_styled" => Ok(Self::RequireStyled),
            other => Err(format!(
                "Unknown font fallback: {other}. Use: plain-outlined, require-styled"
            )),
        }
    }
}

/// The font the renderer will use, decided before export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FontChoice {
    Styled {
        path: PathBuf,
    },
    #[default]
    PlainOutlined,
}

/// One timed slice of on-screen text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFragment {
    /// Position in reading order.
    pub index: usize,
    pub text: String,
    pub display_start_secs: f64,
    pub display_end_secs: f64,
    #[serde(default)]
    pub animation: TextAnimation,
}

impl TextFragment {
    pub fn duration(&self) -> f64 {
        self.display_end_secs - self.display_start_secs
    }

    /// Whether the fragment is on screen at timeline time `t`.
    pub fn is_active(&self, t: f64) -> bool {
        t >= self.display_start_secs && t < self.display_end_secs
    }

    pub fn opacity_at(&self, t: f64) -> f64 {
        if !self.is_active(t) {
            return 0.0;
        }
        self.animation
            .opacity_at(t - self.display_start_secs, self.duration())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slide_offset_decays() {
        let anim = TextAnimation {
            slide: Some(SlideIn {
                duration_secs: 0.5,
                offset_px: 200.0,
            }),
            ..Default::default()
        };
        assert!((anim.y_offset_at(0.0) - 200.0).abs() < 1e-9);
        assert!((anim.y_offset_at(0.25) - 100.0).abs() < 1e-9);
        assert_eq!(anim.y_offset_at(0.6), 0.0);
    }

    #[test]
    fn test_zoom_growth_caps() {
        let anim = TextAnimation {
            zoom: Some(ZoomGrowth {
                rate_per_sec: 0.05,
                max_scale: 1.05,
            }),
            ..Default::default()
        };
        assert_eq!(anim.scale_at(0.0), 1.0);
        assert!((anim.scale_at(0.5) - 1.025).abs() < 1e-9);
        assert!((anim.scale_at(10.0) - 1.05).abs() < 1e-9);
    }

    #[test]
    fn test_fragment_activity_is_half_open() {
        let fragment = TextFragment {
            index: 0,
            text: "hello".into(),
            display_start_secs: 1.0,
            display_end_secs: 2.0,
            animation: TextAnimation::default(),
        };
        assert!(fragment.is_active(1.0));
        assert!(!fragment.is_active(2.0));
        assert_eq!(fragment.opacity_at(1.5), 1.0);
    }

    #[test]
    fn test_style_presets() {
        let bold = TextStylePreset::Bold.style();
        assert_eq!(bold.font_size, 70);
        assert_eq!(bold.color, [255, 255, 0]);
        assert_eq!(
            "vibrant".parse::<TextStylePreset>().unwrap(),
            TextStylePreset::Vibrant
        );
        assert_eq!(
            "require-styled".parse::<FontFallback>().unwrap(),
            FontFallback::RequireStyled
        );
    }
}
