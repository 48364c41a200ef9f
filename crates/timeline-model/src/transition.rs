//! Transitions between adjacent background clips.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Scale reached by the outgoing clip at the end of a zoom transition.
pub const ZOOM_TRANSITION_SCALE: f64 = 1.1;

/// How two adjacent clips hand off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransitionStyle {
    /// Linear fade-out / fade-in over the full requested duration.
    #[default]
    Crossfade,
    /// Crossfade at half the requested duration.
    Slide,
    /// Crossfade with the outgoing clip scaling up across its fade-out.
    Zoom,
    /// Hard cut with no overlap.
    Cut,
}

impl TransitionStyle {
    /// Fraction of the requested duration that becomes overlap.
    pub fn overlap_factor(self) -> f64 {
        match self {
            TransitionStyle::Crossfade | TransitionStyle::Zoom => 1.0,
            TransitionStyle::Slide => 0.5,
            TransitionStyle::Cut => 0.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransitionStyle::Crossfade => "crossfade",
            TransitionStyle::Slide => "slide",
            TransitionStyle::Zoom => "zoom",
            TransitionStyle::Cut => "cut",
        }
    }
}

impl fmt::Display for TransitionStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransitionStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "crossfade" => Ok(Self::Crossfade),
            "slide" => Ok(Self::Slide),
            "zoom" => Ok(Self::Zoom),
            "cut" => Ok(Self::Cut),
            other => Err(format!(
                "Unknown transition: {other}. Use: crossfade, slide, zoom, cut"
            )),
        }
    }
}

/// A requested hand-off between two consecutive segments, before clamping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitionRequest {
    pub style: TransitionStyle,
    pub duration_secs: f64,
}

impl TransitionRequest {
    pub fn new(style: TransitionStyle, duration_secs: f64) -> Self {
        Self {
            style,
            duration_secs,
        }
    }

    pub fn cut() -> Self {
        Self::new(TransitionStyle::Cut, 0.0)
    }
}

/// A resolved transition between `clips[from_clip]` and `clips[to_clip]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitionSpec {
    /// Index of the outgoing clip.
    pub from_clip: usize,
    /// Index of the incoming clip.
    pub to_clip: usize,
    pub style: TransitionStyle,
    /// Duration asked for by the caller.
    pub requested_secs: f64,
    /// Overlap actually laid out, after style scaling and clamping.
    pub overlap_secs: f64,
}

impl TransitionSpec {
    /// The request this transition was resolved from.
    pub fn request(&self) -> TransitionRequest {
        TransitionRequest::new(self.style, self.requested_secs)
    }
}
