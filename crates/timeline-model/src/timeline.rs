//! The timeline: the immutable layout of every layer of one output.
//!
//! A timeline is constructed by the composer from already-resolved inputs,
//! validated once, and then only read. Background clips tile
//! `[0, total_duration)`; neighbours overlap only inside their transition
//! window. Text fragments are contiguous and cover the same range.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::asset::MediaAsset;
use crate::clip::Clip;
use crate::error::{ModelError, TimelineViolation};
use crate::text::{FontChoice, TextFragment, TextStyle};
use crate::transition::TransitionSpec;
use crate::TIME_EPSILON;

/// The narration audio layer. Attached unclipped at time 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrationTrack {
    pub asset: Arc<MediaAsset>,
    #[serde(default)]
    pub voice: Option<String>,
}

impl NarrationTrack {
    pub fn new(asset: Arc<MediaAsset>) -> Self {
        Self { asset, voice: None }
    }

    pub fn duration(&self) -> f64 {
        self.asset.duration_secs
    }
}

/// Text layer presentation shared by all fragments.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextLayer {
    pub style: TextStyle,
    pub font: FontChoice,
    pub fragments: Vec<TextFragment>,
}

/// The aggregate root handed to the exporter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Resolved total duration in seconds.
    pub total_duration_secs: f64,
    /// Background clips in timeline order.
    pub clips: Vec<Clip>,
    /// `transitions[i]` joins `clips[i]` and `clips[i + 1]`.
    pub transitions: Vec<TransitionSpec>,
    /// Overlay text.
    #[serde(default)]
    pub text: TextLayer,
    /// Narration audio, if any.
    #[serde(default)]
    pub narration: Option<NarrationTrack>,
}

impl Timeline {
    pub fn fragments(&self) -> &[TextFragment] {
        &self.text.fragments
    }

    /// Clips placed over timeline time `t`, in layer order.
    pub fn clips_at(&self, t: f64) -> impl Iterator<Item = (usize, &Clip)> {
        self.clips
            .iter()
            .enumerate()
            .filter(move |(_, clip)| clip.covers(t))
    }

    /// The text fragment on screen at `t`.
    pub fn fragment_at(&self, t: f64) -> Option<&TextFragment> {
        self.text.fragments.iter().find(|f| f.is_active(t))
    }

    /// Check every structural invariant.
    pub fn validate(&self) -> Result<(), TimelineViolation> {
        let total = self.total_duration_secs;
        if !(total.is_finite() && total > 0.0) {
            return Err(TimelineViolation::NonPositiveDuration { total_secs: total });
        }
        self.validate_background(total)?;
        validate_fragments(&self.text.fragments, total)
    }

    fn validate_background(&self, total: f64) -> Result<(), TimelineViolation> {
        if self.clips.is_empty() {
            return Err(TimelineViolation::EmptyBackground);
        }

        for (index, clip) in self.clips.iter().enumerate() {
            clip.check_trim()
                .map_err(|e| TimelineViolation::Clip {
                    index,
                    message: e.to_string(),
                })?;
            if clip.layer_end() > total + TIME_EPSILON {
                return Err(TimelineViolation::Clip {
                    index,
                    message: format!("ends at {}s past total {}s", clip.layer_end(), total),
                });
            }
        }

        let first_start = self.clips[0].layer_start_secs;
        if first_start.abs() > TIME_EPSILON {
            return Err(TimelineViolation::FirstClipOffset {
                start_secs: first_start,
            });
        }

        let expected = self.clips.len() - 1;
        if self.transitions.len() != expected {
            return Err(TimelineViolation::TransitionCount {
                expected,
                actual: self.transitions.len(),
            });
        }

        for (index, transition) in self.transitions.iter().enumerate() {
            if transition.from_clip != index || transition.to_clip != index + 1 {
                return Err(TimelineViolation::Transition {
                    index,
                    message: format!(
                        "joins clips {} -> {} instead of {} -> {}",
                        transition.from_clip,
                        transition.to_clip,
                        index,
                        index + 1
                    ),
                });
            }

            let outgoing = &self.clips[index];
            let incoming = &self.clips[index + 1];
            let overlap = transition.overlap_secs;
            let max_overlap = outgoing.duration().min(incoming.duration());
            if !(overlap >= 0.0) || overlap > max_overlap + TIME_EPSILON {
                return Err(TimelineViolation::Transition {
                    index,
                    message: format!("overlap {overlap}s outside [0, {max_overlap}]"),
                });
            }
            if (incoming.fade_in_secs - overlap).abs() > TIME_EPSILON {
                return Err(TimelineViolation::Transition {
                    index,
                    message: format!(
                        "incoming fade-in {}s does not match overlap {overlap}s",
                        incoming.fade_in_secs
                    ),
                });
            }

            let expected_start = outgoing.layer_end() - overlap;
            if (incoming.layer_start_secs - expected_start).abs() > TIME_EPSILON {
                return Err(TimelineViolation::Placement {
                    index: index + 1,
                    expected_secs: expected_start,
                    actual_secs: incoming.layer_start_secs,
                });
            }
        }

        for index in 2..self.clips.len() {
            let earlier = &self.clips[index - 2];
            if self.clips[index].layer_start_secs < earlier.layer_end() - TIME_EPSILON {
                return Err(TimelineViolation::DoubleCoverage {
                    index,
                    other: index - 2,
                });
            }
        }

        let end = self.clips.iter().map(Clip::layer_end).fold(0.0, f64::max);
        if (end - total).abs() > TIME_EPSILON {
            return Err(TimelineViolation::BackgroundEnd {
                end_secs: end,
                total_secs: total,
            });
        }

        Ok(())
    }

    /// Save the timeline as pretty JSON.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), ModelError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ModelError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| ModelError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        std::fs::write(path, json).map_err(|e| ModelError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Load a timeline saved with [`Timeline::save_json`].
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ModelError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&json).map_err(|e| ModelError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// Fragments must be contiguous, non-empty, and exactly cover `[0, total)`.
/// An empty list means "no overlay" and is valid.
pub fn validate_fragments(fragments: &[TextFragment], total: f64) -> Result<(), TimelineViolation> {
    let (Some(first), Some(last)) = (fragments.first(), fragments.last()) else {
        return Ok(());
    };
    if first.display_start_secs != 0.0 {
        return Err(TimelineViolation::FragmentCoverage {
            message: format!("first fragment starts at {}s", first.display_start_secs),
        });
    }
    if last.display_end_secs != total {
        return Err(TimelineViolation::FragmentCoverage {
            message: format!(
                "last fragment ends at {}s, total is {}s",
                last.display_end_secs, total
            ),
        });
    }
    for (i, fragment) in fragments.iter().enumerate() {
        if fragment.index != i {
            return Err(TimelineViolation::FragmentCoverage {
                message: format!("fragment at position {i} has index {}", fragment.index),
            });
        }
        if !(fragment.display_end_secs > fragment.display_start_secs) {
            return Err(TimelineViolation::FragmentCoverage {
                message: format!("fragment {i} has empty display window"),
            });
        }
    }
    for pair in fragments.windows(2) {
        if pair[0].display_end_secs != pair[1].display_start_secs {
            return Err(TimelineViolation::FragmentCoverage {
                message: format!(
                    "fragment {} ends at {}s but fragment {} starts at {}s",
                    pair[0].index,
                    pair[0].display_end_secs,
                    pair[1].index,
                    pair[1].display_start_secs
                ),
            });
        }
    }
    Ok(())
}
