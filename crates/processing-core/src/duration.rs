//! Duration resolution.
//!
//! Picks the authoritative total duration among competing signals:
//! measured narration length beats the reading-time estimate, and both
//! are capped. A zero-length result is an error, never an artifact.

use serde::Serialize;

use reelkit_common::error::{ReelError, ReelResult};

/// Default reading rate in words per minute.
pub const DEFAULT_WORDS_PER_MINUTE: f64 = 150.0;

/// Which signal the resolved duration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationSource {
    MeasuredAudio,
    ReadingEstimate,
}

/// A resolved total duration and where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolvedDuration {
    pub total_secs: f64,
    pub source: DurationSource,
    /// Whether the hard cap shortened the source value.
    pub capped: bool,
}

/// `word_count / words_per_second`.
pub fn estimate_reading_duration(word_count: usize, words_per_minute: f64) -> f64 {
    if !(words_per_minute > 0.0) {
        return 0.0;
    }
    word_count as f64 / (words_per_minute / 60.0)
}

/// Resolve the total duration.
///
/// A measured duration that is missing, zero, negative, or not finite is
/// treated as unavailable and the estimate is used instead.
pub fn resolve(
    measured_audio_secs: Option<f64>,
    estimated_reading_secs: f64,
    hard_cap_secs: f64,
) -> ReelResult<ResolvedDuration> {
    if !(hard_cap_secs.is_finite() && hard_cap_secs > 0.0) {
        return Err(ReelError::config(format!(
            "duration cap must be positive, got {hard_cap_secs}"
        )));
    }

    let measured = match measured_audio_secs {
        Some(secs) if secs.is_finite() && secs > 0.0 => Some(secs),
        Some(secs) => {
            tracing::warn!(
                measured_secs = secs,
                "Ignoring unusable narration duration"
            );
            None
        }
        None => None,
    };

    let (value, source) = match measured {
        Some(secs) => (secs, DurationSource::MeasuredAudio),
        None => (estimated_reading_secs, DurationSource::ReadingEstimate),
    };

    let total = value.min(hard_cap_secs);
    if !(total.is_finite() && total > 0.0) {
        return Err(ReelError::empty_content(
            "no narration audio and no words to read; total duration would be zero",
        ));
    }

    Ok(ResolvedDuration {
        total_secs: total,
        source,
        capped: value > hard_cap_secs,
    })
}
