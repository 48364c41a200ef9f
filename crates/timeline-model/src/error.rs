//! Error types for the timeline model.

use std::path::PathBuf;

/// Errors from constructing, loading, or saving model values.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Invalid trim window [{in_secs}, {out_secs}) for {path} (duration {duration_secs}s)")]
    InvalidTrim {
        path: PathBuf,
        in_secs: f64,
        out_secs: f64,
        duration_secs: f64,
    },

    #[error("Clip from {path} placed at negative time {start_secs}")]
    NegativePlacement { path: PathBuf, start_secs: f64 },

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// A breach of the timeline's structural invariants.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TimelineViolation {
    #[error("total duration must be positive and finite, got {total_secs}")]
    NonPositiveDuration { total_secs: f64 },

    #[error("timeline has no background clips")]
    EmptyBackground,

    #[error("clip {index}: {message}")]
    Clip { index: usize, message: String },

    #[error("first clip starts at {start_secs}s instead of 0")]
    FirstClipOffset { start_secs: f64 },

    #[error("clip {index} starts at {actual_secs}s, expected {expected_secs}s")]
    Placement {
        index: usize,
        expected_secs: f64,
        actual_secs: f64,
    },

    #[error("clip {index} overlaps clip {other} outside a transition window")]
    DoubleCoverage { index: usize, other: usize },

    #[error("expected {expected} transitions, found {actual}")]
    TransitionCount { expected: usize, actual: usize },

    #[error("transition {index}: {message}")]
    Transition { index: usize, message: String },

    #[error("background ends at {end_secs}s but total duration is {total_secs}s")]
    BackgroundEnd { end_secs: f64, total_secs: f64 },

    #[error("text fragments: {message}")]
    FragmentCoverage { message: String },
}
