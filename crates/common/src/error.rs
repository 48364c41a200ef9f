//! Error types shared across ReelKit crates.

use std::path::PathBuf;

/// Top-level error type for ReelKit operations.
#[derive(Debug, thiserror::Error)]
pub enum ReelError {
    #[error("No source assets found in {location}")]
    NoAssetsFound { location: String },

    #[error("Empty content: {message}")]
    EmptyContent { message: String },

    #[error("Timeline invariant violated: {message}")]
    InvariantViolation { message: String },

    #[error("Failed to decode asset {path}: {message}")]
    AssetDecode { path: PathBuf, message: String },

    #[error("Export failed: {message}")]
    Export { message: String },

    #[error("Export cancelled")]
    Cancelled,

    #[error("Export deadline exceeded after {elapsed_secs:.1}s")]
    DeadlineExceeded { elapsed_secs: f64 },

    #[error("Narration synthesis failed: {message}")]
    Synthesis { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using ReelError.
pub type ReelResult<T> = Result<T, ReelError>;

impl ReelError {
    pub fn no_assets(location: impl Into<String>) -> Self {
        Self::NoAssetsFound {
            location: location.into(),
        }
    }

    pub fn empty_content(msg: impl Into<String>) -> Self {
        Self::EmptyContent {
            message: msg.into(),
        }
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation {
            message: msg.into(),
        }
    }

    pub fn asset_decode(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::AssetDecode {
            path: path.into(),
            message: msg.into(),
        }
    }

    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export {
            message: msg.into(),
        }
    }

    pub fn synthesis(msg: impl Into<String>) -> Self {
        Self::Synthesis {
            message: msg.into(),
        }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }

    /// Whether this failure belongs to a single item of a batch.
    ///
    /// Item-scoped failures are recorded at the batch boundary and never
    /// abort sibling items. Contract violations are not item-scoped: they
    /// indicate a logic defect and terminate the composition attempt.
    pub fn is_item_scoped(&self) -> bool {
        !matches!(self, Self::InvariantViolation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invariant_violation_is_not_item_scoped() {
        assert!(!ReelError::invariant("gap at 3.0s").is_item_scoped());
        assert!(ReelError::export("ffmpeg exited with 1").is_item_scoped());
        assert!(ReelError::empty_content("no words").is_item_scoped());
        assert!(ReelError::Cancelled.is_item_scoped());
    }

    #[test]
    fn test_display_messages() {
        let err = ReelError::no_assets("StockVideos");
        assert_eq!(err.to_string(), "No source assets found in StockVideos");

        let err = ReelError::asset_decode("clip.mp4", "moov atom not found");
        assert_eq!(
            err.to_string(),
            "Failed to decode asset clip.mp4: moov atom not found"
        );
    }
}
