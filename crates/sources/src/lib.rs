//! ReelKit Sources
//!
//! Everything the composition engine consumes from the filesystem:
//! - **Probe:** Read dimensions, duration, and frame rate with ffprobe
//! - **Footage:** Discover and measure background videos in a directory
//! - **Content:** Load narration items from JSON/JSONL and clean their text
//! - **Sampler:** Decode single frames with ffmpeg for previews

pub mod content;
pub mod footage;
pub mod probe;
pub mod sampler;

pub use content::{
    clean_text, load_content, prepare_narration_text, select_content, ContentSelection,
};
pub use footage::{find_footage, load_footage, VIDEO_EXTENSIONS};
pub use probe::{command_exists, FfprobeProber, MediaProber};
pub use sampler::FfmpegFrameSampler;
