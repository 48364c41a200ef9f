//! ReelKit Narration
//!
//! Spoken and written companions of the text layer:
//! - **Synthesis:** Text-to-speech through an external command (Kokoro by default)
//! - **Subtitle Generation:** SRT/VTT sidecars from timeline text fragments

pub mod subtitles;
pub mod synthesis;

pub use subtitles::*;
pub use synthesis::*;
