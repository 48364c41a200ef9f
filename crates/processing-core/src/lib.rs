//! ReelKit Processing Core: the timeline composition engine
//!
//! Turns heterogeneous, variable-duration media into one frame-accurate,
//! fixed-aspect timeline:
//! - **Aspect:** Center-crop any source to the output aspect ratio
//! - **Selector:** Pick and trim source segments (seeded randomness)
//! - **Blender:** Overlap windows and fade/scale curves between clips
//! - **Chunker:** Split narration text into readable fragments
//! - **Duration:** Resolve the authoritative total duration
//! - **Composer:** Lay out every layer and validate the result
//!
//! This crate is pure computation with no I/O. Inputs and outputs are data.

pub mod aspect;
pub mod background;
pub mod blender;
pub mod chunker;
pub mod composer;
pub mod duration;
pub mod reel;
pub mod selector;

pub use aspect::{crop, TargetFrame};
pub use background::{background_from_asset, build_background_timeline, BackgroundConfig};
pub use blender::{blend, effective_overlap, BlendedPair, LayoutCursor};
pub use chunker::{chunk, word_count};
pub use composer::{compose, compose_batch, distribute_fragments, ComposeConfig, ComposeRequest};
pub use duration::{estimate_reading_duration, resolve, DurationSource, ResolvedDuration};
pub use reel::{build_reel_batch, build_reel_timeline, window_background, ReelConfig, ReelRequest};
pub use selector::select_segment;
