//! ReelKit Render Engine
//!
//! Turns a finished [`Timeline`](reelkit_timeline_model::Timeline) into
//! pixels. The compositor evaluates single frames for previews; the
//! export module drives ffmpeg through one filter graph per timeline.
//!
//! # Pipeline Architecture
//!
//! ```text
//! clip 0 ──┐ -ss/-t trim
//!          ├── crop / scale / effects / zoom ramp / alpha fades
//! clip n ──┘         │
//!                    ├── overlay on black base at layer start
//! text fragments ────┘         │
//!                              ├── drawtext (style, fade, slide, zoom)
//! narration.wav ───────────────┘         │
//!                                        ▼
//!                                 Encode (H.264 + AAC)
//!                                        │
//!                                        ▼
//!                                    reel.mp4 (+ .srt)
//! ```

pub mod compositor;
pub mod export;
pub mod fonts;

pub use compositor::{compose_frame, frame_plan, render_frame, ClipLayer, FrameComposition, TextOverlay};
pub use export::*;
pub use fonts::resolve_font;
