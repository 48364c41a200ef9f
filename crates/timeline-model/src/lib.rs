//! ReelKit Timeline Model
//!
//! Defines the core data contracts for composed reels:
//! - **Assets:** Immutable handles over decoded media sources
//! - **Clips:** Trimmed, placed references to assets with fade/scale curves
//!   and lazily applied frame filters
//! - **Text:** Timed on-screen fragments with styles and animations
//! - **Timeline:** The immutable aggregate handed to the exporter
//!
//! All times are in seconds. Clip-local times are measured from the
//! clip's `layer_start_secs`; source times from the asset's origin.

pub mod asset;
pub mod clip;
pub mod content;
pub mod effects;
pub mod error;
pub mod text;
pub mod timeline;
pub mod transition;

pub use asset::*;
pub use clip::*;
pub use content::*;
pub use effects::*;
pub use error::*;
pub use text::*;
pub use timeline::*;
pub use transition::*;

/// Tolerance used when comparing accumulated floating-point times.
pub const TIME_EPSILON: f64 = 1e-6;
