//! VoxReel Composition Core
//!
//! Deterministic planning engine for marker-driven video compositions.
//! Turns a declarative timeline document plus probed media durations into a
//! complete render plan: absolute segment timings, an audio mix, styled
//! subtitles, and ffmpeg-ready filter strings.

pub mod audio;
pub mod captions;
pub mod config;
pub mod media;
pub mod planner;
pub mod pool;
pub mod render;
pub mod timeline;

// Re-export common types
mod types;
pub use types::*;

mod error;
pub use error::*;
