//! Timeline Module
//!
//! The declarative composition model and its resolution into absolute
//! timings:
//! - `models.rs` - Segment/Timeline/AudioConfig value records and validation
//! - `resolve.rs` - duration resolution (probed, defaulted, derived) and
//!   cumulative start/end assignment

mod models;
mod resolve;

// Re-export models
pub use models::{
    AudioConfig, AudioTrack, Segment, SegmentKind, Timeline, TransitionKind,
    DEFAULT_TRANSITION_DURATION, MAX_TRANSITION_DURATION,
};

// Re-export resolution
pub use resolve::{
    required_probes, resolve_timeline, MarkerTable, ResolvedTimeline, ResolvedTiming,
    SourceDurations, DEFAULT_IMAGE_DURATION, DEFAULT_PLACEHOLDER_DURATION, MIN_MAIN_DURATION,
};
