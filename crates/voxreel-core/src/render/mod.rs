//! Render Planning
//!
//! Turns the resolved composition parts into a serializable render plan.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          render                             │
//! │                                                             │
//! │  ┌───────────────────┐      ┌─────────────────────────────┐ │
//! │  │      filters      │      │            plan             │ │
//! │  │  ffmpeg filter    │◀─────│  RenderPlan assembly from   │ │
//! │  │  string builders  │      │  timeline + mix + subtitles │ │
//! │  └───────────────────┘      └─────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The plan is pure data: every filter expression, input path, and timing
//! is precomputed so a renderer can execute it without consulting the
//! planner again.

mod filters;
mod plan;

pub use filters::{
    ass_burn_filter, audio_mix_filter, black_frame_source, fade_in_filter, scale_pad_filter,
    segment_video_filters, silent_audio_source, track_filter_chain, SILENT_AUDIO_SAMPLE_RATE,
};
pub use plan::{assemble_plan, RenderInput, RenderPlan, SegmentRenderOp, SubtitlePlan};
