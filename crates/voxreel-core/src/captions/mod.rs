//! Subtitle System Module
//!
//! Provides subtitle functionality for voxreel including:
//! - Cue data models (Cue, WordSpan)
//! - SRT parsing and export
//! - Adaptive line wrapping, karaoke timing, and voice re-sync
//! - Style presets and ASS document generation
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Subtitle System                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  models.rs     - Data structures (Cue, WordSpan)                │
//! │  formats.rs    - SRT parsing and export                         │
//! │  compose.rs    - Wrapping, karaoke tagging, re-sync             │
//! │  style.rs      - Style presets and ASS document output          │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use voxreel_core::captions::{compose_cues, parse_srt, SubtitleStyle};
//!
//! let cues = parse_srt(&std::fs::read_to_string("narration.srt")?)?;
//! let style = SubtitleStyle::from_preset_name("bold").unwrap();
//! let set = compose_cues(&cues, &style, 1920, 2);
//! ```

mod compose;
mod formats;
mod models;
mod style;

// Re-export models
pub use models::{Cue, WordSpan};

// Re-export format functions
pub use formats::{
    export_srt, format_srt_timestamp, parse_srt, parse_srt_timestamp, ParseError,
};

// Re-export composition
pub use compose::{
    attach_words, compose_cues, cues_from_words, karaoke_words, line_char_budget, offset_cues,
    wrap_text, KaraokeWord, RenderableCue, RenderableCueSet, WrappedText, DEFAULT_MAX_LINES,
    FLOW_MAX_SPAN_MS, FLOW_MAX_WORDS, MAX_CHARS_PER_LINE, MIN_CHARS_PER_LINE,
    WORD_BOUNDARY_TOLERANCE_MS,
};

// Re-export styling
pub use style::{
    ass_document, format_ass_timestamp, AnimationStyle, Color, SubtitlePosition, SubtitleStyle,
    DEFAULT_FONT_FAMILY, DEFAULT_FONT_SIZE, DEFAULT_MARGIN_V, DEFAULT_OUTLINE_WIDTH,
    KARAOKE_SECONDARY_COLOR,
};
