//! Render Plan Assembly
//!
//! Folds the resolved timeline, the audio mix, and the composed subtitles
//! into one serializable plan: an ordered list of segment render operations
//! plus the mixing filter and the subtitle burn. The plan is the hand-off
//! artifact; executing it is the renderer's job, not ours.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::filters::{
    ass_burn_filter, audio_mix_filter, black_frame_source, segment_video_filters,
    silent_audio_source,
};
use crate::audio::AudioMixPlan;
use crate::captions::{ass_document, RenderableCueSet, SubtitleStyle};
use crate::timeline::{ResolvedTimeline, Segment, SegmentKind, Timeline};
use crate::types::{AspectRatio, Canvas, MarkerName, MediaKind, PlanId, TimeSec};

// =============================================================================
// Types
// =============================================================================

/// Where a segment's pixels come from
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RenderInput {
    /// An on-disk media file
    File { path: PathBuf },
    /// Media a content provider materializes before rendering
    Generated,
    /// A lavfi source, used for placeholder segments
    Blank { lavfi: String },
}

/// One segment's render operation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentRenderOp {
    pub index: usize,
    pub kind: SegmentKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<MarkerName>,
    pub input: RenderInput,
    pub start: TimeSec,
    pub end: TimeSec,
    pub duration: TimeSec,
    /// Loop a still image for the whole duration
    pub loop_input: bool,
    /// Drop the source's own audio
    pub mute: bool,
    /// Video filter chain, applied in order
    pub video_filters: Vec<String>,
    /// Silent-audio source fed alongside inputs that carry no usable audio,
    /// so concatenation sees a uniform stream layout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub silent_audio: Option<String>,
}

/// The composed subtitle hand-off: the cue set, its style, the rendered
/// ASS document, and where the renderer should write/burn it
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtitlePlan {
    pub style: SubtitleStyle,
    pub cues: RenderableCueSet,
    pub document: String,
    pub path: PathBuf,
    pub burn_filter: String,
}

impl SubtitlePlan {
    pub fn new(
        cues: RenderableCueSet,
        style: SubtitleStyle,
        canvas: Canvas,
        path: impl Into<PathBuf>,
    ) -> Self {
        let path = path.into();
        let document = ass_document(&cues, &style, canvas);
        let burn_filter = ass_burn_filter(&path);
        Self {
            style,
            cues,
            document,
            path,
            burn_filter,
        }
    }
}

/// The complete composition plan for one timeline
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderPlan {
    pub id: PlanId,
    pub created_at: DateTime<Utc>,
    pub aspect: AspectRatio,
    pub canvas: Canvas,
    pub total_duration: TimeSec,
    pub segments: Vec<SegmentRenderOp>,
    pub audio: AudioMixPlan,
    /// Ready filter_complex expression for the mix; `None` when the plan
    /// carries no audio tracks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitles: Option<SubtitlePlan>,
    pub warnings: Vec<String>,
}

impl RenderPlan {
    /// Audio input files in the order the mix filter numbers them
    pub fn audio_inputs(&self) -> Vec<&Path> {
        let mut inputs = Vec::new();
        if let Some(voice) = &self.audio.voice {
            inputs.push(voice.path.as_path());
        }
        if let Some(music) = &self.audio.music {
            inputs.push(music.path.as_path());
        }
        inputs
    }

    /// True when some main segment still waits for generated content
    pub fn needs_generation(&self) -> bool {
        self.segments
            .iter()
            .any(|op| op.input == RenderInput::Generated)
    }
}

// =============================================================================
// Assembly
// =============================================================================

/// Builds the render plan from already-planned parts.
///
/// `generated_main` maps segment indexes to media a content provider
/// materialized for them; durationless mains without an entry stay
/// [`RenderInput::Generated`] so the renderer knows work remains.
pub fn assemble_plan(
    timeline: &Timeline,
    resolved: &ResolvedTimeline,
    aspect: AspectRatio,
    mix: &AudioMixPlan,
    subtitles: Option<SubtitlePlan>,
    generated_main: &HashMap<usize, PathBuf>,
) -> RenderPlan {
    let canvas = aspect.canvas();
    // The mixed audio replaces segment audio; the concatenated video is
    // input 0, so audio tracks start at input index 1.
    let audio_filter = audio_mix_filter(mix, 1);

    let segments = resolved
        .timings()
        .iter()
        .map(|timing| {
            let segment = &timeline.segments[timing.index];
            let (input, loop_input, silent_audio) =
                segment_input(segment, timing.index, timing.duration, canvas, generated_main);
            let video_filters = match input {
                RenderInput::Blank { .. } => Vec::new(),
                _ => segment_video_filters(canvas, segment.transition, segment.transition_duration),
            };
            SegmentRenderOp {
                index: timing.index,
                kind: timing.kind,
                name: timing.name.clone(),
                input,
                start: timing.start,
                end: timing.end,
                duration: timing.duration,
                loop_input,
                mute: segment.mute,
                video_filters,
                silent_audio,
            }
        })
        .collect();

    RenderPlan {
        id: ulid::Ulid::new().to_string(),
        created_at: Utc::now(),
        aspect,
        canvas,
        total_duration: resolved.total_duration(),
        segments,
        audio: mix.clone(),
        audio_filter,
        subtitles,
        warnings: resolved.warnings().to_vec(),
    }
}

fn segment_input(
    segment: &Segment,
    index: usize,
    duration: TimeSec,
    canvas: Canvas,
    generated_main: &HashMap<usize, PathBuf>,
) -> (RenderInput, bool, Option<String>) {
    if segment.kind == SegmentKind::Placeholder {
        let input = RenderInput::Blank {
            lavfi: black_frame_source(canvas, duration),
        };
        return (input, false, None);
    }

    let source = segment
        .source_path
        .clone()
        .or_else(|| generated_main.get(&index).cloned());

    match source {
        Some(path) => {
            let is_image = MediaKind::from_path(&path) == Some(MediaKind::Image);
            let silent_audio = if is_image {
                // Still images carry no audio stream; generate exactly
                // enough silence to cover the looped frames
                Some(silent_audio_source(Some(duration)))
            } else if segment.mute {
                Some(silent_audio_source(None))
            } else {
                None
            };
            (RenderInput::File { path }, is_image, silent_audio)
        }
        None => (RenderInput::Generated, false, None),
    }
}

// =============================================================================
// Tests
// =============================================================================
