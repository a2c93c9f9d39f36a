//! Timeline Model Definitions
//!
//! Declarative input model for one composition: an ordered segment list plus
//! optional voice/music directives anchored to segment markers. Everything
//! here is an immutable value record; absolute timings are computed by
//! [`crate::timeline::resolve`].

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{PlanError, PlanResult};
use crate::types::{MarkerName, TimeSec};

/// Transition length applied when a segment declares a transition but no duration
pub const DEFAULT_TRANSITION_DURATION: TimeSec = 0.5;

/// Upper bound for per-segment transition length
pub const MAX_TRANSITION_DURATION: TimeSec = 3.0;

// =============================================================================
// Segment Kind
// =============================================================================

/// Role a segment plays in the composition
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    /// Regular content slice backed by a media file
    Scene,
    /// Opening slice, typically auto-muted when timeline audio is present
    Intro,
    /// Closing slice
    Outro,
    /// Narrated body; may omit its duration to fill the voice track
    Main,
    /// Black filler frame
    Placeholder,
}

impl SegmentKind {
    /// Lowercase label as written in timeline documents
    pub fn label(&self) -> &'static str {
        match self {
            SegmentKind::Scene => "scene",
            SegmentKind::Intro => "intro",
            SegmentKind::Outro => "outro",
            SegmentKind::Main => "main",
            SegmentKind::Placeholder => "placeholder",
        }
    }

    /// Kinds that cannot exist without a backing media file
    pub fn requires_source(&self) -> bool {
        matches!(
            self,
            SegmentKind::Scene | SegmentKind::Intro | SegmentKind::Outro
        )
    }
}

// =============================================================================
// Transition
// =============================================================================

/// Per-segment transition, baked into the segment's own render parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransitionKind {
    None,
    Fade,
    FadeBlack,
}

impl Default for TransitionKind {
    fn default() -> Self {
        TransitionKind::None
    }
}

// =============================================================================
// Segment
// =============================================================================

/// One ordered slice of the final composition
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    /// Segment role
    #[serde(rename = "type")]
    pub kind: SegmentKind,
    /// Backing media file; required for Scene/Intro/Outro, optional for Main
    /// (absent means the content is generated from the pool)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_path: Option<PathBuf>,
    /// Human label; doubles as the marker audio directives anchor to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<MarkerName>,
    /// Explicit duration in seconds; a Main segment may omit it to derive
    /// its duration from the audio track
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<TimeSec>,
    /// Discard the segment's own embedded audio
    #[serde(default)]
    pub mute: bool,
    /// Transition applied at the segment's start
    #[serde(default)]
    pub transition: TransitionKind,
    /// Transition length in seconds
    #[serde(default = "default_transition_duration")]
    pub transition_duration: TimeSec,
}

fn default_transition_duration() -> TimeSec {
    DEFAULT_TRANSITION_DURATION
}

impl Segment {
    /// Creates a bare segment of the given kind
    pub fn new(kind: SegmentKind) -> Self {
        Self {
            kind,
            source_path: None,
            name: None,
            duration: None,
            mute: false,
            transition: TransitionKind::default(),
            transition_duration: DEFAULT_TRANSITION_DURATION,
        }
    }

    /// Creates a scene backed by a media file
    pub fn scene(source: impl Into<PathBuf>) -> Self {
        let mut seg = Self::new(SegmentKind::Scene);
        seg.source_path = Some(source.into());
        seg
    }

    /// Creates an intro backed by a media file
    pub fn intro(source: impl Into<PathBuf>) -> Self {
        let mut seg = Self::new(SegmentKind::Intro);
        seg.source_path = Some(source.into());
        seg
    }

    /// Creates an outro backed by a media file
    pub fn outro(source: impl Into<PathBuf>) -> Self {
        let mut seg = Self::new(SegmentKind::Outro);
        seg.source_path = Some(source.into());
        seg
    }

    /// Creates a main segment with no source (content generated from pool)
    pub fn main() -> Self {
        Self::new(SegmentKind::Main)
    }

    /// Creates a black placeholder
    pub fn placeholder() -> Self {
        Self::new(SegmentKind::Placeholder)
    }

    /// Sets the marker name
    pub fn with_name(mut self, name: impl Into<MarkerName>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets an explicit duration in seconds
    pub fn with_duration(mut self, seconds: TimeSec) -> Self {
        self.duration = Some(seconds);
        self
    }

    /// Sets the backing media file
    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source_path = Some(source.into());
        self
    }

    /// Discards the segment's embedded audio
    pub fn muted(mut self) -> Self {
        self.mute = true;
        self
    }

    /// Sets the transition and its length
    pub fn with_transition(mut self, kind: TransitionKind, seconds: TimeSec) -> Self {
        self.transition = kind;
        self.transition_duration = seconds;
        self
    }
}

// =============================================================================
// Audio Directives
// =============================================================================

/// One audio track directive, placed relative to segment markers.
///
/// `start_at`/`stop_at` resolve to the start and end timestamp of the named
/// segment respectively; absence means "from the beginning" / "through the
/// end of the timeline". Volume and fades are optional; the mix planner
/// applies role defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioTrack {
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_at: Option<MarkerName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_at: Option<MarkerName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fade_in: Option<TimeSec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fade_out: Option<TimeSec>,
}

impl AudioTrack {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            start_at: None,
            stop_at: None,
            volume: None,
            fade_in: None,
            fade_out: None,
        }
    }

    /// Anchors the track start to a segment marker
    pub fn starting_at(mut self, marker: impl Into<MarkerName>) -> Self {
        self.start_at = Some(marker.into());
        self
    }

    /// Anchors the track stop to a segment marker (the segment's end)
    pub fn stopping_at(mut self, marker: impl Into<MarkerName>) -> Self {
        self.stop_at = Some(marker.into());
        self
    }

    /// Sets the track gain (1.0 = unchanged)
    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }

    /// Sets fade-in/fade-out lengths in seconds
    pub fn with_fades(mut self, fade_in: TimeSec, fade_out: TimeSec) -> Self {
        self.fade_in = Some(fade_in);
        self.fade_out = Some(fade_out);
        self
    }
}

/// Optional voice/music pair for one composition
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<AudioTrack>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub music: Option<AudioTrack>,
}

impl AudioConfig {
    pub fn is_empty(&self) -> bool {
        self.voice.is_none() && self.music.is_none()
    }
}

// =============================================================================
// Timeline
// =============================================================================

/// The full declarative input for one composition
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    pub segments: Vec<Segment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioConfig>,
}

impl Timeline {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self {
            segments,
            audio: None,
        }
    }

    pub fn with_audio(mut self, audio: AudioConfig) -> Self {
        self.audio = Some(audio);
        self
    }

    /// True when the timeline declares at least one audio track
    pub fn has_timeline_audio(&self) -> bool {
        self.audio.as_ref().is_some_and(|a| !a.is_empty())
    }

    /// Structural validation.
    ///
    /// Returns advisory warnings on success; cross-reference rules (marker
    /// lookup, derived durations) are checked during resolution where the
    /// required context exists.
    pub fn validate(&self) -> PlanResult<Vec<String>> {
        if self.segments.is_empty() {
            return Err(PlanError::EmptyTimeline);
        }

        let mut warnings = Vec::new();
        let mut derived_main: Option<usize> = None;

        for (index, segment) in self.segments.iter().enumerate() {
            if segment.kind.requires_source() && segment.source_path.is_none() {
                return Err(PlanError::MissingSource {
                    index,
                    kind: segment.kind.label().to_string(),
                });
            }

            if let Some(duration) = segment.duration {
                if !duration.is_finite() || duration < 0.0 {
                    return Err(PlanError::InvalidSegment {
                        index,
                        reason: format!("invalid duration {duration}"),
                    });
                }
            }

            if !segment.transition_duration.is_finite()
                || segment.transition_duration < 0.0
                || segment.transition_duration > MAX_TRANSITION_DURATION
            {
                return Err(PlanError::InvalidSegment {
                    index,
                    reason: format!(
                        "transition duration {} out of range 0..{}",
                        segment.transition_duration, MAX_TRANSITION_DURATION
                    ),
                });
            }

            if segment.kind == SegmentKind::Main && segment.duration.is_none() {
                if derived_main.is_some() {
                    return Err(PlanError::SecondDerivedMain { index });
                }
                derived_main = Some(index);
            }
        }

        if !self.segments.iter().any(|s| s.kind == SegmentKind::Main) {
            warnings.push(
                "timeline has no main segment; only declared segments will appear".to_string(),
            );
        }

        if let Some(audio) = &self.audio {
            if audio.is_empty() {
                warnings.push("audio config declares neither voice nor music".to_string());
            }
        }

        Ok(warnings)
    }
}
