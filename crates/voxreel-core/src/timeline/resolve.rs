//! Timeline Resolution
//!
//! Turns a declarative [`Timeline`] into absolute per-segment timings.
//! Durations come from three places: explicit values in the document, probed
//! source durations supplied by the caller, and the derived Main duration
//! that stretches the narrated body to fill the voice track. Resolution is a
//! pure computation; all file probing happens before it (see
//! [`crate::planner`]).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{PlanError, PlanResult};
use crate::timeline::models::{SegmentKind, Timeline};
use crate::types::{MarkerName, MediaKind, TimeSec};

/// Duration assumed for still images used as intro/scene material
pub const DEFAULT_IMAGE_DURATION: TimeSec = 4.0;

/// Duration assumed for placeholder segments without an explicit value
pub const DEFAULT_PLACEHOLDER_DURATION: TimeSec = 3.0;

/// Floor for the derived Main duration when the voice track is too short
pub const MIN_MAIN_DURATION: TimeSec = 1.0;

// =============================================================================
// Probed Source Durations
// =============================================================================

/// Natural durations of source files, keyed by path.
///
/// Gathered by the orchestrating planner via the duration probe; resolution
/// itself never touches the filesystem.
#[derive(Clone, Debug, Default)]
pub struct SourceDurations {
    map: HashMap<PathBuf, TimeSec>,
}

impl SourceDurations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, seconds: TimeSec) {
        self.map.insert(path.into(), seconds);
    }

    pub fn get(&self, path: &Path) -> Option<TimeSec> {
        self.map.get(path).copied()
    }

    /// Fetches a duration planning depends on. A missing entry means the
    /// probe pass skipped a file it should not have.
    pub fn require(&self, path: &Path) -> PlanResult<TimeSec> {
        self.get(path).ok_or_else(|| {
            PlanError::Internal(format!("no probed duration for {}", path.display()))
        })
    }
}

/// Source files whose natural duration resolution will need.
///
/// Covers video/audio-backed segments without explicit durations (images use
/// [`DEFAULT_IMAGE_DURATION`] instead) and every declared audio track. The
/// planner probes exactly this list before calling [`resolve_timeline`].
pub fn required_probes(timeline: &Timeline) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = Vec::new();
    let mut push = |path: &PathBuf, paths: &mut Vec<PathBuf>| {
        if !paths.contains(path) {
            paths.push(path.clone());
        }
    };

    let has_audio = timeline.has_timeline_audio();
    for segment in &timeline.segments {
        if segment.duration.is_some() {
            continue;
        }
        if segment.kind == SegmentKind::Main && has_audio {
            // Derived duration; the source is trimmed, not probed.
            continue;
        }
        if let Some(source) = &segment.source_path {
            if !MediaKind::is_image(source) {
                push(source, &mut paths);
            }
        }
    }

    if let Some(audio) = &timeline.audio {
        if let Some(voice) = &audio.voice {
            push(&voice.path, &mut paths);
        }
        if let Some(music) = &audio.music {
            push(&music.path, &mut paths);
        }
    }

    paths
}

// =============================================================================
// Marker Table
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MarkerSlot {
    Unique(usize),
    Ambiguous,
}

/// Name → segment index association, built once per resolution.
///
/// Duplicate names are recorded as ambiguous and only surface as errors when
/// a directive actually references them.
#[derive(Clone, Debug, Default)]
pub struct MarkerTable {
    slots: HashMap<MarkerName, MarkerSlot>,
}

impl MarkerTable {
    fn build(timeline: &Timeline) -> Self {
        let mut slots = HashMap::new();
        for (index, segment) in timeline.segments.iter().enumerate() {
            if let Some(name) = &segment.name {
                slots
                    .entry(name.clone())
                    .and_modify(|slot| *slot = MarkerSlot::Ambiguous)
                    .or_insert(MarkerSlot::Unique(index));
            }
        }
        Self { slots }
    }

    /// Resolves a marker to its segment index
    pub fn lookup(&self, name: &str) -> PlanResult<usize> {
        match self.slots.get(name) {
            Some(MarkerSlot::Unique(index)) => Ok(*index),
            Some(MarkerSlot::Ambiguous) => Err(PlanError::AmbiguousMarker(name.to_string())),
            None => Err(PlanError::UnknownMarker(name.to_string())),
        }
    }
}

// =============================================================================
// Resolved Timings
// =============================================================================

/// Absolute placement of one segment on the final timeline
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedTiming {
    pub index: usize,
    pub kind: SegmentKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<MarkerName>,
    pub start: TimeSec,
    pub end: TimeSec,
    pub duration: TimeSec,
}

/// The resolved timeline: contiguous per-segment timings plus the marker
/// table consumed by the audio mix planner and subtitle composer.
#[derive(Clone, Debug)]
pub struct ResolvedTimeline {
    timings: Vec<ResolvedTiming>,
    markers: MarkerTable,
    warnings: Vec<String>,
}

impl ResolvedTimeline {
    pub fn timings(&self) -> &[ResolvedTiming] {
        &self.timings
    }

    pub fn get(&self, index: usize) -> Option<&ResolvedTiming> {
        self.timings.get(index)
    }

    pub fn len(&self) -> usize {
        self.timings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timings.is_empty()
    }

    /// End of the last segment (0 for an empty timeline)
    pub fn total_duration(&self) -> TimeSec {
        self.timings.last().map_or(0.0, |t| t.end)
    }

    /// Absolute start of the segment carrying this marker
    pub fn marker_start(&self, name: &str) -> PlanResult<TimeSec> {
        let index = self.markers.lookup(name)?;
        Ok(self.timings[index].start)
    }

    /// Absolute end of the segment carrying this marker
    pub fn marker_end(&self, name: &str) -> PlanResult<TimeSec> {
        let index = self.markers.lookup(name)?;
        Ok(self.timings[index].end)
    }

    /// Advisory warnings accumulated during validation and resolution
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// Resolves a timeline into absolute segment timings.
///
/// `durations` must cover every path listed by [`required_probes`]; the
/// caller gathers them through its duration probe. Fails on structural
/// errors, unknown/ambiguous markers, and underivable Main durations.
pub fn resolve_timeline(
    timeline: &Timeline,
    durations: &SourceDurations,
) -> PlanResult<ResolvedTimeline> {
    let mut warnings = timeline.validate()?;
    let markers = MarkerTable::build(timeline);

    // Every marker a directive references must resolve, loudly, before any
    // timing math uses it.
    if let Some(audio) = &timeline.audio {
        let referenced = [&audio.voice, &audio.music]
            .into_iter()
            .flatten()
            .flat_map(|track| [track.start_at.as_deref(), track.stop_at.as_deref()])
            .flatten();
        for name in referenced {
            markers.lookup(name)?;
        }
    }

    let has_audio = timeline.has_timeline_audio();
    let mut resolved: Vec<Option<TimeSec>> = Vec::with_capacity(timeline.segments.len());
    let mut derived_main: Option<usize> = None;

    for (index, segment) in timeline.segments.iter().enumerate() {
        let duration = match (segment.kind, segment.duration) {
            (_, Some(explicit)) => Some(explicit),
            (SegmentKind::Main, None) => {
                if has_audio {
                    derived_main = Some(index);
                    None
                } else if let Some(source) = &segment.source_path {
                    Some(source_duration(source, durations)?)
                } else {
                    return Err(PlanError::NoAudioForDerivedMain { index });
                }
            }
            (SegmentKind::Placeholder, None) => Some(DEFAULT_PLACEHOLDER_DURATION),
            (_, None) => {
                // Scene/Intro/Outro; validate() guarantees the source exists.
                let source = segment.source_path.as_ref().ok_or_else(|| {
                    PlanError::MissingSource {
                        index,
                        kind: segment.kind.label().to_string(),
                    }
                })?;
                Some(source_duration(source, durations)?)
            }
        };
        resolved.push(duration);
    }

    if let Some(main_index) = derived_main {
        let audio = timeline
            .audio
            .as_ref()
            .ok_or(PlanError::NoAudioForDerivedMain { index: main_index })?;

        let lead_path = audio
            .voice
            .as_ref()
            .map(|v| &v.path)
            .or_else(|| audio.music.as_ref().map(|m| &m.path))
            .ok_or(PlanError::NoAudioForDerivedMain { index: main_index })?;
        let lead_duration = durations.require(lead_path)?;

        let anchor_marker = audio
            .voice
            .as_ref()
            .and_then(|v| v.start_at.as_deref())
            .or_else(|| audio.music.as_ref().and_then(|m| m.start_at.as_deref()));
        let anchor_index = match anchor_marker {
            Some(name) => markers.lookup(name)?,
            None => 0,
        };

        let occupied: TimeSec = resolved
            .iter()
            .enumerate()
            .skip(anchor_index)
            .filter(|(index, _)| *index != main_index)
            .filter_map(|(_, duration)| *duration)
            .sum();

        let mut main_duration = lead_duration - occupied;
        if main_duration <= 0.0 {
            warn!(
                shortfall = occupied - lead_duration,
                "audio track shorter than the segments scheduled during it; clamping main duration"
            );
            warnings.push(format!(
                "audio track ({lead_duration:.2}s) is shorter than the {occupied:.2}s of segments scheduled during it; main clamped to {MIN_MAIN_DURATION}s"
            ));
            main_duration = MIN_MAIN_DURATION;
        }
        resolved[main_index] = Some(main_duration);
    }

    let mut timings = Vec::with_capacity(resolved.len());
    let mut cursor: TimeSec = 0.0;
    for (index, segment) in timeline.segments.iter().enumerate() {
        let duration = resolved[index].ok_or_else(|| {
            PlanError::Internal(format!("segment {index} left without a duration"))
        })?;
        let start = cursor;
        cursor += duration;
        timings.push(ResolvedTiming {
            index,
            kind: segment.kind,
            name: segment.name.clone(),
            start,
            end: cursor,
            duration,
        });
    }

    Ok(ResolvedTimeline {
        timings,
        markers,
        warnings,
    })
}

/// Duration of a visual source: probed for video, fixed default for stills
fn source_duration(source: &Path, durations: &SourceDurations) -> PlanResult<TimeSec> {
    if MediaKind::is_image(source) {
        Ok(DEFAULT_IMAGE_DURATION)
    } else {
        durations.require(source)
    }
}
