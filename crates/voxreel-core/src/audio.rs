//! Audio Mix Planning
//!
//! Computes delay/trim/fade/volume parameters for the voice and music tracks
//! against a resolved timeline. The output is declarative; the render plan
//! assembler turns it into ffmpeg filter strings.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{PlanError, PlanResult};
use crate::timeline::{AudioConfig, AudioTrack, ResolvedTimeline, SourceDurations};
use crate::types::TimeSec;

/// Gain applied to the voice track unless the directive overrides it
pub const DEFAULT_VOICE_VOLUME: f64 = 1.0;

/// Gain applied to the music track unless the directive overrides it
pub const DEFAULT_MUSIC_VOLUME: f64 = 0.3;

/// Fade-in length for music unless the directive overrides it
pub const DEFAULT_MUSIC_FADE_IN: TimeSec = 2.0;

/// Fade-out length for music unless the directive overrides it
pub const DEFAULT_MUSIC_FADE_OUT: TimeSec = 2.0;

// =============================================================================
// Plan Records
// =============================================================================

/// Placement of one audio track in the final mix.
///
/// The source is trimmed to `trim` seconds from its beginning, faded within
/// that window, then pushed `delay` seconds into the composition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackPlan {
    pub path: PathBuf,
    /// Gain before mixing (1.0 = unchanged)
    pub volume: f64,
    /// Silence inserted before the track starts, in seconds
    pub delay: TimeSec,
    /// Length the source plays for, from its own start, in seconds
    pub trim: TimeSec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fade_in: Option<TimeSec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fade_out: Option<TimeSec>,
}

impl TrackPlan {
    /// Where the track ends on the composition clock
    pub fn end(&self) -> TimeSec {
        self.delay + self.trim
    }

    /// Offset inside the trimmed window where the fade-out begins
    pub fn fade_out_start(&self) -> Option<TimeSec> {
        self.fade_out.map(|f| (self.trim - f).max(0.0))
    }
}

/// The full audio plan for one composition
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioMixPlan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<TrackPlan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub music: Option<TrackPlan>,
    /// Length the mixed audio must pad out to, equal to total video length
    pub total_duration: TimeSec,
}

impl AudioMixPlan {
    pub fn track_count(&self) -> usize {
        self.voice.iter().count() + self.music.iter().count()
    }

    pub fn is_silent(&self) -> bool {
        self.track_count() == 0
    }

    /// True when voice and music must be mixed into one stream
    pub fn needs_mixing(&self) -> bool {
        self.track_count() == 2
    }

    /// Delta applied to subtitle cues so they stay aligned with the voice
    pub fn subtitle_offset(&self) -> TimeSec {
        self.voice.as_ref().map_or(0.0, |v| v.delay)
    }
}

// =============================================================================
// Planning
// =============================================================================

/// Plans the audio mix for a resolved timeline.
///
/// `durations` must contain the voice track's natural length (the voice trim
/// depends on it). Markers referenced by the directives were validated during
/// resolution; lookups here reuse the same table.
pub fn plan_mix(
    resolved: &ResolvedTimeline,
    audio: &AudioConfig,
    durations: &SourceDurations,
) -> PlanResult<AudioMixPlan> {
    let total = resolved.total_duration();

    let voice = match &audio.voice {
        Some(directive) => Some(plan_voice(directive, resolved, durations, total)?),
        None => None,
    };
    let music = match &audio.music {
        Some(directive) => Some(plan_music(directive, resolved, total)?),
        None => None,
    };

    Ok(AudioMixPlan {
        voice,
        music,
        total_duration: total,
    })
}

/// Voice: starts at its marker, plays its natural length but never past the
/// end of the last segment.
fn plan_voice(
    directive: &AudioTrack,
    resolved: &ResolvedTimeline,
    durations: &SourceDurations,
    total: TimeSec,
) -> PlanResult<TrackPlan> {
    let natural = durations.require(&directive.path)?;
    let delay = match directive.start_at.as_deref() {
        Some(marker) => resolved.marker_start(marker)?,
        None => 0.0,
    };
    if directive.stop_at.is_some() {
        warn!(
            path = %directive.path.display(),
            "voice stopAt is ignored; the voice track always runs to the timeline end"
        );
    }

    let trim = natural.min((total - delay).max(0.0));
    Ok(TrackPlan {
        path: directive.path.clone(),
        volume: directive.volume.unwrap_or(DEFAULT_VOICE_VOLUME),
        delay,
        trim,
        fade_in: directive.fade_in,
        fade_out: directive.fade_out,
    })
}

/// Music: plays from its start marker through the end of its stop marker's
/// segment (or the timeline end), faded within that window.
fn plan_music(
    directive: &AudioTrack,
    resolved: &ResolvedTimeline,
    total: TimeSec,
) -> PlanResult<TrackPlan> {
    let start = match directive.start_at.as_deref() {
        Some(marker) => resolved.marker_start(marker)?,
        None => 0.0,
    };
    let stop = match directive.stop_at.as_deref() {
        Some(marker) => resolved.marker_end(marker)?,
        None => total,
    };

    let window = stop - start;
    if window <= 0.0 {
        return Err(PlanError::ValidationError(format!(
            "music window is empty: stops at {stop:.2}s, before its {start:.2}s start"
        )));
    }

    Ok(TrackPlan {
        path: directive.path.clone(),
        volume: directive.volume.unwrap_or(DEFAULT_MUSIC_VOLUME),
        delay: start,
        trim: window,
        fade_in: Some(directive.fade_in.unwrap_or(DEFAULT_MUSIC_FADE_IN)),
        fade_out: Some(directive.fade_out.unwrap_or(DEFAULT_MUSIC_FADE_OUT)),
    })
}
