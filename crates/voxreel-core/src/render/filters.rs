//! FFmpeg Filter Strings
//!
//! Pure builders for the filter expressions the render plan hands to the
//! renderer. Planning never spawns ffmpeg; it only describes the work, so
//! everything here is string assembly over already-resolved numbers.

use std::path::Path;

use crate::audio::{AudioMixPlan, TrackPlan};
use crate::timeline::TransitionKind;
use crate::types::{Canvas, TimeSec};

/// Sample rate used for generated silence
pub const SILENT_AUDIO_SAMPLE_RATE: u32 = 44100;

// =============================================================================
// Video
// =============================================================================

/// Letterboxes any input onto the target canvas without distortion
pub fn scale_pad_filter(canvas: Canvas) -> String {
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1",
        w = canvas.width,
        h = canvas.height,
    )
}

/// Fade in from black over `duration` seconds at the segment start
pub fn fade_in_filter(duration: TimeSec) -> String {
    format!("fade=t=in:st=0:d={duration}:color=black")
}

/// The per-segment video filter chain: canvas normalization plus the baked
/// transition when one is configured.
pub fn segment_video_filters(
    canvas: Canvas,
    transition: TransitionKind,
    transition_duration: TimeSec,
) -> Vec<String> {
    let mut filters = vec![scale_pad_filter(canvas)];
    match transition {
        TransitionKind::None => {}
        TransitionKind::Fade | TransitionKind::FadeBlack => {
            filters.push(fade_in_filter(transition_duration));
        }
    }
    filters
}

/// lavfi source producing black frames, used for placeholder segments
pub fn black_frame_source(canvas: Canvas, duration: TimeSec) -> String {
    format!(
        "color=c=black:s={}x{}:d={}",
        canvas.width, canvas.height, duration
    )
}

/// Burns an ASS subtitle document onto the video
pub fn ass_burn_filter(path: &Path) -> String {
    format!("ass={}", path.display())
}

// =============================================================================
// Audio
// =============================================================================

/// lavfi source producing stereo silence, bounded when a duration is given.
/// Keeps concat inputs uniform when a segment has no audio of its own.
pub fn silent_audio_source(duration: Option<TimeSec>) -> String {
    match duration {
        Some(d) => format!(
            "anullsrc=channel_layout=stereo:sample_rate={SILENT_AUDIO_SAMPLE_RATE}:d={d}"
        ),
        None => format!("anullsrc=channel_layout=stereo:sample_rate={SILENT_AUDIO_SAMPLE_RATE}"),
    }
}

/// One track's processing chain: gain, trim to its window, fades inside the
/// trimmed span, then the delay onto the composition clock. Chain order
/// matters: fade offsets are relative to the trimmed source, so the delay
/// must come last.
pub fn track_filter_chain(plan: &TrackPlan) -> String {
    let mut chain = format!("volume={},atrim=0:{}", plan.volume, plan.trim);
    if let Some(fade_in) = plan.fade_in {
        chain.push_str(&format!(",afade=t=in:st=0:d={fade_in}"));
    }
    if let (Some(fade_out), Some(start)) = (plan.fade_out, plan.fade_out_start()) {
        chain.push_str(&format!(",afade=t=out:st={start}:d={fade_out}"));
    }
    let delay_ms = (plan.delay * 1000.0).floor() as u64;
    chain.push_str(&format!(",adelay={delay_ms}|{delay_ms}"));
    chain
}

/// The full `-filter_complex` mixing expression, labelling the mixed
/// output `[aout]`. Input streams are numbered from `first_input_index`
/// in voice-then-music order. Returns `None` when there is nothing to mix.
pub fn audio_mix_filter(mix: &AudioMixPlan, first_input_index: usize) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    let mut labels: Vec<&str> = Vec::new();
    let mut index = first_input_index;

    if let Some(voice) = &mix.voice {
        parts.push(format!("[{index}:a]{}[voice]", track_filter_chain(voice)));
        labels.push("[voice]");
        index += 1;
    }
    if let Some(music) = &mix.music {
        parts.push(format!("[{index}:a]{}[music]", track_filter_chain(music)));
        labels.push("[music]");
    }

    match labels.len() {
        0 => None,
        1 => {
            parts.push(format!(
                "{}apad=whole_dur={}[aout]",
                labels[0], mix.total_duration
            ));
            Some(parts.join(";"))
        }
        _ => {
            parts.push(format!(
                "{}amix=inputs={}:duration=longest,apad=whole_dur={}[aout]",
                labels.concat(),
                labels.len(),
                mix.total_duration
            ));
            Some(parts.join(";"))
        }
    }
}
