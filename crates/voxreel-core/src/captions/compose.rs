//! Subtitle Composition
//!
//! Turns parsed cues into renderable ones: collapses source line breaks,
//! wraps text into a bounded number of lines using an adaptive character
//! budget, tags words with karaoke durations when word timing exists, and
//! shifts cue sets to follow a delayed voice track.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::models::{Cue, WordSpan};
use super::style::{AnimationStyle, SubtitleStyle};
use crate::types::TimeMs;

/// Hard ceiling for characters per subtitle line
pub const MAX_CHARS_PER_LINE: usize = 42;

/// Floor for the adaptive character budget
pub const MIN_CHARS_PER_LINE: usize = 18;

/// Default number of lines a cue may occupy
pub const DEFAULT_MAX_LINES: usize = 2;

/// Slack applied when matching words to a cue's time window
pub const WORD_BOUNDARY_TOLERANCE_MS: i64 = 50;

/// Word-count boundary when generating cues from raw word timing
pub const FLOW_MAX_WORDS: usize = 10;

/// Time-span boundary when generating cues from raw word timing
pub const FLOW_MAX_SPAN_MS: TimeMs = 3000;

// =============================================================================
// Character Budget
// =============================================================================

/// Characters that fit on one subtitle line for this canvas and font.
///
/// Narrow/vertical canvases use a tighter per-pixel multiplier than wide
/// ones: subtitle renderers need extra safety margin when the frame is
/// narrow. The result is clamped to
/// [`MIN_CHARS_PER_LINE`]..[`MAX_CHARS_PER_LINE`].
pub fn line_char_budget(frame_width: u32, font_size: u32) -> usize {
    let aspect = frame_width as f64 / 1920.0;
    let multiplier = if aspect < 0.7 { 0.40 } else { 0.48 };
    let budget = (frame_width as f64 / font_size.max(1) as f64) * multiplier;
    budget
        .clamp(MIN_CHARS_PER_LINE as f64, MAX_CHARS_PER_LINE as f64)
        .floor() as usize
}

// =============================================================================
// Word Packing
// =============================================================================

/// Greedily packs word lengths into lines of at most `budget` characters,
/// stopping after `max_lines`. Returns the per-line index ranges and the
/// number of words dropped past the last line. A word longer than the budget
/// sits alone on its line, unmodified.
fn pack_words(lengths: &[usize], max_lines: usize, budget: usize) -> (Vec<Range<usize>>, usize) {
    let mut ranges: Vec<Range<usize>> = Vec::new();
    let mut start = 0usize;
    let mut width = 0usize;
    let mut dropped = 0usize;

    for (i, &len) in lengths.iter().enumerate() {
        if ranges.len() == max_lines {
            dropped += 1;
            continue;
        }
        if width == 0 {
            if len > budget {
                ranges.push(i..i + 1);
            } else {
                start = i;
                width = len;
            }
        } else if width + 1 + len <= budget {
            width += 1 + len;
        } else {
            ranges.push(start..i);
            width = 0;
            if ranges.len() == max_lines {
                dropped += 1;
            } else if len > budget {
                ranges.push(i..i + 1);
            } else {
                start = i;
                width = len;
            }
        }
    }
    if width > 0 && ranges.len() < max_lines {
        ranges.push(start..lengths.len());
    }

    (ranges, dropped)
}

/// Wrapped form of one cue's text
#[derive(Clone, Debug, PartialEq)]
pub struct WrappedText {
    pub lines: Vec<String>,
    /// Words that did not fit within `max_lines`
    pub dropped_words: usize,
}

/// Collapses any existing line breaks, then wraps the text into at most
/// `max_lines` lines of `budget` characters. Overflowing words are dropped,
/// never wrapped onto an extra line.
pub fn wrap_text(text: &str, max_lines: usize, budget: usize) -> WrappedText {
    let cleaned = text.replace("\\N", " ");
    let words: Vec<&str> = cleaned.split_whitespace().collect();
    let lengths: Vec<usize> = words.iter().map(|w| w.chars().count()).collect();

    let (ranges, dropped_words) = pack_words(&lengths, max_lines, budget);
    let lines = ranges
        .into_iter()
        .map(|range| words[range].join(" "))
        .collect();

    WrappedText {
        lines,
        dropped_words,
    }
}

// =============================================================================
// Karaoke Timing
// =============================================================================

/// One word with its highlight duration, ready for ASS `\kf` emission
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KaraokeWord {
    pub text: String,
    /// Highlight duration in centiseconds
    pub duration_cs: u32,
}

/// Whether a word's span overlaps the cue's window, with
/// [`WORD_BOUNDARY_TOLERANCE_MS`] of slack on both ends
fn overlaps_window(cue: &Cue, word: &WordSpan) -> bool {
    (word.start_ms as i64) < cue.end_ms as i64 + WORD_BOUNDARY_TOLERANCE_MS
        && (word.end_ms as i64) > cue.start_ms as i64 - WORD_BOUNDARY_TOLERANCE_MS
}

/// Words overlapping the cue's window, each tagged with its display duration.
///
/// Durations come from consecutive word starts; the last word uses its own
/// span. The window match carries [`WORD_BOUNDARY_TOLERANCE_MS`] of slack on
/// both ends to avoid dropping boundary words.
pub fn karaoke_words(cue: &Cue, words: &[WordSpan]) -> Vec<KaraokeWord> {
    let matched: Vec<&WordSpan> = words.iter().filter(|w| overlaps_window(cue, w)).collect();

    matched
        .iter()
        .enumerate()
        .map(|(i, word)| {
            let duration_ms = match matched.get(i + 1) {
                Some(next) => next.start_ms as i64 - word.start_ms as i64,
                None => word.end_ms as i64 - word.start_ms as i64,
            };
            KaraokeWord {
                text: word.text.clone(),
                duration_cs: (duration_ms.max(0) as f64 / 10.0).round() as u32,
            }
        })
        .collect()
}

// =============================================================================
// Composition
// =============================================================================

/// One cue ready for the renderer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderableCue {
    pub start_ms: TimeMs,
    pub end_ms: TimeMs,
    /// Wrapped plain lines, top to bottom
    pub lines: Vec<String>,
    /// Per-line karaoke words; `None` renders as plain lines
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub karaoke: Option<Vec<Vec<KaraokeWord>>>,
}

/// The composed cue set plus its truncation count
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderableCueSet {
    pub cues: Vec<RenderableCue>,
    /// How many cues lost words to the line limit
    pub truncated_cues: usize,
}

impl RenderableCueSet {
    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }
}

/// Composes parsed cues into renderable ones.
///
/// Karaoke is attempted per cue when the style requests it and the cue
/// carries word timing; cues without words fall back to plain wrapping,
/// never an error.
pub fn compose_cues(
    cues: &[Cue],
    style: &SubtitleStyle,
    frame_width: u32,
    max_lines: usize,
) -> RenderableCueSet {
    let budget = line_char_budget(frame_width, style.font_size);
    let mut truncated_cues = 0usize;
    let mut out = Vec::with_capacity(cues.len());

    for cue in cues {
        let karaoke = if style.animation == AnimationStyle::Karaoke {
            cue.words
                .as_deref()
                .map(|words| karaoke_words(cue, words))
                .filter(|tagged| !tagged.is_empty())
        } else {
            None
        };

        let renderable = match karaoke {
            Some(tagged) => {
                let lengths: Vec<usize> =
                    tagged.iter().map(|w| w.text.chars().count()).collect();
                let (ranges, dropped) = pack_words(&lengths, max_lines, budget);
                if dropped > 0 {
                    truncated_cues += 1;
                    debug!(start_ms = cue.start_ms, dropped, "karaoke cue truncated");
                }
                let lines = ranges
                    .iter()
                    .cloned()
                    .map(|range| {
                        tagged[range]
                            .iter()
                            .map(|w| w.text.clone())
                            .collect::<Vec<_>>()
                            .join(" ")
                    })
                    .collect();
                let karaoke_lines = ranges
                    .into_iter()
                    .map(|range| tagged[range].to_vec())
                    .collect();
                RenderableCue {
                    start_ms: cue.start_ms,
                    end_ms: cue.end_ms,
                    lines,
                    karaoke: Some(karaoke_lines),
                }
            }
            None => {
                let wrapped = wrap_text(&cue.text, max_lines, budget);
                if wrapped.dropped_words > 0 {
                    truncated_cues += 1;
                    debug!(
                        start_ms = cue.start_ms,
                        dropped = wrapped.dropped_words,
                        "cue truncated to fit the line limit"
                    );
                }
                RenderableCue {
                    start_ms: cue.start_ms,
                    end_ms: cue.end_ms,
                    lines: wrapped.lines,
                    karaoke: None,
                }
            }
        };
        out.push(renderable);
    }

    if truncated_cues > 0 {
        warn!(
            truncated = truncated_cues,
            total = cues.len(),
            budget,
            "cues exceeded the line limit and were truncated"
        );
    }

    RenderableCueSet {
        cues: out,
        truncated_cues,
    }
}

// =============================================================================
// Re-synchronization
// =============================================================================

/// Shifts every cue (and its words) by `delta_ms`, keeping subtitles aligned
/// with a voice track that starts later in the composition.
pub fn offset_cues(cues: &[Cue], delta_ms: i64) -> Vec<Cue> {
    cues.iter().map(|cue| cue.shifted(delta_ms)).collect()
}

/// Joins separately-sourced word timing onto parsed cues by time window.
///
/// Each cue receives the words overlapping its span, matched with the same
/// slack as karaoke composition. Cues no word overlaps keep their plain text
/// only.
pub fn attach_words(cues: &[Cue], words: &[WordSpan]) -> Vec<Cue> {
    cues.iter()
        .map(|cue| {
            let matched: Vec<WordSpan> = words
                .iter()
                .filter(|w| overlaps_window(cue, w))
                .cloned()
                .collect();
            if matched.is_empty() {
                cue.clone()
            } else {
                cue.clone().with_words(matched)
            }
        })
        .collect()
}

// =============================================================================
// Cue Generation From Word Timing
// =============================================================================

/// Builds cues directly from raw word timing when no caption file exists.
///
/// Words are grouped into cues at [`FLOW_MAX_WORDS`] words or once the group
/// spans [`FLOW_MAX_SPAN_MS`]; each generated cue keeps its word slice so
/// karaoke composition still works downstream.
pub fn cues_from_words(words: &[WordSpan]) -> Vec<Cue> {
    let mut cues = Vec::new();
    let mut group: Vec<WordSpan> = Vec::new();

    for word in words {
        group.push(word.clone());
        let span = group
            .last()
            .map(|last| last.end_ms.saturating_sub(group[0].start_ms))
            .unwrap_or(0);
        if group.len() >= FLOW_MAX_WORDS || span >= FLOW_MAX_SPAN_MS {
            cues.push(cue_from_group(std::mem::take(&mut group)));
        }
    }
    if !group.is_empty() {
        cues.push(cue_from_group(group));
    }

    cues
}

fn cue_from_group(group: Vec<WordSpan>) -> Cue {
    let start_ms = group.first().map_or(0, |w| w.start_ms);
    let end_ms = group.last().map_or(0, |w| w.end_ms);
    let text = group
        .iter()
        .map(|w| w.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    Cue::new(start_ms, end_ms, text).with_words(group)
}
