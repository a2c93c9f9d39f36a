//! Caption Data Models
//!
//! Time-coded cues in integer milliseconds, optionally carrying the per-word
//! spans produced by speech-to-text alignment.

use serde::{Deserialize, Serialize};

use crate::types::{TimeMs, TimeSec};

// =============================================================================
// Word Span
// =============================================================================

/// One word with its own time span
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordSpan {
    pub text: String,
    pub start_ms: TimeMs,
    pub end_ms: TimeMs,
}

impl WordSpan {
    pub fn new(text: impl Into<String>, start_ms: TimeMs, end_ms: TimeMs) -> Self {
        Self {
            text: text.into(),
            start_ms,
            end_ms,
        }
    }

    pub fn duration_ms(&self) -> TimeMs {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

// =============================================================================
// Cue
// =============================================================================

/// One time-coded subtitle cue.
///
/// `words` is present only when the caption source carries word timing; its
/// absence degrades karaoke composition to plain wrapped text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cue {
    pub start_ms: TimeMs,
    pub end_ms: TimeMs,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub words: Option<Vec<WordSpan>>,
}

impl Cue {
    pub fn new(start_ms: TimeMs, end_ms: TimeMs, text: impl Into<String>) -> Self {
        Self {
            start_ms,
            end_ms,
            text: text.into(),
            words: None,
        }
    }

    /// Attaches per-word timing
    pub fn with_words(mut self, words: Vec<WordSpan>) -> Self {
        self.words = Some(words);
        self
    }

    pub fn duration_ms(&self) -> TimeMs {
        self.end_ms.saturating_sub(self.start_ms)
    }

    pub fn start_sec(&self) -> TimeSec {
        self.start_ms as TimeSec / 1000.0
    }

    pub fn end_sec(&self) -> TimeSec {
        self.end_ms as TimeSec / 1000.0
    }

    /// The cue moved by `delta_ms`, words included. Shifts that would push a
    /// timestamp below zero clamp at zero.
    pub fn shifted(&self, delta_ms: i64) -> Cue {
        let shift = |ms: TimeMs| -> TimeMs { (ms as i64 + delta_ms).max(0) as TimeMs };
        Cue {
            start_ms: shift(self.start_ms),
            end_ms: shift(self.end_ms),
            text: self.text.clone(),
            words: self.words.as_ref().map(|words| {
                words
                    .iter()
                    .map(|w| WordSpan::new(w.text.clone(), shift(w.start_ms), shift(w.end_ms)))
                    .collect()
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cue_duration_and_seconds() {
        let cue = Cue::new(1500, 4000, "hello");
        assert_eq!(cue.duration_ms(), 2500);
        assert!((cue.start_sec() - 1.5).abs() < 1e-9);
        assert!((cue.end_sec() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_shift_moves_cue_and_words() {
        let cue = Cue::new(1000, 2000, "hi there")
            .with_words(vec![WordSpan::new("hi", 1000, 1400), WordSpan::new("there", 1400, 2000)]);
        let shifted = cue.shifted(500);
        assert_eq!(shifted.start_ms, 1500);
        assert_eq!(shifted.end_ms, 2500);
        let words = shifted.words.unwrap();
        assert_eq!(words[0].start_ms, 1500);
        assert_eq!(words[1].end_ms, 2500);
    }

    #[test]
    fn test_negative_shift_clamps_at_zero() {
        let cue = Cue::new(300, 900, "early");
        let shifted = cue.shifted(-500);
        assert_eq!(shifted.start_ms, 0);
        assert_eq!(shifted.end_ms, 400);
    }

    #[test]
    fn test_serde_uses_camel_case_and_skips_missing_words() {
        let cue = Cue::new(0, 1000, "x");
        let json = serde_json::to_string(&cue).unwrap();
        assert!(json.contains("\"startMs\":0"));
        assert!(json.contains("\"endMs\":1000"));
        assert!(!json.contains("words"));

        let with_words = r#"{"startMs":0,"endMs":500,"text":"a","words":[{"text":"a","startMs":0,"endMs":500}]}"#;
        let parsed: Cue = serde_json::from_str(with_words).unwrap();
        assert_eq!(parsed.words.unwrap().len(), 1);
    }

    #[test]
    fn test_word_span_duration_saturates() {
        assert_eq!(WordSpan::new("w", 500, 200).duration_ms(), 0);
    }
}
