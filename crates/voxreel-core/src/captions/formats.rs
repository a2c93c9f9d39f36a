//! Caption Format Parsing and Export
//!
//! SRT (SubRip) in both directions. The consumed shape is the sequential
//! blank-line-separated block format: index line, `HH:MM:SS,mmm -->
//! HH:MM:SS,mmm`, one or more text lines. Multi-line text is preserved on
//! parse (joined with `\n`); the composer collapses it before wrapping.

use super::Cue;
use crate::types::TimeMs;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during caption parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Invalid timestamp format
    InvalidTimestamp(String),
    /// Invalid caption format
    InvalidFormat(String),
    /// Missing required data
    MissingData(String),
    /// Unexpected end of input
    UnexpectedEnd,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTimestamp(s) => write!(f, "Invalid timestamp: {}", s),
            Self::InvalidFormat(s) => write!(f, "Invalid format: {}", s),
            Self::MissingData(s) => write!(f, "Missing data: {}", s),
            Self::UnexpectedEnd => write!(f, "Unexpected end of input"),
        }
    }
}

impl std::error::Error for ParseError {}

// =============================================================================
// SRT Format
// =============================================================================

/// Parses SRT (SubRip) content into cues.
///
/// # SRT Format
///
/// ```text
/// 1
/// 00:00:01,000 --> 00:00:04,000
/// First caption text
///
/// 2
/// 00:00:05,500 --> 00:00:08,000
/// Second caption text
/// with multiple lines
/// ```
pub fn parse_srt(content: &str) -> Result<Vec<Cue>, ParseError> {
    let mut cues = Vec::new();
    let mut lines = content.lines().peekable();

    while lines.peek().is_some() {
        // Skip empty lines
        while lines.peek().is_some_and(|l| l.trim().is_empty()) {
            lines.next();
        }

        if lines.peek().is_none() {
            break;
        }

        // Sequence number; its value is not trusted
        let _seq = lines.next().ok_or(ParseError::UnexpectedEnd)?;

        // Timestamp line
        let timestamp_line = lines.next().ok_or(ParseError::UnexpectedEnd)?;
        let (start_ms, end_ms) = parse_srt_timestamp_line(timestamp_line)?;

        // Text (may be multiple lines)
        let mut text_lines = Vec::new();
        while let Some(line) = lines.peek() {
            if line.trim().is_empty() {
                break;
            }
            text_lines.push(lines.next().unwrap_or_default().to_string());
        }

        if text_lines.is_empty() {
            return Err(ParseError::MissingData("Caption text".to_string()));
        }

        cues.push(Cue::new(start_ms, end_ms, text_lines.join("\n")));
    }

    Ok(cues)
}

/// Parses an SRT timestamp line (e.g., "00:00:01,000 --> 00:00:04,000")
fn parse_srt_timestamp_line(line: &str) -> Result<(TimeMs, TimeMs), ParseError> {
    let parts: Vec<&str> = line.split("-->").collect();
    if parts.len() != 2 {
        return Err(ParseError::InvalidFormat(format!(
            "Expected 'start --> end' format: {}",
            line
        )));
    }

    let start = parse_srt_timestamp(parts[0].trim())?;
    let end = parse_srt_timestamp(parts[1].trim())?;

    Ok((start, end))
}

/// Parses an SRT timestamp (e.g., "00:01:23,456") into milliseconds
pub fn parse_srt_timestamp(ts: &str) -> Result<TimeMs, ParseError> {
    // Format: HH:MM:SS,mmm (some sources write the dot variant)
    let normalized = ts.replace(',', ".");
    let (hms, millis) = normalized
        .split_once('.')
        .ok_or_else(|| ParseError::InvalidTimestamp(ts.to_string()))?;

    let parts: Vec<&str> = hms.split(':').collect();
    if parts.len() != 3 {
        return Err(ParseError::InvalidTimestamp(ts.to_string()));
    }

    let hours: TimeMs = parts[0]
        .parse()
        .map_err(|_| ParseError::InvalidTimestamp(ts.to_string()))?;
    let minutes: TimeMs = parts[1]
        .parse()
        .map_err(|_| ParseError::InvalidTimestamp(ts.to_string()))?;
    let seconds: TimeMs = parts[2]
        .parse()
        .map_err(|_| ParseError::InvalidTimestamp(ts.to_string()))?;
    let millis: TimeMs = millis
        .parse()
        .map_err(|_| ParseError::InvalidTimestamp(ts.to_string()))?;

    Ok(((hours * 60 + minutes) * 60 + seconds) * 1000 + millis)
}

/// Exports cues to SRT format
pub fn export_srt(cues: &[Cue]) -> String {
    let mut output = String::new();

    for (index, cue) in cues.iter().enumerate() {
        // Sequence number
        output.push_str(&format!("{}\n", index + 1));

        // Timestamps
        let start = format_srt_timestamp(cue.start_ms);
        let end = format_srt_timestamp(cue.end_ms);
        output.push_str(&format!("{} --> {}\n", start, end));

        // Text
        output.push_str(&cue.text);
        output.push_str("\n\n");
    }

    output.trim_end().to_string()
}

/// Formats milliseconds as an SRT timestamp (00:00:00,000)
pub fn format_srt_timestamp(ms: TimeMs) -> String {
    let millis = ms % 1000;
    let total_secs = ms / 1000;
    let secs = total_secs % 60;
    let total_mins = total_secs / 60;
    let mins = total_mins % 60;
    let hours = total_mins / 60;

    format!("{:02}:{:02}:{:02},{:03}", hours, mins, secs, millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // SRT Parsing
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_srt_basic() {
        let srt = "1\n00:00:01,000 --> 00:00:04,000\nHello World\n\n2\n00:00:05,500 --> 00:00:08,000\nSecond caption";
        let cues = parse_srt(srt).unwrap();

        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].start_ms, 1000);
        assert_eq!(cues[0].end_ms, 4000);
        assert_eq!(cues[0].text, "Hello World");
        assert_eq!(cues[1].start_ms, 5500);
        assert_eq!(cues[1].text, "Second caption");
    }

    #[test]
    fn test_parse_srt_multiline_text() {
        let srt = "1\n00:00:01,000 --> 00:00:04,000\nLine one\nLine two";
        let cues = parse_srt(srt).unwrap();
        assert_eq!(cues[0].text, "Line one\nLine two");
    }

    #[test]
    fn test_parse_srt_crlf_and_extra_blanks() {
        let srt = "\r\n1\r\n00:00:00,250 --> 00:00:02,000\r\nWindows line endings\r\n\r\n\r\n2\r\n00:00:03,000 --> 00:00:04,000\r\nStill fine\r\n";
        let cues = parse_srt(srt).unwrap();
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].start_ms, 250);
        assert_eq!(cues[1].text, "Still fine");
    }

    #[test]
    fn test_parse_srt_hour_rollover() {
        let srt = "1\n01:02:03,456 --> 01:02:04,000\nLate cue";
        let cues = parse_srt(srt).unwrap();
        assert_eq!(cues[0].start_ms, 3_723_456);
    }

    #[test]
    fn test_parse_srt_dot_millis_variant() {
        let srt = "1\n00:00:01.500 --> 00:00:02.000\nDotted";
        let cues = parse_srt(srt).unwrap();
        assert_eq!(cues[0].start_ms, 1500);
    }

    #[test]
    fn test_parse_srt_empty_input() {
        assert!(parse_srt("").unwrap().is_empty());
        assert!(parse_srt("\n\n\n").unwrap().is_empty());
    }

    #[test]
    fn test_parse_srt_missing_text_is_error() {
        let srt = "1\n00:00:01,000 --> 00:00:04,000\n\n";
        assert!(matches!(parse_srt(srt), Err(ParseError::MissingData(_))));
    }

    #[test]
    fn test_parse_srt_bad_timestamp_is_error() {
        let srt = "1\n00:00:01,000 -> 00:00:04,000\nMissing arrow dash";
        assert!(matches!(parse_srt(srt), Err(ParseError::InvalidFormat(_))));

        let srt = "1\nnot-a-timestamp --> 00:00:04,000\nBad start";
        assert!(matches!(
            parse_srt(srt),
            Err(ParseError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_parse_srt_truncated_block_is_error() {
        let srt = "1\n";
        assert!(matches!(parse_srt(srt), Err(ParseError::UnexpectedEnd)));
    }

    // -------------------------------------------------------------------------
    // SRT Export
    // -------------------------------------------------------------------------

    #[test]
    fn test_export_srt_roundtrip() {
        let cues = vec![
            Cue::new(1000, 4000, "Hello World"),
            Cue::new(5500, 8000, "Second caption"),
        ];
        let srt = export_srt(&cues);
        assert!(srt.starts_with("1\n00:00:01,000 --> 00:00:04,000\nHello World"));

        let back = parse_srt(&srt).unwrap();
        assert_eq!(back, cues);
    }

    #[test]
    fn test_export_srt_renumbers_sequentially() {
        let cues = vec![Cue::new(0, 100, "a"), Cue::new(200, 300, "b")];
        let srt = export_srt(&cues);
        assert!(srt.contains("1\n00:00:00,000"));
        assert!(srt.contains("2\n00:00:00,200"));
    }

    // -------------------------------------------------------------------------
    // Timestamps
    // -------------------------------------------------------------------------

    #[test]
    fn test_format_srt_timestamp() {
        assert_eq!(format_srt_timestamp(0), "00:00:00,000");
        assert_eq!(format_srt_timestamp(3_723_456), "01:02:03,456");
        assert_eq!(format_srt_timestamp(59_999), "00:00:59,999");
    }

    #[test]
    fn test_parse_timestamp_rejects_short_forms() {
        assert!(parse_srt_timestamp("00:01,000").is_err());
        assert!(parse_srt_timestamp("00:00:01").is_err());
        assert!(parse_srt_timestamp("aa:bb:cc,ddd").is_err());
    }
}
