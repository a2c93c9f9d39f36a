//! Subtitle Styling
//!
//! Style presets, aspect-aware scaling, and the ASS document builder that
//! maps a composed cue set onto a v4.00+ `[Script Info]` document for the
//! renderer to burn in.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::compose::{RenderableCue, RenderableCueSet};
use crate::types::{AspectRatio, Canvas, TimeMs};

/// Default subtitle font family
pub const DEFAULT_FONT_FAMILY: &str = "Arial";

/// Default subtitle font size in points
pub const DEFAULT_FONT_SIZE: u32 = 48;

/// Default outline width in pixels
pub const DEFAULT_OUTLINE_WIDTH: u32 = 2;

/// Default vertical margin in pixels
pub const DEFAULT_MARGIN_V: u32 = 50;

/// Secondary colour for not-yet-sung karaoke words (gray, so fills read
/// as the word lighting up)
pub const KARAOKE_SECONDARY_COLOR: &str = "&H00808080";

// =============================================================================
// Color
// =============================================================================

/// RGBA color value (0-255 for each component)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    /// Creates a new color from RGBA components
    pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Creates an opaque color from RGB components
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    /// White color
    pub fn white() -> Self {
        Self::rgb(255, 255, 255)
    }

    /// Black color
    pub fn black() -> Self {
        Self::rgb(0, 0, 0)
    }

    /// Yellow color (common for subtitles)
    pub fn yellow() -> Self {
        Self::rgb(255, 255, 0)
    }

    /// Parses a color description like `"white"`, `"#FF8800"`, or
    /// `"black@0.6"` (name or hex with an opacity suffix).
    ///
    /// Returns `None` for `"transparent"`. Unknown colors fall back to
    /// white rather than failing the run.
    pub fn parse(input: &str) -> Option<Self> {
        let (color_part, opacity_part) = match input.split_once('@') {
            Some((color, opacity)) => (color, Some(opacity)),
            None => (input, None),
        };
        let name = color_part.trim().to_ascii_lowercase();
        if name == "transparent" {
            return None;
        }

        let base = match name.as_str() {
            "white" => Self::white(),
            "black" => Self::black(),
            "yellow" => Self::yellow(),
            "red" => Self::rgb(255, 0, 0),
            "green" => Self::rgb(0, 255, 0),
            "blue" => Self::rgb(0, 0, 255),
            hex if hex.starts_with('#') && hex.len() == 7 && hex.is_ascii() => {
                let channel = |range| u8::from_str_radix(&hex[range], 16);
                match (channel(1..3), channel(3..5), channel(5..7)) {
                    (Ok(r), Ok(g), Ok(b)) => Self::rgb(r, g, b),
                    _ => {
                        warn!(color = input, "unrecognized color, using white");
                        Self::white()
                    }
                }
            }
            _ => {
                warn!(color = input, "unrecognized color, using white");
                Self::white()
            }
        };

        let alpha = match opacity_part.and_then(|o| o.trim().parse::<f64>().ok()) {
            Some(opacity) => {
                255 - ((1.0 - opacity.clamp(0.0, 1.0)) * 255.0).round() as u8
            }
            None => 255,
        };
        Some(Self { a: alpha, ..base })
    }

    /// Converts to ASS/SSA color format (&HAABBGGRR)
    pub fn to_ass_color(&self) -> String {
        format!(
            "&H{:02X}{:02X}{:02X}{:02X}",
            255 - self.a,
            self.b,
            self.g,
            self.r
        )
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::white()
    }
}

// =============================================================================
// Style
// =============================================================================

/// Where subtitles sit on the frame
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubtitlePosition {
    #[default]
    Bottom,
    Middle,
    Top,
}

impl SubtitlePosition {
    /// Numpad alignment value for the ASS style line
    pub fn ass_alignment(&self) -> u8 {
        match self {
            SubtitlePosition::Bottom => 2,
            SubtitlePosition::Middle => 5,
            SubtitlePosition::Top => 8,
        }
    }
}

/// How cue text animates while spoken
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnimationStyle {
    #[default]
    None,
    /// Word-by-word fill, needs word-level timing
    Karaoke,
}

/// Subtitle text style
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtitleStyle {
    /// Font family name
    pub font_family: String,
    /// Font size in points
    pub font_size: u32,
    pub bold: bool,
    pub italic: bool,
    /// Text color
    pub font_color: Color,
    /// Outline/stroke color
    pub outline_color: Color,
    /// Outline width in pixels
    pub outline_width: u32,
    /// Shadow color (None = no shadow)
    pub shadow_color: Option<Color>,
    /// Shadow offset in pixels
    pub shadow_depth: u32,
    /// Background box color (None = transparent)
    pub background: Option<Color>,
    /// Extra spacing between letters in pixels
    pub line_spacing: u32,
    /// Vertical margin in pixels, ignored for middle placement
    pub margin_v: u32,
    pub position: SubtitlePosition,
    pub animation: AnimationStyle,
}

impl Default for SubtitleStyle {
    fn default() -> Self {
        Self {
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            font_size: DEFAULT_FONT_SIZE,
            bold: false,
            italic: false,
            font_color: Color::white(),
            outline_color: Color::black(),
            outline_width: DEFAULT_OUTLINE_WIDTH,
            shadow_color: None,
            shadow_depth: 0,
            background: None,
            line_spacing: 0,
            margin_v: DEFAULT_MARGIN_V,
            position: SubtitlePosition::Bottom,
            animation: AnimationStyle::None,
        }
    }
}

impl SubtitleStyle {
    /// Plain white text with a thin outline
    pub fn classic() -> Self {
        Self::default()
    }

    /// Large bold text with a heavy outline
    pub fn bold() -> Self {
        Self {
            font_size: 56,
            bold: true,
            outline_width: 3,
            ..Default::default()
        }
    }

    /// Yellow text, slightly enlarged
    pub fn yellow() -> Self {
        Self {
            font_size: 52,
            font_color: Color::yellow(),
            ..Default::default()
        }
    }

    /// Small text with a hairline outline
    pub fn minimal() -> Self {
        Self {
            font_size: 40,
            outline_width: 1,
            ..Default::default()
        }
    }

    /// Bold text sized between classic and bold
    pub fn modern() -> Self {
        Self {
            font_size: 52,
            bold: true,
            outline_width: 3,
            ..Default::default()
        }
    }

    /// Small text on a translucent box
    pub fn cinematic() -> Self {
        Self {
            font_size: 38,
            outline_width: 1,
            background: Color::parse("black@0.7"),
            line_spacing: 5,
            ..Default::default()
        }
    }

    /// Classic text with a soft drop shadow
    pub fn shadow() -> Self {
        Self {
            shadow_color: Color::parse("black@0.6"),
            shadow_depth: 3,
            ..Default::default()
        }
    }

    /// Looks up a preset by its user-facing name
    pub fn from_preset_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "classic" => Some(Self::classic()),
            "bold" => Some(Self::bold()),
            "yellow" => Some(Self::yellow()),
            "minimal" => Some(Self::minimal()),
            "modern" => Some(Self::modern()),
            "cinematic" => Some(Self::cinematic()),
            "shadow" => Some(Self::shadow()),
            _ => None,
        }
    }

    /// Names accepted by [`SubtitleStyle::from_preset_name`]
    pub fn preset_names() -> &'static [&'static str] {
        &[
            "classic",
            "bold",
            "yellow",
            "minimal",
            "modern",
            "cinematic",
            "shadow",
        ]
    }

    /// Rescales the style for a canvas shape.
    ///
    /// Narrow canvases get a smaller font (vertical video cannot fit
    /// full-size text) and a slightly larger bottom margin. Middle
    /// placement keeps its margin untouched since ASS ignores MarginV
    /// for alignment 5.
    pub fn scaled_for(&self, aspect: AspectRatio) -> Self {
        let mut scaled = self.clone();
        scaled.font_size =
            (self.font_size as f64 * aspect_font_scale(aspect)).round() as u32;
        if self.position != SubtitlePosition::Middle {
            scaled.margin_v =
                (self.margin_v as f64 * aspect_margin_scale(aspect)).round() as u32;
        }
        scaled
    }
}

fn aspect_font_scale(aspect: AspectRatio) -> f64 {
    match aspect {
        AspectRatio::Wide => 1.0,
        AspectRatio::Vertical => 0.5,
        AspectRatio::Portrait => 0.7,
        AspectRatio::Square => 0.85,
    }
}

fn aspect_margin_scale(aspect: AspectRatio) -> f64 {
    match aspect {
        AspectRatio::Vertical => 1.2,
        _ => 1.0,
    }
}

// =============================================================================
// ASS Document
// =============================================================================

/// Formats milliseconds as an ASS timestamp (`HH:MM:SS.cc`)
pub fn format_ass_timestamp(ms: TimeMs) -> String {
    let centis = (ms % 1000) / 10;
    let total_secs = ms / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let secs = total_secs % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}.{centis:02}")
}

/// Builds a complete ASS subtitle document for a composed cue set.
///
/// Emits a single `Default` style and one `Dialogue` line per cue. Karaoke
/// cues carry `\kf` fill tags per word; wrapped lines join with `\N`.
pub fn ass_document(set: &RenderableCueSet, style: &SubtitleStyle, canvas: Canvas) -> String {
    let primary = style.font_color.to_ass_color();
    let secondary = if style.animation == AnimationStyle::Karaoke {
        KARAOKE_SECONDARY_COLOR.to_string()
    } else {
        primary.clone()
    };
    let outline = style.outline_color.to_ass_color();
    let back = style
        .background
        .as_ref()
        .or(style.shadow_color.as_ref())
        .map(Color::to_ass_color)
        .unwrap_or_else(|| "&H00000000".to_string());
    // BorderStyle 4 draws the background as a box that hugs the text
    let border_style = if style.background.is_some() { 4 } else { 1 };
    let alignment = style.position.ass_alignment();
    let margin_v = match style.position {
        SubtitlePosition::Middle => 0,
        _ => style.margin_v,
    };

    let mut doc = String::new();
    doc.push_str("[Script Info]\n");
    doc.push_str("Title: voxreel\n");
    doc.push_str("ScriptType: v4.00+\n");
    doc.push_str(&format!("PlayResX: {}\n", canvas.width));
    doc.push_str(&format!("PlayResY: {}\n\n", canvas.height));
    doc.push_str("[V4+ Styles]\n");
    doc.push_str(
        "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, \
         BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, \
         BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding\n",
    );
    doc.push_str(&format!(
        "Style: Default,{},{},{},{},{},{},{},{},0,0,100,100,{},0,{},{},{},{},0,0,{},1\n\n",
        style.font_family,
        style.font_size,
        primary,
        secondary,
        outline,
        back,
        if style.bold { -1 } else { 0 },
        if style.italic { -1 } else { 0 },
        style.line_spacing,
        border_style,
        style.outline_width,
        style.shadow_depth,
        alignment,
        margin_v,
    ));
    doc.push_str("[Events]\n");
    doc.push_str("Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\n");

    for cue in &set.cues {
        doc.push_str(&format!(
            "Dialogue: 0,{},{},Default,,0,0,0,,{}\n",
            format_ass_timestamp(cue.start_ms),
            format_ass_timestamp(cue.end_ms),
            dialogue_text(cue),
        ));
    }

    doc
}

fn dialogue_text(cue: &RenderableCue) -> String {
    match &cue.karaoke {
        Some(lines) => lines
            .iter()
            .map(|line| {
                line.iter()
                    .map(|word| format!("{{\\kf{}}}{}", word.duration_cs, word.text))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join("\\N"),
        None => cue.lines.join("\\N"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::captions::compose::{compose_cues, KaraokeWord};
    use crate::captions::models::{Cue, WordSpan};

    // -------------------------------------------------------------------------
    // Colors
    // -------------------------------------------------------------------------

    #[test]
    fn test_to_ass_color_is_abgr() {
        assert_eq!(Color::white().to_ass_color(), "&H00FFFFFF");
        assert_eq!(Color::rgb(255, 0, 0).to_ass_color(), "&H000000FF");
        assert_eq!(Color::rgba(0, 0, 0, 153).to_ass_color(), "&H66000000");
    }

    #[test]
    fn test_parse_color_named_colors() {
        assert_eq!(Color::parse("white"), Some(Color::white()));
        assert_eq!(Color::parse("Yellow"), Some(Color::yellow()));
        assert_eq!(Color::parse("blue"), Some(Color::rgb(0, 0, 255)));
    }

    #[test]
    fn test_parse_color_hex() {
        assert_eq!(Color::parse("#FF8800"), Some(Color::rgb(255, 136, 0)));
    }

    #[test]
    fn test_parse_color_opacity_suffix() {
        let shadow = Color::parse("black@0.6").unwrap();
        assert_eq!(shadow.to_ass_color(), "&H66000000");
        let box_bg = Color::parse("black@0.7").unwrap();
        assert_eq!(box_bg.to_ass_color(), "&H4D000000");
    }

    #[test]
    fn test_parse_color_transparent_is_none() {
        assert_eq!(Color::parse("transparent"), None);
    }

    #[test]
    fn test_parse_color_unknown_falls_back_to_white() {
        assert_eq!(Color::parse("chartreuse"), Some(Color::white()));
        assert_eq!(Color::parse("#12ZZ34"), Some(Color::white()));
    }

    // -------------------------------------------------------------------------
    // Presets and scaling
    // -------------------------------------------------------------------------

    #[test]
    fn test_preset_lookup() {
        for name in SubtitleStyle::preset_names() {
            assert!(SubtitleStyle::from_preset_name(name).is_some(), "{name}");
        }
        assert!(SubtitleStyle::from_preset_name("vaporwave").is_none());
        assert_eq!(
            SubtitleStyle::from_preset_name("BOLD").unwrap().font_size,
            56
        );
    }

    #[test]
    fn test_scaled_for_vertical_halves_font() {
        let scaled = SubtitleStyle::classic().scaled_for(AspectRatio::Vertical);
        assert_eq!(scaled.font_size, 24);
        assert_eq!(scaled.margin_v, 60);
    }

    #[test]
    fn test_scaled_for_square_rounds() {
        let scaled = SubtitleStyle::classic().scaled_for(AspectRatio::Square);
        assert_eq!(scaled.font_size, 41);
        assert_eq!(scaled.margin_v, DEFAULT_MARGIN_V);
    }

    #[test]
    fn test_scaled_for_middle_keeps_margin() {
        let mut style = SubtitleStyle::classic();
        style.position = SubtitlePosition::Middle;
        let scaled = style.scaled_for(AspectRatio::Vertical);
        assert_eq!(scaled.margin_v, DEFAULT_MARGIN_V);
    }

    #[test]
    fn test_wide_is_identity_scale() {
        let style = SubtitleStyle::bold();
        assert_eq!(style.scaled_for(AspectRatio::Wide), style);
    }

    // -------------------------------------------------------------------------
    // ASS document
    // -------------------------------------------------------------------------

    fn composed(cues: &[Cue], style: &SubtitleStyle) -> RenderableCueSet {
        compose_cues(cues, style, 1920, 2)
    }

    #[test]
    fn test_ass_timestamp_format() {
        assert_eq!(format_ass_timestamp(0), "00:00:00.00");
        assert_eq!(format_ass_timestamp(1500), "00:00:01.50");
        assert_eq!(format_ass_timestamp(3_723_456), "01:02:03.45");
    }

    #[test]
    fn test_ass_document_header() {
        let style = SubtitleStyle::classic();
        let set = composed(&[Cue::new(0, 1000, "hello")], &style);
        let doc = ass_document(&set, &style, Canvas::new(1920, 1080));

        assert!(doc.starts_with("[Script Info]"));
        assert!(doc.contains("PlayResX: 1920"));
        assert!(doc.contains("PlayResY: 1080"));
        assert!(doc.contains(
            "Style: Default,Arial,48,&H00FFFFFF,&H00FFFFFF,&H00000000,&H00000000,0,0,0,0,100,100,0,0,1,2,0,2,0,0,50,1"
        ));
        assert!(doc.contains("Dialogue: 0,00:00:00.00,00:00:01.00,Default,,0,0,0,,hello"));
    }

    #[test]
    fn test_ass_document_karaoke_secondary_and_tags() {
        let mut style = SubtitleStyle::classic();
        style.animation = AnimationStyle::Karaoke;
        let words = vec![
            WordSpan::new("hello", 0, 500),
            WordSpan::new("world", 500, 1000),
        ];
        let cue = Cue::new(0, 1000, "hello world").with_words(words);
        let set = composed(&[cue], &style);
        let doc = ass_document(&set, &style, Canvas::new(1920, 1080));

        assert!(doc.contains(",&H00FFFFFF,&H00808080,"));
        assert!(doc.contains("{\\kf50}hello {\\kf50}world"));
    }

    #[test]
    fn test_ass_document_middle_position_zeroes_margin() {
        let mut style = SubtitleStyle::classic();
        style.position = SubtitlePosition::Middle;
        let set = composed(&[Cue::new(0, 1000, "hi")], &style);
        let doc = ass_document(&set, &style, Canvas::new(1080, 1920));
        assert!(doc.contains(",5,0,0,0,1\n"));
    }

    #[test]
    fn test_ass_document_background_box() {
        let style = SubtitleStyle::cinematic();
        let set = composed(&[Cue::new(0, 1000, "hi")], &style);
        let doc = ass_document(&set, &style, Canvas::new(1920, 1080));
        // BackColour carries the box color, BorderStyle switches to 4
        assert!(doc.contains(",&H4D000000,0,0,0,0,100,100,5,0,4,1,0,2,0,0,50,1"));
    }

    #[test]
    fn test_ass_document_shadow_rides_back_colour() {
        let style = SubtitleStyle::shadow();
        let set = composed(&[Cue::new(0, 1000, "hi")], &style);
        let doc = ass_document(&set, &style, Canvas::new(1920, 1080));
        assert!(doc.contains(",&H66000000,0,0,0,0,100,100,0,0,1,2,3,2,0,0,50,1"));
    }

    #[test]
    fn test_wrapped_lines_join_with_ass_breaks() {
        let style = SubtitleStyle::classic();
        let text = "one two three four five six seven";
        let set = composed(&[Cue::new(0, 2000, text)], &style);
        let doc = ass_document(&set, &style, Canvas::new(1920, 1080));
        assert!(doc.contains("one two three four\\Nfive six seven"));
    }

    #[test]
    fn test_multiline_karaoke_cue() {
        let line1 = vec![KaraokeWord {
            text: "top".to_string(),
            duration_cs: 40,
        }];
        let line2 = vec![KaraokeWord {
            text: "bottom".to_string(),
            duration_cs: 60,
        }];
        let cue = RenderableCue {
            start_ms: 0,
            end_ms: 1000,
            lines: vec!["top".to_string(), "bottom".to_string()],
            karaoke: Some(vec![line1, line2]),
        };
        let set = RenderableCueSet {
            cues: vec![cue],
            truncated_cues: 0,
        };
        let doc = ass_document(&set, &SubtitleStyle::classic(), Canvas::new(1920, 1080));
        assert!(doc.contains("{\\kf40}top\\N{\\kf60}bottom"));
    }
}
