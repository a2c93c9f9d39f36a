//! Voxreel Core Type Definitions
//!
//! Fundamental aliases and value types shared across the planning engine.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// =============================================================================
// ID Types
// =============================================================================

/// Render plan unique identifier (ULID)
pub type PlanId = String;

/// Segment marker name referenced by audio directives
pub type MarkerName = String;

// =============================================================================
// Time Types
// =============================================================================

/// Time in seconds (floating point)
pub type TimeSec = f64;

/// Time in integer milliseconds, as used by subtitle cues
pub type TimeMs = u64;

// =============================================================================
// Aspect Ratio & Canvas
// =============================================================================

/// Target delivery aspect ratio.
///
/// Each ratio maps to a fixed output canvas and to the pool bucket its
/// media selections are tracked under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AspectRatio {
    /// 16:9 landscape (YouTube)
    #[serde(rename = "16:9")]
    Wide,
    /// 9:16 vertical (Shorts, TikTok)
    #[serde(rename = "9:16")]
    Vertical,
    /// 4:5 portrait (Instagram feed)
    #[serde(rename = "4:5")]
    Portrait,
    /// 1:1 square
    #[serde(rename = "1:1")]
    Square,
}

impl AspectRatio {
    /// Output canvas for this ratio
    pub fn canvas(&self) -> Canvas {
        match self {
            AspectRatio::Wide => Canvas::new(1920, 1080),
            AspectRatio::Vertical => Canvas::new(1080, 1920),
            AspectRatio::Portrait => Canvas::new(1080, 1350),
            AspectRatio::Square => Canvas::new(1080, 1080),
        }
    }

    /// Pool bucket this format draws media from and records history under
    pub fn bucket(&self) -> &'static str {
        match self {
            AspectRatio::Wide => "youtube",
            AspectRatio::Vertical => "tiktok",
            AspectRatio::Portrait => "instagram",
            AspectRatio::Square => "square",
        }
    }

    /// Ratio label as written in configs ("16:9" etc.)
    pub fn label(&self) -> &'static str {
        match self {
            AspectRatio::Wide => "16:9",
            AspectRatio::Vertical => "9:16",
            AspectRatio::Portrait => "4:5",
            AspectRatio::Square => "1:1",
        }
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        AspectRatio::Wide
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "16:9" => Ok(AspectRatio::Wide),
            "9:16" => Ok(AspectRatio::Vertical),
            "4:5" => Ok(AspectRatio::Portrait),
            "1:1" => Ok(AspectRatio::Square),
            other => Err(format!(
                "unknown aspect ratio '{other}' (expected 16:9, 9:16, 4:5 or 1:1)"
            )),
        }
    }
}

/// Canvas size in pixels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width / height ratio
    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            return 0.0;
        }
        self.width as f64 / self.height as f64
    }
}

// =============================================================================
// Media Kind
// =============================================================================

/// Recognized image file extensions (lowercase, no dot)
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];

/// Recognized video file extensions (lowercase, no dot)
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "webm", "mkv", "flv"];

/// Recognized audio file extensions (lowercase, no dot)
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a", "aac"];

/// Broad media classification by file extension
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MediaKind {
    Video,
    Image,
    Audio,
}

impl MediaKind {
    /// Classifies a path by extension. Unknown extensions return `None`.
    pub fn from_path(path: &Path) -> Option<MediaKind> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Video)
        } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Image)
        } else if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Audio)
        } else {
            None
        }
    }

    pub fn is_image(path: &Path) -> bool {
        matches!(MediaKind::from_path(path), Some(MediaKind::Image))
    }

    pub fn is_video(path: &Path) -> bool {
        matches!(MediaKind::from_path(path), Some(MediaKind::Video))
    }
}
