//! Project Configuration
//!
//! Persistent per-project defaults with:
//! - Atomic file writes (temp file + rename)
//! - Schema validation with defaults
//! - Migration support for schema changes
//!
//! Storage location: {project_dir}/config.json
//!
//! These are the channel-level defaults a timeline document inherits when it
//! does not say otherwise: target aspect, audio gains and fades, subtitle
//! preset, pool locations and history caps.

use std::fs;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::captions::{AnimationStyle, SubtitleStyle, DEFAULT_MAX_LINES};
use crate::error::PlanResult;
use crate::pool::{DEFAULT_IMAGE_HISTORY_CAP, DEFAULT_MUSIC_HISTORY_CAP};
use crate::timeline::AudioConfig;
use crate::types::AspectRatio;

/// Config schema version for migration support
pub const CONFIG_VERSION: u32 = 1;

/// Config file name
pub const CONFIG_FILE: &str = "config.json";

/// Lock file name (advisory lock to prevent concurrent writers)
const CONFIG_LOCK_EXTENSION: &str = "json.lock";

// =============================================================================
// Schema
// =============================================================================

/// Project-level planning defaults
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    /// Schema version for migrations
    #[serde(default = "default_version")]
    pub version: u32,

    /// Video output defaults
    #[serde(default)]
    pub video: VideoDefaults,

    /// Audio mix defaults
    #[serde(default)]
    pub audio: AudioDefaults,

    /// Subtitle defaults
    #[serde(default)]
    pub subtitles: SubtitleDefaults,

    /// Media pool defaults
    #[serde(default)]
    pub pool: PoolDefaults,
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            video: VideoDefaults::default(),
            audio: AudioDefaults::default(),
            subtitles: SubtitleDefaults::default(),
            pool: PoolDefaults::default(),
        }
    }
}

impl ProjectConfig {
    /// Normalizes and clamps values so persisted state is always valid.
    ///
    /// Tolerant on purpose: bad values are corrected instead of rejected, so
    /// a hand-edited or stale config never blocks planning.
    pub fn normalize(&mut self) {
        self.version = CONFIG_VERSION;

        self.video.frame_rate = self.video.frame_rate.clamp(1, 120);

        self.audio.voice_volume = clamp_f64(self.audio.voice_volume, 0.5, 2.0);
        self.audio.music_volume = clamp_f64(self.audio.music_volume, 0.1, 1.0);
        self.audio.music_fade_in = clamp_f64(self.audio.music_fade_in, 0.0, 30.0);
        self.audio.music_fade_out = clamp_f64(self.audio.music_fade_out, 0.0, 30.0);

        self.subtitles.preset = normalize_enum(
            &self.subtitles.preset,
            SubtitleStyle::preset_names(),
            default_preset(),
        );
        self.subtitles.max_lines = self.subtitles.max_lines.clamp(1, 4);

        self.pool.image_history_cap = self.pool.image_history_cap.clamp(1, 100);
        self.pool.music_history_cap = self.pool.music_history_cap.clamp(1, 100);
    }
}

fn clamp_f64(value: f64, min: f64, max: f64) -> f64 {
    if !value.is_finite() {
        return min;
    }
    value.clamp(min, max)
}

fn normalize_enum(value: &str, allowed: &[&str], fallback: String) -> String {
    if allowed.iter().any(|v| v.eq_ignore_ascii_case(value)) {
        value.to_ascii_lowercase()
    } else {
        fallback
    }
}

/// Video output defaults
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoDefaults {
    /// Target aspect ratio ("16:9", "9:16", "4:5", "1:1")
    #[serde(default)]
    pub aspect: AspectRatio,

    /// Output frame rate
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,
}

impl Default for VideoDefaults {
    fn default() -> Self {
        Self {
            aspect: AspectRatio::default(),
            frame_rate: default_frame_rate(),
        }
    }
}

fn default_frame_rate() -> u32 {
    30
}

/// Audio mix defaults, applied where a directive leaves a value unset
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AudioDefaults {
    /// Voice gain (1.0 = unchanged)
    #[serde(default = "default_voice_volume")]
    pub voice_volume: f64,

    /// Music gain under the voice
    #[serde(default = "default_music_volume")]
    pub music_volume: f64,

    /// Music fade-in length in seconds
    #[serde(default = "default_music_fade_in")]
    pub music_fade_in: f64,

    /// Music fade-out length in seconds
    #[serde(default = "default_music_fade_out")]
    pub music_fade_out: f64,
}

impl Default for AudioDefaults {
    fn default() -> Self {
        Self {
            voice_volume: default_voice_volume(),
            music_volume: default_music_volume(),
            music_fade_in: default_music_fade_in(),
            music_fade_out: default_music_fade_out(),
        }
    }
}

impl AudioDefaults {
    /// Fills unset volume/fade fields on the timeline's audio directives.
    /// Explicit directive values always win.
    pub fn apply_to(&self, audio: &mut AudioConfig) {
        if let Some(voice) = &mut audio.voice {
            voice.volume.get_or_insert(self.voice_volume);
        }
        if let Some(music) = &mut audio.music {
            music.volume.get_or_insert(self.music_volume);
            music.fade_in.get_or_insert(self.music_fade_in);
            music.fade_out.get_or_insert(self.music_fade_out);
        }
    }
}

fn default_voice_volume() -> f64 {
    1.0
}

fn default_music_volume() -> f64 {
    0.35
}

fn default_music_fade_in() -> f64 {
    2.0
}

fn default_music_fade_out() -> f64 {
    3.0
}

/// Subtitle defaults
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubtitleDefaults {
    /// Style preset name (see [`SubtitleStyle::preset_names`])
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Per-word karaoke highlighting when word timing is available
    #[serde(default)]
    pub karaoke: bool,

    /// Maximum rendered lines per cue
    #[serde(default = "default_max_lines")]
    pub max_lines: usize,
}

impl Default for SubtitleDefaults {
    fn default() -> Self {
        Self {
            preset: default_preset(),
            karaoke: false,
            max_lines: default_max_lines(),
        }
    }
}

impl SubtitleDefaults {
    /// Builds the effective style for a target aspect: preset, karaoke
    /// toggle, then per-aspect font/margin scaling.
    pub fn style(&self, aspect: AspectRatio) -> SubtitleStyle {
        let mut style = SubtitleStyle::from_preset_name(&self.preset).unwrap_or_default();
        if self.karaoke {
            style.animation = AnimationStyle::Karaoke;
        }
        style.scaled_for(aspect)
    }
}

fn default_preset() -> String {
    "classic".to_string()
}

fn default_max_lines() -> usize {
    DEFAULT_MAX_LINES
}

/// Media pool defaults
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PoolDefaults {
    /// Root directory holding per-bucket image subdirectories
    #[serde(default)]
    pub images_dir: Option<PathBuf>,

    /// Root directory holding music files
    #[serde(default)]
    pub music_dir: Option<PathBuf>,

    /// History ledger location; defaults next to the pool when unset
    #[serde(default)]
    pub history_file: Option<PathBuf>,

    /// Recent-image entries kept per bucket
    #[serde(default = "default_image_history_cap")]
    pub image_history_cap: usize,

    /// Recent-music entries kept per bucket
    #[serde(default = "default_music_history_cap")]
    pub music_history_cap: usize,
}

impl Default for PoolDefaults {
    fn default() -> Self {
        Self {
            images_dir: None,
            music_dir: None,
            history_file: None,
            image_history_cap: default_image_history_cap(),
            music_history_cap: default_music_history_cap(),
        }
    }
}

fn default_image_history_cap() -> usize {
    DEFAULT_IMAGE_HISTORY_CAP
}

fn default_music_history_cap() -> usize {
    DEFAULT_MUSIC_HISTORY_CAP
}

// =============================================================================
// Manager
// =============================================================================

/// Loads, saves, and resets the project config file
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Creates a manager rooted at the given project directory
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_path: project_dir.into().join(CONFIG_FILE),
        }
    }

    /// Creates a manager over an explicit config file path
    pub fn with_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    fn lock_path(&self) -> PathBuf {
        self.config_path.with_extension(CONFIG_LOCK_EXTENSION)
    }

    fn with_lock<T>(
        &self,
        exclusive: bool,
        op: impl FnOnce() -> PlanResult<T>,
    ) -> PlanResult<T> {
        // Ensure parent directory exists so the lock file can be created.
        if let Some(parent) = self.config_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())?;

        if exclusive {
            fs2::FileExt::lock_exclusive(&lock_file)?;
        } else {
            fs2::FileExt::lock_shared(&lock_file)?;
        }

        let result = op();

        if let Err(e) = fs2::FileExt::unlock(&lock_file) {
            warn!("failed to unlock config lock file: {}", e);
        }

        result
    }

    /// Loads the config, returning defaults if the file doesn't exist or
    /// cannot be parsed
    pub fn load(&self) -> ProjectConfig {
        let result = self.with_lock(false, || {
            if !self.config_path.exists() {
                info!(path = %self.config_path.display(), "config file not found, using defaults");
                return Ok(ProjectConfig::default());
            }

            let content = fs::read_to_string(&self.config_path)?;
            let mut config = serde_json::from_str::<ProjectConfig>(&content)?;

            if config.version < CONFIG_VERSION {
                info!(
                    "migrating config from version {} to {}",
                    config.version, CONFIG_VERSION
                );
                config = self.migrate(config);
            }

            config.normalize();
            Ok(config)
        });

        match result {
            Ok(config) => config,
            Err(e) => {
                warn!("failed to load config, using defaults: {}", e);
                ProjectConfig::default()
            }
        }
    }

    /// Saves the config using an atomic write (temp file + rename)
    pub fn save(&self, config: &ProjectConfig) -> PlanResult<ProjectConfig> {
        self.with_lock(true, || {
            // Normalize before persisting.
            let mut normalized = config.clone();
            normalized.normalize();

            let content = serde_json::to_string_pretty(&normalized)?;

            // std::fs::rename does not overwrite on Windows.
            let temp_path = self.config_path.with_extension("json.tmp");
            if temp_path.exists() {
                let _ = fs::remove_file(&temp_path);
            }

            let mut file = fs::File::create(&temp_path)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;

            if cfg!(windows) && self.config_path.exists() {
                let _ = fs::remove_file(&self.config_path);
            }
            fs::rename(&temp_path, &self.config_path)?;

            info!("config saved to {:?}", self.config_path);
            Ok(normalized)
        })
    }

    /// Resets to defaults and deletes the config file
    pub fn reset(&self) -> PlanResult<ProjectConfig> {
        self.with_lock(true, || {
            if self.config_path.exists() {
                fs::remove_file(&self.config_path)?;
                info!("config file deleted");
            }
            Ok(ProjectConfig::default())
        })
    }

    /// Migrates a config from an older schema version
    fn migrate(&self, mut config: ProjectConfig) -> ProjectConfig {
        // Future migrations go here.
        config.version = CONFIG_VERSION;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::AudioTrack;
    use tempfile::TempDir;

    // -------------------------------------------------------------------------
    // Schema
    // -------------------------------------------------------------------------

    #[test]
    fn test_default_config() {
        let config = ProjectConfig::default();
        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.video.aspect, AspectRatio::Wide);
        assert_eq!(config.video.frame_rate, 30);
        assert_eq!(config.audio.voice_volume, 1.0);
        assert_eq!(config.audio.music_volume, 0.35);
        assert_eq!(config.audio.music_fade_in, 2.0);
        assert_eq!(config.audio.music_fade_out, 3.0);
        assert_eq!(config.subtitles.preset, "classic");
        assert!(!config.subtitles.karaoke);
        assert_eq!(config.subtitles.max_lines, 2);
        assert_eq!(config.pool.image_history_cap, 20);
        assert_eq!(config.pool.music_history_cap, 10);
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = ProjectConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: ProjectConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn test_partial_json_uses_defaults_for_missing() {
        let json = r#"{"version": 1, "video": {"aspect": "9:16"}}"#;
        let mut config: ProjectConfig = serde_json::from_str(json).unwrap();
        config.normalize();

        assert_eq!(config.video.aspect, AspectRatio::Vertical);
        assert_eq!(config.video.frame_rate, 30);
        assert_eq!(config.subtitles.preset, "classic");
    }

    #[test]
    fn test_normalize_clamps_values() {
        let mut config = ProjectConfig::default();
        config.audio.voice_volume = 99.0;
        config.audio.music_volume = f64::NAN;
        config.subtitles.preset = "sparkly".to_string();
        config.subtitles.max_lines = 0;
        config.pool.image_history_cap = 5000;

        config.normalize();

        assert_eq!(config.audio.voice_volume, 2.0);
        assert_eq!(config.audio.music_volume, 0.1);
        assert_eq!(config.subtitles.preset, "classic");
        assert_eq!(config.subtitles.max_lines, 1);
        assert_eq!(config.pool.image_history_cap, 100);
    }

    #[test]
    fn test_normalize_preset_is_case_insensitive() {
        let mut config = ProjectConfig::default();
        config.subtitles.preset = "Modern".to_string();
        config.normalize();
        assert_eq!(config.subtitles.preset, "modern");
    }

    // -------------------------------------------------------------------------
    // Defaults application
    // -------------------------------------------------------------------------

    #[test]
    fn test_audio_defaults_fill_unset_directive_fields() {
        let defaults = AudioDefaults::default();
        let mut audio = AudioConfig {
            voice: Some(AudioTrack::new("voice.mp3")),
            music: Some(AudioTrack::new("music.mp3").with_volume(0.5)),
        };

        defaults.apply_to(&mut audio);

        let voice = audio.voice.unwrap();
        assert_eq!(voice.volume, Some(1.0));
        let music = audio.music.unwrap();
        // Explicit directive value wins
        assert_eq!(music.volume, Some(0.5));
        assert_eq!(music.fade_in, Some(2.0));
        assert_eq!(music.fade_out, Some(3.0));
    }

    #[test]
    fn test_subtitle_defaults_build_scaled_style() {
        let defaults = SubtitleDefaults {
            preset: "modern".to_string(),
            karaoke: true,
            max_lines: 2,
        };
        let style = defaults.style(AspectRatio::Vertical);
        assert_eq!(style.animation, AnimationStyle::Karaoke);
        // modern is 52pt; the 9:16 canvas halves it
        assert_eq!(style.font_size, 26);
    }

    #[test]
    fn test_unknown_preset_falls_back_to_default_style() {
        let defaults = SubtitleDefaults {
            preset: "sparkly".to_string(),
            karaoke: false,
            max_lines: 2,
        };
        let style = defaults.style(AspectRatio::Wide);
        assert_eq!(style.font_size, SubtitleStyle::default().font_size);
    }

    // -------------------------------------------------------------------------
    // Manager
    // -------------------------------------------------------------------------

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::new(dir.path());
        assert_eq!(manager.load(), ProjectConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::new(dir.path());

        let mut config = ProjectConfig::default();
        config.video.aspect = AspectRatio::Square;
        config.subtitles.preset = "yellow".to_string();
        manager.save(&config).unwrap();

        let loaded = manager.load();
        assert_eq!(loaded.video.aspect, AspectRatio::Square);
        assert_eq!(loaded.subtitles.preset, "yellow");
    }

    #[test]
    fn test_invalid_json_returns_defaults() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "invalid json {{{").unwrap();

        let manager = ConfigManager::new(dir.path());
        assert_eq!(manager.load(), ProjectConfig::default());
    }

    #[test]
    fn test_save_normalizes_before_persisting() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::new(dir.path());

        let mut config = ProjectConfig::default();
        config.audio.music_volume = 7.0;
        let saved = manager.save(&config).unwrap();
        assert_eq!(saved.audio.music_volume, 1.0);
        assert_eq!(manager.load().audio.music_volume, 1.0);
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::new(dir.path());
        manager.save(&ProjectConfig::default()).unwrap();

        assert!(!manager.config_path().with_extension("json.tmp").exists());
        assert!(manager.config_path().exists());
    }

    #[test]
    fn test_reset_deletes_file() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::new(dir.path());
        manager.save(&ProjectConfig::default()).unwrap();
        assert!(manager.config_path().exists());

        let reset = manager.reset().unwrap();
        assert!(!manager.config_path().exists());
        assert_eq!(reset, ProjectConfig::default());
    }

    #[test]
    fn test_old_version_is_migrated() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{"version": 0, "subtitles": {"preset": "bold"}}"#,
        )
        .unwrap();

        let manager = ConfigManager::new(dir.path());
        let config = manager.load();
        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.subtitles.preset, "bold");
    }
}
