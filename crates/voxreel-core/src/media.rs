//! Media Probing Module
//!
//! Duration probing for timeline sources, backed by `ffprobe`. The planner
//! only depends on the [`SourceDurationProbe`] trait so planning stays
//! testable without spawning processes; [`StaticDurationProbe`] serves tests
//! and dry runs. The [`MainContentProvider`] strategy trait lives here too
//! since materializing main content is the other media-producing boundary.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use crate::error::{PlanError, PlanResult};
use crate::pool::{
    pool_dir_for_aspect, scan_media_dir, select_media, HistoryStore, DEFAULT_IMAGE_HISTORY_CAP,
};
use crate::timeline::SourceDurations;
use crate::types::{AspectRatio, MediaKind, TimeSec};

// =============================================================================
// Errors
// =============================================================================

/// Errors raised while probing source durations
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("source not found: {0}")]
    SourceNotFound(PathBuf),

    #[error("failed to spawn {binary} for {path}: {source}")]
    Spawn {
        binary: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("ffprobe failed for {path}: {stderr}")]
    Failed { path: PathBuf, stderr: String },

    #[error("unreadable duration for {path}: {raw:?}")]
    UnreadableDuration { path: PathBuf, raw: String },
}

// =============================================================================
// Duration Probe
// =============================================================================

/// Resolves the real duration of a media file in seconds
#[async_trait]
pub trait SourceDurationProbe: Send + Sync {
    async fn probe(&self, path: &Path) -> Result<TimeSec, ProbeError>;

    /// Probes every path into a duration map, failing on the first error
    async fn probe_all(&self, paths: &[PathBuf]) -> Result<SourceDurations, ProbeError> {
        let mut durations = SourceDurations::new();
        for path in paths {
            let duration = self.probe(path).await?;
            durations.insert(path.clone(), duration);
        }
        Ok(durations)
    }
}

/// Probe backed by the `ffprobe` binary
pub struct FfprobeDurationProbe {
    binary: String,
}

impl FfprobeDurationProbe {
    pub fn new() -> Self {
        Self {
            binary: "ffprobe".to_string(),
        }
    }

    /// Overrides the binary name, for non-PATH installs
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for FfprobeDurationProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceDurationProbe for FfprobeDurationProbe {
    async fn probe(&self, path: &Path) -> Result<TimeSec, ProbeError> {
        if !path.exists() {
            return Err(ProbeError::SourceNotFound(path.to_path_buf()));
        }

        let output = Command::new(&self.binary)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(path)
            .output()
            .await
            .map_err(|e| ProbeError::Spawn {
                binary: self.binary.clone(),
                path: path.to_path_buf(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(ProbeError::Failed {
                path: path.to_path_buf(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let raw = String::from_utf8_lossy(&output.stdout);
        let duration =
            parse_duration_output(&raw).ok_or_else(|| ProbeError::UnreadableDuration {
                path: path.to_path_buf(),
                raw: raw.trim().to_string(),
            })?;

        debug!(path = %path.display(), duration, "probed source duration");
        Ok(duration)
    }
}

/// Parses ffprobe's bare duration output (one float on its own line)
fn parse_duration_output(raw: &str) -> Option<TimeSec> {
    let duration: TimeSec = raw.trim().parse().ok()?;
    if duration.is_finite() && duration >= 0.0 {
        Some(duration)
    } else {
        None
    }
}

/// In-memory probe for tests and dry runs
#[derive(Default)]
pub struct StaticDurationProbe {
    durations: HashMap<PathBuf, TimeSec>,
}

impl StaticDurationProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: impl Into<PathBuf>, duration: TimeSec) -> Self {
        self.durations.insert(path.into(), duration);
        self
    }
}

#[async_trait]
impl SourceDurationProbe for StaticDurationProbe {
    async fn probe(&self, path: &Path) -> Result<TimeSec, ProbeError> {
        self.durations
            .get(path)
            .copied()
            .ok_or_else(|| ProbeError::SourceNotFound(path.to_path_buf()))
    }
}

// =============================================================================
// Main Content Provider
// =============================================================================

/// Strategy for materializing main-segment media when the timeline leaves
/// `sourcePath` empty. Implementations may render slideshows, invoke
/// generators, or hand back pre-built files; the planner only needs a path.
#[async_trait]
pub trait MainContentProvider: Send + Sync {
    /// Provider name for logs and plan annotations
    fn name(&self) -> &str;

    /// Produces media covering `duration` seconds and returns its path
    async fn generate(&self, duration: TimeSec) -> PlanResult<PathBuf>;
}

/// Provider that always hands back one fixed file, for tests and dry runs
pub struct StaticContentProvider {
    path: PathBuf,
}

impl StaticContentProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl MainContentProvider for StaticContentProvider {
    fn name(&self) -> &str {
        "static"
    }

    async fn generate(&self, _duration: TimeSec) -> PlanResult<PathBuf> {
        Ok(self.path.clone())
    }
}

/// Provider that picks a background video from the shared media pool,
/// recording the pick in the history ledger so consecutive runs vary.
///
/// The requested duration is advisory; the renderer loops or trims the
/// selected file to fit.
pub struct PoolContentProvider {
    pool_dir: PathBuf,
    aspect: AspectRatio,
    store: Arc<dyn HistoryStore>,
    history_cap: usize,
}

impl PoolContentProvider {
    pub fn new(
        pool_dir: impl Into<PathBuf>,
        aspect: AspectRatio,
        store: Arc<dyn HistoryStore>,
    ) -> Self {
        Self {
            pool_dir: pool_dir.into(),
            aspect,
            store,
            history_cap: DEFAULT_IMAGE_HISTORY_CAP,
        }
    }

    pub fn with_history_cap(mut self, cap: usize) -> Self {
        self.history_cap = cap;
        self
    }
}

#[async_trait]
impl MainContentProvider for PoolContentProvider {
    fn name(&self) -> &str {
        "pool"
    }

    async fn generate(&self, duration: TimeSec) -> PlanResult<PathBuf> {
        let bucket = self.aspect.bucket();
        let dir = pool_dir_for_aspect(&self.pool_dir, self.aspect)
            .ok_or_else(|| PlanError::EmptyPool(bucket.to_string()))?;
        let pool = scan_media_dir(&dir, MediaKind::Video)?;

        let mut history = self.store.load();
        let chosen = select_media(&pool, &mut history, bucket, 1, self.history_cap)?;
        self.store.save(&history)?;

        let path = chosen
            .into_iter()
            .next()
            .ok_or_else(|| PlanError::EmptyPool(bucket.to_string()))?;
        debug!(path = %path.display(), duration, "selected pool video for main content");
        Ok(path)
    }
}
