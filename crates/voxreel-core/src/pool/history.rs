//! Pool History Ledger
//!
//! Persistent record of recently selected pool media, kept so consecutive
//! runs avoid repeating the same backgrounds and tracks. The ledger is a
//! small JSON file: one list of basenames per bucket, newest last, plus a
//! `lastUpdate` stamp.

use std::collections::HashMap;
use std::fs;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::PlanResult;

/// Entries kept per image bucket
pub const DEFAULT_IMAGE_HISTORY_CAP: usize = 20;

/// Entries kept per music bucket
pub const DEFAULT_MUSIC_HISTORY_CAP: usize = 10;

/// Lock file suffix (advisory lock to prevent concurrent writers)
const HISTORY_LOCK_EXTENSION: &str = "json.lock";

// =============================================================================
// Ledger
// =============================================================================

/// Recently-used media per bucket, newest last
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PoolHistory {
    #[serde(flatten)]
    buckets: HashMap<String, Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_update: Option<DateTime<Utc>>,
}

impl PoolHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Basenames recently chosen from `bucket`, oldest first
    pub fn recent(&self, bucket: &str) -> &[String] {
        self.buckets.get(bucket).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, bucket: &str, basename: &str) -> bool {
        self.recent(bucket).iter().any(|name| name == basename)
    }

    /// Appends chosen basenames to `bucket` and evicts the oldest entries
    /// beyond `cap`, preserving recency order.
    pub fn record<I>(&mut self, bucket: &str, basenames: I, cap: usize)
    where
        I: IntoIterator<Item = String>,
    {
        let entries = self.buckets.entry(bucket.to_string()).or_default();
        entries.extend(basenames);
        if entries.len() > cap {
            let overflow = entries.len() - cap;
            entries.drain(..overflow);
        }
        self.last_update = Some(Utc::now());
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.values().all(Vec::is_empty)
    }
}

// =============================================================================
// Store
// =============================================================================

/// Loads and persists the [`PoolHistory`] ledger.
///
/// `load` never fails: a missing or corrupt ledger yields an empty one so
/// planning always proceeds. `save` failures are real errors since a silent
/// drop would defeat repetition avoidance.
pub trait HistoryStore: Send + Sync {
    fn load(&self) -> PoolHistory;
    fn save(&self, history: &PoolHistory) -> PlanResult<()>;
}

/// JSON-file-backed store with atomic writes
pub struct JsonHistoryStore {
    path: PathBuf,
}

impl JsonHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension(HISTORY_LOCK_EXTENSION)
    }

    fn with_lock<T>(
        &self,
        exclusive: bool,
        op: impl FnOnce() -> PlanResult<T>,
    ) -> PlanResult<T> {
        if let Some(parent) = self.path.parent() {
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
            warn!("failed to unlock history lock file: {}", e);
        }

        result
    }
}

impl HistoryStore for JsonHistoryStore {
    fn load(&self) -> PoolHistory {
        let result = self.with_lock(false, || {
            if !self.path.exists() {
                info!(path = %self.path.display(), "history file not found, starting fresh");
                return Ok(PoolHistory::default());
            }
            let content = fs::read_to_string(&self.path)?;
            Ok(serde_json::from_str::<PoolHistory>(&content)?)
        });

        match result {
            Ok(history) => history,
            Err(e) => {
                warn!("failed to load pool history, starting fresh: {}", e);
                PoolHistory::default()
            }
        }
    }

    /// Atomic write: temp file + rename, under the advisory lock
    fn save(&self, history: &PoolHistory) -> PlanResult<()> {
        self.with_lock(true, || {
            let content = serde_json::to_string_pretty(history)?;

            // std::fs::rename does not overwrite on Windows.
            let temp_path = self.path.with_extension("json.tmp");
            if temp_path.exists() {
                let _ = fs::remove_file(&temp_path);
            }

            let mut file = fs::File::create(&temp_path)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;

            if cfg!(windows) && self.path.exists() {
                let _ = fs::remove_file(&self.path);
            }
            fs::rename(&temp_path, &self.path)?;

            Ok(())
        })
    }
}

/// In-memory store for tests and dry runs
#[derive(Default)]
pub struct MemoryHistoryStore {
    inner: Mutex<PoolHistory>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history(history: PoolHistory) -> Self {
        Self {
            inner: Mutex::new(history),
        }
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn load(&self) -> PoolHistory {
        match self.inner.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn save(&self, history: &PoolHistory) -> PlanResult<()> {
        match self.inner.lock() {
            Ok(mut guard) => *guard = history.clone(),
            Err(poisoned) => *poisoned.into_inner() = history.clone(),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // -------------------------------------------------------------------------
    // Ledger
    // -------------------------------------------------------------------------

    #[test]
    fn test_record_appends_in_order() {
        let mut history = PoolHistory::new();
        history.record("youtube", vec!["a.jpg".to_string()], 20);
        history.record("youtube", vec!["b.jpg".to_string()], 20);
        assert_eq!(history.recent("youtube"), &["a.jpg", "b.jpg"]);
        assert!(history.contains("youtube", "a.jpg"));
        assert!(!history.contains("tiktok", "a.jpg"));
        assert!(history.last_update().is_some());
    }

    #[test]
    fn test_record_evicts_oldest_beyond_cap() {
        let mut history = PoolHistory::new();
        for i in 0..25 {
            history.record("youtube", vec![format!("img{i}.jpg")], 20);
        }
        let recent = history.recent("youtube");
        assert_eq!(recent.len(), 20);
        assert_eq!(recent.first().map(String::as_str), Some("img5.jpg"));
        assert_eq!(recent.last().map(String::as_str), Some("img24.jpg"));
    }

    #[test]
    fn test_recent_for_unknown_bucket_is_empty() {
        let history = PoolHistory::new();
        assert!(history.recent("nope").is_empty());
        assert!(history.is_empty());
    }

    #[test]
    fn test_ledger_wire_shape() {
        let mut history = PoolHistory::new();
        history.record("tiktok", vec!["clip.jpg".to_string()], 20);
        let json = serde_json::to_string(&history).unwrap();
        assert!(json.contains("\"tiktok\":[\"clip.jpg\"]"));
        assert!(json.contains("\"lastUpdate\""));

        let back: PoolHistory = serde_json::from_str(&json).unwrap();
        assert_eq!(back.recent("tiktok"), &["clip.jpg"]);
    }

    // -------------------------------------------------------------------------
    // JSON store
    // -------------------------------------------------------------------------

    #[test]
    fn test_json_store_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = JsonHistoryStore::new(dir.path().join("history.json"));

        let mut history = PoolHistory::new();
        history.record("youtube", vec!["bg.jpg".to_string()], 20);
        store.save(&history).unwrap();

        let loaded = store.load();
        assert_eq!(loaded.recent("youtube"), &["bg.jpg"]);
    }

    #[test]
    fn test_json_store_missing_file_is_fresh() {
        let dir = TempDir::new().unwrap();
        let store = JsonHistoryStore::new(dir.path().join("nope.json"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_json_store_corrupt_file_is_fresh() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "{not json").unwrap();
        let store = JsonHistoryStore::new(&path);
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_json_store_overwrites_previous() {
        let dir = TempDir::new().unwrap();
        let store = JsonHistoryStore::new(dir.path().join("history.json"));

        let mut history = PoolHistory::new();
        history.record("square", vec!["one.jpg".to_string()], 20);
        store.save(&history).unwrap();
        history.record("square", vec!["two.jpg".to_string()], 20);
        store.save(&history).unwrap();

        assert_eq!(store.load().recent("square"), &["one.jpg", "two.jpg"]);
    }

    // -------------------------------------------------------------------------
    // Memory store
    // -------------------------------------------------------------------------

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryHistoryStore::new();
        let mut history = store.load();
        assert!(history.is_empty());

        history.record("tiktok", vec!["v.jpg".to_string()], 20);
        store.save(&history).unwrap();
        assert_eq!(store.load().recent("tiktok"), &["v.jpg"]);
    }
}
