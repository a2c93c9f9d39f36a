//! Media Pool Module
//!
//! Random selection of background media from shared per-format pools,
//! with repetition avoidance backed by a persisted history ledger.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Media Pool                                 │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  mod.rs        - Directory scan, bucket resolution, selection   │
//! │  history.rs    - PoolHistory ledger and HistoryStore            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Selection never repeats an entry recorded in the bucket's history
//! unless the filter would leave nothing to choose from; in that case the
//! whole pool becomes eligible again rather than failing the run.

mod history;

pub use history::{
    HistoryStore, JsonHistoryStore, MemoryHistoryStore, PoolHistory,
    DEFAULT_IMAGE_HISTORY_CAP, DEFAULT_MUSIC_HISTORY_CAP,
};

use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{PlanError, PlanResult};
use crate::types::{AspectRatio, MediaKind};

/// Bucket used when no per-format pool directory exists
pub const UNIVERSAL_BUCKET: &str = "universal";

// =============================================================================
// Pool Directories
// =============================================================================

/// Resolves the pool directory for a format, falling back to the shared
/// `universal` directory when no per-format one exists.
pub fn pool_dir_for_aspect(base: &Path, aspect: AspectRatio) -> Option<PathBuf> {
    let preferred = base.join(aspect.bucket());
    if preferred.is_dir() {
        return Some(preferred);
    }
    let universal = base.join(UNIVERSAL_BUCKET);
    if universal.is_dir() {
        return Some(universal);
    }
    None
}

/// Lists media files of one kind directly inside `dir`, sorted by name
pub fn scan_media_dir(dir: &Path, kind: MediaKind) -> PlanResult<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).max_depth(1).follow_links(false) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                debug!(error = %e, "skipping unreadable entry during pool scan");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if MediaKind::from_path(entry.path()) == Some(kind) {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

// =============================================================================
// Selection
// =============================================================================

/// Picks `count` random entries from `pool`, avoiding basenames recorded in
/// the bucket's history and recording the chosen ones in their place.
///
/// A history that rules out every candidate is bypassed for this call:
/// repeating media beats having none. Requests larger than the pool return
/// the whole pool in random order. Only a pool with no entries at all is an
/// error.
pub fn select_from_pool<R: Rng + ?Sized>(
    pool: &[PathBuf],
    history: &mut PoolHistory,
    bucket: &str,
    count: usize,
    cap: usize,
    rng: &mut R,
) -> PlanResult<Vec<PathBuf>> {
    if pool.is_empty() {
        return Err(PlanError::EmptyPool(bucket.to_string()));
    }

    let fresh: Vec<PathBuf> = pool
        .iter()
        .filter(|path| !history.contains(bucket, &basename(path)))
        .cloned()
        .collect();

    let mut candidates = if fresh.is_empty() {
        warn!(
            bucket,
            pool_size = pool.len(),
            "every pool entry was recently used, bypassing history for this call"
        );
        pool.to_vec()
    } else {
        if fresh.len() < pool.len() {
            debug!(
                bucket,
                filtered = pool.len() - fresh.len(),
                remaining = fresh.len(),
                "filtered recently used pool entries"
            );
        }
        fresh
    };

    candidates.shuffle(rng);
    candidates.truncate(count.min(candidates.len()));

    if !candidates.is_empty() {
        history.record(bucket, candidates.iter().map(|p| basename(p)), cap);
    }

    Ok(candidates)
}

/// [`select_from_pool`] with the thread-local RNG
pub fn select_media(
    pool: &[PathBuf],
    history: &mut PoolHistory,
    bucket: &str,
    count: usize,
    cap: usize,
) -> PlanResult<Vec<PathBuf>> {
    select_from_pool(pool, history, bucket, count, cap, &mut rand::thread_rng())
}

fn basename(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::fs;
    use tempfile::TempDir;

    fn pool_of(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(|n| PathBuf::from(format!("/pool/{n}"))).collect()
    }

    // -------------------------------------------------------------------------
    // Selection
    // -------------------------------------------------------------------------

    #[test]
    fn test_select_avoids_recent_entries() {
        let pool = pool_of(&["img1.jpg", "img2.jpg", "img3.jpg"]);
        let mut history = PoolHistory::new();
        history.record(
            "youtube",
            vec!["img1.jpg".to_string(), "img2.jpg".to_string()],
            20,
        );

        let mut rng = StdRng::seed_from_u64(7);
        let chosen =
            select_from_pool(&pool, &mut history, "youtube", 1, 20, &mut rng).unwrap();
        assert_eq!(chosen, vec![PathBuf::from("/pool/img3.jpg")]);
        assert!(history.contains("youtube", "img3.jpg"));
    }

    #[test]
    fn test_select_bypasses_exhausted_history() {
        let pool = pool_of(&["img1.jpg", "img2.jpg", "img3.jpg"]);
        let mut history = PoolHistory::new();
        history.record(
            "youtube",
            pool.iter().map(|p| basename(p)).collect::<Vec<_>>(),
            20,
        );

        let mut rng = StdRng::seed_from_u64(7);
        let chosen =
            select_from_pool(&pool, &mut history, "youtube", 2, 20, &mut rng).unwrap();
        assert_eq!(chosen.len(), 2);
        assert_ne!(chosen[0], chosen[1]);
        for path in &chosen {
            assert!(pool.contains(path));
        }
    }

    #[test]
    fn test_select_clamps_count_to_pool() {
        let pool = pool_of(&["a.jpg", "b.jpg", "c.jpg"]);
        let mut history = PoolHistory::new();
        let mut rng = StdRng::seed_from_u64(1);
        let chosen =
            select_from_pool(&pool, &mut history, "square", 10, 20, &mut rng).unwrap();
        assert_eq!(chosen.len(), 3);
    }

    #[test]
    fn test_select_empty_pool_is_an_error() {
        let mut history = PoolHistory::new();
        let mut rng = StdRng::seed_from_u64(1);
        let err = select_from_pool(&[], &mut history, "tiktok", 1, 20, &mut rng);
        assert!(matches!(err, Err(PlanError::EmptyPool(_))));
    }

    #[test]
    fn test_history_stays_bounded_across_selections() {
        let pool: Vec<PathBuf> = (0..30)
            .map(|i| PathBuf::from(format!("/pool/img{i}.jpg")))
            .collect();
        let mut history = PoolHistory::new();
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..10 {
            select_from_pool(&pool, &mut history, "youtube", 5, 20, &mut rng).unwrap();
            assert!(history.recent("youtube").len() <= 20);
        }
    }

    #[test]
    fn test_selected_paths_are_distinct() {
        let pool = pool_of(&["a.jpg", "b.jpg", "c.jpg", "d.jpg", "e.jpg"]);
        let mut history = PoolHistory::new();
        let mut rng = StdRng::seed_from_u64(99);
        let chosen =
            select_from_pool(&pool, &mut history, "youtube", 5, 20, &mut rng).unwrap();

        let mut unique = chosen.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), chosen.len());
    }

    // -------------------------------------------------------------------------
    // Directories
    // -------------------------------------------------------------------------

    #[test]
    fn test_pool_dir_prefers_format_bucket() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("tiktok")).unwrap();
        fs::create_dir(dir.path().join("universal")).unwrap();

        let resolved = pool_dir_for_aspect(dir.path(), AspectRatio::Vertical).unwrap();
        assert!(resolved.ends_with("tiktok"));
    }

    #[test]
    fn test_pool_dir_falls_back_to_universal() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("universal")).unwrap();

        let resolved = pool_dir_for_aspect(dir.path(), AspectRatio::Portrait).unwrap();
        assert!(resolved.ends_with("universal"));
    }

    #[test]
    fn test_pool_dir_missing_entirely() {
        let dir = TempDir::new().unwrap();
        assert!(pool_dir_for_aspect(dir.path(), AspectRatio::Wide).is_none());
    }

    #[test]
    fn test_scan_filters_by_kind_and_sorts() {
        let dir = TempDir::new().unwrap();
        for name in ["b.png", "a.jpg", "notes.txt", "track.mp3"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/deep.jpg"), b"x").unwrap();

        let images = scan_media_dir(dir.path(), MediaKind::Image).unwrap();
        let names: Vec<String> = images.iter().map(|p| basename(p)).collect();
        assert_eq!(names, vec!["a.jpg", "b.png"]);

        let audio = scan_media_dir(dir.path(), MediaKind::Audio).unwrap();
        assert_eq!(audio.len(), 1);
    }
}
