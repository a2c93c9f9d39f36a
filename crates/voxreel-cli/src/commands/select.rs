//! `voxreel select` runs the pool selector against a directory and prints
//! the chosen paths, one per line.

use std::path::PathBuf;

use clap::Args;

use voxreel_core::pool::{
    scan_media_dir, select_media, HistoryStore, JsonHistoryStore, PoolHistory,
    DEFAULT_IMAGE_HISTORY_CAP, DEFAULT_MUSIC_HISTORY_CAP,
};
use voxreel_core::MediaKind;

#[derive(Args, Debug)]
pub struct SelectArgs {
    /// Pool directory to draw from
    #[arg(long)]
    pub pool: PathBuf,

    /// How many entries to pick
    #[arg(long, default_value_t = 1)]
    pub count: usize,

    /// History bucket the selections are recorded under
    #[arg(long)]
    pub bucket: String,

    /// History ledger file; omit for a one-off selection without memory
    #[arg(long)]
    pub history: Option<PathBuf>,

    /// Media kind to select: image, video or audio
    #[arg(long, default_value = "image")]
    pub kind: String,
}

pub fn run(args: SelectArgs) -> anyhow::Result<()> {
    let kind = parse_kind(&args.kind)?;
    let pool = scan_media_dir(&args.pool, kind)?;
    let cap = match kind {
        MediaKind::Audio => DEFAULT_MUSIC_HISTORY_CAP,
        _ => DEFAULT_IMAGE_HISTORY_CAP,
    };

    let chosen = match &args.history {
        Some(path) => {
            let store = JsonHistoryStore::new(path);
            let mut history = store.load();
            let chosen = select_media(&pool, &mut history, &args.bucket, args.count, cap)?;
            store.save(&history)?;
            chosen
        }
        None => {
            let mut history = PoolHistory::new();
            select_media(&pool, &mut history, &args.bucket, args.count, cap)?
        }
    };

    for path in &chosen {
        println!("{}", path.display());
    }
    Ok(())
}

fn parse_kind(name: &str) -> anyhow::Result<MediaKind> {
    match name.to_ascii_lowercase().as_str() {
        "image" => Ok(MediaKind::Image),
        "video" => Ok(MediaKind::Video),
        "audio" | "music" => Ok(MediaKind::Audio),
        other => anyhow::bail!("unknown media kind '{other}' (expected image, video or audio)"),
    }
}
