//! `voxreel plan` resolves timeline documents into render plans.
//!
//! Each `--timeline` file is planned independently: one failing document is
//! reported and skipped, the rest of the batch still runs, and the exit
//! status reflects whether anything failed.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use tracing::error;

use voxreel_core::captions::WordSpan;
use voxreel_core::config::SubtitleDefaults;
use voxreel_core::media::{FfprobeDurationProbe, PoolContentProvider};
use voxreel_core::planner::{CaptionRequest, CompositionPlanner, PlanRequest};
use voxreel_core::pool::{HistoryStore, JsonHistoryStore, MemoryHistoryStore};
use voxreel_core::timeline::Timeline;
use voxreel_core::AspectRatio;

#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Timeline document, one plan per file (repeatable)
    #[arg(long = "timeline", required = true)]
    pub timelines: Vec<PathBuf>,

    /// Target aspect ratio
    #[arg(long, default_value = "16:9")]
    pub aspect: AspectRatio,

    /// Output directory for plan and caption files
    #[arg(long, default_value = "out")]
    pub out_dir: PathBuf,

    /// SRT subtitles applied to every planned timeline
    #[arg(long)]
    pub srt: Option<PathBuf>,

    /// JSON word-timing file for karaoke and cue generation
    #[arg(long)]
    pub words: Option<PathBuf>,

    /// History ledger recording pool selections across runs
    #[arg(long)]
    pub history: Option<PathBuf>,

    /// Media pool root; sourceless main segments draw a background from it
    #[arg(long)]
    pub pool: Option<PathBuf>,
}

pub async fn run(args: PlanArgs) -> anyhow::Result<()> {
    let srt = match &args.srt {
        Some(path) => Some(
            fs::read_to_string(path)
                .with_context(|| format!("reading subtitles {}", path.display()))?,
        ),
        None => None,
    };
    let words: Option<Vec<WordSpan>> = match &args.words {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading word timing {}", path.display()))?;
            Some(
                serde_json::from_str(&raw)
                    .with_context(|| format!("parsing word timing {}", path.display()))?,
            )
        }
        None => None,
    };

    let mut planner = CompositionPlanner::new(Arc::new(FfprobeDurationProbe::new()));
    if let Some(pool_dir) = &args.pool {
        let store: Arc<dyn HistoryStore> = match &args.history {
            Some(path) => Arc::new(JsonHistoryStore::new(path)),
            None => Arc::new(MemoryHistoryStore::new()),
        };
        planner = planner.with_content_provider(Arc::new(PoolContentProvider::new(
            pool_dir,
            args.aspect,
            store,
        )));
    }

    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating {}", args.out_dir.display()))?;

    let mut failed = 0usize;
    for path in &args.timelines {
        match plan_one(&planner, path, &args, srt.as_deref(), words.as_deref()).await {
            Ok(outcome) => println!("{}", outcome),
            Err(e) => {
                failed += 1;
                error!(timeline = %path.display(), "planning failed: {e:#}");
                eprintln!("{}: FAILED: {e:#}", path.display());
            }
        }
    }

    let total = args.timelines.len();
    if failed > 0 {
        anyhow::bail!("{failed} of {total} timeline documents failed");
    }
    Ok(())
}

async fn plan_one(
    planner: &CompositionPlanner,
    path: &Path,
    args: &PlanArgs,
    srt: Option<&str>,
    words: Option<&[WordSpan]>,
) -> anyhow::Result<String> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading timeline {}", path.display()))?;
    let timeline: Timeline =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "timeline".to_string());
    let plan_path = args.out_dir.join(format!("{stem}.plan.json"));

    let mut request = PlanRequest::new(timeline, args.aspect);
    if srt.is_some() || words.is_some() {
        let defaults = SubtitleDefaults::default();
        let mut captions = CaptionRequest::new(args.out_dir.join(format!("{stem}.ass")))
            .with_style(defaults.style(args.aspect))
            .with_max_lines(defaults.max_lines);
        if let Some(srt) = srt {
            captions = captions.with_srt(srt);
        }
        if let Some(words) = words {
            captions = captions.with_words(words.to_vec());
        }
        request = request.with_captions(captions);
    }

    let plan = planner.plan(&request).await?;

    if let Some(subtitles) = &plan.subtitles {
        fs::write(&subtitles.path, &subtitles.document)
            .with_context(|| format!("writing {}", subtitles.path.display()))?;
    }
    let json = serde_json::to_string_pretty(&plan)?;
    fs::write(&plan_path, json).with_context(|| format!("writing {}", plan_path.display()))?;

    let mut outcome = format!("{} -> {}", path.display(), plan_path.display());
    if !plan.warnings.is_empty() {
        outcome.push_str(&format!(" ({} warnings)", plan.warnings.len()));
    }
    Ok(outcome)
}
