//! `voxreel captions` composes an ASS subtitle document standalone, without
//! planning a full timeline.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use voxreel_core::captions::{
    ass_document, attach_words, compose_cues, cues_from_words, offset_cues, parse_srt,
    AnimationStyle, Cue, SubtitleStyle, WordSpan, DEFAULT_MAX_LINES,
};
use voxreel_core::AspectRatio;

#[derive(Args, Debug)]
pub struct CaptionsArgs {
    /// SRT document to compose; omit to build cues from --words alone
    #[arg(long)]
    pub srt: Option<PathBuf>,

    /// Target aspect ratio (scales font size and margins)
    #[arg(long, default_value = "16:9")]
    pub aspect: AspectRatio,

    /// Style preset name
    #[arg(long, default_value = "classic")]
    pub style: String,

    /// Render word-by-word karaoke highlighting
    #[arg(long)]
    pub karaoke: bool,

    /// JSON word-timing file: [{"text", "startMs", "endMs"}, ...]
    #[arg(long)]
    pub words: Option<PathBuf>,

    /// Shift all cues by this many milliseconds
    #[arg(long, default_value_t = 0)]
    pub offset_ms: i64,

    /// Line limit per cue
    #[arg(long, default_value_t = DEFAULT_MAX_LINES)]
    pub max_lines: usize,

    /// Output ASS path
    #[arg(long)]
    pub out: PathBuf,
}

pub fn run(args: CaptionsArgs) -> anyhow::Result<()> {
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

    let mut cues: Vec<Cue> = match (&args.srt, &words) {
        (Some(path), _) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading subtitles {}", path.display()))?;
            parse_srt(&raw)?
        }
        (None, Some(words)) => cues_from_words(words),
        (None, None) => anyhow::bail!("nothing to compose: pass --srt and/or --words"),
    };

    if args.srt.is_some() {
        if let Some(words) = &words {
            cues = attach_words(&cues, words);
        }
    }
    if args.offset_ms != 0 {
        cues = offset_cues(&cues, args.offset_ms);
    }

    let style = caption_style(&args.style, args.karaoke, args.aspect)?;
    let canvas = args.aspect.canvas();
    let set = compose_cues(&cues, &style, canvas.width, args.max_lines);
    let document = ass_document(&set, &style, canvas);

    if let Some(parent) = args.out.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(&args.out, document)
        .with_context(|| format!("writing {}", args.out.display()))?;
    println!("{}", args.out.display());
    Ok(())
}

fn caption_style(
    preset: &str,
    karaoke: bool,
    aspect: AspectRatio,
) -> anyhow::Result<SubtitleStyle> {
    let mut style = SubtitleStyle::from_preset_name(preset).ok_or_else(|| {
        anyhow::anyhow!(
            "unknown style preset '{preset}' (one of: {})",
            SubtitleStyle::preset_names().join(", ")
        )
    })?;
    if karaoke {
        style.animation = AnimationStyle::Karaoke;
    }
    Ok(style.scaled_for(aspect))
}
