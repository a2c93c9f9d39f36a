//! Composition Planning Orchestration
//!
//! The async driver that turns one timeline document into a complete
//! [`RenderPlan`]: gather source durations through the probe, run the pure
//! planning stages, materialize generated main content when a provider is
//! configured, and assemble the final plan.
//!
//! ```text
//!   Timeline ──▶ required_probes ──▶ probe_all ──▶ resolve_timeline
//!                                                       │
//!       captions (parse ▶ re-sync ▶ compose)            ▼
//!       audio mix (plan_mix)          ──────▶ assemble_plan ──▶ RenderPlan
//! ```
//!
//! Everything after the probe pass is pure computation over the gathered
//! duration map; a probe failure aborts planning for this timeline rather
//! than silently defaulting.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use crate::audio::{plan_mix, AudioMixPlan};
use crate::captions::{
    attach_words, compose_cues, cues_from_words, offset_cues, parse_srt, Cue, SubtitleStyle,
    WordSpan, DEFAULT_MAX_LINES,
};
use crate::error::PlanResult;
use crate::media::{MainContentProvider, SourceDurationProbe};
use crate::render::{assemble_plan, RenderPlan, SubtitlePlan};
use crate::timeline::{
    required_probes, resolve_timeline, ResolvedTimeline, SegmentKind, Timeline,
};
use crate::types::AspectRatio;

// =============================================================================
// Requests
// =============================================================================

/// Caption inputs for one composition.
///
/// `srt` takes precedence as cue source; `words` alone generates flowing
/// cues, and together with `srt` it attaches karaoke timing to the parsed
/// cues. The style is the effective one, already scaled for the target
/// canvas (see [`crate::config::SubtitleDefaults::style`]).
#[derive(Clone, Debug)]
pub struct CaptionRequest {
    pub srt: Option<String>,
    pub words: Option<Vec<WordSpan>>,
    pub style: SubtitleStyle,
    pub max_lines: usize,
    /// Where the renderer should write the ASS document
    pub output_path: PathBuf,
}

impl CaptionRequest {
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            srt: None,
            words: None,
            style: SubtitleStyle::default(),
            max_lines: DEFAULT_MAX_LINES,
            output_path: output_path.into(),
        }
    }

    pub fn with_srt(mut self, srt: impl Into<String>) -> Self {
        self.srt = Some(srt.into());
        self
    }

    pub fn with_words(mut self, words: Vec<WordSpan>) -> Self {
        self.words = Some(words);
        self
    }

    pub fn with_style(mut self, style: SubtitleStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_max_lines(mut self, max_lines: usize) -> Self {
        self.max_lines = max_lines;
        self
    }
}

/// One unit of planning work
#[derive(Clone, Debug)]
pub struct PlanRequest {
    pub timeline: Timeline,
    pub aspect: AspectRatio,
    pub captions: Option<CaptionRequest>,
}

impl PlanRequest {
    pub fn new(timeline: Timeline, aspect: AspectRatio) -> Self {
        Self {
            timeline,
            aspect,
            captions: None,
        }
    }

    pub fn with_captions(mut self, captions: CaptionRequest) -> Self {
        self.captions = Some(captions);
        self
    }
}

// =============================================================================
// Planner
// =============================================================================

/// Plans complete compositions against injected I/O collaborators
pub struct CompositionPlanner {
    probe: Arc<dyn SourceDurationProbe>,
    content_provider: Option<Arc<dyn MainContentProvider>>,
}

impl CompositionPlanner {
    pub fn new(probe: Arc<dyn SourceDurationProbe>) -> Self {
        Self {
            probe,
            content_provider: None,
        }
    }

    /// Sets the strategy for materializing sourceless main segments.
    /// Without one, their operations stay marked as pending generation.
    pub fn with_content_provider(mut self, provider: Arc<dyn MainContentProvider>) -> Self {
        self.content_provider = Some(provider);
        self
    }

    /// Plans one timeline into a render plan.
    ///
    /// Fails on structural timeline errors, unresolvable markers, probe
    /// failures, and caption parse errors; degraded-mode conditions (missing
    /// word timing, clamped durations) surface as plan warnings instead.
    pub async fn plan(&self, request: &PlanRequest) -> PlanResult<RenderPlan> {
        let timeline = &request.timeline;

        let paths = required_probes(timeline);
        debug!(sources = paths.len(), "gathering source durations");
        let durations = self.probe.probe_all(&paths).await?;

        let resolved = resolve_timeline(timeline, &durations)?;

        let mix = match &timeline.audio {
            Some(audio) if !audio.is_empty() => plan_mix(&resolved, audio, &durations)?,
            _ => AudioMixPlan {
                voice: None,
                music: None,
                total_duration: resolved.total_duration(),
            },
        };

        let subtitles = match &request.captions {
            Some(captions) => self.compose_subtitles(captions, &mix, request.aspect)?,
            None => None,
        };

        let generated = self.materialize_main(timeline, &resolved).await?;

        let plan = assemble_plan(
            timeline,
            &resolved,
            request.aspect,
            &mix,
            subtitles,
            &generated,
        );
        info!(
            id = %plan.id,
            aspect = %plan.aspect,
            total_duration = plan.total_duration,
            segments = plan.segments.len(),
            warnings = plan.warnings.len(),
            "composition plan assembled"
        );
        Ok(plan)
    }

    /// Parses or generates cues, re-syncs them to the voice delay, and
    /// composes the renderable set. `None` when the request holds no usable
    /// caption source.
    fn compose_subtitles(
        &self,
        request: &CaptionRequest,
        mix: &AudioMixPlan,
        aspect: AspectRatio,
    ) -> PlanResult<Option<SubtitlePlan>> {
        let mut cues: Vec<Cue> = match (&request.srt, &request.words) {
            (Some(srt), _) => parse_srt(srt)?,
            (None, Some(words)) => cues_from_words(words),
            (None, None) => return Ok(None),
        };
        if cues.is_empty() {
            return Ok(None);
        }

        // SRT cues carry no word timing of their own; join the aligned words
        // on before any shifting so both move together.
        if let (Some(_), Some(words)) = (&request.srt, &request.words) {
            cues = attach_words(&cues, words);
        }

        let offset_ms = (mix.subtitle_offset() * 1000.0).round() as i64;
        if offset_ms != 0 {
            debug!(offset_ms, "re-syncing cues to the delayed voice track");
            cues = offset_cues(&cues, offset_ms);
        }

        let canvas = aspect.canvas();
        let set = compose_cues(&cues, &request.style, canvas.width, request.max_lines);
        Ok(Some(SubtitlePlan::new(
            set,
            request.style.clone(),
            canvas,
            request.output_path.clone(),
        )))
    }

    /// Generates media for sourceless main segments through the configured
    /// provider, keyed by segment index.
    async fn materialize_main(
        &self,
        timeline: &Timeline,
        resolved: &ResolvedTimeline,
    ) -> PlanResult<HashMap<usize, PathBuf>> {
        let mut generated = HashMap::new();
        let Some(provider) = &self.content_provider else {
            return Ok(generated);
        };

        for timing in resolved.timings() {
            let segment = &timeline.segments[timing.index];
            if segment.kind == SegmentKind::Main && segment.source_path.is_none() {
                info!(
                    provider = provider.name(),
                    index = timing.index,
                    duration = timing.duration,
                    "materializing main content"
                );
                let path = provider.generate(timing.duration).await?;
                generated.insert(timing.index, path);
            }
        }
        Ok(generated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::captions::AnimationStyle;
    use crate::error::PlanError;
    use crate::media::{StaticContentProvider, StaticDurationProbe};
    use crate::render::RenderInput;
    use crate::timeline::{AudioConfig, AudioTrack, Segment};

    const SRT: &str = "1\n00:00:00,000 --> 00:00:02,000\nHello world\n\n\
                       2\n00:00:02,000 --> 00:00:04,000\nSecond cue\n";

    fn fixture_timeline(voice_anchor: &str) -> Timeline {
        Timeline::new(vec![
            Segment::intro("intro.png").with_name("Intro"),
            Segment::main().with_name("Body"),
            Segment::outro("outro.mp4").with_duration(6.0).with_name("Outro"),
        ])
        .with_audio(AudioConfig {
            voice: Some(AudioTrack::new("voice.mp3").starting_at(voice_anchor)),
            music: None,
        })
    }

    fn fixture_probe() -> Arc<StaticDurationProbe> {
        Arc::new(StaticDurationProbe::new().with("voice.mp3", 50.0))
    }

    #[tokio::test]
    async fn test_plan_end_to_end() {
        let planner = CompositionPlanner::new(fixture_probe())
            .with_content_provider(Arc::new(StaticContentProvider::new("generated/body.mp4")));
        let request = PlanRequest::new(fixture_timeline("Intro"), AspectRatio::Wide)
            .with_captions(CaptionRequest::new("out/captions.ass").with_srt(SRT));

        let plan = planner.plan(&request).await.unwrap();

        assert_eq!(plan.segments.len(), 3);
        assert_eq!(plan.total_duration, 50.0);
        assert_eq!(
            plan.segments[1].input,
            RenderInput::File {
                path: PathBuf::from("generated/body.mp4")
            }
        );
        assert!(!plan.needs_generation());

        let subtitles = plan.subtitles.unwrap();
        assert!(subtitles.document.contains("Hello world"));
        assert_eq!(subtitles.cues.cues[0].start_ms, 0);
    }

    #[tokio::test]
    async fn test_plan_without_provider_leaves_main_pending() {
        let planner = CompositionPlanner::new(fixture_probe());
        let request = PlanRequest::new(fixture_timeline("Intro"), AspectRatio::Wide);

        let plan = planner.plan(&request).await.unwrap();
        assert_eq!(plan.segments[1].input, RenderInput::Generated);
        assert!(plan.needs_generation());
    }

    #[tokio::test]
    async fn test_cues_follow_delayed_voice() {
        // Voice anchored to Body starts at 4s; subtitles shift with it.
        let planner = CompositionPlanner::new(fixture_probe());
        let request = PlanRequest::new(fixture_timeline("Body"), AspectRatio::Wide)
            .with_captions(CaptionRequest::new("out/captions.ass").with_srt(SRT));

        let plan = planner.plan(&request).await.unwrap();
        let subtitles = plan.subtitles.unwrap();
        assert_eq!(subtitles.cues.cues[0].start_ms, 4000);
        assert_eq!(subtitles.cues.cues[1].start_ms, 6000);
    }

    #[tokio::test]
    async fn test_words_alone_generate_flowing_cues() {
        let timeline = Timeline::new(vec![Segment::scene("clip.mp4").with_duration(5.0)]);
        let mut style = SubtitleStyle::default();
        style.animation = AnimationStyle::Karaoke;
        let words = vec![
            WordSpan::new("hello", 0, 500),
            WordSpan::new("there", 500, 1100),
        ];
        let request = PlanRequest::new(timeline, AspectRatio::Vertical).with_captions(
            CaptionRequest::new("out.ass")
                .with_words(words)
                .with_style(style),
        );

        let planner = CompositionPlanner::new(Arc::new(StaticDurationProbe::new()));
        let plan = planner.plan(&request).await.unwrap();
        let subtitles = plan.subtitles.unwrap();
        assert_eq!(subtitles.cues.cues.len(), 1);
        assert!(subtitles.cues.cues[0].karaoke.is_some());
    }

    #[tokio::test]
    async fn test_srt_with_words_gets_karaoke() {
        let mut style = SubtitleStyle::default();
        style.animation = AnimationStyle::Karaoke;
        let words = vec![
            WordSpan::new("Hello", 0, 900),
            WordSpan::new("world", 900, 1900),
        ];
        let request = PlanRequest::new(fixture_timeline("Intro"), AspectRatio::Wide)
            .with_captions(
                CaptionRequest::new("out.ass")
                    .with_srt(SRT)
                    .with_words(words)
                    .with_style(style),
            );

        let planner = CompositionPlanner::new(fixture_probe());
        let plan = planner.plan(&request).await.unwrap();
        let subtitles = plan.subtitles.unwrap();
        assert!(subtitles.cues.cues[0].karaoke.is_some());
        // The second cue has no overlapping words and stays plain.
        assert!(subtitles.cues.cues[1].karaoke.is_none());
        assert!(subtitles.document.contains("\\kf"));
    }

    #[tokio::test]
    async fn test_probe_failure_aborts_planning() {
        let planner = CompositionPlanner::new(Arc::new(StaticDurationProbe::new()));
        let request = PlanRequest::new(fixture_timeline("Intro"), AspectRatio::Wide);

        let err = planner.plan(&request).await.unwrap_err();
        assert!(matches!(err, PlanError::Probe(_)));
    }

    #[tokio::test]
    async fn test_malformed_srt_aborts_planning() {
        let planner = CompositionPlanner::new(fixture_probe());
        let request = PlanRequest::new(fixture_timeline("Intro"), AspectRatio::Wide)
            .with_captions(CaptionRequest::new("out.ass").with_srt("1\nnot a timestamp\nx\n"));

        let err = planner.plan(&request).await.unwrap_err();
        assert!(matches!(err, PlanError::Caption(_)));
    }

    #[tokio::test]
    async fn test_empty_caption_request_yields_no_subtitles() {
        let planner = CompositionPlanner::new(fixture_probe());
        let request = PlanRequest::new(fixture_timeline("Intro"), AspectRatio::Wide)
            .with_captions(CaptionRequest::new("out.ass"));

        let plan = planner.plan(&request).await.unwrap();
        assert!(plan.subtitles.is_none());
    }

    #[tokio::test]
    async fn test_silent_timeline_plans_without_audio() {
        let timeline = Timeline::new(vec![Segment::scene("clip.mp4").with_duration(8.0)]);
        let planner = CompositionPlanner::new(Arc::new(StaticDurationProbe::new()));
        let plan = planner
            .plan(&PlanRequest::new(timeline, AspectRatio::Square))
            .await
            .unwrap();

        assert!(plan.audio.voice.is_none());
        assert!(plan.audio_filter.is_none());
        assert_eq!(plan.audio.total_duration, 8.0);
    }
}
