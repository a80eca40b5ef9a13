//! The per-job render pipeline.

use std::sync::Arc;

use async_trait::async_trait;
use reel_align::{adjust_for_continuity, align_segments};
use reel_media::{media_duration, JobWorkspace, MediaError};
use reel_models::{
    Asset, AssetKind, JobRecord, RenderOptions, RenderRequest, Segment,
};
use reel_providers::{
    AssetResolver, BatchImageCache, GenerativeProvider, MotionProvider, Resolution,
};
use reel_services::{
    ServiceError, SpeechSynthesizer, StoryPlanner, Transcriber, VideoRenderer,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::progress::{milestone, ProgressReporter};
use crate::retry::{retry_async, RetryConfig};

/// Failures that abort a job. Per-segment visual problems never appear
/// here; they degrade the output instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error("{0}")]
    Internal(String),
}

/// Processes one claimed job to a terminal outcome.
///
/// The worker loop only knows this trait, so tests drive the loop with
/// scripted processors instead of the full pipeline.
#[async_trait]
pub trait JobProcessor: Send + Sync {
    /// Render the job, returning the output video path.
    async fn process(
        &self,
        record: &JobRecord,
        reporter: &ProgressReporter,
    ) -> Result<String, PipelineError>;
}

/// The real pipeline: narration, transcript, plan, visuals, alignment,
/// render.
pub struct RenderPipeline {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    transcriber: Arc<dyn Transcriber>,
    planner: Arc<dyn StoryPlanner>,
    renderer: Arc<dyn VideoRenderer>,
    resolver: AssetResolver,
    motion: Option<Arc<dyn MotionProvider>>,
    /// Backend used for the pre-submitted generative batch
    batch_generator: Option<Arc<dyn GenerativeProvider>>,
    work_dir: String,
}

impl RenderPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        transcriber: Arc<dyn Transcriber>,
        planner: Arc<dyn StoryPlanner>,
        renderer: Arc<dyn VideoRenderer>,
        resolver: AssetResolver,
        motion: Option<Arc<dyn MotionProvider>>,
        batch_generator: Option<Arc<dyn GenerativeProvider>>,
        work_dir: String,
    ) -> Self {
        Self {
            synthesizer,
            transcriber,
            planner,
            renderer,
            resolver,
            motion,
            batch_generator,
            work_dir,
        }
    }

    async fn run(
        &self,
        record: &JobRecord,
        reporter: &ProgressReporter,
        workspace: &JobWorkspace,
    ) -> Result<String, PipelineError> {
        let params = &record.params;
        let avatar = params.preferences.avatar;

        reporter.report(1, "Synthesizing narration...").await;
        let audio_path = workspace.file("narration.ogg");
        retry_async(&RetryConfig::new("tts"), || {
            self.synthesizer
                .synthesize(&params.script, avatar, &audio_path)
        })
        .await?;
        let audio_duration = media_duration(&audio_path).await?;
        reporter
            .report(milestone::SYNTHESIS, "Narration ready, transcribing...")
            .await;

        let hints: Vec<String> = params
            .script
            .split_whitespace()
            .map(str::to_string)
            .collect();
        let words = retry_async(&RetryConfig::new("stt"), || {
            self.transcriber
                .transcribe(&audio_path, avatar.language_code(), &hints)
        })
        .await?;
        reporter
            .report(milestone::TRANSCRIPTION, "Transcript ready, planning story...")
            .await;

        // Segmentation runs on what was actually spoken, not the submitted
        // script, so segment text matches transcript words exactly.
        let canonical = reel_models::canonical_script(&words);
        let mut segments = retry_async(&RetryConfig::new("segmentation"), || {
            self.planner.segment_script(&canonical)
        })
        .await?;

        let plans = retry_async(&RetryConfig::new("visual-planning"), || {
            self.planner.plan_visuals(&segments, &params.content_class)
        })
        .await?;
        for (segment, plan) in segments.iter_mut().zip(plans) {
            segment.visual_description = plan.visual_description;
            segment.needs_real_world_search = plan.needs_real_world_search;
        }
        reporter
            .report(milestone::SEGMENTATION, "Story planned, creating visuals...")
            .await;

        let cache = self.presubmit_batch(&segments, params.preferences.animate_stills).await;

        let total = segments.len();
        for (i, segment) in segments.iter_mut().enumerate() {
            reporter
                .report(
                    ProgressReporter::segment_progress(i, total),
                    format!("Creating visuals ({}/{})...", i + 1, total),
                )
                .await;

            let stem = format!("seg{i}");
            let resolution = self
                .resolver
                .resolve(workspace.root(), &stem, segment, cache.as_ref())
                .await;
            if resolution == Resolution::Unresolved {
                info!(job_id = %record.id, segment = i, "segment left without a visual");
                continue;
            }

            if params.preferences.animate_stills {
                self.maybe_animate(segment, workspace, &stem).await;
            }
        }
        reporter
            .report(milestone::RESOLUTION_END, "Visuals ready, assembling timeline...")
            .await;

        align_segments(&words, &mut segments);
        adjust_for_continuity(&mut segments, audio_duration);

        let assets = build_timeline(&segments, audio_duration);
        reporter
            .report(milestone::RENDER, "Rendering video...")
            .await;

        let request = RenderRequest {
            output_name: params
                .video_id
                .clone()
                .unwrap_or_else(|| format!("video-{}", record.id)),
            words,
            assets,
            options: RenderOptions {
                subtitles: params.preferences.subtitles,
                audio_url: audio_path.to_string_lossy().into_owned(),
                ..RenderOptions::default()
            },
        };
        let output = retry_async(&RetryConfig::new("render"), || {
            self.renderer.render(&request)
        })
        .await?;

        Ok(output)
    }

    /// Start batched generation for every narrative prompt so results are
    /// ready by the time the segment loop needs them.
    async fn presubmit_batch(
        &self,
        segments: &[Segment],
        animate_stills: bool,
    ) -> Option<BatchImageCache> {
        if !animate_stills {
            return None;
        }
        let generator = self.batch_generator.clone()?;
        let prompts: Vec<String> = segments
            .iter()
            .filter(|s| s.kind == reel_models::SegmentKind::Narrative)
            .map(|s| s.visual_description.clone())
            .collect();
        if prompts.is_empty() {
            return None;
        }
        let cache = BatchImageCache::new();
        cache.submit(generator, &prompts).await;
        Some(cache)
    }

    /// Ask the planner whether a resolved still should move, and animate
    /// it if so. Every failure here keeps the still in place.
    async fn maybe_animate(&self, segment: &mut Segment, workspace: &JobWorkspace, stem: &str) {
        let Some(motion) = &self.motion else { return };
        let Some(resolved) = segment.resolved.clone() else { return };
        if resolved.kind != AssetKind::Image {
            return;
        }

        let prompt = match self
            .planner
            .motion_decision(&segment.text, &segment.visual_description)
            .await
        {
            Ok(Some(prompt)) => prompt,
            Ok(None) => return,
            Err(err) => {
                warn!(error = %err, "motion decision failed, keeping still");
                return;
            }
        };

        let animated = async {
            let source = motion
                .animate(std::path::Path::new(&resolved.path), &prompt)
                .await?;
            self.resolver
                .materialize_clip(workspace.root(), &format!("{stem}-clip"), source)
                .await
        }
        .await;

        match animated {
            Ok(clip) => segment.resolved = Some(clip),
            Err(err) => warn!(error = %err, "animation failed, keeping still"),
        }
    }
}

/// One timeline entry per resolved segment; the last entry is stretched to
/// the measured audio duration so the video never ends on silence early.
fn build_timeline(segments: &[Segment], audio_duration: f64) -> Vec<Asset> {
    let mut assets: Vec<Asset> = segments
        .iter()
        .filter_map(|s| {
            s.resolved.as_ref().map(|r| Asset {
                path: r.path.clone(),
                kind: r.kind,
                start: s.start_time,
                end: s.end_time,
            })
        })
        .collect();
    if let Some(last) = assets.last_mut() {
        last.end = audio_duration;
    }
    assets
}

#[async_trait]
impl JobProcessor for RenderPipeline {
    async fn process(
        &self,
        record: &JobRecord,
        reporter: &ProgressReporter,
    ) -> Result<String, PipelineError> {
        let workspace = JobWorkspace::create(&self.work_dir, record.id.as_str()).await?;
        let result = self.run(record, reporter, &workspace).await;
        // Temp media goes away whatever happened.
        workspace.cleanup().await;
        result
    }
}
