//! Idempotent per-segment rendering.
//!
//! A clip file on disk is the completion marker: segments whose clip
//! already exists are never re-encoded, so a batch can be re-run after a
//! partial failure and only the missing clips are produced.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use longform_common::{InputKind, LongformError, LongformResult, RenderDefaults};
use longform_project_model::layout::ArtifactLayout;
use longform_project_model::project::{Chapter, Project, Segment};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::{AbortHandle, JoinSet};

use crate::encoder::MediaEncoder;
use crate::filter_graph::{build_segment_plan, EncodeSettings, MusicBed, RenderSpec};
use crate::staging::StagedOutput;

/// Whether a clip was produced by this call or found on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipStatus {
    Created,
    Existing,
}

/// A rendered segment clip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Clip {
    pub segment_id: String,
    pub path: PathBuf,
    pub status: ClipStatus,
}

/// Inputs for rendering one image/narration pair outside a project.
#[derive(Debug, Clone)]
pub struct SingleRender {
    pub image: PathBuf,
    pub audio: PathBuf,
    pub output: PathBuf,
    pub effects: Vec<String>,
    pub music: Option<MusicBed>,
}

/// Outcome of one segment in a batch.
#[derive(Debug, Clone)]
pub enum SegmentOutcome {
    Created(Clip),
    Existing(Clip),
    Missing { kind: InputKind, path: PathBuf },
    Failed { message: String },
}

impl SegmentOutcome {
    fn from_result(result: LongformResult<Clip>) -> Self {
        match result {
            Ok(clip) => match clip.status {
                ClipStatus::Created => SegmentOutcome::Created(clip),
                ClipStatus::Existing => SegmentOutcome::Existing(clip),
            },
            Err(LongformError::MissingInput { kind, path }) => {
                SegmentOutcome::Missing { kind, path }
            }
            Err(err) => SegmentOutcome::Failed {
                message: err.to_string(),
            },
        }
    }

    pub fn clip(&self) -> Option<&Clip> {
        match self {
            SegmentOutcome::Created(clip) | SegmentOutcome::Existing(clip) => Some(clip),
            _ => None,
        }
    }

    /// Short label for progress output.
    pub fn label(&self) -> &'static str {
        match self {
            SegmentOutcome::Created(_) => "created",
            SegmentOutcome::Existing(_) => "exists",
            SegmentOutcome::Missing { .. } => "skipped",
            SegmentOutcome::Failed { .. } => "failed",
        }
    }
}

/// Per-segment line of a batch summary.
#[derive(Debug, Clone)]
pub struct SegmentReport {
    /// One-based position in playback order.
    pub position: usize,
    pub segment_id: String,
    pub outcome: SegmentOutcome,
}

/// Progress callback for batch rendering.
pub type BatchProgressCallback = Arc<dyn Fn(BatchEvent) + Send + Sync>;

/// Batch progress event; `position` is one-based out of `total`.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    Started {
        position: usize,
        total: usize,
        segment_id: String,
    },
    Finished {
        total: usize,
        report: SegmentReport,
    },
}

/// Result of rendering every segment of a project.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    /// Reports in playback order.
    pub reports: Vec<SegmentReport>,
}

impl BatchSummary {
    fn count(&self, pred: impl Fn(&SegmentOutcome) -> bool) -> usize {
        self.reports.iter().filter(|r| pred(&r.outcome)).count()
    }

    pub fn total(&self) -> usize {
        self.reports.len()
    }

    pub fn created(&self) -> usize {
        self.count(|o| matches!(o, SegmentOutcome::Created(_)))
    }

    pub fn existing(&self) -> usize {
        self.count(|o| matches!(o, SegmentOutcome::Existing(_)))
    }

    pub fn missing(&self) -> usize {
        self.count(|o| matches!(o, SegmentOutcome::Missing { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, SegmentOutcome::Failed { .. }))
    }

    /// Clips available for assembly, in playback order.
    pub fn clips(&self) -> impl Iterator<Item = &Clip> {
        self.reports.iter().filter_map(|r| r.outcome.clip())
    }

    /// Every segment has a clip.
    pub fn is_complete(&self) -> bool {
        self.missing() == 0 && self.failed() == 0
    }
}

/// Validated work for one encode, built before dispatch.
#[derive(Debug, Clone)]
struct RenderJob {
    segment_id: String,
    image: PathBuf,
    audio: PathBuf,
    output: PathBuf,
    effects: Vec<String>,
    music: Option<MusicBed>,
}

enum Prepared {
    Done(Clip),
    Encode(RenderJob),
}

/// Renders segment clips through a [`MediaEncoder`].
#[derive(Clone)]
pub struct SegmentRenderer {
    encoder: Arc<dyn MediaEncoder>,
    layout: ArtifactLayout,
    defaults: RenderDefaults,
    settings: EncodeSettings,
}

impl SegmentRenderer {
    pub fn new(
        encoder: Arc<dyn MediaEncoder>,
        layout: ArtifactLayout,
        defaults: RenderDefaults,
    ) -> Self {
        let settings = EncodeSettings::from_defaults(&defaults);
        Self {
            encoder,
            layout,
            defaults,
            settings,
        }
    }

    pub fn layout(&self) -> &ArtifactLayout {
        &self.layout
    }

    pub fn defaults(&self) -> &RenderDefaults {
        &self.defaults
    }

    /// Render one segment of `chapter` from the given image and narration.
    ///
    /// Returns `Existing` without touching the encoder when the clip is
    /// already on disk, and `MissingInput` when the image or narration is
    /// absent.
    pub async fn render(
        &self,
        segment: &Segment,
        chapter: &Chapter,
        image: &Path,
        audio: &Path,
    ) -> LongformResult<Clip> {
        match self.prepare(segment, chapter, image, audio)? {
            Prepared::Done(clip) => Ok(clip),
            Prepared::Encode(job) => self.encode(job).await,
        }
    }

    /// Render an ad-hoc image/narration pair to `request.output`.
    pub async fn render_single(&self, request: SingleRender) -> LongformResult<Clip> {
        let segment_id = request
            .output
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "single".to_string());

        if let Some(clip) = existing_clip(&segment_id, &request.output) {
            return Ok(clip);
        }
        check_input(InputKind::Image, &request.image)?;
        check_input(InputKind::Audio, &request.audio)?;
        let music = match request.music {
            Some(bed) if bed.path.exists() => Some(bed),
            Some(bed) => {
                tracing::warn!(path = %bed.path.display(), "Music track not found, rendering narration only");
                None
            }
            None => None,
        };

        self.encode(RenderJob {
            segment_id,
            image: request.image,
            audio: request.audio,
            output: request.output,
            effects: request.effects,
            music,
        })
        .await
    }

    /// Render every segment of `project` from the artifact layout.
    ///
    /// Fails immediately with `MissingDependency` when the encoder is not
    /// available. Otherwise every segment gets an outcome; per-segment
    /// failures, panics included, never stop the batch. With a single worker
    /// progress events arrive in playback order.
    pub async fn render_project(
        &self,
        project: &Project,
        progress: Option<BatchProgressCallback>,
    ) -> LongformResult<BatchSummary> {
        if !self.encoder.is_available() {
            return Err(LongformError::missing_dependency(self.encoder.name()));
        }

        let total = project.segment_count();
        let workers = self.defaults.worker_count();
        tracing::info!(
            project = project.display_name(),
            segments = total,
            workers,
            "Rendering segments"
        );

        let mut prepared = Vec::with_capacity(total);
        for entry in project.segments() {
            let id = entry.segment.segment_id.clone();
            let image = self.layout.image_path(&id);
            let audio = self.layout.audio_path(&id);
            let result = self.prepare(entry.segment, entry.chapter, &image, &audio);
            prepared.push((entry.index + 1, id, result));
        }

        let reporter = BatchReporter { total, progress };
        let mut reports = if workers == 1 {
            self.render_in_order(prepared, &reporter).await?
        } else {
            self.render_parallel(prepared, workers, &reporter).await?
        };

        reports.sort_by_key(|r| r.position);
        let summary = BatchSummary { reports };
        tracing::info!(
            created = summary.created(),
            existing = summary.existing(),
            missing = summary.missing(),
            failed = summary.failed(),
            "Segment batch finished"
        );
        Ok(summary)
    }

    async fn render_in_order(
        &self,
        prepared: Vec<(usize, String, LongformResult<Prepared>)>,
        reporter: &BatchReporter,
    ) -> LongformResult<Vec<SegmentReport>> {
        let mut reports = Vec::with_capacity(prepared.len());
        for (position, segment_id, result) in prepared {
            let result = match result {
                Ok(Prepared::Encode(job)) => {
                    reporter.started(position, &segment_id);
                    match self.encode_isolated(job).await {
                        Err(err) if err.is_fatal() => return Err(err),
                        other => other,
                    }
                }
                Ok(Prepared::Done(clip)) => Ok(clip),
                Err(err) => Err(err),
            };
            reports.push(reporter.finished(position, segment_id, result));
        }
        Ok(reports)
    }

    async fn render_parallel(
        &self,
        prepared: Vec<(usize, String, LongformResult<Prepared>)>,
        workers: usize,
        reporter: &BatchReporter,
    ) -> LongformResult<Vec<SegmentReport>> {
        let mut reports = Vec::with_capacity(prepared.len());
        let mut pending: HashMap<usize, String> = HashMap::new();
        let semaphore = Arc::new(Semaphore::new(workers));
        let mut tasks = JoinSet::new();

        for (position, segment_id, result) in prepared {
            match result {
                Ok(Prepared::Encode(job)) => {
                    pending.insert(position, segment_id.clone());
                    let renderer = self.clone();
                    let semaphore = Arc::clone(&semaphore);
                    let reporter = reporter.clone();
                    tasks.spawn(async move {
                        let _permit = semaphore.acquire_owned().await;
                        reporter.started(position, &segment_id);
                        let result = renderer.encode_isolated(job).await;
                        (position, segment_id, result)
                    });
                }
                Ok(Prepared::Done(clip)) => {
                    reports.push(reporter.finished(position, segment_id, Ok(clip)));
                }
                Err(err) => reports.push(reporter.finished(position, segment_id, Err(err))),
            }
        }

        while let Some(joined) = tasks.join_next().await {
            let (position, segment_id, result) = match joined {
                Ok(done) => done,
                Err(err) => {
                    tracing::error!(error = %err, "Render task ended without a result");
                    continue;
                }
            };
            pending.remove(&position);

            let result = match result {
                Err(err) if err.is_fatal() => {
                    tasks.abort_all();
                    return Err(err);
                }
                other => other,
            };
            reports.push(reporter.finished(position, segment_id, result));
        }

        for (position, segment_id) in pending {
            let result = Err(LongformError::encode("render task ended without a result"));
            reports.push(reporter.finished(position, segment_id, result));
        }
        Ok(reports)
    }

    /// Encode on its own task so a panic becomes this segment's failure.
    async fn encode_isolated(&self, job: RenderJob) -> LongformResult<Clip> {
        let renderer = self.clone();
        let segment_id = job.segment_id.clone();
        let handle = tokio::spawn(async move { renderer.encode(job).await });
        let _abort = AbortOnDrop(handle.abort_handle());

        match handle.await {
            Ok(result) => result,
            Err(err) if err.is_panic() => Err(LongformError::encode(format!(
                "render of {segment_id} panicked"
            ))),
            Err(_) => Err(LongformError::encode(format!(
                "render of {segment_id} was cancelled"
            ))),
        }
    }

    fn prepare(
        &self,
        segment: &Segment,
        chapter: &Chapter,
        image: &Path,
        audio: &Path,
    ) -> LongformResult<Prepared> {
        let id = &segment.segment_id;
        let output = self.layout.clip_path(id);
        if let Some(clip) = existing_clip(id, &output) {
            return Ok(Prepared::Done(clip));
        }
        check_input(InputKind::Image, image)?;
        check_input(InputKind::Audio, audio)?;

        Ok(Prepared::Encode(RenderJob {
            segment_id: id.clone(),
            image: image.to_path_buf(),
            audio: audio.to_path_buf(),
            output,
            effects: segment.effects_in(chapter).to_vec(),
            music: self.music_for(chapter),
        }))
    }

    /// Background music for a chapter, when its track exists on disk.
    fn music_for(&self, chapter: &Chapter) -> Option<MusicBed> {
        let path = self.layout.music_path(chapter)?;
        if !path.exists() {
            tracing::warn!(
                chapter = %chapter.chapter_id,
                path = %path.display(),
                "Music track not found, rendering narration only"
            );
            return None;
        }
        Some(MusicBed {
            path,
            volume: chapter.music_volume.unwrap_or(self.defaults.music_volume),
        })
    }

    async fn encode(&self, job: RenderJob) -> LongformResult<Clip> {
        let probe = self.encoder.probe(&job.audio).await?;
        let spec = RenderSpec {
            segment_id: job.segment_id.clone(),
            image_path: job.image,
            audio_path: job.audio,
            output_path: job.output.clone(),
            effects: job.effects,
            music: job.music,
            padding_start_secs: self.defaults.padding_start_secs,
            padding_end_secs: self.defaults.padding_end_secs,
            narration_secs: probe.duration_secs,
        };

        let staged = StagedOutput::new(&job.output)?;
        let plan = build_segment_plan(&spec, &self.settings, staged.temp_path())?;
        tracing::info!(
            segment = %spec.segment_id,
            duration_secs = plan.duration_secs,
            effects = ?spec.effects,
            music = spec.music.is_some(),
            "Rendering segment"
        );

        self.encoder.render(&plan, None).await?;
        let path = staged.commit().await?;

        Ok(Clip {
            segment_id: spec.segment_id,
            path,
            status: ClipStatus::Created,
        })
    }
}

/// Emits batch events and turns results into reports.
#[derive(Clone)]
struct BatchReporter {
    total: usize,
    progress: Option<BatchProgressCallback>,
}

impl BatchReporter {
    fn started(&self, position: usize, segment_id: &str) {
        if let Some(cb) = &self.progress {
            cb(BatchEvent::Started {
                position,
                total: self.total,
                segment_id: segment_id.to_string(),
            });
        }
    }

    fn finished(
        &self,
        position: usize,
        segment_id: String,
        result: LongformResult<Clip>,
    ) -> SegmentReport {
        if let Err(err) = &result {
            tracing::warn!(segment = %segment_id, error = %err, "Segment not rendered");
        }
        let report = SegmentReport {
            position,
            segment_id,
            outcome: SegmentOutcome::from_result(result),
        };
        if let Some(cb) = &self.progress {
            cb(BatchEvent::Finished {
                total: self.total,
                report: report.clone(),
            });
        }
        report
    }
}

/// Aborts the spawned encode when the awaiting task is dropped.
struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn existing_clip(segment_id: &str, output: &Path) -> Option<Clip> {
    if !output.exists() {
        return None;
    }
    tracing::info!(segment = segment_id, path = %output.display(), "Clip exists, skipping");
    Some(Clip {
        segment_id: segment_id.to_string(),
        path: output.to_path_buf(),
        status: ClipStatus::Existing,
    })
}

fn check_input(kind: InputKind, path: &Path) -> LongformResult<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(LongformError::missing_input(kind, path))
    }
}
