pub mod assemble;
pub mod build;
pub mod check;
pub mod effects;
pub mod render;
pub mod single;
pub mod status;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use longform_common::config::RenderDefaults;
use longform_project_model::{ArtifactLayout, Project};
use longform_render_engine::{BatchEvent, BatchProgressCallback, BatchSummary, SegmentOutcome};

/// Name of the segments document inside a project directory.
pub const SEGMENTS_FILE: &str = "segments.json";

/// Default final video name inside a project directory.
pub const FINAL_VIDEO_FILE: &str = "final_video.mp4";

/// Where a project's document and artifacts live.
#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    /// Path to the project directory
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Segments document (defaults to <PATH>/segments.json)
    #[arg(long)]
    pub segments: Option<PathBuf>,

    /// Image directory (defaults to <PATH>/images)
    #[arg(long)]
    pub images_dir: Option<PathBuf>,

    /// Narration directory (defaults to <PATH>/audio)
    #[arg(long)]
    pub audio_dir: Option<PathBuf>,

    /// Clip directory (defaults to <PATH>/clips)
    #[arg(long)]
    pub clips_dir: Option<PathBuf>,

    /// Music directory (defaults to <PATH>/music)
    #[arg(long)]
    pub music_dir: Option<PathBuf>,
}

impl ProjectArgs {
    pub fn segments_path(&self) -> PathBuf {
        self.segments
            .clone()
            .unwrap_or_else(|| self.path.join(SEGMENTS_FILE))
    }

    pub fn final_video_path(&self, output: Option<PathBuf>) -> PathBuf {
        output.unwrap_or_else(|| self.path.join(FINAL_VIDEO_FILE))
    }

    pub fn layout(&self) -> ArtifactLayout {
        let mut layout = ArtifactLayout::for_project_dir(&self.path);
        if let Some(dir) = &self.images_dir {
            layout.images_dir = dir.clone();
        }
        if let Some(dir) = &self.audio_dir {
            layout.audio_dir = dir.clone();
        }
        if let Some(dir) = &self.clips_dir {
            layout.clips_dir = dir.clone();
        }
        if self.music_dir.is_some() {
            layout = layout.with_music_dir(self.music_dir.clone());
        }
        layout
    }

    pub fn load_project(&self) -> anyhow::Result<Project> {
        let path = self.segments_path();
        Project::load(&path)
            .map_err(|e| anyhow::anyhow!("Failed to load project from {}: {e}", path.display()))
    }
}

/// Render settings that can be overridden per invocation.
#[derive(Args, Debug, Clone, Default)]
pub struct RenderOverrides {
    /// Parallel segment renders
    #[arg(short = 'j', long)]
    pub workers: Option<usize>,

    /// Silence before narration (seconds)
    #[arg(long)]
    pub padding_start: Option<f64>,

    /// Silence after narration (seconds)
    #[arg(long)]
    pub padding_end: Option<f64>,

    /// Per-encode timeout in seconds (0 disables)
    #[arg(long)]
    pub timeout: Option<u64>,
}

impl RenderOverrides {
    pub fn apply(&self, defaults: &mut RenderDefaults) -> anyhow::Result<()> {
        if let Some(workers) = self.workers {
            defaults.max_parallel_renders = workers;
        }
        if let Some(secs) = self.padding_start {
            defaults.padding_start_secs = secs;
        }
        if let Some(secs) = self.padding_end {
            defaults.padding_end_secs = secs;
        }
        if let Some(secs) = self.timeout {
            defaults.render_timeout_secs = (secs > 0).then_some(secs);
        }
        defaults
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid render settings: {e}"))
    }
}

/// Prints a line when a segment starts encoding and when it finishes.
pub fn batch_printer() -> BatchProgressCallback {
    Arc::new(|event: BatchEvent| match event {
        BatchEvent::Started {
            position,
            total,
            segment_id,
        } => println!("[{position}/{total}] {segment_id} rendering..."),
        BatchEvent::Finished { total, report } => {
            println!(
                "[{}/{}] {} {}",
                report.position,
                total,
                report.segment_id,
                report.outcome.label()
            );
            match &report.outcome {
                SegmentOutcome::Missing { kind, path } => {
                    println!("      missing {kind}: {}", path.display());
                }
                SegmentOutcome::Failed { message } => println!("      {message}"),
                _ => {}
            }
        }
    })
}

pub fn print_batch_summary(summary: &BatchSummary) {
    println!();
    println!("Segments:  {}", summary.total());
    println!("  created: {}", summary.created());
    println!("  existing: {}", summary.existing());
    println!("  skipped: {}", summary.missing());
    println!("  failed:  {}", summary.failed());
    if summary.is_complete() {
        println!("All clips are ready.");
    } else {
        println!("Some clips are missing. Re-run once the inputs are fixed.");
    }
}
