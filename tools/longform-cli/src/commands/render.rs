//! Render every segment clip of a project.

use std::sync::Arc;

use longform_common::config::RenderDefaults;
use longform_project_model::Project;
use longform_render_engine::{BatchSummary, FfmpegEncoder, SegmentRenderer};

use super::ProjectArgs;

pub async fn run(args: ProjectArgs, defaults: RenderDefaults) -> anyhow::Result<()> {
    let project = args.load_project()?;
    let summary = render_all(&args, &project, defaults).await?;
    super::print_batch_summary(&summary);
    Ok(())
}

/// Render the batch; only a missing encoder is an error.
pub async fn render_all(
    args: &ProjectArgs,
    project: &Project,
    defaults: RenderDefaults,
) -> anyhow::Result<BatchSummary> {
    println!("Rendering project: {}", project.display_name());
    println!("  Segments: {}", project.segment_count());
    println!("  Workers:  {}", defaults.worker_count());
    println!();

    let encoder = Arc::new(FfmpegEncoder::new(&defaults));
    let renderer = SegmentRenderer::new(encoder, args.layout(), defaults);
    renderer
        .render_project(project, Some(super::batch_printer()))
        .await
        .map_err(|e| anyhow::anyhow!("Render failed: {e}"))
}
