//! Render all segments, then assemble.

use std::path::PathBuf;

use longform_common::config::RenderDefaults;

use super::ProjectArgs;

pub async fn run(
    args: ProjectArgs,
    output: Option<PathBuf>,
    defaults: RenderDefaults,
) -> anyhow::Result<()> {
    let project = args.load_project()?;
    let output = args.final_video_path(output);

    let summary = super::render::render_all(&args, &project, defaults.clone()).await?;
    super::print_batch_summary(&summary);

    if summary.clips().next().is_none() {
        println!("[WARN] No clips available, skipping assembly");
        return Ok(());
    }

    println!();
    let video =
        super::assemble::assemble_project(&args, Some(&project), &output, defaults).await?;
    super::assemble::print_final_video(&video);
    Ok(())
}
