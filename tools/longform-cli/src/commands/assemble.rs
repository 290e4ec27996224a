//! Concatenate rendered clips into the final video.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use longform_common::config::RenderDefaults;
use longform_common::format_timestamp;
use longform_project_model::Project;
use longform_render_engine::{ClipOrder, FfmpegEncoder, FinalVideo, TimelineAssembler};

use super::ProjectArgs;

pub async fn run(
    args: ProjectArgs,
    output: Option<PathBuf>,
    lexicographic: bool,
    defaults: RenderDefaults,
) -> anyhow::Result<()> {
    let output = args.final_video_path(output);

    let project = if lexicographic {
        None
    } else if args.segments_path().exists() {
        Some(args.load_project()?)
    } else {
        println!(
            "[WARN] {} not found, ordering clips by file name",
            args.segments_path().display()
        );
        None
    };

    let video = assemble_project(&args, project.as_ref(), &output, defaults).await?;
    print_final_video(&video);
    Ok(())
}

pub async fn assemble_project(
    args: &ProjectArgs,
    project: Option<&Project>,
    output: &Path,
    defaults: RenderDefaults,
) -> anyhow::Result<FinalVideo> {
    let order = match project {
        Some(project) => ClipOrder::Declared(project),
        None => ClipOrder::Lexicographic,
    };

    println!("Assembling {}", output.display());
    let encoder = Arc::new(FfmpegEncoder::new(&defaults));
    let assembler = TimelineAssembler::new(encoder, args.layout(), &defaults);
    assembler
        .assemble(order, output)
        .await
        .map_err(|e| anyhow::anyhow!("Assembly failed: {e}"))
}

pub fn print_final_video(video: &FinalVideo) {
    println!();
    println!("[OK] Final video: {}", video.path.display());
    println!("  Clips:    {}", video.clip_count);
    println!("  Duration: {}", format_timestamp(video.total_duration_secs));

    if !video.markers.is_empty() {
        println!("  Chapters:");
        for marker in &video.markers {
            println!("    {} {}", marker.timestamp(), marker.title);
        }
    }
    if let Some(path) = &video.chapters_file {
        println!("  Chapter list: {}", path.display());
    }
    if !video.missing.is_empty() {
        println!("[WARN] {} clip(s) were missing and left out:", video.missing.len());
        for id in &video.missing {
            println!("  - {id}");
        }
    }
}
