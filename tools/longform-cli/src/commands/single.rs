//! Render one image/narration pair.

use std::path::PathBuf;
use std::sync::Arc;

use longform_common::config::RenderDefaults;
use longform_project_model::ArtifactLayout;
use longform_render_engine::{
    ClipStatus, FfmpegEncoder, MediaEncoder, MusicBed, SegmentRenderer, SingleRender,
};

pub async fn run(
    image: PathBuf,
    audio: PathBuf,
    output: PathBuf,
    effects: Vec<String>,
    music: Option<PathBuf>,
    music_volume: Option<f64>,
    defaults: RenderDefaults,
) -> anyhow::Result<()> {
    let encoder = Arc::new(FfmpegEncoder::new(&defaults));
    if !encoder.is_available() {
        anyhow::bail!("ffmpeg/ffprobe not found. Install ffmpeg or set render.ffmpeg_path in the config.");
    }

    let volume = music_volume.unwrap_or(defaults.music_volume);
    if !volume.is_finite() || volume < 0.0 {
        anyhow::bail!("Music volume must be >= 0, got {volume}");
    }

    let dir = |p: &PathBuf| p.parent().map(PathBuf::from).unwrap_or_default();
    let layout = ArtifactLayout::new(dir(&image), dir(&audio), dir(&output));

    println!("Rendering {}", output.display());
    if effects.is_empty() {
        println!("  Motion: static");
    } else {
        println!("  Motion: {}", effects.join(" -> "));
    }

    let renderer = SegmentRenderer::new(encoder, layout, defaults);
    let clip = renderer
        .render_single(SingleRender {
            image,
            audio,
            output,
            effects,
            music: music.map(|path| MusicBed { path, volume }),
        })
        .await
        .map_err(|e| anyhow::anyhow!("Render failed: {e}"))?;

    match clip.status {
        ClipStatus::Created => println!("[OK] Clip created: {}", clip.path.display()),
        ClipStatus::Existing => println!("[OK] Clip already exists: {}", clip.path.display()),
    }
    Ok(())
}
