//! Check encoder availability and configuration.

use std::path::PathBuf;

use longform_common::config::{config_file_path, RenderDefaults};
use longform_render_engine::locate_binary;

pub fn run(config: Option<PathBuf>, defaults: RenderDefaults) -> anyhow::Result<()> {
    println!("Longform System Check");
    println!("{}", "=".repeat(50));

    let ffmpeg = locate_binary("ffmpeg", defaults.ffmpeg_path.as_deref());
    let ffprobe = locate_binary("ffprobe", defaults.ffprobe_path.as_deref());
    for (name, found) in [("ffmpeg", &ffmpeg), ("ffprobe", &ffprobe)] {
        match found {
            Some(path) => println!("[OK] {name}: {}", path.display()),
            None => println!("[WARN] {name}: not found on PATH or in common install locations"),
        }
    }

    let config_path = config.unwrap_or_else(config_file_path);
    if config_path.exists() {
        println!("[OK] Config: {}", config_path.display());
    } else {
        println!("[OK] Config: defaults (no file at {})", config_path.display());
    }

    match defaults.validate() {
        Ok(()) => println!("[OK] Render settings valid"),
        Err(e) => println!("[WARN] Render settings: {e}"),
    }
    println!(
        "     {} / {} crf {} preset {}, padding {:.2}s + {:.2}s, music {:.2}, workers {}",
        defaults.video_codec,
        defaults.audio_codec,
        defaults.crf,
        defaults.preset,
        defaults.padding_start_secs,
        defaults.padding_end_secs,
        defaults.music_volume,
        defaults.worker_count()
    );
    match defaults.render_timeout_secs {
        Some(secs) => println!("     timeout {secs}s per encode"),
        None => println!("     no encode timeout"),
    }

    println!();
    if ffmpeg.is_some() && ffprobe.is_some() {
        println!("Encoder is available. Longform is ready.");
    } else {
        println!("Install ffmpeg (which provides ffprobe) or set render.ffmpeg_path / render.ffprobe_path.");
    }
    Ok(())
}
