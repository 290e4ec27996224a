//! Filter graph and argument construction for the encode engine.
//!
//! Input `0` is the looped still image, input `1` the narration, and the
//! optional input `2` the background music. The video branch ends in `[v]`,
//! the audio branch in `[a]`.

use std::path::{Path, PathBuf};

use longform_common::{secs_to_millis, LongformError, LongformResult, RenderDefaults};
use longform_motion::{
    resolve_sequence, MotionFunction, MotionPlan, CANVAS_FPS, CANVAS_HEIGHT, CANVAS_WIDTH,
};

/// Background music mixed under the narration.
#[derive(Debug, Clone, PartialEq)]
pub struct MusicBed {
    pub path: PathBuf,
    pub volume: f64,
}

/// Everything needed to encode one segment.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSpec {
    pub segment_id: String,
    pub image_path: PathBuf,
    pub audio_path: PathBuf,
    /// Final clip path.
    pub output_path: PathBuf,
    /// Effect ids in playback order; empty for a still frame.
    pub effects: Vec<String>,
    pub music: Option<MusicBed>,
    pub padding_start_secs: f64,
    pub padding_end_secs: f64,
    /// Probed narration length.
    pub narration_secs: f64,
}

impl RenderSpec {
    /// Narration plus both paddings.
    pub fn total_duration_secs(&self) -> f64 {
        self.narration_secs + self.padding_start_secs + self.padding_end_secs
    }
}

/// Canvas and codec parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeSettings {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub video_codec: String,
    pub audio_codec: String,
    pub crf: u8,
    pub preset: String,
    pub audio_bitrate: String,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self::from_defaults(&RenderDefaults::default())
    }
}

impl EncodeSettings {
    pub fn from_defaults(defaults: &RenderDefaults) -> Self {
        Self {
            width: CANVAS_WIDTH,
            height: CANVAS_HEIGHT,
            fps: CANVAS_FPS,
            video_codec: defaults.video_codec.clone(),
            audio_codec: defaults.audio_codec.clone(),
            crf: defaults.crf,
            preset: defaults.preset.clone(),
            audio_bitrate: defaults.audio_bitrate.clone(),
        }
    }

    pub fn codec_args(&self) -> Vec<String> {
        vec![
            "-c:v".to_string(),
            self.video_codec.clone(),
            "-preset".to_string(),
            self.preset.clone(),
            "-crf".to_string(),
            self.crf.to_string(),
            "-c:a".to_string(),
            self.audio_codec.clone(),
            "-b:a".to_string(),
            self.audio_bitrate.clone(),
            "-movflags".to_string(),
            "+faststart".to_string(),
        ]
    }
}

/// What an [`EncodePlan`] produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeKind {
    /// One segment clip from image and narration.
    Segment,
    /// Stream-copy concatenation of finished clips.
    Concat,
}

/// A fully specified encoder invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodePlan {
    pub kind: EncodeKind,
    /// Arguments, excluding the binary itself.
    pub args: Vec<String>,
    /// Path the encoder writes to.
    pub output_path: PathBuf,
    /// Expected output duration.
    pub duration_secs: f64,
    /// Expected output frame count (0 when unknown).
    pub total_frames: u64,
    pub filter_graph: Option<String>,
}

fn global_args() -> Vec<String> {
    [
        "-y",
        "-hide_banner",
        "-loglevel",
        "error",
        "-nostats",
        "-progress",
        "pipe:1",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Zoompan expression for one motion slice.
///
/// `on` counts output frames inside the slice, so `on/N` is the slice's
/// normalized time.
pub fn zoompan_expr(motion: &MotionFunction, settings: &EncodeSettings) -> String {
    let n = motion.total_frames;
    let size = format!("{}x{}", settings.width, settings.height);
    let fps = settings.fps;

    if motion.is_static() {
        return format!(
            "zoompan=z=1:d={n}:x='iw/2-(iw/zoom/2)':y='ih/2-(ih/zoom/2)':s={size}:fps={fps}"
        );
    }

    let c = motion.controls;
    format!(
        "zoompan=z='{sz}+({ez}-{sz})*on/{n}':x='iw*({sx}+({ex}-{sx})*on/{n})-iw/zoom/2':y='ih*({sy}+({ey}-{sy})*on/{n})-ih/zoom/2':d={n}:s={size}:fps={fps}",
        sz = c.start_zoom,
        ez = c.end_zoom,
        sx = c.start_x,
        ex = c.end_x,
        sy = c.start_y,
        ey = c.end_y,
    )
}

/// Video branch ending in `[v]`.
///
/// Multiple slices are rendered from one image frame each and concatenated
/// in order.
pub fn build_video_graph(plan: &MotionPlan, settings: &EncodeSettings) -> String {
    if let [only] = plan.slices.as_slice() {
        return format!("[0:v]{},format=yuv420p[v]", zoompan_expr(only, settings));
    }

    let k = plan.slices.len();
    let mut graph = String::new();
    graph.push_str("[0:v]trim=end_frame=1,split=");
    graph.push_str(&k.to_string());
    for i in 0..k {
        graph.push_str(&format!("[s{i}]"));
    }
    for (i, slice) in plan.slices.iter().enumerate() {
        graph.push_str(&format!(
            ";[s{i}]{zp},trim=end_frame={n},setpts=PTS-STARTPTS[m{i}]",
            zp = zoompan_expr(slice, settings),
            n = slice.total_frames,
        ));
    }
    graph.push(';');
    for i in 0..k {
        graph.push_str(&format!("[m{i}]"));
    }
    graph.push_str(&format!("concat=n={k}:v=1:a=0,format=yuv420p[v]"));
    graph
}

/// Audio branch ending in `[a]`.
///
/// The narration is delayed by the head padding and extended by the tail
/// padding; music loops underneath and never decides the length.
pub fn build_audio_graph(spec: &RenderSpec) -> String {
    let delay_ms = secs_to_millis(spec.padding_start_secs);
    let narration = format!(
        "[1:a]adelay={delay_ms}|{delay_ms},apad=pad_dur={pad}",
        pad = spec.padding_end_secs.max(0.0),
    );

    match &spec.music {
        None => format!("{narration}[a]"),
        Some(music) => format!(
            "{narration}[narration];[2:a]volume={vol},aloop=loop=-1:size=2e+09[music];[narration][music]amix=inputs=2:duration=first:dropout_transition=2[a]",
            vol = music.volume,
        ),
    }
}

/// Combined graph for one segment.
pub fn build_filter_graph(
    spec: &RenderSpec,
    motion: &MotionPlan,
    settings: &EncodeSettings,
) -> String {
    format!(
        "{};{}",
        build_video_graph(motion, settings),
        build_audio_graph(spec)
    )
}

/// Encoder invocation for one segment, writing to `write_to`.
pub fn build_segment_plan(
    spec: &RenderSpec,
    settings: &EncodeSettings,
    write_to: &Path,
) -> LongformResult<EncodePlan> {
    if !spec.narration_secs.is_finite() || spec.narration_secs <= 0.0 {
        return Err(LongformError::InvalidDuration {
            duration_secs: spec.narration_secs,
        });
    }

    let total = spec.total_duration_secs();
    let motion = resolve_sequence(spec.effects.as_slice(), total, settings.fps)?;
    let graph = build_filter_graph(spec, &motion, settings);

    let mut args = global_args();
    args.extend([
        "-loop".to_string(),
        "1".to_string(),
        "-i".to_string(),
        path_arg(&spec.image_path),
        "-i".to_string(),
        path_arg(&spec.audio_path),
    ]);
    if let Some(music) = &spec.music {
        args.push("-i".to_string());
        args.push(path_arg(&music.path));
    }
    args.extend([
        "-filter_complex".to_string(),
        graph.clone(),
        "-map".to_string(),
        "[v]".to_string(),
        "-map".to_string(),
        "[a]".to_string(),
        "-t".to_string(),
        format!("{total:.3}"),
    ]);
    args.extend(settings.codec_args());
    args.extend(["-f".to_string(), "mp4".to_string(), path_arg(write_to)]);

    Ok(EncodePlan {
        kind: EncodeKind::Segment,
        args,
        output_path: write_to.to_path_buf(),
        duration_secs: total,
        total_frames: motion.total_frames,
        filter_graph: Some(graph),
    })
}

/// Stream-copy concatenation of the clips listed in `list_path`.
pub fn build_concat_plan(list_path: &Path, write_to: &Path, duration_secs: f64) -> EncodePlan {
    let mut args = global_args();
    args.extend([
        "-f".to_string(),
        "concat".to_string(),
        "-safe".to_string(),
        "0".to_string(),
        "-i".to_string(),
        path_arg(list_path),
        "-c".to_string(),
        "copy".to_string(),
        "-movflags".to_string(),
        "+faststart".to_string(),
        "-f".to_string(),
        "mp4".to_string(),
        path_arg(write_to),
    ]);

    EncodePlan {
        kind: EncodeKind::Concat,
        args,
        output_path: write_to.to_path_buf(),
        duration_secs,
        total_frames: 0,
        filter_graph: None,
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}
