//! Encode engine interface and the ffmpeg backend.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use longform_common::{InputKind, LongformError, LongformResult, RenderDefaults};
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;

use crate::filter_graph::EncodePlan;

/// Install locations searched when a binary is not on `PATH`.
pub const COMMON_BIN_DIRS: [&str; 3] = ["/opt/homebrew/bin", "/usr/local/bin", "/usr/bin"];

/// Progress callback for a single encoder invocation.
pub type EncodeProgressCallback = Arc<dyn Fn(EncodeProgress) + Send + Sync>;

/// Encode progress report.
#[derive(Debug, Clone)]
pub struct EncodeProgress {
    /// Current progress [0.0, 1.0].
    pub progress: f64,

    /// Frames rendered so far.
    pub frames_rendered: u64,

    /// Total frames to render.
    pub total_frames: u64,

    /// Estimated time remaining in seconds.
    pub eta_secs: f64,

    pub stage: EncodeStage,
}

/// Stages of one encoder invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeStage {
    Encoding,
    Finalizing,
    Complete,
}

/// A file written by the encoder.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipHandle {
    pub path: PathBuf,
    pub duration_secs: f64,
    pub elapsed: Duration,
}

/// First video stream of a probed file.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoStream {
    pub codec: String,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

impl VideoStream {
    /// Human-readable difference from `other`, or `None` when the layouts
    /// can be stream-copied together.
    pub fn mismatch(&self, other: &VideoStream) -> Option<String> {
        if self.codec != other.codec {
            return Some(format!("codec {} != {}", other.codec, self.codec));
        }
        if self.width != other.width || self.height != other.height {
            return Some(format!(
                "resolution {}x{} != {}x{}",
                other.width, other.height, self.width, self.height
            ));
        }
        if (self.fps - other.fps).abs() > 0.01 {
            return Some(format!("frame rate {:.3} != {:.3}", other.fps, self.fps));
        }
        None
    }
}

/// Result of probing a media file.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaProbe {
    pub duration_secs: f64,
    pub video: Option<VideoStream>,
}

/// Trait for encode engines (ffmpeg, test doubles).
#[async_trait]
pub trait MediaEncoder: Send + Sync {
    /// Backend name.
    fn name(&self) -> &str;

    /// Check if this backend is usable on the system.
    fn is_available(&self) -> bool;

    /// Execute an encode plan, writing `plan.output_path`.
    async fn render(
        &self,
        plan: &EncodePlan,
        progress: Option<EncodeProgressCallback>,
    ) -> LongformResult<ClipHandle>;

    /// Read duration and stream layout of a media file.
    async fn probe(&self, path: &Path) -> LongformResult<MediaProbe>;
}

/// Find `binary`: an explicit path wins, then `PATH`, then common
/// install locations.
pub fn locate_binary(binary: &str, configured: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = configured {
        if path.is_file() {
            return Some(path.to_path_buf());
        }
        tracing::warn!(path = %path.display(), binary, "Configured binary not found");
        return None;
    }

    if let Ok(path) = which::which(binary) {
        return Some(path);
    }

    COMMON_BIN_DIRS
        .iter()
        .map(|dir| Path::new(dir).join(binary))
        .find(|candidate| candidate.is_file())
}

/// Encoder backed by the `ffmpeg` and `ffprobe` binaries.
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    ffmpeg: Option<PathBuf>,
    ffprobe: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl FfmpegEncoder {
    pub fn new(defaults: &RenderDefaults) -> Self {
        Self {
            ffmpeg: locate_binary("ffmpeg", defaults.ffmpeg_path.as_deref()),
            ffprobe: locate_binary("ffprobe", defaults.ffprobe_path.as_deref()),
            timeout: defaults.render_timeout_secs.map(Duration::from_secs),
        }
    }

    pub fn ffmpeg_path(&self) -> Option<&Path> {
        self.ffmpeg.as_deref()
    }

    pub fn ffprobe_path(&self) -> Option<&Path> {
        self.ffprobe.as_deref()
    }

    async fn run_ffmpeg(
        &self,
        binary: &Path,
        plan: &EncodePlan,
        progress: Option<EncodeProgressCallback>,
    ) -> LongformResult<()> {
        tracing::debug!(args = ?plan.args, "Running ffmpeg");
        let mut child = Command::new(binary)
            .args(&plan.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| LongformError::encode(format!("Failed to start ffmpeg: {e}")))?;

        tracing::debug!(
            pid = child.id(),
            args_len = plan.args.len(),
            total_frames = plan.total_frames,
            "ffmpeg process started"
        );

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| LongformError::encode("Failed to capture ffmpeg stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| LongformError::encode("Failed to capture ffmpeg stderr"))?;

        // Drain stderr concurrently so ffmpeg never blocks on a full pipe.
        let stderr_task = tokio::spawn(async move {
            let mut reader = BufReader::new(stderr);
            let mut output = String::new();
            match reader.read_to_string(&mut output).await {
                Ok(_) => output,
                Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
            }
        });

        let start = Instant::now();
        let drive = async {
            let mut lines = BufReader::new(stdout).lines();
            let mut latest = ProgressState::default();
            let mut last_progress_secs = 0.0f64;
            let mut last_progress_wall = Instant::now();

            while let Some(line) = lines.next_line().await? {
                let Some((key, value)) = line.trim().split_once('=') else {
                    continue;
                };
                latest.update(key, value);
                if key != "progress" {
                    continue;
                }
                if latest.out_time_secs > last_progress_secs + 0.001 {
                    last_progress_secs = latest.out_time_secs;
                    last_progress_wall = Instant::now();
                }
                if let Some(cb) = &progress {
                    cb(progress_report(
                        &latest,
                        plan.total_frames,
                        plan.duration_secs,
                        start.elapsed().as_secs_f64(),
                    ));
                }
                if last_progress_wall.elapsed().as_secs() >= 10 {
                    tracing::warn!(
                        out_time_secs = latest.out_time_secs,
                        elapsed_secs = start.elapsed().as_secs_f64(),
                        "No ffmpeg progress advancement for 10s"
                    );
                    last_progress_wall = Instant::now();
                }
            }
            let status = child.wait().await?;
            Ok::<_, std::io::Error>(status)
        };

        let waited = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, drive).await.ok(),
            None => Some(drive.await),
        };

        let status = match waited {
            Some(result) => {
                result.map_err(|e| LongformError::encode(format!("Failed to wait on ffmpeg: {e}")))?
            }
            None => {
                let secs = self.timeout.map(|d| d.as_secs()).unwrap_or_default();
                tracing::warn!(timeout_secs = secs, "ffmpeg timed out, killing process");
                child.kill().await.ok();
                stderr_task.abort();
                return Err(LongformError::encode(format!(
                    "ffmpeg timed out after {secs}s"
                )));
            }
        };

        let stderr_output = stderr_task
            .await
            .unwrap_or_else(|_| "<failed to join stderr reader>".to_string());

        if !status.success() {
            return Err(LongformError::encode(format!(
                "ffmpeg failed (status {}): {}",
                status,
                stderr_output.trim()
            )));
        }

        if let Some(cb) = &progress {
            cb(EncodeProgress {
                progress: 1.0,
                frames_rendered: plan.total_frames,
                total_frames: plan.total_frames,
                eta_secs: 0.0,
                stage: EncodeStage::Complete,
            });
        }

        Ok(())
    }
}

#[async_trait]
impl MediaEncoder for FfmpegEncoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    fn is_available(&self) -> bool {
        self.ffmpeg.is_some() && self.ffprobe.is_some()
    }

    async fn render(
        &self,
        plan: &EncodePlan,
        progress: Option<EncodeProgressCallback>,
    ) -> LongformResult<ClipHandle> {
        let binary = self
            .ffmpeg
            .as_deref()
            .ok_or_else(|| LongformError::missing_dependency("ffmpeg"))?;

        let started = Instant::now();
        self.run_ffmpeg(binary, plan, progress).await?;

        let written = tokio::fs::metadata(&plan.output_path)
            .await
            .map(|m| m.len())
            .unwrap_or(0);
        if written == 0 {
            return Err(LongformError::encode(format!(
                "ffmpeg produced no output at {}",
                plan.output_path.display()
            )));
        }

        tracing::debug!(
            output = %plan.output_path.display(),
            elapsed_secs = started.elapsed().as_secs_f64(),
            "ffmpeg finished"
        );

        Ok(ClipHandle {
            path: plan.output_path.clone(),
            duration_secs: plan.duration_secs,
            elapsed: started.elapsed(),
        })
    }

    async fn probe(&self, path: &Path) -> LongformResult<MediaProbe> {
        let binary = self
            .ffprobe
            .as_deref()
            .ok_or_else(|| LongformError::missing_dependency("ffprobe"))?;

        if !path.exists() {
            return Err(LongformError::missing_input(InputKind::Clip, path));
        }

        let output = Command::new(binary)
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| LongformError::probe(path, format!("failed to start ffprobe: {e}")))?;

        if !output.status.success() {
            return Err(LongformError::probe(
                path,
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        parse_probe_output(path, &output.stdout)
    }
}

/// ffprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    duration: Option<String>,
}

fn parse_probe_output(path: &Path, stdout: &[u8]) -> LongformResult<MediaProbe> {
    let probe: FfprobeOutput = serde_json::from_slice(stdout)
        .map_err(|e| LongformError::probe(path, format!("unreadable ffprobe output: {e}")))?;

    let stream_duration = probe
        .streams
        .iter()
        .find_map(|s| s.duration.as_deref().and_then(|d| d.parse::<f64>().ok()));
    let duration_secs = probe
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .and_then(|d| d.parse::<f64>().ok())
        .or(stream_duration)
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| LongformError::probe(path, "no duration reported"))?;

    let video = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .map(|s| VideoStream {
            codec: s.codec_name.clone().unwrap_or_default(),
            width: s.width.unwrap_or(0),
            height: s.height.unwrap_or(0),
            fps: s
                .r_frame_rate
                .as_deref()
                .and_then(parse_frame_rate)
                .unwrap_or(0.0),
        });

    Ok(MediaProbe {
        duration_secs,
        video,
    })
}

/// Parse a frame rate string (`"30/1"`, `"30000/1001"`, or `"29.97"`).
pub fn parse_frame_rate(s: &str) -> Option<f64> {
    if let Some((num, den)) = s.split_once('/') {
        let num: f64 = num.trim().parse().ok()?;
        let den: f64 = den.trim().parse().ok()?;
        if den > 0.0 {
            return Some(num / den);
        }
        return None;
    }
    s.trim().parse().ok()
}

#[derive(Debug, Default)]
struct ProgressState {
    out_time_secs: f64,
    complete: bool,
}

impl ProgressState {
    fn update(&mut self, key: &str, value: &str) {
        match key {
            // ffmpeg reports microseconds under both keys.
            "out_time_ms" | "out_time_us" => {
                if let Ok(us) = value.parse::<f64>() {
                    self.out_time_secs = us / 1_000_000.0;
                }
            }
            "progress" => {
                self.complete = value == "end";
            }
            _ => {}
        }
    }
}

fn progress_report(
    state: &ProgressState,
    total_frames: u64,
    expected_duration_secs: f64,
    elapsed_secs: f64,
) -> EncodeProgress {
    let progress = if expected_duration_secs <= 0.0 {
        0.0
    } else {
        (state.out_time_secs / expected_duration_secs).clamp(0.0, 1.0)
    };

    let frames_rendered = (progress * total_frames as f64).round() as u64;
    let eta_secs = if progress > 0.0 {
        (elapsed_secs / progress) - elapsed_secs
    } else {
        0.0
    }
    .max(0.0);

    EncodeProgress {
        progress: if state.complete { 1.0 } else { progress },
        frames_rendered,
        total_frames,
        eta_secs,
        stage: if state.complete {
            EncodeStage::Finalizing
        } else {
            EncodeStage::Encoding
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter_graph::EncodeKind;

    /// Encoder whose "ffmpeg" is an arbitrary system binary.
    fn encoder_running(binary: &str, timeout_secs: Option<u64>) -> Option<FfmpegEncoder> {
        let path = which::which(binary).ok()?;
        Some(FfmpegEncoder::new(&RenderDefaults {
            ffmpeg_path: Some(path.clone()),
            ffprobe_path: Some(path),
            render_timeout_secs: timeout_secs,
            ..RenderDefaults::default()
        }))
    }

    fn plan_with_args(name: &str, args: &[&str]) -> EncodePlan {
        EncodePlan {
            kind: EncodeKind::Segment,
            args: args.iter().map(|a| a.to_string()).collect(),
            output_path: std::env::temp_dir().join(format!("longform_test_{name}.mp4")),
            duration_secs: 1.0,
            total_frames: 30,
            filter_graph: None,
        }
    }

    #[tokio::test]
    async fn test_hung_encoder_is_killed_at_timeout() {
        let Some(encoder) = encoder_running("sleep", Some(1)) else {
            return;
        };
        let plan = plan_with_args("hung", &["30"]);

        let started = Instant::now();
        let err = encoder.render(&plan, None).await.unwrap_err();

        assert!(started.elapsed() < Duration::from_secs(10));
        assert!(matches!(err, LongformError::EncodeFailure { .. }));
        assert!(err.to_string().contains("timed out after 1s"), "{err}");
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn test_nonzero_exit_reports_status_and_stderr() {
        let Some(encoder) = encoder_running("sh", Some(30)) else {
            return;
        };
        let plan = plan_with_args("exit3", &["-c", "echo boom >&2; exit 3"]);

        let err = encoder.render(&plan, None).await.unwrap_err();

        assert!(matches!(err, LongformError::EncodeFailure { .. }));
        let message = err.to_string();
        assert!(message.contains("ffmpeg failed"), "{message}");
        assert!(message.contains("boom"), "{message}");
        assert!(!plan.output_path.exists());
    }

    #[tokio::test]
    async fn test_clean_exit_without_output_is_a_failure() {
        let Some(encoder) = encoder_running("true", None) else {
            return;
        };
        let plan = plan_with_args("no_output", &[]);

        let err = encoder.render(&plan, None).await.unwrap_err();
        assert!(err.to_string().contains("produced no output"), "{err}");
    }

    #[test]
    fn test_parse_frame_rate() {
        assert!((parse_frame_rate("30/1").unwrap() - 30.0).abs() < 0.01);
        assert!((parse_frame_rate("30000/1001").unwrap() - 29.97).abs() < 0.01);
        assert!((parse_frame_rate("29.97").unwrap() - 29.97).abs() < 0.01);
        assert_eq!(parse_frame_rate("0/0"), None);
        assert_eq!(parse_frame_rate("abc"), None);
    }

    #[test]
    fn test_parse_probe_output_reads_video_stream() {
        let json = br#"{
            "streams": [
                {"codec_type": "audio", "codec_name": "aac"},
                {"codec_type": "video", "codec_name": "h264", "width": 1920, "height": 1080, "r_frame_rate": "30/1"}
            ],
            "format": {"duration": "11.033000"}
        }"#;
        let probe = parse_probe_output(Path::new("a.mp4"), json).unwrap();
        assert!((probe.duration_secs - 11.033).abs() < 1e-9);
        let video = probe.video.unwrap();
        assert_eq!(video.codec, "h264");
        assert_eq!((video.width, video.height), (1920, 1080));
        assert_eq!(video.fps, 30.0);
    }

    #[test]
    fn test_parse_probe_output_audio_only() {
        let json = br#"{"streams": [{"codec_type": "audio", "duration": "4.5"}], "format": {}}"#;
        let probe = parse_probe_output(Path::new("a.mp3"), json).unwrap();
        assert_eq!(probe.duration_secs, 4.5);
        assert!(probe.video.is_none());
    }

    #[test]
    fn test_parse_probe_output_without_duration_fails() {
        let json = br#"{"streams": [], "format": {}}"#;
        let err = parse_probe_output(Path::new("a.mp3"), json).unwrap_err();
        assert!(matches!(err, LongformError::Probe { .. }));
    }

    #[test]
    fn test_stream_mismatch_descriptions() {
        let base = VideoStream {
            codec: "h264".to_string(),
            width: 1920,
            height: 1080,
            fps: 30.0,
        };
        assert_eq!(base.mismatch(&base.clone()), None);

        let hevc = VideoStream {
            codec: "hevc".to_string(),
            ..base.clone()
        };
        assert!(base.mismatch(&hevc).unwrap().starts_with("codec"));

        let small = VideoStream {
            width: 1280,
            height: 720,
            ..base.clone()
        };
        assert!(base.mismatch(&small).unwrap().starts_with("resolution"));

        let ntsc = VideoStream {
            fps: 29.97,
            ..base.clone()
        };
        assert!(base.mismatch(&ntsc).unwrap().starts_with("frame rate"));
    }

    #[test]
    fn test_progress_report_tracks_out_time() {
        let mut state = ProgressState::default();
        state.update("out_time_us", "5000000");
        let report = progress_report(&state, 300, 10.0, 2.0);
        assert!((report.progress - 0.5).abs() < 1e-9);
        assert_eq!(report.frames_rendered, 150);
        assert!((report.eta_secs - 2.0).abs() < 1e-9);
        assert_eq!(report.stage, EncodeStage::Encoding);

        state.update("progress", "end");
        assert_eq!(progress_report(&state, 300, 10.0, 4.0).stage, EncodeStage::Finalizing);
    }

    #[test]
    fn test_configured_binary_must_exist() {
        let missing = Path::new("/nonexistent/longform/ffmpeg");
        assert_eq!(locate_binary("ffmpeg", Some(missing)), None);
    }

    #[tokio::test]
    async fn test_encoder_without_binaries_reports_missing_dependency() {
        let defaults = RenderDefaults {
            ffmpeg_path: Some(PathBuf::from("/nonexistent/ffmpeg")),
            ffprobe_path: Some(PathBuf::from("/nonexistent/ffprobe")),
            ..RenderDefaults::default()
        };
        let encoder = FfmpegEncoder::new(&defaults);
        assert!(!encoder.is_available());

        let err = encoder.probe(Path::new("x.mp3")).await.unwrap_err();
        assert!(err.is_fatal());
    }
}
