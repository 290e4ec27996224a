//! Effect parameter resolution.
//!
//! An effect is resolved against a duration and frame rate into a
//! [`MotionFunction`]: zoom and focal point as linear functions of
//! normalized time `t = frame / total_frames`.

use longform_common::{frames_for, LongformError, LongformResult};
use longform_project_model::effect::{EffectControls, MotionEffect};
use longform_project_model::framing::{mix, Framing};
use longform_project_model::project::{Chapter, Segment};
use serde::Serialize;

/// Output canvas width in pixels.
pub const CANVAS_WIDTH: u32 = 1920;
/// Output canvas height in pixels.
pub const CANVAS_HEIGHT: u32 = 1080;
/// Output frame rate.
pub const CANVAS_FPS: u32 = 30;

/// Zoom and focal point over the course of one effect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MotionFunction {
    /// The effect this was resolved from; `None` for a still frame.
    pub effect: Option<MotionEffect>,
    pub controls: EffectControls,
    pub total_frames: u64,
}

impl MotionFunction {
    /// Full frame without motion for `total_frames` frames.
    pub fn still(total_frames: u64) -> Self {
        Self {
            effect: None,
            controls: EffectControls::STATIC,
            total_frames,
        }
    }

    pub fn for_effect(effect: MotionEffect, total_frames: u64) -> Self {
        Self {
            effect: Some(effect),
            controls: effect.controls(),
            total_frames,
        }
    }

    pub fn zoom(&self, t: f64) -> f64 {
        mix(self.controls.start_zoom, self.controls.end_zoom, t)
    }

    pub fn x(&self, t: f64) -> f64 {
        mix(self.controls.start_x, self.controls.end_x, t)
    }

    pub fn y(&self, t: f64) -> f64 {
        mix(self.controls.start_y, self.controls.end_y, t)
    }

    /// Framing at normalized time `t` (clamped to `[0, 1]`).
    pub fn at(&self, t: f64) -> Framing {
        Framing {
            zoom: self.zoom(t),
            x: self.x(t),
            y: self.y(t),
        }
    }

    /// Normalized time of a frame index.
    pub fn t_at_frame(&self, frame: u64) -> f64 {
        if self.total_frames == 0 {
            return 0.0;
        }
        (frame as f64 / self.total_frames as f64).clamp(0.0, 1.0)
    }

    pub fn at_frame(&self, frame: u64) -> Framing {
        self.at(self.t_at_frame(frame))
    }

    /// Top-left corner of the visible window at `t` on a `w` x `h` image.
    pub fn viewport_px(&self, t: f64, w: f64, h: f64) -> (f64, f64) {
        self.at(t).top_left_px(w, h)
    }

    pub fn is_static(&self) -> bool {
        self.controls.is_static()
    }

    /// Display name: the effect id or `static`.
    pub fn label(&self) -> &'static str {
        self.effect.map(MotionEffect::as_str).unwrap_or("static")
    }

    pub fn duration_secs(&self, fps: u32) -> f64 {
        if fps == 0 {
            return 0.0;
        }
        self.total_frames as f64 / fps as f64
    }
}

/// Effects played back to back, each owning a contiguous frame slice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MotionPlan {
    pub slices: Vec<MotionFunction>,
    pub total_frames: u64,
}

impl MotionPlan {
    pub fn still(total_frames: u64) -> Self {
        Self {
            slices: vec![MotionFunction::still(total_frames)],
            total_frames,
        }
    }

    /// A single still slice.
    pub fn is_static(&self) -> bool {
        self.slices.len() == 1 && self.slices[0].is_static()
    }

    pub fn frame_counts(&self) -> Vec<u64> {
        self.slices.iter().map(|s| s.total_frames).collect()
    }

    /// Framing at a frame index of the whole plan.
    pub fn at_frame(&self, frame: u64) -> Framing {
        let mut start = 0;
        for slice in &self.slices {
            if frame < start + slice.total_frames {
                return slice.at_frame(frame - start);
            }
            start += slice.total_frames;
        }
        self.slices
            .last()
            .map(|s| s.at(1.0))
            .unwrap_or(Framing::FULL)
    }
}

fn check_duration(duration_secs: f64, fps: u32) -> LongformResult<u64> {
    if !duration_secs.is_finite() || duration_secs <= 0.0 || fps == 0 {
        return Err(LongformError::InvalidDuration { duration_secs });
    }
    let frames = frames_for(duration_secs, fps);
    if frames == 0 {
        return Err(LongformError::InvalidDuration { duration_secs });
    }
    Ok(frames)
}

/// Look up an effect id. Unknown ids degrade to a still frame with a warning.
fn lookup(effect_id: &str) -> Option<MotionEffect> {
    let effect = MotionEffect::parse(effect_id);
    if effect.is_none() {
        let err = LongformError::invalid_effect(effect_id);
        tracing::warn!(error = %err, "falling back to a still frame");
    }
    effect
}

/// Resolve one effect over `duration_secs` at `fps`.
///
/// Fails with `InvalidDuration` when the duration is not positive and
/// finite, `fps` is zero, or the duration covers no whole frame.
pub fn resolve(effect_id: &str, duration_secs: f64, fps: u32) -> LongformResult<MotionFunction> {
    let total_frames = check_duration(duration_secs, fps)?;
    Ok(match lookup(effect_id) {
        Some(effect) => MotionFunction::for_effect(effect, total_frames),
        None => MotionFunction::still(total_frames),
    })
}

/// Resolve a sequence of effects sharing one duration.
///
/// Slice `i` of `k` gets `floor(N*(i+1)/k) - floor(N*i/k)` frames, so the
/// slices add up to exactly `N`. An empty sequence is a still frame.
pub fn resolve_sequence<S: AsRef<str>>(
    effect_ids: &[S],
    duration_secs: f64,
    fps: u32,
) -> LongformResult<MotionPlan> {
    let total_frames = check_duration(duration_secs, fps)?;
    if effect_ids.is_empty() {
        return Ok(MotionPlan::still(total_frames));
    }

    let k = effect_ids.len() as u64;
    let boundary = |i: u64| total_frames * i / k;
    let mut slices = Vec::with_capacity(effect_ids.len());
    for (i, id) in effect_ids.iter().enumerate() {
        let i = i as u64;
        let frames = boundary(i + 1) - boundary(i);
        if frames == 0 {
            return Err(LongformError::InvalidDuration { duration_secs });
        }
        slices.push(match lookup(id.as_ref()) {
            Some(effect) => MotionFunction::for_effect(effect, frames),
            None => MotionFunction::still(frames),
        });
    }

    tracing::debug!(
        effects = effect_ids.len(),
        total_frames,
        "resolved motion sequence"
    );

    Ok(MotionPlan {
        slices,
        total_frames,
    })
}

/// Resolve the motion for a segment inside its chapter.
///
/// Chapters with motion disabled and segments without effects get a still
/// frame.
pub fn resolve_segment(
    segment: &Segment,
    chapter: &Chapter,
    duration_secs: f64,
    fps: u32,
) -> LongformResult<MotionPlan> {
    resolve_sequence(segment.effects_in(chapter), duration_secs, fps)
}
