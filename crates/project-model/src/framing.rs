//! Camera framing over a still image.
//!
//! Focal coordinates are normalized to `[0.0, 1.0]`, zoom is a
//! magnification factor (`1.0` shows the whole image).

use serde::{Deserialize, Serialize};

/// Where the virtual camera looks and how far it is zoomed in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Framing {
    /// Magnification (1.0 = full frame).
    pub zoom: f64,
    /// Focal point, horizontal (normalized, 0.5 = center).
    pub x: f64,
    /// Focal point, vertical (normalized, 0.5 = center).
    pub y: f64,
}

impl Framing {
    /// Whole image, centered.
    pub const FULL: Framing = Framing {
        zoom: 1.0,
        x: 0.5,
        y: 0.5,
    };

    /// Create a framing, clamping values to the valid range.
    pub fn new(zoom: f64, x: f64, y: f64) -> Self {
        Self {
            zoom: zoom.clamp(1.0, 10.0),
            x: x.clamp(0.0, 1.0),
            y: y.clamp(0.0, 1.0),
        }
    }

    /// Linearly interpolate between two framings.
    ///
    /// `t` is clamped to `[0, 1]`; the endpoints are returned exactly.
    pub fn lerp(a: &Framing, b: &Framing, t: f64) -> Framing {
        Framing {
            zoom: mix(a.zoom, b.zoom, t),
            x: mix(a.x, b.x, t),
            y: mix(a.y, b.y, t),
        }
    }

    /// Fraction of each image axis visible at this zoom.
    pub fn visible_fraction(&self) -> f64 {
        1.0 / self.zoom
    }

    /// Top-left corner of the visible window in pixels of a
    /// `frame_w` x `frame_h` image.
    ///
    /// The focal point sits at the window center, so half of the zoomed
    /// window size is subtracted from the focal pixel.
    pub fn top_left_px(&self, frame_w: f64, frame_h: f64) -> (f64, f64) {
        (
            frame_w * self.x - frame_w / self.zoom / 2.0,
            frame_h * self.y - frame_h / self.zoom / 2.0,
        )
    }
}

/// Monotonic linear blend that hits both endpoints bit-for-bit.
pub fn mix(a: f64, b: f64, t: f64) -> f64 {
    if t.is_nan() || t <= 0.0 {
        return a;
    }
    if t >= 1.0 {
        return b;
    }
    (a + (b - a) * t).clamp(a.min(b), a.max(b))
}

impl Default for Framing {
    fn default() -> Self {
        Self::FULL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_full_framing_window_is_origin() {
        let (x, y) = Framing::FULL.top_left_px(1920.0, 1080.0);
        assert!(x.abs() < 1e-9);
        assert!(y.abs() < 1e-9);
        assert_eq!(Framing::FULL.visible_fraction(), 1.0);
    }

    #[test]
    fn test_zoomed_window_centers_on_focus() {
        let framing = Framing::new(2.0, 0.5, 0.5);
        let (x, y) = framing.top_left_px(1920.0, 1080.0);
        assert!((x - 480.0).abs() < 1e-9);
        assert!((y - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_new_clamps() {
        let framing = Framing::new(0.5, -1.0, 2.0);
        assert_eq!(framing.zoom, 1.0);
        assert_eq!(framing.x, 0.0);
        assert_eq!(framing.y, 1.0);
    }

    #[test]
    fn test_mix_endpoints_are_exact() {
        assert_eq!(mix(1.0, 1.3, 0.0), 1.0);
        assert_eq!(mix(1.0, 1.3, 1.0), 1.3);
        assert_eq!(mix(1.3, 1.0, 1.0), 1.0);
        assert_eq!(mix(1.0, 1.3, 2.0), 1.3);
        assert_eq!(mix(1.0, 1.3, -1.0), 1.0);
    }

    #[test]
    fn test_lerp_midpoint() {
        let a = Framing::new(1.0, 0.3, 0.5);
        let b = Framing::new(1.4, 0.7, 0.5);
        let mid = Framing::lerp(&a, &b, 0.5);
        assert!((mid.zoom - 1.2).abs() < 1e-9);
        assert!((mid.x - 0.5).abs() < 1e-9);
        assert_eq!(mid.y, 0.5);
    }

    proptest! {
        #[test]
        fn prop_mix_stays_between_endpoints(
            a in 0.5f64..2.0,
            b in 0.5f64..2.0,
            t in -1.0f64..2.0,
        ) {
            let v = mix(a, b, t);
            prop_assert!(v >= a.min(b) && v <= a.max(b));
        }
    }
}
