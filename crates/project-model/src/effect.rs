//! Named camera motion effects and their control values.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The fixed set of camera motions a segment may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionEffect {
    ZoomIn,
    ZoomOut,
    PanLeft,
    PanRight,
    PanUp,
    PanDown,
}

/// Start and end framing for an effect.
///
/// Coordinates are normalized focal points: `0.5` is the frame center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectControls {
    pub start_zoom: f64,
    pub end_zoom: f64,
    pub start_x: f64,
    pub end_x: f64,
    pub start_y: f64,
    pub end_y: f64,
}

impl EffectControls {
    /// Full frame, no motion.
    pub const STATIC: EffectControls = EffectControls {
        start_zoom: 1.0,
        end_zoom: 1.0,
        start_x: 0.5,
        end_x: 0.5,
        start_y: 0.5,
        end_y: 0.5,
    };

    /// Whether start and end framing are identical.
    pub fn is_static(&self) -> bool {
        self.start_zoom == self.end_zoom && self.start_x == self.end_x && self.start_y == self.end_y
    }
}

impl MotionEffect {
    pub const ALL: [MotionEffect; 6] = [
        MotionEffect::ZoomIn,
        MotionEffect::ZoomOut,
        MotionEffect::PanLeft,
        MotionEffect::PanRight,
        MotionEffect::PanUp,
        MotionEffect::PanDown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MotionEffect::ZoomIn => "zoom_in",
            MotionEffect::ZoomOut => "zoom_out",
            MotionEffect::PanLeft => "pan_left",
            MotionEffect::PanRight => "pan_right",
            MotionEffect::PanUp => "pan_up",
            MotionEffect::PanDown => "pan_down",
        }
    }

    /// Parse an identifier; `zoom-in`, `zoom_in`, and `ZoomIn`-style case
    /// differences are all accepted.
    pub fn parse(id: &str) -> Option<Self> {
        let normalized = id.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|effect| effect.as_str() == normalized)
    }

    pub fn controls(self) -> EffectControls {
        match self {
            MotionEffect::ZoomIn => EffectControls {
                start_zoom: 1.0,
                end_zoom: 1.3,
                ..EffectControls::STATIC
            },
            MotionEffect::ZoomOut => EffectControls {
                start_zoom: 1.3,
                end_zoom: 1.0,
                ..EffectControls::STATIC
            },
            MotionEffect::PanLeft => EffectControls {
                start_zoom: 1.2,
                end_zoom: 1.2,
                start_x: 0.7,
                end_x: 0.3,
                ..EffectControls::STATIC
            },
            MotionEffect::PanRight => EffectControls {
                start_zoom: 1.2,
                end_zoom: 1.2,
                start_x: 0.3,
                end_x: 0.7,
                ..EffectControls::STATIC
            },
            MotionEffect::PanUp => EffectControls {
                start_zoom: 1.2,
                end_zoom: 1.2,
                start_y: 0.7,
                end_y: 0.3,
                ..EffectControls::STATIC
            },
            MotionEffect::PanDown => EffectControls {
                start_zoom: 1.2,
                end_zoom: 1.2,
                start_y: 0.3,
                end_y: 0.7,
                ..EffectControls::STATIC
            },
        }
    }
}

impl fmt::Display for MotionEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when an identifier does not name a known effect.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown motion effect {0:?}")]
pub struct UnknownEffect(pub String);

impl FromStr for MotionEffect {
    type Err = UnknownEffect;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| UnknownEffect(s.to_string()))
    }
}
