//! Error types shared across Longform crates.

use std::path::PathBuf;

/// Kind of input artifact a segment depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    Image,
    Audio,
    Clip,
    Music,
    Project,
}

impl InputKind {
    pub fn as_str(self) -> &'static str {
        match self {
            InputKind::Image => "image",
            InputKind::Audio => "audio",
            InputKind::Clip => "clip",
            InputKind::Music => "music",
            InputKind::Project => "project",
        }
    }
}

impl std::fmt::Display for InputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level error type for Longform operations.
#[derive(Debug, thiserror::Error)]
pub enum LongformError {
    #[error("Missing dependency: {binary} not found")]
    MissingDependency { binary: String },

    #[error("Missing {kind}: {path}")]
    MissingInput { kind: InputKind, path: PathBuf },

    #[error("Invalid effect: {effect}")]
    InvalidEffect { effect: String },

    #[error("Invalid duration: {duration_secs}s")]
    InvalidDuration { duration_secs: f64 },

    #[error("Encode failed: {message}")]
    EncodeFailure { message: String },

    #[error("Probe failed for {path}: {message}")]
    Probe { path: PathBuf, message: String },

    #[error("Structural mismatch: {message}")]
    StructuralMismatch { message: String },

    #[error("Project error: {message}")]
    Project { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid review: {message}")]
    Review { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using LongformError.
pub type LongformResult<T> = Result<T, LongformError>;

impl LongformError {
    pub fn missing_dependency(binary: impl Into<String>) -> Self {
        Self::MissingDependency {
            binary: binary.into(),
        }
    }

    pub fn missing_input(kind: InputKind, path: impl Into<PathBuf>) -> Self {
        Self::MissingInput {
            kind,
            path: path.into(),
        }
    }

    pub fn invalid_effect(effect: impl Into<String>) -> Self {
        Self::InvalidEffect {
            effect: effect.into(),
        }
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::EncodeFailure {
            message: msg.into(),
        }
    }

    pub fn probe(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Probe {
            path: path.into(),
            message: msg.into(),
        }
    }

    pub fn structural(msg: impl Into<String>) -> Self {
        Self::StructuralMismatch {
            message: msg.into(),
        }
    }

    pub fn project(msg: impl Into<String>) -> Self {
        Self::Project {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn review(msg: impl Into<String>) -> Self {
        Self::Review {
            message: msg.into(),
        }
    }

    /// Whether a batch must stop when this error is seen.
    ///
    /// Only a missing encode engine aborts; everything else is per item.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::MissingDependency { .. })
    }
}
