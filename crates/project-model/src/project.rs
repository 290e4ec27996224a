//! Project, chapter, and segment types.
//!
//! A project is the declarative description of a narrated video: an ordered
//! list of chapters, each an ordered list of segments. It is produced
//! upstream (script writing, prompt generation) and is read-only here.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

/// Default narration voice when the project does not name one.
pub const DEFAULT_VOICE: &str = "en-US-DavisNeural";

/// Top-level project document (`segments.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Human-readable project name.
    #[serde(default)]
    pub project_name: Option<String>,

    /// Narration voice used by the speech synthesizer.
    #[serde(default = "default_voice")]
    pub voice: String,

    /// Visual style hint used by the image generator.
    #[serde(default)]
    pub visual_style: Option<String>,

    /// Chapters in playback order.
    #[serde(default)]
    pub chapters: Vec<Chapter>,
}

/// An ordered group of segments sharing music and effect settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    /// Chapter identifier (string or number in the source document).
    #[serde(deserialize_with = "deserialize_id")]
    pub chapter_id: String,

    /// Display title used for chapter markers.
    #[serde(default)]
    pub title: Option<String>,

    /// Segments in playback order.
    #[serde(default)]
    pub segments: Vec<Segment>,

    /// Background music file name, relative to the music directory.
    #[serde(default)]
    pub music_track: Option<String>,

    /// Background music gain for this chapter.
    #[serde(default)]
    pub music_volume: Option<f64>,

    /// Master switch for camera motion in this chapter.
    #[serde(default = "default_true")]
    pub ken_burns_enabled: bool,
}

/// The smallest narrated unit: one image, one narration, one clip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    /// Unique identifier; filename stem for image, audio, and clip.
    #[serde(deserialize_with = "deserialize_id")]
    pub segment_id: String,

    /// Narration text.
    #[serde(default)]
    pub narration: String,

    /// Image generation prompt.
    #[serde(default)]
    pub image_prompt: Option<String>,

    /// Camera motion effects, applied in order.
    #[serde(default)]
    pub ken_burns_sequence: Vec<String>,
}

/// A segment together with the chapter that owns it.
#[derive(Debug, Clone, Copy)]
pub struct SegmentRef<'a> {
    /// Zero-based position in playback order.
    pub index: usize,
    pub chapter: &'a Chapter,
    pub segment: &'a Segment,
}

impl Project {
    /// Parse a project document from JSON and validate it.
    pub fn from_json(json: &str) -> Result<Self, ProjectError> {
        let project: Project =
            serde_json::from_str(json).map_err(|e| ProjectError::ParseError {
                path: PathBuf::from("<inline>"),
                source: e,
            })?;
        project.validate()?;
        Ok(project)
    }

    /// Load and validate a project document from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ProjectError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let project: Project =
            serde_json::from_str(&content).map_err(|e| ProjectError::ParseError {
                path: path.to_path_buf(),
                source: e,
            })?;
        project.validate()?;
        Ok(project)
    }

    /// Check structural invariants: segment ids are present, usable as
    /// filename stems, and unique across the whole project.
    pub fn validate(&self) -> Result<(), ProjectError> {
        let mut seen = HashSet::new();
        for chapter in &self.chapters {
            if let Some(volume) = chapter.music_volume {
                if !volume.is_finite() || volume < 0.0 {
                    return Err(ProjectError::ValidationError {
                        message: format!(
                            "chapter {} has invalid music_volume {volume}",
                            chapter.chapter_id
                        ),
                    });
                }
            }
            for segment in &chapter.segments {
                let id = segment.segment_id.as_str();
                if id.trim().is_empty() {
                    return Err(ProjectError::ValidationError {
                        message: format!("chapter {} has a segment without id", chapter.chapter_id),
                    });
                }
                if id.contains(['/', '\\']) || id == "." || id == ".." {
                    return Err(ProjectError::ValidationError {
                        message: format!("segment id {id:?} is not a valid file stem"),
                    });
                }
                if !seen.insert(id) {
                    return Err(ProjectError::ValidationError {
                        message: format!("duplicate segment id {id:?}"),
                    });
                }
            }
        }
        Ok(())
    }

    /// All segments in playback order (chapter order, then segment order).
    pub fn segments(&self) -> impl Iterator<Item = SegmentRef<'_>> {
        self.chapters
            .iter()
            .flat_map(|chapter| chapter.segments.iter().map(move |segment| (chapter, segment)))
            .enumerate()
            .map(|(index, (chapter, segment))| SegmentRef {
                index,
                chapter,
                segment,
            })
    }

    /// Total number of segments.
    pub fn segment_count(&self) -> usize {
        self.chapters.iter().map(|c| c.segments.len()).sum()
    }

    /// Look up a segment and its chapter by id.
    pub fn find_segment(&self, segment_id: &str) -> Option<SegmentRef<'_>> {
        self.segments()
            .find(|entry| entry.segment.segment_id == segment_id)
    }

    /// Display name for summaries.
    pub fn display_name(&self) -> &str {
        self.project_name.as_deref().unwrap_or("untitled")
    }
}

impl Chapter {
    /// Title used in chapter markers.
    pub fn display_title(&self) -> String {
        match &self.title {
            Some(title) if !title.trim().is_empty() => title.clone(),
            _ => format!("Chapter {}", self.chapter_id),
        }
    }
}

impl Segment {
    /// Effects to apply inside `chapter`; empty means a static frame.
    ///
    /// Motion is used only when the chapter allows it and the segment asks
    /// for at least one effect.
    pub fn effects_in<'a>(&'a self, chapter: &Chapter) -> &'a [String] {
        if chapter.ken_burns_enabled {
            &self.ken_burns_sequence
        } else {
            &[]
        }
    }

    /// Whether camera motion applies to this segment inside `chapter`.
    pub fn uses_motion(&self, chapter: &Chapter) -> bool {
        !self.effects_in(chapter).is_empty()
    }
}

fn default_voice() -> String {
    DEFAULT_VOICE.to_string()
}

fn default_true() -> bool {
    true
}

/// Accept identifiers written either as JSON strings or integers.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
        Uint(u64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Int(n) => n.to_string(),
        RawId::Uint(n) => n.to_string(),
    })
}

/// Errors that can occur when working with projects.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid project: {message}")]
    ValidationError { message: String },
}
