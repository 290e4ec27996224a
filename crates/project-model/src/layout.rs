//! On-disk layout joining independently produced artifacts.
//!
//! For a segment `S` the image lives at `<images_dir>/S.png`, the narration
//! at `<audio_dir>/S.mp3`, and the rendered clip at `<clips_dir>/S.mp4`.
//! The segment id is the only join key between these directories.

use std::path::{Path, PathBuf};

use crate::project::{Chapter, Project};

pub const IMAGE_EXTENSION: &str = "png";
pub const AUDIO_EXTENSION: &str = "mp3";
pub const CLIP_EXTENSION: &str = "mp4";

/// Directories holding the artifacts of one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    pub images_dir: PathBuf,
    pub audio_dir: PathBuf,
    pub clips_dir: PathBuf,
    pub music_dir: Option<PathBuf>,
}

/// Which artifacts exist for a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArtifactStatus {
    pub image: bool,
    pub audio: bool,
    pub clip: bool,
}

impl ArtifactStatus {
    /// Image and narration are both available.
    pub fn ready_to_render(&self) -> bool {
        self.image && self.audio
    }
}

impl ArtifactLayout {
    pub fn new(
        images_dir: impl Into<PathBuf>,
        audio_dir: impl Into<PathBuf>,
        clips_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            images_dir: images_dir.into(),
            audio_dir: audio_dir.into(),
            clips_dir: clips_dir.into(),
            music_dir: None,
        }
    }

    /// Standard layout inside a project directory:
    /// `images/`, `audio/`, `clips/`, and `music/`.
    pub fn for_project_dir(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            images_dir: root.join("images"),
            audio_dir: root.join("audio"),
            clips_dir: root.join("clips"),
            music_dir: Some(root.join("music")),
        }
    }

    pub fn with_music_dir(mut self, music_dir: Option<PathBuf>) -> Self {
        self.music_dir = music_dir;
        self
    }

    pub fn image_path(&self, segment_id: &str) -> PathBuf {
        self.images_dir
            .join(format!("{segment_id}.{IMAGE_EXTENSION}"))
    }

    pub fn audio_path(&self, segment_id: &str) -> PathBuf {
        self.audio_dir.join(format!("{segment_id}.{AUDIO_EXTENSION}"))
    }

    pub fn clip_path(&self, segment_id: &str) -> PathBuf {
        self.clips_dir.join(format!("{segment_id}.{CLIP_EXTENSION}"))
    }

    /// Music file requested by a chapter, if any. Existence is not checked.
    pub fn music_path(&self, chapter: &Chapter) -> Option<PathBuf> {
        let track = chapter.music_track.as_deref()?.trim();
        if track.is_empty() {
            return None;
        }
        Some(self.music_dir.as_ref()?.join(track))
    }

    /// Check which artifacts exist for a segment.
    pub fn status(&self, segment_id: &str) -> ArtifactStatus {
        ArtifactStatus {
            image: self.image_path(segment_id).exists(),
            audio: self.audio_path(segment_id).exists(),
            clip: self.clip_path(segment_id).exists(),
        }
    }

    /// Human-readable problems for every segment that cannot be rendered yet.
    pub fn missing_sources(&self, project: &Project) -> Vec<String> {
        let mut errors = vec![];
        for entry in project.segments() {
            let id = &entry.segment.segment_id;
            let status = self.status(id);
            if status.clip {
                continue;
            }
            if !status.image {
                errors.push(format!(
                    "{id}: image missing ({})",
                    self.image_path(id).display()
                ));
            }
            if !status.audio {
                errors.push(format!(
                    "{id}: audio missing ({})",
                    self.audio_path(id).display()
                ));
            }
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_use_segment_id_as_stem() {
        let layout = ArtifactLayout::for_project_dir("/proj");
        assert_eq!(layout.image_path("s01"), PathBuf::from("/proj/images/s01.png"));
        assert_eq!(layout.audio_path("s01"), PathBuf::from("/proj/audio/s01.mp3"));
        assert_eq!(layout.clip_path("s01"), PathBuf::from("/proj/clips/s01.mp4"));
    }

    #[test]
    fn test_music_path_requires_track_and_dir() {
        let chapter: Chapter = serde_json::from_str(
            r#"{"chapter_id": 1, "music_track": "calm.mp3", "segments": []}"#,
        )
        .unwrap();
        let with_dir = ArtifactLayout::for_project_dir("/proj");
        assert_eq!(
            with_dir.music_path(&chapter),
            Some(PathBuf::from("/proj/music/calm.mp3"))
        );

        let without_dir = ArtifactLayout::new("i", "a", "c");
        assert_eq!(without_dir.music_path(&chapter), None);

        let silent: Chapter =
            serde_json::from_str(r#"{"chapter_id": 2, "segments": []}"#).unwrap();
        assert_eq!(with_dir.music_path(&silent), None);
    }

    #[test]
    fn test_missing_sources_reports_each_gap() {
        let root = std::env::temp_dir().join("longform_test_layout_missing");
        let _ = std::fs::remove_dir_all(&root);
        let layout = ArtifactLayout::for_project_dir(&root);
        std::fs::create_dir_all(&layout.images_dir).unwrap();
        std::fs::write(layout.image_path("a"), b"png").unwrap();

        let project = Project::from_json(
            r#"{"chapters": [{"chapter_id": 1, "segments": [{"segment_id": "a"}, {"segment_id": "b"}]}]}"#,
        )
        .unwrap();

        let errors = layout.missing_sources(&project);
        assert_eq!(errors.len(), 3);
        assert!(errors[0].starts_with("a: audio missing"));
        assert!(layout.status("a").image);
        assert!(!layout.status("a").ready_to_render());

        std::fs::remove_dir_all(&root).ok();
    }
}
