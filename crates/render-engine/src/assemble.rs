//! Timeline assembly: concatenation and chapter markers.
//!
//! Clips are joined with the concat demuxer and stream copy, so every clip
//! must share codec, resolution, and frame rate. Chapter start times are the
//! running sum of measured clip durations, which keeps markers aligned with
//! what was actually encoded rather than with narration estimates.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use longform_common::{format_timestamp, InputKind, LongformError, LongformResult, RenderDefaults};
use longform_project_model::layout::{ArtifactLayout, CLIP_EXTENSION};
use longform_project_model::project::Project;
use serde::Serialize;

use crate::encoder::{MediaEncoder, VideoStream};
use crate::filter_graph::build_concat_plan;
use crate::staging::StagedOutput;

/// Header line of the chapters sidecar.
pub const CHAPTERS_HEADER: &str = "YouTube Chapters:";

/// How clips are ordered on the timeline.
#[derive(Debug, Clone, Copy)]
pub enum ClipOrder<'a> {
    /// Chapter order, then segment order, with chapter markers.
    Declared(&'a Project),
    /// Clip files sorted by name; no chapter markers.
    Lexicographic,
}

/// Start of a chapter on the final timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChapterMarker {
    pub chapter_id: String,
    pub title: String,
    pub start_secs: f64,
}

impl ChapterMarker {
    pub fn timestamp(&self) -> String {
        format_timestamp(self.start_secs)
    }
}

/// The assembled video.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalVideo {
    pub path: PathBuf,
    pub clip_count: usize,
    pub total_duration_secs: f64,
    pub markers: Vec<ChapterMarker>,
    /// Segment ids (or file names) that had no clip.
    pub missing: Vec<String>,
    pub chapters_file: Option<PathBuf>,
}

#[derive(Debug, Clone)]
struct TimelineEntry {
    segment_id: String,
    path: PathBuf,
}

/// Concatenates finished clips into the final video.
#[derive(Clone)]
pub struct TimelineAssembler {
    encoder: Arc<dyn MediaEncoder>,
    layout: ArtifactLayout,
    verify_uniform_streams: bool,
}

impl TimelineAssembler {
    pub fn new(
        encoder: Arc<dyn MediaEncoder>,
        layout: ArtifactLayout,
        defaults: &RenderDefaults,
    ) -> Self {
        Self {
            encoder,
            layout,
            verify_uniform_streams: defaults.verify_uniform_streams,
        }
    }

    /// Concatenate clips in `order` into `output`.
    ///
    /// Missing clips are skipped with a warning. Fails with `MissingInput`
    /// when no clip exists at all, and with `StructuralMismatch` when clips
    /// disagree on stream layout.
    pub async fn assemble(
        &self,
        order: ClipOrder<'_>,
        output: &Path,
    ) -> LongformResult<FinalVideo> {
        if !self.encoder.is_available() {
            return Err(LongformError::missing_dependency(self.encoder.name()));
        }

        let (entries, missing) = match order {
            ClipOrder::Declared(project) => self.declared_entries(project),
            ClipOrder::Lexicographic => (self.lexicographic_entries()?, vec![]),
        };

        if entries.is_empty() {
            return Err(LongformError::missing_input(
                InputKind::Clip,
                &self.layout.clips_dir,
            ));
        }

        tracing::info!(
            clips = entries.len(),
            missing = missing.len(),
            output = %output.display(),
            "Assembling timeline"
        );

        let durations = self.measure(&entries).await?;
        let total_duration_secs: f64 = durations.values().sum();

        let markers = match order {
            ClipOrder::Declared(project) => derive_chapter_markers(project, &durations),
            ClipOrder::Lexicographic => vec![],
        };

        let staged = StagedOutput::new(output)?;
        let list_path = concat_list_path(output);
        let paths: Vec<PathBuf> = entries.iter().map(|e| absolute(&e.path)).collect();
        std::fs::write(&list_path, concat_list(&paths))?;

        let plan = build_concat_plan(&list_path, staged.temp_path(), total_duration_secs);
        let rendered = self.encoder.render(&plan, None).await;
        if let Err(err) = std::fs::remove_file(&list_path) {
            tracing::warn!(error = %err, path = %list_path.display(), "Failed to remove concat list");
        }
        rendered?;
        let path = staged.commit().await?;

        let chapters_file = if markers.is_empty() {
            None
        } else {
            let sidecar = chapters_path(&path);
            write_chapters_file(&sidecar, &markers)?;
            tracing::info!(path = %sidecar.display(), chapters = markers.len(), "Wrote chapter markers");
            Some(sidecar)
        };

        tracing::info!(
            path = %path.display(),
            duration_secs = total_duration_secs,
            "Final video assembled"
        );

        Ok(FinalVideo {
            path,
            clip_count: entries.len(),
            total_duration_secs,
            markers,
            missing,
            chapters_file,
        })
    }

    fn declared_entries(&self, project: &Project) -> (Vec<TimelineEntry>, Vec<String>) {
        let mut entries = vec![];
        let mut missing = vec![];
        for entry in project.segments() {
            let id = &entry.segment.segment_id;
            let path = self.layout.clip_path(id);
            if path.exists() {
                entries.push(TimelineEntry {
                    segment_id: id.clone(),
                    path,
                });
            } else {
                tracing::warn!(segment = %id, path = %path.display(), "Clip missing, omitting from timeline");
                missing.push(id.clone());
            }
        }
        (entries, missing)
    }

    fn lexicographic_entries(&self) -> LongformResult<Vec<TimelineEntry>> {
        let dir = &self.layout.clips_dir;
        if !dir.is_dir() {
            return Ok(vec![]);
        }
        let mut entries: Vec<TimelineEntry> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path.extension().and_then(|e| e.to_str()) == Some(CLIP_EXTENSION)
            })
            .map(|path| TimelineEntry {
                segment_id: path
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_default(),
                path,
            })
            .collect();
        entries.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
        Ok(entries)
    }

    /// Probe every clip; check stream layout when enabled.
    async fn measure(&self, entries: &[TimelineEntry]) -> LongformResult<HashMap<String, f64>> {
        let mut durations = HashMap::with_capacity(entries.len());
        let mut reference: Option<(PathBuf, VideoStream)> = None;

        for entry in entries {
            let probe = self.encoder.probe(&entry.path).await?;
            durations.insert(entry.segment_id.clone(), probe.duration_secs);

            if !self.verify_uniform_streams {
                continue;
            }
            let stream = probe.video.ok_or_else(|| {
                LongformError::structural(format!(
                    "{} has no video stream",
                    entry.path.display()
                ))
            })?;
            match &reference {
                None => reference = Some((entry.path.clone(), stream)),
                Some((first_path, first)) => {
                    if let Some(diff) = first.mismatch(&stream) {
                        return Err(LongformError::structural(format!(
                            "{} differs from {}: {diff}",
                            entry.path.display(),
                            first_path.display()
                        )));
                    }
                }
            }
        }

        Ok(durations)
    }
}

/// Chapter start offsets from measured clip durations.
///
/// Each marker is recorded before its own chapter's clips are added;
/// segments without a measured duration contribute zero.
pub fn derive_chapter_markers(
    project: &Project,
    durations: &HashMap<String, f64>,
) -> Vec<ChapterMarker> {
    let mut running = 0.0;
    let mut markers = Vec::with_capacity(project.chapters.len());
    for chapter in &project.chapters {
        markers.push(ChapterMarker {
            chapter_id: chapter.chapter_id.clone(),
            title: chapter.display_title(),
            start_secs: running,
        });
        running += chapter
            .segments
            .iter()
            .filter_map(|s| durations.get(&s.segment_id))
            .sum::<f64>();
    }
    markers
}

/// Concat demuxer list: one `file '<path>'` line per clip.
pub fn concat_list(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| format!("file '{}'\n", escape_concat_path(&p.to_string_lossy())))
        .collect()
}

/// Escape a path for a single-quoted concat list entry.
pub fn escape_concat_path(path: &str) -> String {
    path.replace('\'', r"'\''")
}

/// Chapters sidecar content.
pub fn format_chapters(markers: &[ChapterMarker]) -> String {
    let mut out = format!("{CHAPTERS_HEADER}\n\n");
    for marker in markers {
        out.push_str(&format!("{} {}\n", marker.timestamp(), marker.title));
    }
    out
}

pub fn write_chapters_file(path: &Path, markers: &[ChapterMarker]) -> LongformResult<()> {
    std::fs::write(path, format_chapters(markers))?;
    Ok(())
}

/// `<output stem>.chapters.txt` next to the output.
pub fn chapters_path(output: &Path) -> PathBuf {
    output.with_extension("chapters.txt")
}

fn concat_list_path(output: &Path) -> PathBuf {
    output.with_extension("concat.txt")
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::fs::canonicalize(path)
        .or_else(|_| std::env::current_dir().map(|cwd| cwd.join(path)))
        .unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn two_chapter_project() -> Project {
        Project::from_json(
            r#"{"chapters": [
                {"chapter_id": 1, "title": "Intro", "segments": [{"segment_id": "a"}, {"segment_id": "b"}]},
                {"chapter_id": 2, "segments": [{"segment_id": "c"}]}
            ]}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_markers_accumulate_preceding_chapters() {
        let project = two_chapter_project();
        let durations: HashMap<String, f64> = [("a", 2.0), ("b", 3.0), ("c", 4.0)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();

        let markers = derive_chapter_markers(&project, &durations);
        let stamps: Vec<_> = markers.iter().map(|m| m.timestamp()).collect();
        assert_eq!(stamps, vec!["0:00", "0:05"]);
        assert_eq!(markers[1].title, "Chapter 2");
    }

    #[test]
    fn test_missing_clip_contributes_zero() {
        let project = two_chapter_project();
        let durations: HashMap<String, f64> = [("a".to_string(), 2.0)].into_iter().collect();
        let markers = derive_chapter_markers(&project, &durations);
        assert_eq!(markers[1].start_secs, 2.0);
    }

    #[test]
    fn test_concat_list_escapes_single_quotes() {
        let list = concat_list(&[
            PathBuf::from("/clips/a.mp4"),
            PathBuf::from("/clips/it's.mp4"),
        ]);
        assert_eq!(list, "file '/clips/a.mp4'\nfile '/clips/it'\\''s.mp4'\n");
    }

    #[test]
    fn test_chapters_file_format() {
        let markers = vec![
            ChapterMarker {
                chapter_id: "1".to_string(),
                title: "Intro".to_string(),
                start_secs: 0.0,
            },
            ChapterMarker {
                chapter_id: "2".to_string(),
                title: "Deep Water".to_string(),
                start_secs: 3661.4,
            },
        ];
        assert_eq!(
            format_chapters(&markers),
            "YouTube Chapters:\n\n0:00 Intro\n1:01:01 Deep Water\n"
        );
    }

    proptest! {
        #[test]
        fn prop_markers_start_at_zero_and_never_decrease(
            chapters in proptest::collection::vec(proptest::collection::vec(0.0f64..600.0, 0..5), 1..6)
        ) {
            let mut durations = HashMap::new();
            let mut doc = vec![];
            for (c, segs) in chapters.iter().enumerate() {
                let ids: Vec<String> = (0..segs.len()).map(|s| format!("c{c}s{s}")).collect();
                for (id, d) in ids.iter().zip(segs) {
                    durations.insert(id.clone(), *d);
                }
                let segments: Vec<_> = ids.iter().map(|id| serde_json::json!({"segment_id": id})).collect();
                doc.push(serde_json::json!({"chapter_id": c, "segments": segments}));
            }
            let project = Project::from_json(&serde_json::json!({"chapters": doc}).to_string()).unwrap();

            let markers = derive_chapter_markers(&project, &durations);
            prop_assert_eq!(markers.len(), chapters.len());
            prop_assert_eq!(markers[0].start_secs, 0.0);
            for pair in markers.windows(2) {
                prop_assert!(pair[1].start_secs >= pair[0].start_secs);
            }
        }
    }

    #[test]
    fn test_sidecar_paths() {
        assert_eq!(
            chapters_path(Path::new("/p/final_video.mp4")),
            PathBuf::from("/p/final_video.chapters.txt")
        );
        assert_eq!(
            concat_list_path(Path::new("/p/final_video.mp4")),
            PathBuf::from("/p/final_video.concat.txt")
        );
    }
}
