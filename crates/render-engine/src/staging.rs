//! Temporary sibling outputs.
//!
//! Encoders write to `<final>.partial`; the file is renamed onto the final
//! path only after a successful encode. A staged output that is dropped
//! without [`StagedOutput::commit`] removes its temporary file, so a clip
//! path on disk always means a finished clip.

use std::path::{Path, PathBuf};

use longform_common::LongformResult;

const PARTIAL_SUFFIX: &str = "partial";

/// Path of the temporary sibling for `final_path` (`clip.mp4` -> `clip.mp4.partial`).
pub fn partial_path(final_path: &Path) -> PathBuf {
    let mut name = final_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".");
    name.push(PARTIAL_SUFFIX);
    final_path.with_file_name(name)
}

/// A pending output that is either committed or cleaned up.
#[derive(Debug)]
pub struct StagedOutput {
    temp: PathBuf,
    target: PathBuf,
    committed: bool,
}

impl StagedOutput {
    /// Stage `target`, creating its parent directory and clearing any
    /// leftover temporary file from an interrupted run.
    pub fn new(target: impl Into<PathBuf>) -> LongformResult<Self> {
        let target = target.into();
        if let Some(parent) = target.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let temp = partial_path(&target);
        if temp.exists() {
            tracing::debug!(path = %temp.display(), "Removing stale partial output");
            std::fs::remove_file(&temp)?;
        }
        Ok(Self {
            temp,
            target,
            committed: false,
        })
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp
    }

    pub fn target_path(&self) -> &Path {
        &self.target
    }

    /// Move the temporary file onto the final path.
    pub async fn commit(mut self) -> LongformResult<PathBuf> {
        tokio::fs::rename(&self.temp, &self.target).await?;
        self.committed = true;
        Ok(self.target.clone())
    }
}

impl Drop for StagedOutput {
    fn drop(&mut self) {
        if self.committed || !self.temp.exists() {
            return;
        }
        if let Err(err) = std::fs::remove_file(&self.temp) {
            tracing::warn!(
                error = %err,
                path = %self.temp.display(),
                "Failed to remove partial output"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_path_appends_suffix() {
        assert_eq!(
            partial_path(Path::new("/clips/s01.mp4")),
            PathBuf::from("/clips/s01.mp4.partial")
        );
    }

    #[test]
    fn test_drop_removes_uncommitted_temp() {
        let dir = std::env::temp_dir().join("longform_test_staging_drop");
        let _ = std::fs::remove_dir_all(&dir);
        let staged = StagedOutput::new(dir.join("a.mp4")).unwrap();
        std::fs::write(staged.temp_path(), b"half").unwrap();
        let temp = staged.temp_path().to_path_buf();
        drop(staged);
        assert!(!temp.exists());
        assert!(!dir.join("a.mp4").exists());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_commit_renames_onto_target() {
        let dir = std::env::temp_dir().join("longform_test_staging_commit");
        let _ = std::fs::remove_dir_all(&dir);
        let staged = StagedOutput::new(dir.join("b.mp4")).unwrap();
        std::fs::write(staged.temp_path(), b"done").unwrap();
        let path = staged.commit().await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"done");
        assert!(!partial_path(&path).exists());
        std::fs::remove_dir_all(&dir).ok();
    }
}
