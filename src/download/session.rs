//! Temporary file tracking for one downloader.
//!
//! Every path a download writes (session directories, transcoder outputs,
//! thumbnails) is registered here and removed by [`TempFiles::cleanup`].

use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::core::config::SESSION_DIR_PREFIX;

/// Paths owned by a downloader until cleanup.
#[derive(Debug, Default)]
pub struct TempFiles {
    tracked: Vec<PathBuf>,
}

impl TempFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `<temp_root>/instagram_<uuid>` and track it.
    pub async fn create_session_dir(&mut self, temp_root: &Path) -> io::Result<PathBuf> {
        let dir = temp_root.join(format!("{}{}", SESSION_DIR_PREFIX, Uuid::new_v4().simple()));
        tokio::fs::create_dir_all(&dir).await?;
        log::debug!("Created session directory {}", dir.display());
        self.track(dir.clone());
        Ok(dir)
    }

    /// Register a path for cleanup. Paths inside an already tracked directory are skipped.
    pub fn track(&mut self, path: PathBuf) {
        if self.tracked.iter().any(|known| path.starts_with(known)) {
            return;
        }
        self.tracked.push(path);
    }

    pub fn tracked(&self) -> &[PathBuf] {
        &self.tracked
    }

    pub fn is_empty(&self) -> bool {
        self.tracked.is_empty()
    }

    /// Delete every tracked path. Missing paths are fine; other failures are
    /// logged and the path is dropped from tracking anyway.
    ///
    /// Returns the number of paths actually removed.
    pub fn cleanup(&mut self) -> usize {
        let mut removed = 0;
        for path in self.tracked.drain(..) {
            let result = if path.is_dir() {
                std::fs::remove_dir_all(&path)
            } else {
                std::fs::remove_file(&path)
            };
            match result {
                Ok(()) => {
                    log::debug!("Removed {}", path.display());
                    removed += 1;
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => log::warn!("Failed to remove {}: {}", path.display(), e),
            }
        }
        if removed > 0 {
            log::info!("Cleaned up {} temporary paths", removed);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_session_dir_is_created_and_removed() {
        let root = tempfile::tempdir().unwrap();
        let mut files = TempFiles::new();

        let dir = files.create_session_dir(root.path()).await.unwrap();
        assert!(dir.is_dir());
        assert!(dir
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(SESSION_DIR_PREFIX));
        std::fs::write(dir.join("1.jpg"), b"x").unwrap();

        assert_eq!(files.cleanup(), 1);
        assert!(!dir.exists());
        assert!(files.is_empty());
    }

    #[test]
    fn test_cleanup_twice_and_without_files() {
        let mut files = TempFiles::new();
        assert_eq!(files.cleanup(), 0);

        files.track(PathBuf::from("/nonexistent/igdora/file.mp4"));
        assert_eq!(files.cleanup(), 0);
        assert_eq!(files.cleanup(), 0);
    }

    #[test]
    fn test_nested_paths_are_not_tracked_twice() {
        let mut files = TempFiles::new();
        files.track(PathBuf::from("/tmp/instagram_abc"));
        files.track(PathBuf::from("/tmp/instagram_abc/1.converted.mp4"));
        files.track(PathBuf::from("/tmp/other.mp4"));
        assert_eq!(files.tracked().len(), 2);
    }
}
