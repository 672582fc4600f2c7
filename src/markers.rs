//! Process-wide session markers
//!
//! Two sentinel files signal "a recording session is active": one holds the
//! pid of the owning process, the other the absolute path of the in-progress
//! audio file. They are advisory - every session exit path (success, empty
//! buffer, interrupt) must remove them so a later run never sees stale state.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::paths::VoxPaths;

/// Handle on the two marker files for one base directory.
#[derive(Debug)]
pub struct SessionMarkers {
    pid_path: PathBuf,
    audio_path: PathBuf,
}

impl SessionMarkers {
    pub fn new(paths: &VoxPaths) -> Self {
        Self {
            pid_path: paths.pid_marker(),
            audio_path: paths.audio_marker(),
        }
    }

    /// Record the target audio path of the session being started.
    pub fn write_audio_path(&self, target: &Path) -> io::Result<()> {
        fs::write(&self.audio_path, target.display().to_string())
    }

    /// Record this process as the owner of the active session.
    pub fn write_pid(&self) -> io::Result<()> {
        fs::write(&self.pid_path, std::process::id().to_string())
    }

    /// Remove both markers. Missing files are fine; anything else is logged
    /// and otherwise ignored, since cleanup runs on paths that cannot fail.
    pub fn clear(&self) {
        remove_marker(&self.pid_path);
        remove_marker(&self.audio_path);
    }

    pub fn any_present(&self) -> bool {
        self.pid_path.exists() || self.audio_path.exists()
    }
}

fn remove_marker(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != io::ErrorKind::NotFound {
            log::warn!("Failed to remove marker {:?}: {}", path, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_clear_removes_both() {
        let dir = tempfile::tempdir().unwrap();
        let paths = VoxPaths::with_home(dir.path());
        let markers = SessionMarkers::new(&paths);

        markers.write_audio_path(Path::new("/tmp/out.wav")).unwrap();
        markers.write_pid().unwrap();
        assert!(markers.any_present());

        markers.clear();
        assert!(!markers.any_present());
    }

    #[test]
    fn test_clear_tolerates_missing_markers() {
        let dir = tempfile::tempdir().unwrap();
        let paths = VoxPaths::with_home(dir.path());
        let markers = SessionMarkers::new(&paths);

        // Never written; clearing must not panic or error.
        markers.clear();
        assert!(!markers.any_present());
    }

    #[test]
    fn test_audio_marker_holds_target_path() {
        let dir = tempfile::tempdir().unwrap();
        let paths = VoxPaths::with_home(dir.path());
        let markers = SessionMarkers::new(&paths);

        markers.write_audio_path(Path::new("/tmp/out.wav")).unwrap();
        let contents = fs::read_to_string(paths.audio_marker()).unwrap();
        assert_eq!(contents, "/tmp/out.wav");

        markers.write_pid().unwrap();
        let pid: u32 = fs::read_to_string(paths.pid_marker())
            .unwrap()
            .parse()
            .unwrap();
        assert_eq!(pid, std::process::id());
    }
}
