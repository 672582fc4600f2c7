//! Home-relative path derivation for recordings and session markers
//!
//! Recordings are stored in: ~/.vox/recording_<YYYYMMDD_HHMMSS>.wav
//! Markers live directly under the home directory so an interrupted run can
//! be detected and reset by the next one.

use std::path::PathBuf;

use chrono::{DateTime, Local};

const PID_MARKER: &str = ".recordpid";
const AUDIO_MARKER: &str = ".recordaudio";
const RECORDING_DIR: &str = ".vox";

/// Resolves all well-known file locations relative to one base directory.
/// Production code uses the real home directory; tests substitute a temp dir.
#[derive(Debug, Clone)]
pub struct VoxPaths {
    home: PathBuf,
}

impl VoxPaths {
    pub fn new() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self { home }
    }

    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    /// Marker holding the pid of the process with an active session.
    pub fn pid_marker(&self) -> PathBuf {
        self.home.join(PID_MARKER)
    }

    /// Marker holding the absolute path of the in-progress audio file.
    pub fn audio_marker(&self) -> PathBuf {
        self.home.join(AUDIO_MARKER)
    }

    pub fn recording_dir(&self) -> PathBuf {
        self.home.join(RECORDING_DIR)
    }

    /// Timestamp-derived target path for a session starting at `at`.
    pub fn recording_path(&self, at: DateTime<Local>) -> PathBuf {
        let filename = format!("recording_{}.wav", at.format("%Y%m%d_%H%M%S"));
        self.recording_dir().join(filename)
    }
}

impl Default for VoxPaths {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_recording_path_is_timestamp_named() {
        let paths = VoxPaths::with_home("/tmp/voxhome");
        let at = Local.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
        let path = paths.recording_path(at);
        assert_eq!(
            path,
            PathBuf::from("/tmp/voxhome/.vox/recording_20260314_092653.wav")
        );
    }

    #[test]
    fn test_markers_live_under_home() {
        let paths = VoxPaths::with_home("/tmp/voxhome");
        assert_eq!(paths.pid_marker(), PathBuf::from("/tmp/voxhome/.recordpid"));
        assert_eq!(
            paths.audio_marker(),
            PathBuf::from("/tmp/voxhome/.recordaudio")
        );
    }
}
