//! Recording session lifecycle
//!
//! A `Session` owns exactly one recording attempt: it acquires the input
//! device, maintains the two on-disk markers that advertise "a session is
//! active", waits for the first stop condition (timeout, manual stop, or
//! interrupt), and finalizes the captured buffer to a WAV file. Markers are
//! removed on every exit path so a later run never observes stale state.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use chrono::Local;

use crate::audio::{write_wav, AudioError, AudioSource, CaptureHandle, SampleSink};
use crate::markers::SessionMarkers;
use crate::paths::VoxPaths;

/// Why an active session stopped capturing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The maximum duration elapsed with no manual stop.
    Timeout,
    /// The user asked to stop early (Enter key, Stop button).
    Manual,
    /// The process received an interrupt/termination request.
    Interrupted,
}

/// One-shot stop condition shared between the session and its front end.
///
/// The first reason requested wins; later requests are ignored. A manual
/// stop and the timeout firing in the same instant resolve to whichever the
/// waiter observes first - no further ordering is guaranteed.
pub struct StopSignal {
    reason: Mutex<Option<StopReason>>,
    cond: Condvar,
}

impl StopSignal {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            reason: Mutex::new(None),
            cond: Condvar::new(),
        })
    }

    /// Request a stop. Idempotent: only the first reason is recorded.
    pub fn request(&self, reason: StopReason) {
        let mut slot = self.reason.lock().unwrap();
        if slot.is_none() {
            *slot = Some(reason);
            self.cond.notify_all();
        }
    }

    /// The reason recorded so far, if any.
    pub fn requested(&self) -> Option<StopReason> {
        *self.reason.lock().unwrap()
    }

    /// Block until a stop is requested or `max_duration` elapses. Reaching
    /// the deadline records `Timeout` so other observers (e.g. the elapsed
    /// time ticker) see the session as stopped.
    pub fn wait(&self, max_duration: Duration) -> StopReason {
        let deadline = Instant::now() + max_duration;
        let mut slot = self.reason.lock().unwrap();
        loop {
            if let Some(reason) = *slot {
                return reason;
            }
            let now = Instant::now();
            if now >= deadline {
                *slot = Some(StopReason::Timeout);
                self.cond.notify_all();
                return StopReason::Timeout;
            }
            let (guard, _) = self.cond.wait_timeout(slot, deadline - now).unwrap();
            slot = guard;
        }
    }
}

/// How a finished session ended.
#[derive(Debug)]
pub enum SessionOutcome {
    /// Capture finished and the buffer was serialized to this path.
    Completed(PathBuf),
    /// The process was interrupted; no audio was saved and the caller
    /// should exit cleanly without transcribing.
    Interrupted,
}

/// Errors that make a recording attempt fail.
#[derive(Debug)]
pub enum RecordingError {
    /// Stop was observed before any audio block arrived.
    NoAudioData,
    Device(AudioError),
    Io(std::io::Error),
    Encode(hound::Error),
}

impl std::fmt::Display for RecordingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordingError::NoAudioData => write!(f, "No audio data recorded"),
            RecordingError::Device(e) => write!(f, "Audio device error: {}", e),
            RecordingError::Io(e) => write!(f, "Recording I/O error: {}", e),
            RecordingError::Encode(e) => write!(f, "Failed to write WAV file: {}", e),
        }
    }
}

impl std::error::Error for RecordingError {}

/// An active recording session. At most one exists per process; starting a
/// new one forcibly resets any markers a previous run left behind.
pub struct Session {
    markers: SessionMarkers,
    sink: Arc<SampleSink>,
    capture: Box<dyn CaptureHandle>,
    target: PathBuf,
    stop: Arc<StopSignal>,
}

impl Session {
    /// Begin capturing. Allocates the timestamp-derived target path, writes
    /// both markers, and starts the device stream. On any failure the
    /// markers are cleared before returning.
    pub fn start(
        paths: &VoxPaths,
        source: &mut dyn AudioSource,
        stop: Arc<StopSignal>,
    ) -> Result<Self, RecordingError> {
        let markers = SessionMarkers::new(paths);
        // Markers left by a crashed run mean "previous session ended
        // uncoupled": reset rather than error.
        markers.clear();

        let target = paths.recording_path(Local::now());

        let started = (|| {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(RecordingError::Io)?;
            }
            markers
                .write_audio_path(&target)
                .map_err(RecordingError::Io)?;

            let sink = SampleSink::new();
            let capture = source
                .start(Arc::clone(&sink))
                .map_err(RecordingError::Device)?;

            markers.write_pid().map_err(RecordingError::Io)?;
            Ok((sink, capture))
        })();

        match started {
            Ok((sink, capture)) => {
                log::info!("Recording started: {:?}", target);
                Ok(Self {
                    markers,
                    sink,
                    capture,
                    target,
                    stop,
                })
            }
            Err(e) => {
                markers.clear();
                Err(e)
            }
        }
    }

    /// The WAV path this session will produce on success.
    pub fn target_path(&self) -> &Path {
        &self.target
    }

    /// Block until the first stop condition fires, then finalize.
    ///
    /// Timeout and manual stop serialize the buffer (failing with
    /// `NoAudioData` if it is empty); an interrupt discards the buffer and
    /// reports `Interrupted`. Markers are cleared on every path.
    pub fn wait(self, max_duration: Duration) -> Result<SessionOutcome, RecordingError> {
        let reason = self.stop.wait(max_duration);
        log::info!("Stop condition observed: {:?}", reason);

        // Close before releasing the device: blocks delivered after this
        // point are dropped, never raced with the serialization read.
        let blocks = self.sink.close();
        drop(self.capture);

        let result = match reason {
            StopReason::Interrupted => Ok(SessionOutcome::Interrupted),
            StopReason::Timeout | StopReason::Manual => {
                let total_samples: usize = blocks.iter().map(Vec::len).sum();
                if total_samples == 0 {
                    Err(RecordingError::NoAudioData)
                } else {
                    match write_wav(&self.target, &blocks) {
                        Ok(()) => {
                            log::info!("Recording stopped, WAV finalized: {:?}", self.target);
                            Ok(SessionOutcome::Completed(self.target.clone()))
                        }
                        Err(e) => Err(RecordingError::Encode(e)),
                    }
                }
            }
        };

        self.markers.clear();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_first_requested_reason_wins() {
        let stop = StopSignal::new();
        stop.request(StopReason::Manual);
        stop.request(StopReason::Interrupted);
        assert_eq!(stop.requested(), Some(StopReason::Manual));
        assert_eq!(stop.wait(Duration::from_secs(5)), StopReason::Manual);
    }

    #[test]
    fn test_wait_returns_timeout_at_deadline() {
        let stop = StopSignal::new();
        let reason = stop.wait(Duration::from_millis(50));
        assert_eq!(reason, StopReason::Timeout);
        // The deadline itself records the reason for other observers.
        assert_eq!(stop.requested(), Some(StopReason::Timeout));
    }

    #[test]
    fn test_wait_wakes_on_request_from_other_thread() {
        let stop = StopSignal::new();
        let waiter = Arc::clone(&stop);

        let handle = thread::spawn(move || waiter.wait(Duration::from_secs(10)));
        thread::sleep(Duration::from_millis(20));
        stop.request(StopReason::Manual);

        assert_eq!(handle.join().unwrap(), StopReason::Manual);
    }
}
