//! Vox: push-to-talk voice transcription via the Deepgram API
//!
//! Capture microphone audio into a 16 kHz mono WAV, send it to Deepgram's
//! prerecorded endpoint, and put the transcript on the clipboard. The
//! library is front-end agnostic: the terminal binary and any GUI share the
//! same session controller and transcription client, differing only in how
//! they surface status and drive the stop signal.

pub mod audio;
pub mod config;
pub mod markers;
pub mod paths;
pub mod session;
pub mod transcription;

pub use audio::{AudioError, AudioSource, CpalSource, SampleSink};
pub use config::{Config, ConfigError};
pub use paths::VoxPaths;
pub use session::{RecordingError, Session, SessionOutcome, StopReason, StopSignal};
pub use transcription::{sidecar_path, DeepgramClient, TranscriptionError};
