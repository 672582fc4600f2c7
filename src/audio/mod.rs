//! Audio capture and encoding
//!
//! Microphone input via CPAL, WAV encoding via hound. The `AudioSource`
//! trait is the seam between the session controller and the real device.

mod capture;
mod wav;

pub use capture::{
    AudioError, AudioSource, CaptureHandle, CpalSource, SampleSink, CHANNELS, SAMPLE_RATE,
};
pub use wav::write_wav;
