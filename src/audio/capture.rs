//! Microphone capture using CPAL
//!
//! Capture is abstracted behind the `AudioSource` trait so the session
//! controller can be exercised without a physical input device. The CPAL
//! implementation opens the default input at 16 kHz, converts every delivered
//! buffer to a block of i16 samples, and appends it to the session's sink.

use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig, SupportedStreamConfig};

/// Sample rate requested from the device and written to the WAV header.
pub const SAMPLE_RATE: u32 = 16_000;
/// Recordings are mono; multi-channel devices are reduced to channel 0.
pub const CHANNELS: u16 = 1;

/// Errors that can occur while acquiring or running the input device.
#[derive(Debug, Clone)]
pub enum AudioError {
    NoInputDevice,
    NoSupportedConfig,
    StreamCreationFailed(String),
}

impl std::fmt::Display for AudioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioError::NoInputDevice => write!(f, "No audio input device found"),
            AudioError::NoSupportedConfig => {
                write!(f, "No input configuration supporting {} Hz", SAMPLE_RATE)
            }
            AudioError::StreamCreationFailed(e) => {
                write!(f, "Failed to create audio stream: {}", e)
            }
        }
    }
}

impl std::error::Error for AudioError {}

/// Append-only buffer of captured sample blocks.
///
/// The device callback appends while the session is active; finalization
/// closes the sink and drains it under the same lock, so a callback that
/// fires after stop is observed drops its block instead of racing the read.
pub struct SampleSink {
    inner: Mutex<SinkState>,
}

struct SinkState {
    blocks: Vec<Vec<i16>>,
    open: bool,
}

impl SampleSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(SinkState {
                blocks: Vec::new(),
                open: true,
            }),
        })
    }

    /// Append one captured block. Dropped silently once the sink is closed.
    pub fn push(&self, block: Vec<i16>) {
        let mut state = self.inner.lock().unwrap();
        if state.open {
            state.blocks.push(block);
        }
    }

    /// Close the sink and take every block appended so far, in arrival order.
    pub fn close(&self) -> Vec<Vec<i16>> {
        let mut state = self.inner.lock().unwrap();
        state.open = false;
        std::mem::take(&mut state.blocks)
    }
}

/// Live capture. Dropping the handle stops the stream and releases the device.
pub trait CaptureHandle {}

/// An input device that can deliver sample blocks into a `SampleSink`.
pub trait AudioSource {
    fn start(&mut self, sink: Arc<SampleSink>) -> Result<Box<dyn CaptureHandle>, AudioError>;
}

/// CPAL-backed audio source using the default input device.
pub struct CpalSource {
    device: Device,
    config: StreamConfig,
    sample_format: SampleFormat,
}

impl CpalSource {
    pub fn new() -> Result<Self, AudioError> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or(AudioError::NoInputDevice)?;

        log::info!("Using audio input device: {:?}", device.name());

        let supported = pick_input_config(&device)?;

        log::info!(
            "Audio config: {} Hz, {} channels, {:?}",
            supported.sample_rate().0,
            supported.channels(),
            supported.sample_format()
        );

        let sample_format = supported.sample_format();
        let config: StreamConfig = supported.into();

        Ok(Self {
            device,
            config,
            sample_format,
        })
    }

    fn build_stream(&self, sink: Arc<SampleSink>) -> Result<Stream, AudioError> {
        let err_fn = |err| log::error!("Audio stream error: {}", err);

        match self.sample_format {
            SampleFormat::I16 => self.build_stream_typed::<i16>(sink, err_fn),
            SampleFormat::U16 => self.build_stream_typed::<u16>(sink, err_fn),
            SampleFormat::F32 => self.build_stream_typed::<f32>(sink, err_fn),
            _ => Err(AudioError::NoSupportedConfig),
        }
    }

    fn build_stream_typed<T>(
        &self,
        sink: Arc<SampleSink>,
        err_fn: impl FnMut(cpal::StreamError) + Send + 'static,
    ) -> Result<Stream, AudioError>
    where
        T: cpal::Sample<Float = f32> + cpal::SizedSample + Send + 'static,
    {
        let config = self.config.clone();
        let channels = config.channels.max(1) as usize;

        let stream = self
            .device
            .build_input_stream(
                &config,
                move |data: &[T], _: &cpal::InputCallbackInfo| {
                    // Device thread: convert and append, nothing slower.
                    let mut block = Vec::with_capacity(data.len() / channels + 1);
                    for frame in data.chunks(channels) {
                        if let Some(&sample) = frame.first() {
                            block.push(sample_to_i16(sample));
                        }
                    }
                    sink.push(block);
                },
                err_fn,
                None,
            )
            .map_err(|e| AudioError::StreamCreationFailed(e.to_string()))?;

        Ok(stream)
    }
}

impl AudioSource for CpalSource {
    fn start(&mut self, sink: Arc<SampleSink>) -> Result<Box<dyn CaptureHandle>, AudioError> {
        let stream = self.build_stream(sink)?;

        stream.play().map_err(|e| {
            AudioError::StreamCreationFailed(format!("Failed to start stream: {}", e))
        })?;

        Ok(Box::new(CpalCapture { _stream: stream }))
    }
}

struct CpalCapture {
    _stream: Stream,
}

impl CaptureHandle for CpalCapture {}

/// Find an input configuration that can deliver 16 kHz, preferring the
/// fewest channels.
fn pick_input_config(device: &Device) -> Result<SupportedStreamConfig, AudioError> {
    let ranges = device
        .supported_input_configs()
        .map_err(|_| AudioError::NoSupportedConfig)?;

    let mut best: Option<cpal::SupportedStreamConfigRange> = None;
    for range in ranges {
        if range.min_sample_rate().0 <= SAMPLE_RATE && SAMPLE_RATE <= range.max_sample_rate().0 {
            let better = match &best {
                None => true,
                Some(b) => range.channels() < b.channels(),
            };
            if better {
                best = Some(range);
            }
        }
    }

    best.map(|range| range.with_sample_rate(cpal::SampleRate(SAMPLE_RATE)))
        .ok_or(AudioError::NoSupportedConfig)
}

/// Convert any sample type to i16 for WAV writing.
fn sample_to_i16<T: cpal::Sample<Float = f32>>(sample: T) -> i16 {
    let f32_sample: f32 = sample.to_float_sample();
    let clamped = f32_sample.clamp(-1.0, 1.0);
    (clamped * i16::MAX as f32) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_to_i16_from_float() {
        assert_eq!(sample_to_i16(0.0f32), 0);
        assert_eq!(sample_to_i16(1.0f32), i16::MAX);
        assert_eq!(sample_to_i16(-1.0f32), -i16::MAX);

        // A driver handing us values outside [-1, 1] must clamp, not wrap.
        assert_eq!(sample_to_i16(2.0f32), i16::MAX);
        assert_eq!(sample_to_i16(-2.0f32), -i16::MAX);
    }

    #[test]
    fn test_sample_to_i16_from_integer_formats() {
        // Silence for each format the stream builder accepts. The u16
        // midpoint (32768) is that format's zero level.
        assert_eq!(sample_to_i16(0i16), 0);
        assert_eq!(sample_to_i16(32768u16), 0);

        // Full scale survives the float round-trip to within a couple of
        // steps (the conversion divides by 32768, not 32767).
        assert!(sample_to_i16(i16::MAX) >= i16::MAX - 2);
        assert!(sample_to_i16(i16::MIN) <= -(i16::MAX - 2));
        assert!(sample_to_i16(u16::MAX) >= i16::MAX - 2);
        assert!(sample_to_i16(u16::MIN) <= -(i16::MAX - 2));
    }

    #[test]
    fn test_sink_preserves_arrival_order() {
        let sink = SampleSink::new();
        sink.push(vec![1, 2]);
        sink.push(vec![3]);
        sink.push(vec![4, 5, 6]);

        let blocks = sink.close();
        assert_eq!(blocks, vec![vec![1, 2], vec![3], vec![4, 5, 6]]);
    }

    #[test]
    fn test_sink_drops_blocks_after_close() {
        let sink = SampleSink::new();
        sink.push(vec![1]);
        let blocks = sink.close();
        assert_eq!(blocks.len(), 1);

        // Late callback after stop was observed
        sink.push(vec![2]);
        assert!(sink.close().is_empty());
    }
}
