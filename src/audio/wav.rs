//! WAV serialization with hound

use std::path::Path;

use hound::{WavSpec, WavWriter};

use super::capture::{CHANNELS, SAMPLE_RATE};

/// Write captured blocks to `path` as a 16 kHz mono 16-bit WAV, preserving
/// block arrival order.
pub fn write_wav(path: &Path, blocks: &[Vec<i16>]) -> Result<(), hound::Error> {
    let spec = WavSpec {
        channels: CHANNELS,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;
    for block in blocks {
        for &sample in block {
            writer.write_sample(sample)?;
        }
    }
    writer.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::WavReader;

    #[test]
    fn test_write_wav_concatenates_blocks_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");

        let blocks = vec![vec![1i16, 2, 3], vec![4, 5], vec![6]];
        write_wav(&path, &blocks).unwrap();

        let mut reader = WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.sample_rate, 16_000);
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.bits_per_sample, 16);

        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![1, 2, 3, 4, 5, 6]);
    }
}
