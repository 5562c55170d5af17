//! WAV container decode.
//!
//! Clips arrive as raw encoded bytes; `hound` handles the container in both
//! integer and float sample formats. Multi-channel audio is collapsed to
//! mono by averaging across channels — averaging rather than selecting one
//! channel, so no single microphone dominates the embedding.

use std::io::Cursor;

use tracing::debug;

use crate::error::{NomenError, Result};

/// Decode WAV bytes into mono f32 samples plus the source sample rate.
///
/// # Errors
/// `Decode` if the bytes are not a parseable WAV clip or a sample fails to
/// read (truncated payload, malformed chunk).
pub fn decode_wav(bytes: &[u8]) -> Result<(Vec<f32>, u32)> {
    let mut reader =
        hound::WavReader::new(Cursor::new(bytes)).map_err(|e| NomenError::Decode(e.to_string()))?;
    let spec = reader.spec();
    let channels = usize::from(spec.channels.max(1));

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map_err(|e| NomenError::Decode(e.to_string())))
            .collect::<Result<Vec<_>>>()?,
        hound::SampleFormat::Int => {
            if spec.bits_per_sample <= 16 {
                reader
                    .samples::<i16>()
                    .map(|s| {
                        s.map(|v| (v as f32) / (i16::MAX as f32))
                            .map_err(|e| NomenError::Decode(e.to_string()))
                    })
                    .collect::<Result<Vec<_>>>()?
            } else {
                let max = ((1_i64 << (spec.bits_per_sample - 1)) - 1) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| {
                        s.map(|v| (v as f32) / max)
                            .map_err(|e| NomenError::Decode(e.to_string()))
                    })
                    .collect::<Result<Vec<_>>>()?
            }
        }
    };

    debug!(
        channels,
        sample_rate = spec.sample_rate,
        frames = interleaved.len() / channels,
        "decoded wav clip"
    );

    if channels == 1 {
        return Ok((interleaved, spec.sample_rate));
    }

    let mut mono = Vec::with_capacity(interleaved.len() / channels);
    for frame in interleaved.chunks(channels) {
        let sum = frame.iter().copied().sum::<f32>();
        mono.push(sum / channels as f32);
    }
    Ok((mono, spec.sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn wav_bytes(spec: hound::WavSpec, write: impl FnOnce(&mut hound::WavWriter<&mut Cursor<Vec<u8>>>)) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            write(&mut writer);
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    fn int_spec(channels: u16, sample_rate: u32) -> hound::WavSpec {
        hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        }
    }

    #[test]
    fn mono_int16_round_trips() {
        let bytes = wav_bytes(int_spec(1, 16_000), |w| {
            for _ in 0..160 {
                w.write_sample(i16::MAX / 2).unwrap();
            }
        });
        let (samples, rate) = decode_wav(&bytes).unwrap();
        assert_eq!(rate, 16_000);
        assert_eq!(samples.len(), 160);
        assert!((samples[0] - 0.5).abs() < 1e-3);
    }

    #[test]
    fn stereo_collapses_by_averaging() {
        // L = +0.5, R = -0.5 → average 0.0, not either channel
        let bytes = wav_bytes(int_spec(2, 16_000), |w| {
            for _ in 0..100 {
                w.write_sample(i16::MAX / 2).unwrap();
                w.write_sample(-(i16::MAX / 2)).unwrap();
            }
        });
        let (samples, _) = decode_wav(&bytes).unwrap();
        assert_eq!(samples.len(), 100);
        for s in &samples {
            assert!(s.abs() < 1e-3, "expected averaged silence, got {s}");
        }
    }

    #[test]
    fn float_format_passes_through() {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 44_100,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let bytes = wav_bytes(spec, |w| {
            for i in 0..64 {
                w.write_sample(i as f32 * 0.01).unwrap();
            }
        });
        let (samples, rate) = decode_wav(&bytes).unwrap();
        assert_eq!(rate, 44_100);
        assert!((samples[10] - 0.10).abs() < 1e-6);
    }

    #[test]
    fn garbage_bytes_fail_with_decode_error() {
        let err = decode_wav(b"definitely not a wav file").unwrap_err();
        assert!(matches!(err, NomenError::Decode(_)));
        assert!(err.is_client_fault());
    }

    #[test]
    fn empty_input_fails_with_decode_error() {
        let err = decode_wav(&[]).unwrap_err();
        assert!(matches!(err, NomenError::Decode(_)));
    }
}
