//! Audio normalization: raw encoded bytes → canonical mono 16 kHz waveform.
//!
//! ## Pipeline
//!
//! ```text
//! bytes → decode (hound) → downmix to mono → resample (rubato) → length gate
//! ```
//!
//! Decode and length failures are client-input faults: the caller receives
//! `Decode` or `InsufficientAudio` and nothing downstream runs. The length
//! gate is applied after resampling, so the minimum is measured in target
//! rate samples regardless of the source rate.

pub mod decode;
pub mod resample;
pub mod waveform;

pub use waveform::Waveform;

use tracing::debug;

use crate::config::ServiceConfig;
use crate::error::{NomenError, Result};
use resample::RateConverter;

/// Input frame count per rubato process call.
const RESAMPLE_CHUNK: usize = 1024;

/// Normalize an encoded clip to the shape the encoder accepts.
///
/// # Errors
/// - `Decode` if the bytes are not a parseable clip.
/// - `InsufficientAudio` if the normalized waveform is shorter than
///   `config.min_samples()`.
pub fn normalize(bytes: &[u8], config: &ServiceConfig) -> Result<Waveform> {
    let (mono, source_rate) = decode::decode_wav(bytes)?;

    let samples = if source_rate == config.target_sample_rate {
        mono
    } else {
        let mut converter =
            RateConverter::new(source_rate, config.target_sample_rate, RESAMPLE_CHUNK)?;
        let mut out = converter.process(&mono)?;
        out.extend(converter.finish()?);
        out
    };

    let need = config.min_samples();
    if samples.len() < need {
        return Err(NomenError::InsufficientAudio {
            got: samples.len(),
            need,
        });
    }

    debug!(
        source_rate,
        target_rate = config.target_sample_rate,
        samples = samples.len(),
        "normalized clip"
    );

    Ok(Waveform::new(samples, config.target_sample_rate))
}
