//! Canonical waveform type produced by the normalizer.

/// A contiguous mono PCM clip at a known sample rate.
///
/// This is the only input shape the encoder accepts: single channel,
/// f32 samples in [-1.0, 1.0], at the service's target rate.
#[derive(Debug, Clone)]
pub struct Waveform {
    /// Mono f32 samples in [-1.0, 1.0].
    pub samples: Vec<f32>,
    /// Sample rate in Hz (e.g. 16000).
    pub sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Returns the duration of this clip in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Returns true if the clip contains no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
