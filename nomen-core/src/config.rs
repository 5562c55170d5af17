//! Named configuration constants for the identification service.
//!
//! These are policy values, not runtime-tunable knobs. They live in a struct
//! rather than bare consts so tests and calibration runs can construct a
//! service with different values.

/// Configuration for [`IdentificationService`](crate::service::IdentificationService).
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Embedding dimensionality, fixed by the speaker model export.
    /// Default: 192 (ECAPA-VoxCeleb).
    pub embedding_dim: usize,
    /// Sample rate every clip is normalized to before extraction (Hz).
    /// Default: 16000.
    pub target_sample_rate: u32,
    /// Minimum clip duration after normalization (seconds). Shorter clips
    /// are rejected as client-input errors. Default: 1.0.
    pub min_duration_secs: f32,
    /// Minimum cosine similarity for a positive identification.
    /// Default: 0.25.
    pub accept_threshold: f32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            embedding_dim: 192,
            target_sample_rate: 16_000,
            min_duration_secs: 1.0,
            accept_threshold: 0.25,
        }
    }
}

impl ServiceConfig {
    /// Minimum sample count a normalized waveform must reach.
    pub fn min_samples(&self) -> usize {
        (self.min_duration_secs * self.target_sample_rate as f32).ceil() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_minimum_is_one_second_at_16k() {
        assert_eq!(ServiceConfig::default().min_samples(), 16_000);
    }

    #[test]
    fn min_samples_scales_with_duration() {
        let config = ServiceConfig {
            min_duration_secs: 0.5,
            ..ServiceConfig::default()
        };
        assert_eq!(config.min_samples(), 8_000);
    }
}
