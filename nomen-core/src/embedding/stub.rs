//! `StubEncoder` — deterministic backend that needs no model files.
//!
//! Used by tests and model-free builds. The embedding is a pure function of
//! the waveform content: the clip is split into `dim` equal bands and each
//! component is the mean absolute amplitude of its band, plus a small
//! constant offset so silent clips still produce a non-zero vector.
//! Identical audio therefore always yields an identical embedding, which is
//! what the round-trip and determinism tests rely on.

use tracing::debug;

use crate::audio::Waveform;
use crate::embedding::{Embedding, VoiceEncoder};
use crate::error::Result;

/// Band-energy stub encoder.
pub struct StubEncoder {
    dim: usize,
    clip_count: u64,
}

impl StubEncoder {
    pub fn new(dim: usize) -> Self {
        Self { dim, clip_count: 0 }
    }
}

impl Default for StubEncoder {
    fn default() -> Self {
        Self::new(192)
    }
}

impl VoiceEncoder for StubEncoder {
    fn warm_up(&mut self) -> Result<()> {
        debug!("StubEncoder::warm_up — no-op");
        Ok(())
    }

    fn encode(&mut self, waveform: &Waveform) -> Result<Embedding> {
        self.clip_count += 1;

        let samples = &waveform.samples;
        let band = (samples.len() / self.dim).max(1);
        let mut values = Vec::with_capacity(self.dim);
        for i in 0..self.dim {
            let start = (i * band).min(samples.len());
            let end = ((i + 1) * band).min(samples.len());
            let mean = if start < end {
                samples[start..end].iter().map(|s| s.abs()).sum::<f32>() / (end - start) as f32
            } else {
                0.0
            };
            // Offset keeps the vector away from zero norm on silent input.
            values.push(mean + 1e-3);
        }

        debug!(clip = self.clip_count, dim = self.dim, "stub embedding");
        Embedding::from_raw(values, self.dim)
    }

    fn embedding_dim(&self) -> usize {
        self.dim
    }

    fn device(&self) -> String {
        "stub".into()
    }
}
