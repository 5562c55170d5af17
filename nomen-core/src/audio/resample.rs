//! Sample-rate conversion using a rubato `FastFixedIn` resampler.
//!
//! ## Design
//!
//! Clients record at whatever rate their hardware offers (commonly 44.1 or
//! 48 kHz). The speaker model requires 16 kHz mono f32. `RateConverter`
//! bridges that gap for whole clips: feed the decoded samples through
//! `process`, then call `finish` once to drain the sub-chunk tail and the
//! resampler's internal delay line.
//!
//! When source rate == target rate, `RateConverter` is a zero-copy
//! passthrough — no rubato session is created at all.

use rubato::{FastFixedIn, PolynomialDegree, Resampler};

use crate::error::Result;

/// Converts f32 mono audio from one fixed sample rate to another.
pub struct RateConverter {
    /// `None` when source rate == target rate (passthrough mode).
    resampler: Option<FastFixedIn<f32>>,
    /// Accumulation buffer — holds partial input chunks between calls.
    input_buf: Vec<f32>,
    /// How many input samples rubato expects per process call.
    chunk_size: usize,
    /// Pre-allocated output buffer: `[1][output_frames_max]`.
    output_buf: Vec<Vec<f32>>,
}

impl RateConverter {
    /// Create a new converter.
    ///
    /// # Parameters
    /// - `source_rate`: Sample rate of the decoded audio (Hz).
    /// - `target_rate`: Sample rate expected by the model (Hz).
    /// - `chunk_size`: Input frame count per rubato call (e.g. `1024`).
    ///
    /// # Errors
    /// Returns an error if rubato fails to initialise.
    pub fn new(source_rate: u32, target_rate: u32, chunk_size: usize) -> Result<Self> {
        if source_rate == target_rate {
            return Ok(Self {
                resampler: None,
                input_buf: Vec::new(),
                chunk_size,
                output_buf: Vec::new(),
            });
        }

        let ratio = target_rate as f64 / source_rate as f64;

        let resampler = FastFixedIn::<f32>::new(
            ratio,
            1.0, // fixed ratio — no dynamic adjustment
            PolynomialDegree::Cubic,
            chunk_size,
            1, // mono
        )
        .map_err(|e| anyhow::anyhow!("resampler init: {e}"))?;

        let max_out = resampler.output_frames_max();
        let output_buf = vec![vec![0f32; max_out]; 1];

        tracing::debug!(
            source_rate,
            target_rate,
            chunk_size,
            max_out,
            "resampling enabled"
        );

        Ok(Self {
            resampler: Some(resampler),
            input_buf: Vec::new(),
            chunk_size,
            output_buf,
        })
    }

    /// Process incoming samples, returning resampled output (may be empty).
    ///
    /// Samples are accumulated internally until a full `chunk_size` block is
    /// available for rubato. Any remainder is kept for `finish`.
    ///
    /// In passthrough mode (same rates), input is returned directly.
    pub fn process(&mut self, samples: &[f32]) -> Result<Vec<f32>> {
        let Some(ref mut resampler) = self.resampler else {
            // Zero-copy passthrough
            return Ok(samples.to_vec());
        };

        self.input_buf.extend_from_slice(samples);

        let mut result = Vec::new();

        while self.input_buf.len() >= self.chunk_size {
            let input_slice = &self.input_buf[..self.chunk_size];

            let (_consumed, produced) = resampler
                .process_into_buffer(&[input_slice], &mut self.output_buf, None)
                .map_err(|e| anyhow::anyhow!("resampler process: {e}"))?;
            result.extend_from_slice(&self.output_buf[0][..produced]);

            self.input_buf.drain(..self.chunk_size);
        }

        Ok(result)
    }

    /// Drain the sub-chunk remainder and the resampler's delay line.
    ///
    /// Without this, a clip loses up to `chunk_size - 1` trailing input
    /// samples — enough to push a short enrollment clip under the minimum
    /// duration. Call exactly once, after the last `process`.
    pub fn finish(&mut self) -> Result<Vec<f32>> {
        let Some(ref mut resampler) = self.resampler else {
            return Ok(Vec::new());
        };

        let mut result = Vec::new();

        if !self.input_buf.is_empty() {
            let tail = [self.input_buf.as_slice()];
            let (_consumed, produced) = resampler
                .process_partial_into_buffer(Some(&tail[..]), &mut self.output_buf, None)
                .map_err(|e| anyhow::anyhow!("resampler tail: {e}"))?;
            result.extend_from_slice(&self.output_buf[0][..produced]);
            self.input_buf.clear();
        }

        let (_consumed, produced) = resampler
            .process_partial_into_buffer(None::<&[&[f32]]>, &mut self.output_buf, None)
            .map_err(|e| anyhow::anyhow!("resampler flush: {e}"))?;
        result.extend_from_slice(&self.output_buf[0][..produced]);

        Ok(result)
    }

    /// Returns `true` when source rate == target rate (no resampling occurs).
    pub fn is_passthrough(&self) -> bool {
        self.resampler.is_none()
    }
}
