//! Speaker embedding extraction.
//!
//! The `VoiceEncoder` trait decouples the service from any specific backend
//! (deterministic stub, ONNX ECAPA export, etc.).
//!
//! `&mut self` on `encode` intentionally expresses that inference sessions
//! are stateful. All mutation is serialised through `EncoderHandle`'s
//! `parking_lot::Mutex`, so concurrent requests never enter a session at the
//! same time.

pub mod stub;

#[cfg(feature = "onnx")]
pub mod onnx;

#[cfg(feature = "onnx")]
pub use onnx::{OnnxEncoder, OnnxEncoderConfig};

use std::sync::Arc;

use parking_lot::Mutex;

use crate::audio::Waveform;
use crate::error::{NomenError, Result};

/// A validated speaker embedding.
///
/// [`Embedding::from_raw`] is the only constructor, so every value in
/// circulation has the expected dimensionality, finite components and a
/// non-zero norm. A vector violating any of these indicates an encoder
/// contract violation and is reported as `Extraction` at the boundary,
/// instead of surfacing later as a `NaN` score.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    /// Validate a raw model output vector.
    ///
    /// # Errors
    /// `Extraction` on wrong dimensionality, non-finite values or zero norm.
    pub fn from_raw(values: Vec<f32>, expected_dim: usize) -> Result<Self> {
        if values.len() != expected_dim {
            return Err(NomenError::Extraction(format!(
                "embedding has {} dimensions, expected {expected_dim}",
                values.len()
            )));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(NomenError::Extraction(
                "embedding contains non-finite values".into(),
            ));
        }
        let norm_sq: f64 = values.iter().map(|&v| (v as f64) * (v as f64)).sum();
        if norm_sq == 0.0 {
            return Err(NomenError::Extraction("embedding has zero norm".into()));
        }
        Ok(Self(values))
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Contract for speaker embedding backends.
pub trait VoiceEncoder: Send + 'static {
    /// One-time warm-up: load weights, run a dummy forward pass. Called once
    /// at host startup, before the first request.
    ///
    /// # Errors
    /// Returns an error if model files are missing or corrupt.
    fn warm_up(&mut self) -> Result<()>;

    /// Extract a fixed-dimension embedding from a normalized waveform.
    ///
    /// `waveform` is mono at the target sample rate with at least the
    /// minimum duration; the normalizer guarantees this shape.
    fn encode(&mut self, waveform: &Waveform) -> Result<Embedding>;

    /// Dimensionality of the vectors this backend produces.
    fn embedding_dim(&self) -> usize;

    /// Human-readable compute device description, for health reporting.
    fn device(&self) -> String;
}

/// Thread-safe reference-counted handle to any `VoiceEncoder` implementor.
///
/// The process-wide model handle: constructed once at startup and injected
/// into the service, so tests can substitute a deterministic stub. Uses
/// `parking_lot::Mutex` for non-poisoning behaviour on panic.
#[derive(Clone)]
pub struct EncoderHandle(pub Arc<Mutex<dyn VoiceEncoder>>);

impl EncoderHandle {
    /// Wrap any `VoiceEncoder` in an `EncoderHandle`.
    pub fn new<E: VoiceEncoder>(encoder: E) -> Self {
        Self(Arc::new(Mutex::new(encoder)))
    }
}

impl std::fmt::Debug for EncoderHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncoderHandle").finish_non_exhaustive()
    }
}
