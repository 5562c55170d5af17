//! `IdentificationService` — orchestrates normalizer, encoder and store.
//!
//! ## Flows
//!
//! ```text
//! enroll:   bytes → normalize → encode → store.insert → voice_id
//! identify: bytes → normalize → encode → best_match(store.all()) → result
//! health:   store.count() + encoder device — no audio path
//! ```
//!
//! Input-validation faults short-circuit before the model runs, and nothing
//! mutates the store unless extraction succeeded first. `identify` is
//! read-only. Each call is an independent unit of work; the only shared
//! state is the encoder handle (internally locked) and the store (SQLite
//! transactions).

use serde::Serialize;
use tracing::info;

use crate::audio;
use crate::config::ServiceConfig;
use crate::embedding::EncoderHandle;
use crate::error::{NomenError, Result};
use crate::matcher::{self, MatchResult};
use crate::store::VoiceStore;

/// Result of a successful enrollment.
#[derive(Debug, Clone, Serialize)]
pub struct Enrollment {
    pub voice_id: String,
}

/// Process health summary.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub device: String,
    pub voices: usize,
}

pub struct IdentificationService {
    config: ServiceConfig,
    encoder: EncoderHandle,
    store: VoiceStore,
}

impl IdentificationService {
    /// Create a service over an injected encoder and store.
    ///
    /// Does not load the model — call `warm_up()` once at host startup.
    pub fn new(config: ServiceConfig, encoder: EncoderHandle, store: VoiceStore) -> Self {
        Self {
            config,
            encoder,
            store,
        }
    }

    /// One-time model warm-up plus an encoder/config consistency check.
    pub fn warm_up(&self) -> Result<()> {
        info!("warming up speaker encoder");
        let mut encoder = self.encoder.0.lock();
        encoder.warm_up()?;
        let dim = encoder.embedding_dim();
        if dim != self.config.embedding_dim {
            return Err(NomenError::Extraction(format!(
                "encoder produces {dim}-dim embeddings, service configured for {}",
                self.config.embedding_dim
            )));
        }
        info!(dim, device = %encoder.device(), "speaker encoder ready");
        Ok(())
    }

    /// Register a new identity from an audio clip and return it.
    ///
    /// Decode, length and extraction failures abort before any store
    /// mutation, so a failed enrollment leaves no partial record behind.
    pub fn enroll(&self, audio_bytes: &[u8]) -> Result<Enrollment> {
        let waveform = audio::normalize(audio_bytes, &self.config)?;
        let embedding = self.encoder.0.lock().encode(&waveform)?;
        let voice_id = self.store.insert(&embedding)?;
        info!(
            voice_id = %voice_id,
            secs = waveform.duration_secs(),
            "enrolled new voice"
        );
        Ok(Enrollment { voice_id })
    }

    /// Find the best-matching enrolled identity for an audio clip.
    ///
    /// Read-only: never mutates the store. An empty store yields
    /// `{ voice_id: None, score: 0.0 }` rather than an error.
    pub fn identify(&self, audio_bytes: &[u8]) -> Result<MatchResult> {
        let waveform = audio::normalize(audio_bytes, &self.config)?;
        let embedding = self.encoder.0.lock().encode(&waveform)?;
        let candidates = self.store.all()?;
        let result = matcher::best_match(&embedding, &candidates, self.config.accept_threshold)?;
        info!(
            candidates = candidates.len(),
            score = result.score,
            matched = result.voice_id.is_some(),
            "identified clip"
        );
        Ok(result)
    }

    /// Health summary: process readiness, compute device, enrolled count.
    pub fn health(&self) -> Result<HealthReport> {
        Ok(HealthReport {
            status: "ok",
            device: self.encoder.0.lock().device(),
            voices: self.store.count()?,
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}
