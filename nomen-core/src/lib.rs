//! # nomen-core
//!
//! Speaker identification engine SDK: enroll a voice from a short clip,
//! then identify who is speaking in later clips.
//!
//! ## Architecture
//!
//! ```text
//! audio bytes → Normalizer → Waveform → VoiceEncoder → Embedding
//!                                                          │
//!                     enroll ── VoiceStore::insert ◄───────┤
//!                   identify ── best_match(VoiceStore::all())
//! ```
//!
//! The encoder is injected behind [`EncoderHandle`], so hosts run the ONNX
//! speaker model while tests substitute a deterministic stub. The store is
//! durable SQLite; matching is a linear cosine scan over every enrolled
//! record.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod audio;
pub mod config;
pub mod embedding;
pub mod error;
pub mod matcher;
pub mod service;
pub mod store;

// Convenience re-exports for downstream crates
pub use config::ServiceConfig;
pub use embedding::{Embedding, EncoderHandle, VoiceEncoder};
pub use error::NomenError;
pub use matcher::MatchResult;
pub use service::{Enrollment, HealthReport, IdentificationService};
pub use store::{VoiceRecord, VoiceStore};

#[cfg(feature = "onnx")]
pub use embedding::{OnnxEncoder, OnnxEncoderConfig};
