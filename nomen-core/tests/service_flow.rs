//! End-to-end enroll/identify/health flows over the stub encoder and a
//! temporary on-disk store.

use std::io::Cursor;
use std::path::PathBuf;

use nomen_core::audio::Waveform;
use nomen_core::embedding::stub::StubEncoder;
use nomen_core::{
    Embedding, EncoderHandle, IdentificationService, NomenError, ServiceConfig, VoiceEncoder,
    VoiceStore,
};

/// Encoder double whose extraction always fails, for partial-write checks.
struct FailingEncoder {
    dim: usize,
}

impl VoiceEncoder for FailingEncoder {
    fn warm_up(&mut self) -> Result<(), NomenError> {
        Ok(())
    }

    fn encode(&mut self, _waveform: &Waveform) -> Result<Embedding, NomenError> {
        Err(NomenError::Extraction("induced failure".into()))
    }

    fn embedding_dim(&self) -> usize {
        self.dim
    }

    fn device(&self) -> String {
        "failing".into()
    }
}

fn temp_db(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "nomen-flow-{tag}-{}-{:08x}.db",
        std::process::id(),
        rand::random::<u32>()
    ))
}

fn cleanup(path: &PathBuf) {
    for suffix in ["", "-wal", "-shm"] {
        let mut p = path.clone().into_os_string();
        p.push(suffix);
        let _ = std::fs::remove_file(p);
    }
}

/// A sine-tone WAV clip encoded to bytes, mono 16-bit at `sample_rate`.
fn wav_clip(freq_hz: f32, secs: f32, sample_rate: u32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for i in 0..(secs * sample_rate as f32) as usize {
            let t = i as f32 / sample_rate as f32;
            let v =
                (0.4 * (2.0 * std::f32::consts::PI * freq_hz * t).sin() * i16::MAX as f32) as i16;
            writer.write_sample(v).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

/// A clip whose amplitude envelope is modulated at `am_hz`. The stub
/// encoder embeds band energies, so different envelope rates give clearly
/// separated embeddings (pure tones of equal amplitude would not).
fn am_wav_clip(am_hz: f32, secs: f32) -> Vec<u8> {
    let sample_rate = 16_000u32;
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for i in 0..(secs * sample_rate as f32) as usize {
            let t = i as f32 / sample_rate as f32;
            let envelope = 0.5 + 0.5 * (2.0 * std::f32::consts::PI * am_hz * t).sin();
            let carrier = (2.0 * std::f32::consts::PI * 220.0 * t).sin();
            let v = (0.35 * envelope * carrier * i16::MAX as f32) as i16;
            writer.write_sample(v).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

fn stub_config() -> ServiceConfig {
    ServiceConfig {
        embedding_dim: 32,
        ..ServiceConfig::default()
    }
}

fn stub_service(db_path: PathBuf) -> IdentificationService {
    let store = VoiceStore::new(db_path).unwrap();
    let encoder = EncoderHandle::new(StubEncoder::new(32));
    let service = IdentificationService::new(stub_config(), encoder, store);
    service.warm_up().unwrap();
    service
}

#[test]
fn enroll_then_identify_round_trips() {
    let path = temp_db("roundtrip");
    let service = stub_service(path.clone());

    let clip = wav_clip(220.0, 1.5, 16_000);
    let enrollment = service.enroll(&clip).unwrap();

    let result = service.identify(&clip).unwrap();
    assert_eq!(result.voice_id.as_deref(), Some(enrollment.voice_id.as_str()));
    assert!(
        result.score > 0.999,
        "same clip should score ≈1.0, got {}",
        result.score
    );
    cleanup(&path);
}

#[test]
fn identify_against_empty_store_is_not_an_error() {
    let path = temp_db("empty");
    let service = stub_service(path.clone());

    let result = service.identify(&wav_clip(330.0, 1.2, 16_000)).unwrap();
    assert_eq!(result.voice_id, None);
    assert_eq!(result.score, 0.0);
    cleanup(&path);
}

#[test]
fn identify_picks_the_closer_voice() {
    let path = temp_db("closer");
    let service = stub_service(path.clone());

    let slow = am_wav_clip(2.0, 1.5);
    let fast = am_wav_clip(7.0, 1.5);
    // Enroll the non-target first so the assertion cannot pass via tie-break.
    let _fast_id = service.enroll(&fast).unwrap().voice_id;
    let slow_id = service.enroll(&slow).unwrap().voice_id;

    let result = service.identify(&slow).unwrap();
    assert_eq!(result.voice_id.as_deref(), Some(slow_id.as_str()));
    assert!(result.score > 0.999, "exact clip should score ≈1.0");
    cleanup(&path);
}

#[test]
fn repeated_identify_is_deterministic() {
    let path = temp_db("determinism");
    let service = stub_service(path.clone());

    service.enroll(&wav_clip(220.0, 1.5, 16_000)).unwrap();
    service.enroll(&wav_clip(440.0, 1.5, 16_000)).unwrap();

    let query = wav_clip(330.0, 1.2, 16_000);
    let first = service.identify(&query).unwrap();
    let second = service.identify(&query).unwrap();
    assert_eq!(first, second);
    cleanup(&path);
}

#[test]
fn short_clip_is_rejected_before_any_store_mutation() {
    let path = temp_db("short");
    let service = stub_service(path.clone());

    let err = service.enroll(&wav_clip(220.0, 0.5, 16_000)).unwrap_err();
    assert!(matches!(err, NomenError::InsufficientAudio { .. }));
    assert!(err.is_client_fault());

    let health = service.health().unwrap();
    assert_eq!(health.voices, 0);
    cleanup(&path);
}

#[test]
fn garbage_bytes_are_rejected_before_any_store_mutation() {
    let path = temp_db("garbage");
    let service = stub_service(path.clone());

    let err = service.enroll(b"RIFFnot really a wav").unwrap_err();
    assert!(matches!(err, NomenError::Decode(_)));
    assert!(err.is_client_fault());
    assert_eq!(service.health().unwrap().voices, 0);
    cleanup(&path);
}

#[test]
fn extraction_failure_leaves_store_unchanged() {
    let path = temp_db("failing");
    let store = VoiceStore::new(path.clone()).unwrap();
    let encoder = EncoderHandle::new(FailingEncoder { dim: 32 });
    let service = IdentificationService::new(stub_config(), encoder, store);
    service.warm_up().unwrap();

    let err = service.enroll(&wav_clip(220.0, 1.5, 16_000)).unwrap_err();
    assert!(matches!(err, NomenError::Extraction(_)));
    assert!(!err.is_client_fault());
    assert_eq!(service.health().unwrap().voices, 0);
    cleanup(&path);
}

#[test]
fn sequential_enrollments_produce_distinct_identities() {
    let path = temp_db("distinct");
    let service = stub_service(path.clone());

    let mut ids = std::collections::HashSet::new();
    for i in 0..8 {
        let clip = wav_clip(200.0 + i as f32 * 50.0, 1.2, 16_000);
        assert!(ids.insert(service.enroll(&clip).unwrap().voice_id));
    }
    assert_eq!(service.health().unwrap().voices, 8);
    cleanup(&path);
}

#[test]
fn health_reports_device_and_count() {
    let path = temp_db("health");
    let service = stub_service(path.clone());

    let report = service.health().unwrap();
    assert_eq!(report.status, "ok");
    assert_eq!(report.device, "stub");
    assert_eq!(report.voices, 0);

    service.enroll(&wav_clip(220.0, 1.5, 16_000)).unwrap();
    assert_eq!(service.health().unwrap().voices, 1);
    cleanup(&path);
}

#[test]
fn mismatched_encoder_dimension_fails_warm_up() {
    let path = temp_db("dim-mismatch");
    let store = VoiceStore::new(path.clone()).unwrap();
    let encoder = EncoderHandle::new(StubEncoder::new(64));
    let service = IdentificationService::new(stub_config(), encoder, store);

    let err = service.warm_up().unwrap_err();
    assert!(matches!(err, NomenError::Extraction(_)));
    cleanup(&path);
}
